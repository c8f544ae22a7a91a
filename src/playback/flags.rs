//! Request flags and inbound trigger channels
//!
//! Anything outside the tick loop talks to the player through two handles:
//!
//! - [`Controls`]: sets boolean request flags directly (UI buttons, stdin).
//! - [`TriggerPort`]: pushes into single-slot channels, one per trigger kind,
//!   which the player drains at the start of each tick.
//!
//! Both end up in the same [`RequestFlags`]. Flags are booleans, so asking
//! twice before a tick is the same as asking once.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TryRecvError, TrySendError};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

/// Pending requests, consumed by the next tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestFlags {
    pub advance: bool,
    pub retreat: bool,
    pub reload: bool,
    pub publish: bool,
}

impl RequestFlags {
    /// OR another set of requests into this one.
    pub fn merge(&mut self, other: RequestFlags) {
        self.advance |= other.advance;
        self.retreat |= other.retreat;
        self.reload |= other.reload;
        self.publish |= other.publish;
    }

    pub fn any(&self) -> bool {
        self.advance || self.retreat || self.reload || self.publish
    }
}

/// A request that can be issued to the player between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move to the next frame on the next tick.
    Advance,
    /// Move to the previous frame on the next tick.
    Retreat,
    /// Re-scan the sequence directory and restart from the first frame.
    Reload,
    /// Publish the current frame even when auto-publish is off.
    Publish,
}

/// Cloneable handle for setting request flags from any thread.
#[derive(Debug, Clone, Default)]
pub struct Controls {
    flags: Arc<Mutex<RequestFlags>>,
}

impl Controls {
    pub(crate) fn with_flags(flags: RequestFlags) -> Self {
        Self {
            flags: Arc::new(Mutex::new(flags)),
        }
    }

    pub fn request_advance(&self) {
        trace!("Next cloud requested");
        self.flags.lock().advance = true;
    }

    pub fn request_retreat(&self) {
        trace!("Previous cloud requested");
        self.flags.lock().retreat = true;
    }

    pub fn request_reload(&self) {
        trace!("Sequence reload requested");
        self.flags.lock().reload = true;
    }

    pub fn request_publish(&self) {
        trace!("Publish requested");
        self.flags.lock().publish = true;
    }

    /// Dispatch a [`Command`] to the matching request.
    pub fn apply(&self, command: Command) {
        match command {
            Command::Advance => self.request_advance(),
            Command::Retreat => self.request_retreat(),
            Command::Reload => self.request_reload(),
            Command::Publish => self.request_publish(),
        }
    }

    /// Current pending requests, without consuming them.
    pub fn pending(&self) -> RequestFlags {
        *self.flags.lock()
    }

    /// Take all pending requests, leaving none behind.
    pub(crate) fn take(&self) -> RequestFlags {
        std::mem::take(&mut *self.flags.lock())
    }

    /// Put back requests a tick did not get to consume.
    pub(crate) fn restore(&self, unconsumed: RequestFlags) {
        self.flags.lock().merge(unconsumed);
    }
}

/// Externally fired triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Advance,
    Retreat,
    Publish,
}

/// Sending half of the inbound trigger channels.
///
/// Each channel holds at most one pending item.
#[derive(Debug, Clone)]
pub struct TriggerPort {
    advance: SyncSender<()>,
    retreat: SyncSender<()>,
    publish: SyncSender<()>,
}

impl TriggerPort {
    /// Fire a trigger.
    ///
    /// Returns `false` if an item of that kind is already waiting or the
    /// player has been dropped.
    pub fn fire(&self, trigger: Trigger) -> bool {
        let sender = match trigger {
            Trigger::Advance => &self.advance,
            Trigger::Retreat => &self.retreat,
            Trigger::Publish => &self.publish,
        };
        match sender.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => {
                trace!(?trigger, "Trigger already pending");
                false
            }
            Err(TrySendError::Disconnected(())) => false,
        }
    }
}

/// Receiving half of the inbound trigger channels, owned by the player.
#[derive(Debug)]
pub(crate) struct TriggerInbox {
    advance: Receiver<()>,
    retreat: Receiver<()>,
    publish: Receiver<()>,
}

impl TriggerInbox {
    /// Consume at most one item per channel and raise the matching flag.
    pub(crate) fn drain_into(&self, controls: &Controls) {
        if Self::read(&self.advance) {
            trace!("Triggered next cloud");
            controls.request_advance();
        }
        if Self::read(&self.retreat) {
            trace!("Triggered previous cloud");
            controls.request_retreat();
        }
        if Self::read(&self.publish) {
            trace!("Triggered publish");
            controls.request_publish();
        }
    }

    fn read(rx: &Receiver<()>) -> bool {
        match rx.try_recv() {
            Ok(()) => true,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => false,
        }
    }
}

/// Create the trigger channel pair.
pub(crate) fn trigger_channels() -> (TriggerPort, TriggerInbox) {
    let (advance_tx, advance_rx) = sync_channel(1);
    let (retreat_tx, retreat_rx) = sync_channel(1);
    let (publish_tx, publish_rx) = sync_channel(1);
    (
        TriggerPort {
            advance: advance_tx,
            retreat: retreat_tx,
            publish: publish_tx,
        },
        TriggerInbox {
            advance: advance_rx,
            retreat: retreat_rx,
            publish: publish_rx,
        },
    )
}
