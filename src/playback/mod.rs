//! Sequence playback engine
//!
//! Turns a directory of frame files into a controllable stream of records:
//!
//! - `player`: the tick-driven state machine ([`SequencePlayer`])
//! - `flags`: request flags, commands and inbound trigger channels
//! - `cache`: per-kind single-slot record cache
//!
//! # Usage
//!
//! ```no_run
//! use pcdseq::playback::{Emission, PlaybackSettings, SequencePlayer};
//!
//! let mut player = SequencePlayer::with_pcd_loader(PlaybackSettings::default());
//! let controls = player.controls();
//! let mut sink: Vec<Emission> = Vec::new();
//!
//! player.tick(&mut sink); // scans the directory, publishes frame 0
//! controls.request_advance();
//! player.tick(&mut sink); // publishes frame 1
//! ```

mod cache;
mod flags;
mod player;

use std::sync::Arc;

use crate::cloud::{Cloud, RecordKind};

pub use cache::RecordCache;
pub use flags::{Command, Controls, RequestFlags, Trigger, TriggerPort};
pub use player::{
    Boundary, PlaybackSettings, PlayerState, SequencePlayer, TickOutcome, DEFAULT_PATTERN,
};

/// Receiver of everything the player emits.
pub trait PublicationSink {
    /// A record of `kind` for the current frame.
    fn publish(&mut self, kind: RecordKind, record: &Arc<Cloud>);

    /// The cursor ran past either end of the sequence.
    fn end_of_sequence(&mut self) {}
}

/// One item emitted by the player, as collected by the `Vec` sink.
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    Record { kind: RecordKind, record: Arc<Cloud> },
    EndOfSequence,
}

impl PublicationSink for Vec<Emission> {
    fn publish(&mut self, kind: RecordKind, record: &Arc<Cloud>) {
        self.push(Emission::Record {
            kind,
            record: Arc::clone(record),
        });
    }

    fn end_of_sequence(&mut self) {
        self.push(Emission::EndOfSequence);
    }
}

impl<S: PublicationSink + ?Sized> PublicationSink for &mut S {
    fn publish(&mut self, kind: RecordKind, record: &Arc<Cloud>) {
        (**self).publish(kind, record);
    }

    fn end_of_sequence(&mut self) {
        (**self).end_of_sequence();
    }
}
