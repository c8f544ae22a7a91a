//! Sequence player state machine
//!
//! [`SequencePlayer::tick`] is the only place the cursor moves. Each tick:
//!
//! 1. reloads the sequence if requested (or on the very first tick),
//! 2. otherwise applies auto/requested navigation,
//! 3. handles running off either end (signal, then wrap or clamp),
//! 4. checks the publish gate,
//! 5. re-publishes from cache or loads each enabled record kind.

use std::path::PathBuf;

use tracing::{debug, error, info, trace, warn};

use crate::cloud::{PcdLoader, RecordKind, RecordLoader};
use crate::store::{Sequence, SequenceStore, StoreError};

use super::cache::RecordCache;
use super::flags::{trigger_channels, Controls, RequestFlags, TriggerInbox, TriggerPort};
use super::PublicationSink;

/// Default file name pattern: any `.pcd` file.
pub const DEFAULT_PATTERN: &str = r".*\.(pcd)";

/// Everything the player needs to know up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSettings {
    /// Directory holding the frame files.
    pub directory: PathBuf,
    /// Regular expression a file name must fully match.
    pub pattern: String,
    /// Sort discovered files by path.
    pub sort: bool,
    /// Wrap around instead of stopping at either end.
    pub looping: bool,
    /// Advance one frame on every tick.
    pub auto_advance: bool,
    /// Step back one frame on every tick.
    pub auto_retreat: bool,
    /// Publish on every tick instead of waiting for a publish request.
    pub auto_publish: bool,
    /// Record kinds to load and publish.
    pub kinds: Vec<RecordKind>,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            pattern: DEFAULT_PATTERN.to_string(),
            sort: true,
            looping: false,
            auto_advance: true,
            auto_retreat: false,
            auto_publish: true,
            kinds: vec![RecordKind::Xyz],
        }
    }
}

impl PlaybackSettings {
    /// Whether `kind` should be loaded and published.
    pub fn wants(&self, kind: RecordKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Discovery settings derived from these playback settings.
    pub fn store(&self) -> SequenceStore {
        SequenceStore::new(self.directory.clone(), self.pattern.clone(), self.sort)
    }
}

/// Which end of the sequence the cursor ran past.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Start,
    End,
}

/// Coarse lifecycle state, derived from the player's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Nothing has been served yet.
    AwaitingFirstLoad,
    /// A reload has been requested and will run on the next tick.
    SequenceReloadPending,
    /// A frame has been served and is cached.
    Steady,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Frame `index` was read from disk; `published` kinds succeeded, `failed` did not.
    Loaded {
        index: usize,
        published: usize,
        failed: usize,
    },
    /// Frame `index` was already served; cached records were re-published.
    Cached { index: usize, published: usize },
    /// The cursor hit `boundary` without looping; nothing was published.
    Ended { index: usize, boundary: Boundary },
    /// The sequence has no frames.
    Empty,
    /// Auto-publish is off and no publish was requested.
    Held { index: usize },
}

impl TickOutcome {
    /// Number of records handed to the sink.
    pub fn published(&self) -> usize {
        match self {
            TickOutcome::Loaded { published, .. } | TickOutcome::Cached { published, .. } => {
                *published
            }
            _ => 0,
        }
    }
}

/// Cursor into the sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Cursor {
    index: usize,
    /// Index last served to the sink; `None` until something loads.
    previous: Option<usize>,
}

/// Drives a directory of frame files as a controllable stream of records.
///
/// The player is owned by one driver that calls [`tick`](Self::tick).
/// Other threads steer it through [`controls`](Self::controls) and
/// [`trigger_port`](Self::trigger_port).
pub struct SequencePlayer<L = PcdLoader> {
    settings: PlaybackSettings,
    store: SequenceStore,
    loader: L,
    sequence: Sequence,
    cursor: Cursor,
    cache: RecordCache,
    /// Set once the first tick has run.
    started: bool,
    /// Boundary the cursor was clamped against, until it moves away.
    parked: Option<Boundary>,
    last_error: Option<StoreError>,
    controls: Controls,
    triggers: TriggerPort,
    inbox: TriggerInbox,
}

impl SequencePlayer<PcdLoader> {
    /// Player reading PCD files.
    pub fn with_pcd_loader(settings: PlaybackSettings) -> Self {
        Self::new(settings, PcdLoader)
    }
}

impl<L: RecordLoader> SequencePlayer<L> {
    /// Create a player whose first tick scans the directory.
    pub fn new(settings: PlaybackSettings, loader: L) -> Self {
        let initial = RequestFlags {
            reload: true,
            ..Default::default()
        };
        Self::build(settings, loader, Sequence::default(), initial)
    }

    /// Create a player over an already discovered sequence.
    ///
    /// No scan happens until a reload is requested.
    pub fn with_sequence(settings: PlaybackSettings, sequence: Sequence, loader: L) -> Self {
        Self::build(settings, loader, sequence, RequestFlags::default())
    }

    fn build(
        settings: PlaybackSettings,
        loader: L,
        sequence: Sequence,
        initial: RequestFlags,
    ) -> Self {
        let (triggers, inbox) = trigger_channels();
        trace!("Constructed");
        Self {
            store: settings.store(),
            settings,
            loader,
            sequence,
            cursor: Cursor::default(),
            cache: RecordCache::new(),
            started: false,
            parked: None,
            last_error: None,
            controls: Controls::with_flags(initial),
            triggers,
            inbox,
        }
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Current cursor position.
    pub fn index(&self) -> usize {
        self.cursor.index
    }

    /// Index of the frame last served, if any.
    pub fn previous_index(&self) -> Option<usize> {
        self.cursor.previous
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    /// Error from the most recent directory scan, if it failed.
    pub fn last_error(&self) -> Option<&StoreError> {
        self.last_error.as_ref()
    }

    /// Handle for setting request flags.
    pub fn controls(&self) -> Controls {
        self.controls.clone()
    }

    /// Handle for firing external triggers.
    pub fn trigger_port(&self) -> TriggerPort {
        self.triggers.clone()
    }

    pub fn state(&self) -> PlayerState {
        if self.controls.pending().reload {
            PlayerState::SequenceReloadPending
        } else if self.cursor.previous.is_none() {
            PlayerState::AwaitingFirstLoad
        } else {
            PlayerState::Steady
        }
    }

    /// Run one tick, publishing any records into `sink`.
    pub fn tick<S: PublicationSink + ?Sized>(&mut self, sink: &mut S) -> TickOutcome {
        trace!("Tick");
        self.inbox.drain_into(&self.controls);
        let requests = self.controls.take();

        debug!(
            index = self.cursor.index,
            previous = ?self.cursor.previous,
            "Before navigation"
        );

        if requests.reload || !self.started {
            if requests.reload {
                self.reload();
            } else {
                self.cursor.index = 0;
            }
            self.started = true;
            // Navigation requests wait for a tick that navigates.
            self.controls.restore(RequestFlags {
                advance: requests.advance,
                retreat: requests.retreat,
                ..Default::default()
            });
        } else if !self.sequence.is_empty() {
            let forward = self.settings.auto_advance || requests.advance;
            let backward = self.settings.auto_retreat || requests.retreat;
            let delta = forward as isize - backward as isize;
            if let Some(outcome) = self.navigate(delta, sink) {
                self.keep_publish_request(requests);
                return outcome;
            }
        }

        if self.sequence.is_empty() {
            info!("Empty sequence!");
            self.keep_publish_request(requests);
            return TickOutcome::Empty;
        }

        let index = self.cursor.index;
        if !self.settings.auto_publish && !requests.publish {
            debug!(index, "Publishing held until requested");
            return TickOutcome::Held { index };
        }

        debug!(index, previous = ?self.cursor.previous, "After navigation");

        if self.cursor.previous == Some(index) {
            debug!("Returning previous cloud");
            return self.republish(index, sink);
        }

        self.load(index, sink)
    }

    fn keep_publish_request(&self, requests: RequestFlags) {
        if requests.publish {
            self.controls.restore(RequestFlags {
                publish: true,
                ..Default::default()
            });
        }
    }

    /// Rebuild the sequence from disk and rewind.
    fn reload(&mut self) {
        debug!(
            directory = %self.store.directory().display(),
            pattern = self.store.pattern(),
            "Reloading sequence"
        );
        match self.store.discover() {
            Ok(sequence) => {
                if sequence.is_empty() {
                    warn!(
                        "There are no files matching the regular expression {} in {}",
                        self.store.pattern(),
                        self.store.directory().display()
                    );
                }
                self.sequence = sequence;
                self.last_error = None;
            }
            Err(err) => {
                error!("{}", err);
                self.sequence = Sequence::default();
                self.last_error = Some(err);
            }
        }
        self.cursor = Cursor::default();
        self.cache.clear();
        self.parked = None;
    }

    /// Move the cursor by `delta`, handling both ends.
    ///
    /// Returns the outcome to report when the tick must stop here.
    fn navigate<S: PublicationSink + ?Sized>(
        &mut self,
        delta: isize,
        sink: &mut S,
    ) -> Option<TickOutcome> {
        let len = self.sequence.len() as isize;
        let target = self.cursor.index as isize + delta;

        let boundary = if target < 0 {
            Boundary::Start
        } else if target >= len {
            Boundary::End
        } else {
            self.cursor.index = target as usize;
            if delta != 0 {
                self.parked = None;
            }
            return None;
        };

        if self.parked == Some(boundary) {
            // Still pushing against the end we stopped at.
            return Some(TickOutcome::Ended {
                index: self.cursor.index,
                boundary,
            });
        }

        sink.end_of_sequence();

        if self.settings.looping {
            self.cursor.index = match boundary {
                Boundary::Start => (len - 1) as usize,
                Boundary::End => 0,
            };
            info!(index = self.cursor.index, "Sequence loop");
            None
        } else {
            self.cursor.index = match boundary {
                Boundary::Start => 0,
                Boundary::End => (len - 1) as usize,
            };
            self.parked = Some(boundary);
            info!("End of sequence");
            Some(TickOutcome::Ended {
                index: self.cursor.index,
                boundary,
            })
        }
    }

    fn republish<S: PublicationSink + ?Sized>(&self, index: usize, sink: &mut S) -> TickOutcome {
        let mut published = 0;
        for kind in RecordKind::ALL {
            if !self.settings.wants(kind) {
                continue;
            }
            if let Some(record) = self.cache.get_at(kind, index) {
                sink.publish(kind, record);
                published += 1;
            }
        }
        TickOutcome::Cached { index, published }
    }

    /// Load every enabled kind of frame `index`. Failures only skip that kind.
    fn load<S: PublicationSink + ?Sized>(&mut self, index: usize, sink: &mut S) -> TickOutcome {
        let path = self.sequence[index].to_path_buf();
        debug!(path = %path.display(), "Loading cloud from file");

        let mut published = 0;
        let mut failed = 0;
        for kind in RecordKind::ALL {
            if !self.settings.wants(kind) {
                continue;
            }
            match self.loader.load(&path, kind) {
                Ok(cloud) => {
                    let points = cloud.len();
                    let record = self.cache.store(kind, index, cloud);
                    self.cursor.previous = Some(index);
                    sink.publish(kind, &record);
                    info!(
                        %kind,
                        points,
                        "Cloud loaded properly from {}",
                        path.display()
                    );
                    published += 1;
                }
                Err(err) => {
                    warn!(%kind, "Cannot read cloud from {}: {}", path.display(), err);
                    failed += 1;
                }
            }
        }

        TickOutcome::Loaded {
            index,
            published,
            failed,
        }
    }
}
