//! Display state for published clouds
//!
//! [`CloudViewer`] is the publication sink the command line player renders
//! from. It keeps the newest cloud of every kind and what is currently on
//! screen, and [`CloudViewer::refresh`] returns only the changes needed to
//! bring the screen in line with the requested state.

use std::sync::Arc;

use tracing::trace;

use crate::cloud::{Cloud, RecordKind};
use crate::playback::PublicationSink;

/// Initial display settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerSettings {
    pub title: String,
    pub coordinate_system: bool,
    /// Display toggles indexed by [`RecordKind::index`].
    pub display: [bool; 3],
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            title: "pcdseq".to_string(),
            coordinate_system: true,
            display: [true; 3],
        }
    }
}

/// A change to apply to the display.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerAction {
    ShowCloud { kind: RecordKind, record: Arc<Cloud> },
    UpdateCloud { kind: RecordKind, record: Arc<Cloud> },
    HideCloud { kind: RecordKind },
    ShowCoordinateSystem,
    HideCoordinateSystem,
}

#[derive(Debug, Clone, Default)]
struct KindState {
    display: bool,
    shown: bool,
    /// A newer record arrived since the last refresh.
    dirty: bool,
    latest: Option<Arc<Cloud>>,
}

/// Per-kind display state machine fed by the player.
#[derive(Debug, Clone)]
pub struct CloudViewer {
    title: String,
    kinds: [KindState; 3],
    coordinate_system: bool,
    coordinate_system_shown: bool,
    ends_seen: usize,
}

impl Default for CloudViewer {
    fn default() -> Self {
        Self::new(ViewerSettings::default())
    }
}

impl CloudViewer {
    pub fn new(settings: ViewerSettings) -> Self {
        let mut kinds: [KindState; 3] = Default::default();
        for (state, display) in kinds.iter_mut().zip(settings.display) {
            state.display = display;
        }
        Self {
            title: settings.title,
            kinds,
            coordinate_system: settings.coordinate_system,
            coordinate_system_shown: false,
            ends_seen: 0,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Toggle display of one kind.
    pub fn set_display(&mut self, kind: RecordKind, display: bool) {
        self.kinds[kind.index()].display = display;
    }

    pub fn set_coordinate_system(&mut self, show: bool) {
        self.coordinate_system = show;
    }

    pub fn is_shown(&self, kind: RecordKind) -> bool {
        self.kinds[kind.index()].shown
    }

    pub fn coordinate_system_shown(&self) -> bool {
        self.coordinate_system_shown
    }

    /// Newest record received for `kind`.
    pub fn latest(&self, kind: RecordKind) -> Option<&Arc<Cloud>> {
        self.kinds[kind.index()].latest.as_ref()
    }

    /// Number of end-of-sequence signals received.
    pub fn ends_seen(&self) -> usize {
        self.ends_seen
    }

    /// Compute the actions that bring the display up to date.
    pub fn refresh(&mut self) -> Vec<ViewerAction> {
        let mut actions = Vec::new();

        if self.coordinate_system != self.coordinate_system_shown {
            self.coordinate_system_shown = self.coordinate_system;
            actions.push(if self.coordinate_system {
                ViewerAction::ShowCoordinateSystem
            } else {
                ViewerAction::HideCoordinateSystem
            });
        }

        for kind in RecordKind::ALL {
            let state = &mut self.kinds[kind.index()];
            match (&state.latest, state.display, state.shown) {
                (Some(record), true, false) => {
                    actions.push(ViewerAction::ShowCloud {
                        kind,
                        record: Arc::clone(record),
                    });
                    state.shown = true;
                    state.dirty = false;
                }
                (Some(record), true, true) if state.dirty => {
                    actions.push(ViewerAction::UpdateCloud {
                        kind,
                        record: Arc::clone(record),
                    });
                    state.dirty = false;
                }
                (_, false, true) => {
                    actions.push(ViewerAction::HideCloud { kind });
                    state.shown = false;
                }
                _ => {}
            }
        }

        actions
    }
}

impl PublicationSink for CloudViewer {
    fn publish(&mut self, kind: RecordKind, record: &Arc<Cloud>) {
        trace!(%kind, points = record.len(), "Cloud received");
        let state = &mut self.kinds[kind.index()];
        state.latest = Some(Arc::clone(record));
        state.dirty = true;
    }

    fn end_of_sequence(&mut self) {
        self.ends_seen += 1;
    }
}
