//! Per-kind single-slot record cache

use std::sync::Arc;

use crate::cloud::{Cloud, RecordKind};

#[derive(Debug, Clone)]
struct Slot {
    index: usize,
    record: Arc<Cloud>,
}

/// Last successfully decoded record of each kind, tagged with the frame
/// index it came from.
#[derive(Debug, Clone, Default)]
pub struct RecordCache {
    slots: [Option<Slot>; 3],
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot for `kind` and return the shared record.
    pub fn store(&mut self, kind: RecordKind, index: usize, record: Cloud) -> Arc<Cloud> {
        let record = Arc::new(record);
        self.slots[kind.index()] = Some(Slot {
            index,
            record: Arc::clone(&record),
        });
        record
    }

    /// The cached record for `kind`, whatever frame it came from.
    pub fn get(&self, kind: RecordKind) -> Option<&Arc<Cloud>> {
        self.slots[kind.index()].as_ref().map(|slot| &slot.record)
    }

    /// The cached record for `kind` only if it was loaded from `index`.
    pub fn get_at(&self, kind: RecordKind, index: usize) -> Option<&Arc<Cloud>> {
        self.slots[kind.index()]
            .as_ref()
            .filter(|slot| slot.index == index)
            .map(|slot| &slot.record)
    }

    /// Frame index the `kind` slot was loaded from.
    pub fn loaded_index(&self, kind: RecordKind) -> Option<usize> {
        self.slots[kind.index()].as_ref().map(|slot| slot.index)
    }

    pub fn clear(&mut self) {
        self.slots = Default::default();
    }
}
