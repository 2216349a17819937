//! Linear snapshot history for undo.

use std::sync::Arc;

use crate::core::types::Vec3;
use crate::render::VoxelRenderer;
use crate::voxel::store::VoxelStore;
use crate::voxel::voxel::{Color, VoxelRecord};

/// Immutable copy of the whole store at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    records: Arc<[VoxelRecord]>,
}

impl HistoryEntry {
    pub fn new(records: Vec<VoxelRecord>) -> Self {
        Self { records: records.into() }
    }

    pub fn records(&self) -> &[VoxelRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Ordered snapshots plus a cursor.
///
/// Strictly linear: snapshotting after an undo drops every entry past the
/// cursor. Only [`History::snapshot`] moves the cursor forward.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    /// None until the first snapshot
    index: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the store as a new entry after the cursor
    pub fn snapshot<R: VoxelRenderer>(&mut self, store: &VoxelStore<R>) {
        self.push(HistoryEntry::new(store.snapshot_all()));
    }

    /// Append an entry, discarding anything after the cursor
    pub fn push(&mut self, entry: HistoryEntry) {
        let keep = self.index.map_or(0, |i| i + 1);
        if keep < self.entries.len() {
            log::debug!("history: discarding {} entries past cursor", self.entries.len() - keep);
            self.entries.truncate(keep);
        }
        self.entries.push(entry);
        self.index = Some(self.entries.len() - 1);
    }

    /// Step the cursor back one entry and return it.
    ///
    /// Returns None without changing anything at the oldest entry or when
    /// no snapshot exists yet.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        match self.index {
            Some(i) if i > 0 => {
                self.index = Some(i - 1);
                self.entries.get(i - 1)
            }
            _ => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.index.and_then(|i| self.entries.get(i))
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.index, Some(i) if i > 0)
    }
}

/// Replace the store's contents with an entry.
///
/// An empty entry leaves a single unit voxel at the origin in
/// `fallback_color`, so the world never ends up empty after a restore.
pub fn restore<R: VoxelRenderer>(entry: &HistoryEntry, store: &mut VoxelStore<R>, fallback_color: Color) {
    store.clear();
    if entry.is_empty() {
        store.create(Vec3::ZERO, fallback_color, Vec3::ONE);
        return;
    }
    for record in entry.records() {
        store.create_record(record);
    }
}
