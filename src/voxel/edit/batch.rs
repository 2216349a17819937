//! Staggered batch creation for loading save codes.

use std::collections::VecDeque;

use crate::render::VoxelRenderer;
use crate::voxel::store::VoxelStore;
use crate::voxel::voxel::VoxelRecord;

/// Progress of a batch after one step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchProgress {
    /// Records still queued
    Pending { remaining: usize },
    /// Queue drained
    Done,
}

/// Queue of records created a few at a time.
///
/// Runs to completion once started; there is no cancel.
#[derive(Debug)]
pub struct BatchLoad {
    queue: VecDeque<VoxelRecord>,
    total: usize,
    /// Records that landed on an already-occupied cell
    skipped: usize,
}

impl BatchLoad {
    pub fn new(records: Vec<VoxelRecord>) -> Self {
        let total = records.len();
        Self {
            queue: records.into(),
            total,
            skipped: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Create up to `count` voxels
    pub fn step<R: VoxelRenderer>(&mut self, store: &mut VoxelStore<R>, count: usize) -> BatchProgress {
        for _ in 0..count {
            let Some(record) = self.queue.pop_front() else {
                break;
            };
            if !store.create_record(&record) {
                self.skipped += 1;
            }
        }

        if self.queue.is_empty() {
            BatchProgress::Done
        } else {
            BatchProgress::Pending { remaining: self.queue.len() }
        }
    }
}
