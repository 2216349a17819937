//! Voxel edit subsystem: undo history, save codes and batch rebuilds.
//!
//! Every content edit ends in one [`History`] snapshot of the whole store.
//! Save codes are produced and parsed by [`codec`] independently of history.

pub mod history;
pub mod codec;
pub mod scale;
pub mod batch;

pub use history::{History, HistoryEntry, restore};
pub use codec::CodecError;
pub use scale::ScaleFactors;
pub use batch::{BatchLoad, BatchProgress};
