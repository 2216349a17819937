//! Error types for the voxel editor

use thiserror::Error;

use crate::voxel::edit::codec::CodecError;

/// Main error type for the editor
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Save code error: {0}")]
    Codec(#[from] CodecError),

    #[error("Invalid scale input: {0}")]
    InvalidScale(String),
}
