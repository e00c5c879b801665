//! CLI failures and their process exit codes.
//!
//! - 0:  success
//! - 2:  clap arg parse error (automatic, before our code runs)
//! - 10: engine error (bad config, no images, mismatched fields)
//! - 11: file error (image decode, PNG write, segment dump)
//! - 12: input error (bad JSON params, bad flag values)
//! - 13: serialization error

use contour_art_core::EngineError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("cannot load image {}: {source}", .path.display())]
    ImageLoad { path: PathBuf, source: EngineError },

    #[error("cannot write snapshot {}: {source}", .path.display())]
    Snapshot { path: PathBuf, source: EngineError },

    #[error("cannot write segments {}: {source}", .path.display())]
    SegmentDump {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0}")]
    Input(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Engine(_) => 10,
            CliError::ImageLoad { .. } | CliError::Snapshot { .. } | CliError::SegmentDump { .. } => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}
