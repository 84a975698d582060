//! CLI failures and the process exit code each one maps to.
//!
//! clap exits with 2 on bad arguments before `run` is reached. Everything
//! after that is a [`CliError`]:
//!
//! | code | cause |
//! |------|-------|
//! | 10   | the engine rejected the scene (dimensions, dt, sources) |
//! | 11   | a scene file could not be read or an export could not be written |
//! | 12   | a scene file, `--params` or `--mode` value could not be understood |
//! | 13   | the frame or a report could not be serialized |

use std::path::PathBuf;

use flowfield_core::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(EngineError),

    #[error("cannot read scene {}: {message}", path.display())]
    SceneRead { path: PathBuf, message: String },

    #[error("malformed scene {}: {message}", path.display())]
    SceneFormat { path: PathBuf, message: String },

    /// Export write failure, carried over from [`EngineError::Io`].
    #[error("{0}")]
    Export(String),

    /// A `--params` or `--mode` value that could not be interpreted.
    #[error("{0}")]
    Input(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Engine(_) => 10,
            CliError::SceneRead { .. } | CliError::Export(_) => 11,
            CliError::SceneFormat { .. } | CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

/// Export failures keep their I/O exit code; the rest are engine rejections.
impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Io(msg) => CliError::Export(msg),
            EngineError::Serialization(msg) => CliError::Serialization(msg),
            other => CliError::Engine(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}
