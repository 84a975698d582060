//! Error types for the flowfield core.
//!
//! Field evaluation itself never fails: out-of-range parameters are clamped
//! and degenerate queries are epsilon-guarded. These errors cover the
//! fallible edges around it (construction, name lookup, I/O).

use thiserror::Error;

/// Errors produced by engine construction, configuration and export.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Width or height was zero, negative or non-finite.
    #[error("invalid dimensions: width and height must be positive and finite")]
    InvalidDimensions,

    /// A source kind name did not match any known singularity type.
    #[error("unknown source kind: {0}")]
    UnknownSourceKind(String),

    /// A visualization mode name was not recognized.
    #[error("unknown visualization mode: {0}")]
    UnknownMode(String),

    /// A scene description failed validation.
    #[error("invalid scene: {0}")]
    InvalidScene(String),

    /// Writing an export file failed.
    #[error("i/o error: {0}")]
    Io(String),

    /// Geometry or settings could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_dimensions_displays_readable_message() {
        let msg = EngineError::InvalidDimensions.to_string();
        assert!(
            msg.contains("width") && msg.contains("height"),
            "expected message mentioning width and height, got: {msg}"
        );
    }

    #[test]
    fn unknown_source_kind_includes_name() {
        let msg = EngineError::UnknownSourceKind("whirlpool".into()).to_string();
        assert!(msg.contains("whirlpool"), "missing kind name in: {msg}");
    }

    #[test]
    fn unknown_mode_includes_name() {
        let msg = EngineError::UnknownMode("hatching".into()).to_string();
        assert!(msg.contains("hatching"), "missing mode name in: {msg}");
    }

    #[test]
    fn invalid_scene_includes_reason() {
        let msg = EngineError::InvalidScene("zero frames".into()).to_string();
        assert!(msg.contains("zero frames"), "missing reason in: {msg}");
    }

    #[test]
    fn io_error_converts_and_keeps_message() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such dir");
        let err = EngineError::from(io);
        assert!(matches!(err, EngineError::Io(_)));
        assert!(err.to_string().contains("no such dir"));
    }

    #[test]
    fn serde_error_converts_to_serialization() {
        let bad = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        assert!(matches!(
            EngineError::from(bad),
            EngineError::Serialization(_)
        ));
    }

    #[test]
    fn engine_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EngineError>();
    }

    #[test]
    fn engine_error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<EngineError>();
    }
}
