use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced to the host by the video nodes.
///
/// Every variant is terminal for the invocation that produced it.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("video source unavailable: {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },
    #[error("failed to decode a frame from {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("failed to encode {path}: {reason}")]
    Encode { path: PathBuf, reason: String },
    #[error("failed to prepare output location {path}: {source}")]
    OutputPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("node {0} is already registered")]
    DuplicateNode(String),
}

impl NodeError {
    pub fn source_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn encode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Encode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_include_path_and_reason() {
        let err = NodeError::source_unavailable("/in/missing.mp4", "No such file");
        assert_eq!(
            err.to_string(),
            "video source unavailable: /in/missing.mp4: No such file"
        );

        let err = NodeError::encode("/out/Deforum_3.mp4", "codec not found");
        assert_eq!(
            err.to_string(),
            "failed to encode /out/Deforum_3.mp4: codec not found"
        );
    }

    #[test]
    fn test_output_path_exposes_io_source() {
        use std::error::Error as _;
        let err = NodeError::OutputPath {
            path: PathBuf::from("/out"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
    }
}
