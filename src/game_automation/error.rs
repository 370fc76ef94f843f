use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for capture, matching and click operations.
pub type MatchResult<T> = Result<T, MatchError>;

/// The error type for everything around the detection pipeline.
///
/// Detection and pairing themselves never fail; these variants cover loading
/// images, the screen and click collaborators, and the automation channels.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Failed to load image {path:?}: {source}")]
    ImageLoad {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to save image {path:?}: {source}")]
    ImageSave {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Screen capture failed: {description}")]
    Capture { description: String },

    #[error("Click at x={x}, y={y} failed: {description}")]
    Click {
        x: u32,
        y: u32,
        description: String,
    },

    #[error("No board captured yet. Capture the screen before matching pairs.")]
    NotCaptured,

    #[error("Automation command channel closed")]
    ChannelClosed,

    #[error("Task failed to complete: {source}")]
    JoinError {
        #[from]
        source: tokio::task::JoinError,
    },

    #[error("Automation ended before the pairs were clicked: {description}")]
    SessionIncomplete { description: String },

    #[error("Invalid configuration: {description}")]
    InvalidConfig { description: String },

    #[error("Failed to serialize board analysis: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
}

impl MatchError {
    /// Errors after which the automation loop can keep accepting commands
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MatchError::NotCaptured
                | MatchError::Capture { .. }
                | MatchError::Click { .. }
                | MatchError::ImageLoad { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_captured_is_recoverable() {
        assert!(MatchError::NotCaptured.is_recoverable());
        assert!(!MatchError::ChannelClosed.is_recoverable());
    }

    #[test]
    fn test_click_error_message() {
        let err = MatchError::Click {
            x: 12,
            y: 34,
            description: "pointer busy".to_string(),
        };
        assert_eq!(err.to_string(), "Click at x=12, y=34 failed: pointer busy");
    }
}
