//! Error types for the oxidized-cafe frontend

use thiserror::Error;

/// Main error type for the frontend
#[derive(Error, Debug)]
pub enum FrontendError {
    #[error("Relaunch error: {0}")]
    Relaunch(#[from] RelaunchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Reasons a relaunch hand-off did not happen.
///
/// None of these are fatal. The caller falls back to its normal exit
/// disposition whichever variant is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelaunchError {
    /// Target is not under any recognized storage root
    #[error("Unsupported relaunch target: {0}")]
    UnsupportedTarget(String),

    /// The OS relaunch facility could not be initialized
    #[error("Relaunch loader unavailable (status {0})")]
    LoaderUnavailable(i32),

    /// Target path could not be expressed relative to its storage root
    #[error("Cannot translate relaunch path: {0}")]
    PathTranslation(String),

    #[error("Loader prepare failed (status {0})")]
    PrepareFailed(i32),

    /// Launch wrapper rejected the hand-off; the prepare step was reverted
    #[error("Loader launch failed (status {0})")]
    LaunchFailed(i32),
}

/// Result type alias for frontend operations
pub type Result<T> = std::result::Result<T, FrontendError>;
