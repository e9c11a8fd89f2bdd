//! Error types
//!
//! Almost every failure is handled where it happens (ignored input, fallback
//! backdrop, logged storage writes). These are the few that reach a caller.

/// Errors surfaced by the arcade core
#[derive(thiserror::Error, Debug)]
pub enum ArcadeError {
    /// The drawing surface is missing or has no usable size
    #[error("drawing surface unavailable")]
    SurfaceUnavailable,

    /// No game registered under this name
    #[error("unknown game: {0}")]
    UnknownGame(String),

    /// Key-value store rejected a read or write
    #[error("storage error: {0}")]
    Storage(String),

    /// Settings blob could not be encoded or decoded
    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ArcadeError>;
