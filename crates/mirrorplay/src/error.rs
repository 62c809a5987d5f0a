//! Error types for source resolution and session plumbing.

use thiserror::Error;

use crate::source::{Provider, Slot};

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
///
/// Playback failures are not errors: the controller reports them through its
/// phase. These variants cover malformed input records, bad configuration and
/// talking to a session that has already shut down.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown video provider `{0}`")]
    UnknownProvider(String),

    #[error("{slot} source is partially specified: provider and locator must both be set or both be empty")]
    PartialSource { slot: Slot },

    #[error("invalid locator for {provider}: {reason}")]
    InvalidLocator { provider: Provider, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("playback session is closed")]
    SessionClosed,
}

impl Error {
    pub fn invalid_locator(provider: Provider, reason: impl Into<String>) -> Self {
        Self::InvalidLocator {
            provider,
            reason: reason.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
