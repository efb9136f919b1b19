//! Error types for the catalog and the playback controller.

use crate::catalog::EntryId;
use thiserror::Error;

/// Failures reported by the playback controller and its output resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// The source could not be opened or prepared (missing, unreadable or
    /// undecodable). The controller reverts to idle.
    #[error("Cannot play '{name}': {reason}")]
    SourceUnavailable { name: String, reason: String },

    /// The audio output device could not be opened.
    #[error("Audio output unavailable: {0}")]
    OutputUnavailable(String),
}

impl PlayerError {
    pub fn source_unavailable(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failures reported by catalog mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Bundled samples are fixed for the lifetime of the catalog.
    #[error("'{0}' is a bundled sample and cannot be removed")]
    NotRemovable(String),

    #[error("No catalog entry with id {0}")]
    UnknownEntry(EntryId),
}
