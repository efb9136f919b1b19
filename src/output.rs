//! The seam between the playback controller and the audio output facility.
//!
//! An [`AudioOutput`] opens a catalog source into an [`OutputSession`]. Opening
//! only starts preparation: the session later reports [`OutputEvent::Prepared`]
//! (or [`OutputEvent::Failed`]) from [`OutputSession::poll_event`], and
//! [`OutputEvent::Completed`] once playback runs off the end of the media.

use crate::catalog::AudioSource;
use crate::error::PlayerError;

/// Notifications raised by an output session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// Preparation finished; `duration_ms` is 0 when the length is unknown.
    Prepared { duration_ms: u64 },
    /// Playback reached the end of the media.
    Completed,
    /// Preparation failed; the session is unusable.
    Failed(String),
}

pub trait AudioOutput {
    type Session: OutputSession;

    /// Starts preparing `source`. Errors here mean the source could not even
    /// be opened.
    fn open(&mut self, source: &AudioSource, name: &str) -> Result<Self::Session, PlayerError>;
}

pub trait OutputSession {
    fn start(&mut self);

    fn pause(&mut self);

    fn seek_to(&mut self, position_ms: u64);

    /// Current playback offset as reported by the output.
    fn position_ms(&self) -> u64;

    /// Returns the next pending notification, if any. Never blocks.
    fn poll_event(&mut self) -> Option<OutputEvent>;

    /// Releases the underlying output resource. Called exactly once by the
    /// controller before the session is dropped.
    fn release(&mut self);
}
