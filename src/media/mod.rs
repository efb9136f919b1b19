//! In-memory audio data: the bundled samples and duration probing.

pub mod bundled;
pub mod probe;
