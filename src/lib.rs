pub mod catalog;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod output;
pub mod poller;
pub mod time_format;

#[cfg(feature = "player")]
pub mod media;
