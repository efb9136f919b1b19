//! Project-wide constants used across multiple modules.

/// Audio file extensions offered by the file picker.
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac", "mp3", "ogg"];

/// Name of the directory holding the configuration file.
pub const CONFIG_DIR_NAME: &str = "apem";

/// File name of the player log inside the temp directory.
pub const LOG_FILE_NAME: &str = "apem-player.log";

/// How long status messages stay on screen.
pub const STATUS_MESSAGE_SECS: u64 = 3;

/// Returns true when `path` has one of the supported audio extensions.
pub fn is_supported_audio_file(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_is_supported_audio_file() {
        assert!(is_supported_audio_file(Path::new("a.wav")));
        assert!(is_supported_audio_file(Path::new("a.FLAC")));
        assert!(is_supported_audio_file(Path::new("dir/track.mp3")));
        assert!(is_supported_audio_file(Path::new("b.ogg")));
        assert!(!is_supported_audio_file(Path::new("notes.md")));
        assert!(!is_supported_audio_file(Path::new("README")));
    }
}
