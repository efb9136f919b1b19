//! Position and duration labels.

/// Formats a millisecond offset as zero-padded `MM:SS`.
///
/// Minutes are not wrapped into hours, so an offset of 61 minutes renders as
/// `61:00`.
pub fn format_ms(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms / 1_000) % 60;
    format!("{minutes:02}:{seconds:02}")
}

/// Formats the `position / duration` label shown under the transport controls.
pub fn format_progress(position_ms: u64, duration_ms: u64) -> String {
    format!("{} / {}", format_ms(position_ms), format_ms(duration_ms))
}
