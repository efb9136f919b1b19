//! Duration probing from container headers.
//!
//! WAV and FLAC carry their exact length in the header, so their duration is
//! read without decoding. Other formats return `None` and the caller falls
//! back to whatever the decoder reports.

use std::io::Cursor;

pub fn duration_ms(bytes: &[u8]) -> Option<u64> {
    if bytes.starts_with(b"RIFF") {
        wav_duration_ms(bytes)
    } else if bytes.starts_with(b"fLaC") {
        flac_duration_ms(bytes)
    } else {
        None
    }
}

fn wav_duration_ms(bytes: &[u8]) -> Option<u64> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).ok()?;
    let sample_rate = reader.spec().sample_rate as u64;
    if sample_rate == 0 {
        return None;
    }
    // duration() counts frames, independent of the channel count
    Some(reader.duration() as u64 * 1000 / sample_rate)
}

fn flac_duration_ms(bytes: &[u8]) -> Option<u64> {
    let reader = claxon::FlacReader::new(Cursor::new(bytes)).ok()?;
    let info = reader.streaminfo();
    let frames = info.samples?;
    if info.sample_rate == 0 {
        return None;
    }
    Some(frames * 1000 / info.sample_rate as u64)
}
