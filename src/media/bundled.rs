//! The samples that ship with the player.
//!
//! Rather than carrying binary assets, the samples are synthesized on demand
//! as 16-bit mono WAV data that the output decodes like any picked file.

use crate::catalog::BundledSample;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::f32::consts::TAU;
use std::io::Cursor;

pub const SAMPLE_RATE: u32 = 22_050;

const ARPEGGIO_NOTES_HZ: [f32; 4] = [440.0, 554.37, 659.25, 880.0];
const ARPEGGIO_NOTE_SECS: f32 = 0.25;
const AMPLITUDE: f32 = 0.4;

fn duration_secs(sample: BundledSample) -> u32 {
    match sample {
        BundledSample::Chime => 30,
        BundledSample::Arpeggio => 45,
    }
}

/// Renders `sample` as a complete WAV file.
pub fn render(sample: BundledSample) -> Result<Vec<u8>, hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        let total_frames = SAMPLE_RATE * duration_secs(sample);
        for n in 0..total_frames {
            let t = n as f32 / SAMPLE_RATE as f32;
            let value = match sample {
                BundledSample::Chime => chime(t),
                BundledSample::Arpeggio => arpeggio(t),
            };
            writer.write_sample((value * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
    }

    log::debug!("Rendered {:?} ({} bytes)", sample, cursor.get_ref().len());
    Ok(cursor.into_inner())
}

// 440 Hz tone that strikes once per second and decays
fn chime(t: f32) -> f32 {
    let envelope = (-3.0 * t.fract()).exp();
    (TAU * 440.0 * t).sin() * envelope * AMPLITUDE
}

fn arpeggio(t: f32) -> f32 {
    let step = (t / ARPEGGIO_NOTE_SECS) as usize;
    let frequency = ARPEGGIO_NOTES_HZ[step % ARPEGGIO_NOTES_HZ.len()];
    let note_t = t - step as f32 * ARPEGGIO_NOTE_SECS;
    let envelope = (-6.0 * note_t).exp();
    (TAU * frequency * t).sin() * envelope * AMPLITUDE
}
