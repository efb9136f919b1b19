//! Rodio-backed audio output.
//!
//! [`RodioOutput`] is the output resource the playback controller drives. The
//! device stream is opened lazily on the first selection. Each opened source
//! becomes a [`RodioSession`] that prepares on a helper thread (reading the
//! file or rendering the bundled sample, validating it with the decoder and
//! resolving its duration) and reports back over a channel.
//!
//! Seeking rebuilds the sink from the retained bytes at the new offset, the
//! same way a fresh load would, so it works for every format the decoder can
//! open even when in-place seeking is not supported.

use apem_player::catalog::AudioSource;
use apem_player::error::PlayerError;
use apem_player::media::{bundled, probe};
use apem_player::output::{AudioOutput, OutputEvent, OutputSession};
use log::{debug, info, warn};
use rodio::decoder::DecoderError;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use std::error::Error;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::rc::Rc;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

type AudioBytes = Arc<[u8]>;
type PrepareResult = Result<PreparedAudio, String>;

struct PreparedAudio {
    bytes: AudioBytes,
    duration_ms: u64,
}

pub struct RodioOutput {
    stream: Option<Rc<OutputStream>>,
}

impl Default for RodioOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl RodioOutput {
    pub fn new() -> Self {
        Self { stream: None }
    }

    fn stream(&mut self) -> Result<Rc<OutputStream>, PlayerError> {
        let stream = match self.stream.take() {
            Some(stream) => stream,
            None => {
                let mut stream = OutputStreamBuilder::open_default_stream()
                    .map_err(|e| PlayerError::OutputUnavailable(e.to_string()))?;
                // The stream outlives the terminal UI; keep its drop notice off stderr
                stream.log_on_drop(false);
                info!("Opened default audio output stream");
                Rc::new(stream)
            }
        };
        Ok(Rc::clone(self.stream.insert(stream)))
    }
}

impl AudioOutput for RodioOutput {
    type Session = RodioSession;

    fn open(&mut self, source: &AudioSource, name: &str) -> Result<RodioSession, PlayerError> {
        if let AudioSource::External(path) = source
            && !path.is_file()
        {
            return Err(PlayerError::source_unavailable(
                name,
                format!("{} does not exist", path.display()),
            ));
        }

        let stream = self.stream()?;
        let (tx, rx) = mpsc::channel();
        let source = source.clone();

        thread::Builder::new()
            .name("apem-prepare".to_string())
            .spawn(move || {
                // The receiver is gone when the session was released meanwhile
                let _ = tx.send(prepare(&source));
            })
            .map_err(|e| PlayerError::source_unavailable(name, e))?;

        Ok(RodioSession {
            name: name.to_string(),
            stream,
            prepare_rx: Some(rx),
            audio: None,
            sink: None,
            seek_base: Duration::ZERO,
            playing: false,
            completion_reported: false,
            released: false,
        })
    }
}

/// Decoder over the whole buffer. Knowing the byte length lets formats
/// without a length header (plain CBR MP3) still report a total duration.
fn open_decoder(bytes: &AudioBytes) -> Result<Decoder<Cursor<AudioBytes>>, DecoderError> {
    Decoder::builder()
        .with_data(Cursor::new(Arc::clone(bytes)))
        .with_byte_len(bytes.len() as u64)
        .with_seekable(true)
        .build()
}

fn prepare(source: &AudioSource) -> PrepareResult {
    let bytes = match source {
        AudioSource::Bundled(sample) => bundled::render(*sample).map_err(|e| e.to_string())?,
        AudioSource::External(path) => fs::read(path).map_err(|e| e.to_string())?,
    };
    let bytes: AudioBytes = Arc::from(bytes);

    let decoder = open_decoder(&bytes).map_err(|e| format!("unsupported or corrupt audio: {e}"))?;
    let duration_ms = probe::duration_ms(&bytes)
        .or_else(|| decoder.total_duration().map(|d| d.as_millis() as u64))
        .unwrap_or(0);

    debug!("Prepared {} bytes, duration {duration_ms} ms", bytes.len());
    Ok(PreparedAudio { bytes, duration_ms })
}

/// Duration of an audio file, from its header when possible and otherwise
/// from the decoder. `None` when neither knows the length.
pub fn probe_duration_ms(path: &Path) -> Result<Option<u64>, Box<dyn Error>> {
    let bytes: AudioBytes = Arc::from(fs::read(path)?);
    if let Some(duration_ms) = probe::duration_ms(&bytes) {
        return Ok(Some(duration_ms));
    }
    let decoder = open_decoder(&bytes)?;
    Ok(decoder.total_duration().map(|d| d.as_millis() as u64))
}

pub struct RodioSession {
    name: String,
    stream: Rc<OutputStream>,
    prepare_rx: Option<mpsc::Receiver<PrepareResult>>,
    audio: Option<AudioBytes>,
    sink: Option<Sink>,
    seek_base: Duration,
    playing: bool,
    completion_reported: bool,
    released: bool,
}

impl RodioSession {
    /// Replaces the sink with one that starts `position` into the audio.
    fn load_at(&mut self, position: Duration) -> Result<(), String> {
        let bytes = self.audio.clone().ok_or("audio not prepared")?;

        if let Some(old) = self.sink.take() {
            old.stop();
        }

        let sink = Sink::connect_new(self.stream.mixer());
        if !self.playing {
            sink.pause();
        }

        let mut source = open_decoder(&bytes).map_err(|e| e.to_string())?;
        if position.is_zero() {
            sink.append(source);
        } else if let Err(e) = source.try_seek(position) {
            debug!("Seek not supported for {:?} ({e}), skipping instead", self.name);
            let decoder = open_decoder(&bytes).map_err(|e| e.to_string())?;
            sink.append(decoder.skip_duration(position));
        } else {
            sink.append(source);
        }

        self.sink = Some(sink);
        self.seek_base = position;
        self.completion_reported = false;
        Ok(())
    }

    fn needs_reload(&self) -> bool {
        self.sink.as_ref().is_none_or(|sink| sink.empty())
    }
}

impl OutputSession for RodioSession {
    fn start(&mut self) {
        self.playing = true;
        if self.needs_reload() {
            let position = self.seek_base;
            if let Err(e) = self.load_at(position) {
                warn!("Could not restart {:?}: {e}", self.name);
                return;
            }
        }
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn pause(&mut self) {
        self.playing = false;
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn seek_to(&mut self, position_ms: u64) {
        if self.audio.is_none() {
            return;
        }
        if let Err(e) = self.load_at(Duration::from_millis(position_ms)) {
            warn!("Seek to {position_ms} ms failed for {:?}: {e}", self.name);
        }
    }

    fn position_ms(&self) -> u64 {
        let played = self.sink.as_ref().map(Sink::get_pos).unwrap_or_default();
        (self.seek_base + played).as_millis() as u64
    }

    fn poll_event(&mut self) -> Option<OutputEvent> {
        if let Some(rx) = &self.prepare_rx {
            let result = match rx.try_recv() {
                Ok(result) => result,
                Err(mpsc::TryRecvError::Empty) => return None,
                Err(mpsc::TryRecvError::Disconnected) => {
                    Err("preparation stopped unexpectedly".to_string())
                }
            };
            self.prepare_rx = None;

            return match result {
                Ok(prepared) => {
                    self.audio = Some(prepared.bytes);
                    match self.load_at(Duration::ZERO) {
                        Ok(()) => Some(OutputEvent::Prepared {
                            duration_ms: prepared.duration_ms,
                        }),
                        Err(e) => Some(OutputEvent::Failed(e)),
                    }
                }
                Err(reason) => Some(OutputEvent::Failed(reason)),
            };
        }

        if self.playing && !self.completion_reported && self.needs_reload() {
            self.completion_reported = true;
            self.playing = false;
            debug!("Sink drained for {:?}", self.name);
            return Some(OutputEvent::Completed);
        }

        None
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.prepare_rx = None;
        self.audio = None;
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        debug!("Released output for {:?}", self.name);
    }
}

impl Drop for RodioSession {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apem_player::catalog::BundledSample;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn is_ci_environment() -> bool {
        std::env::var("CI").is_ok()
            || std::env::var("GITHUB_ACTIONS").is_ok()
            || std::env::var("TRAVIS").is_ok()
            || std::env::var("CIRCLECI").is_ok()
    }

    fn write_wav(path: &Path, seconds: u32) {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for i in 0..8000 * seconds {
            writer.write_sample(((i % 100) as i16 - 50) * 100).unwrap();
        }
        writer.finalize().unwrap();
    }

    // MPEG-1 Layer III, 128 kbps, 44.1 kHz, mono, no CRC: 417-byte frames of
    // silence and no Xing/Info header, so only the file size gives the length.
    fn write_cbr_mp3(path: &Path, frames: usize) {
        const FRAME_LEN: usize = 417;
        let mut data = Vec::with_capacity(FRAME_LEN * frames);
        for _ in 0..frames {
            let mut frame = vec![0u8; FRAME_LEN];
            frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0xC0]);
            data.extend_from_slice(&frame);
        }
        fs::write(path, data).unwrap();
    }

    #[test]
    fn test_prepare_bundled_sample() {
        let prepared = prepare(&AudioSource::Bundled(BundledSample::Chime)).unwrap();
        assert_eq!(prepared.duration_ms, 30_000);
        assert!(prepared.bytes.starts_with(b"RIFF"));
    }

    #[test]
    fn test_prepare_external_wav() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("three.wav");
        write_wav(&path, 3);

        let prepared = prepare(&AudioSource::External(path)).unwrap();
        assert_eq!(prepared.duration_ms, 3_000);
    }

    #[test]
    fn test_headerless_mp3_reports_duration() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("track.mp3");
        // 200 frames * 1152 samples / 44100 Hz is about 5.2 s
        write_cbr_mp3(&path, 200);

        let prepared = prepare(&AudioSource::External(path.clone())).unwrap();
        assert!(
            (4_500..6_000).contains(&prepared.duration_ms),
            "unexpected duration {}",
            prepared.duration_ms
        );

        let probed = probe_duration_ms(&path).unwrap().unwrap();
        assert!((4_500..6_000).contains(&probed));
    }

    #[test]
    fn test_prepare_missing_file_fails() {
        let result = prepare(&AudioSource::External(PathBuf::from("/nonexistent/a.wav")));
        assert!(result.is_err());
    }

    #[test]
    fn test_prepare_corrupt_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.mp3");
        fs::write(&path, b"definitely not audio").unwrap();

        let result = prepare(&AudioSource::External(path));
        assert!(result.is_err());
    }

    #[test]
    fn test_open_missing_file_does_not_touch_device() {
        let mut output = RodioOutput::new();
        let result = output.open(
            &AudioSource::External(PathBuf::from("/nonexistent/a.wav")),
            "a.wav",
        );

        assert!(matches!(result, Err(PlayerError::SourceUnavailable { .. })));
        assert!(output.stream.is_none());
    }

    #[test]
    fn test_probe_duration_ms() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("two.wav");
        write_wav(&path, 2);

        assert_eq!(probe_duration_ms(&path).unwrap(), Some(2_000));
        assert!(probe_duration_ms(&temp_dir.path().join("missing.wav")).is_err());
    }

    #[test]
    fn test_session_prepares_and_seeks() {
        if is_ci_environment() {
            eprintln!("Skipping audio test in CI environment");
            return;
        }

        let mut output = RodioOutput::new();
        let Ok(mut session) = output.open(&AudioSource::Bundled(BundledSample::Arpeggio), "Sample 2")
        else {
            eprintln!("Skipping audio test: no output device");
            return;
        };

        let mut event = None;
        for _ in 0..200 {
            event = session.poll_event();
            if event.is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(25));
        }
        assert_eq!(event, Some(OutputEvent::Prepared { duration_ms: 45_000 }));

        session.seek_to(20_000);
        assert!(session.position_ms() >= 20_000);

        session.release();
        session.release();
        assert!(session.sink.is_none());
    }
}
