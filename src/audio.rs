//! PCM decoding and the process-wide audio output.
//!
//! The TTS service returns raw linear PCM: 16-bit signed little-endian,
//! mono, 24 kHz. Samples are normalized to f32 in [-1.0, 1.0) and played
//! through a rodio output stream that is opened on first use and kept
//! alive for the process lifetime.

use std::sync::Mutex;

use base64::Engine;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, warn};

/// Sample rate of the TTS model's PCM output.
pub const SAMPLE_RATE: u32 = 24000;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to open audio output: {0}")]
    Output(String),
}

/// Decode a base64 payload into raw PCM bytes.
pub fn decode_base64(data: &str) -> Result<Vec<u8>, AudioError> {
    Ok(base64::engine::general_purpose::STANDARD.decode(data)?)
}

/// Reinterpret raw bytes as little-endian i16 samples and normalize
/// into [-1.0, 1.0). A trailing odd byte is ignored.
pub fn pcm16_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

/// Process-wide audio output context.
///
/// The underlying rodio stream is created lazily on the first playback and
/// never torn down; repeated ensure calls return the same stream. Playback
/// is fire-and-forget — no stop control, no queueing of overlapping clips.
pub struct AudioOutput {
    stream: Mutex<Option<OutputStream>>,
}

impl AudioOutput {
    pub fn new() -> Self {
        Self {
            stream: Mutex::new(None),
        }
    }

    /// Start playing a mono 24 kHz clip. Returns once playback has started.
    pub fn play(&self, samples: Vec<f32>) -> Result<(), AudioError> {
        if samples.is_empty() {
            return Ok(());
        }

        let mut guard = self.stream.lock().unwrap();
        if guard.is_none() {
            let stream = OutputStreamBuilder::open_default_stream()
                .map_err(|e| AudioError::Output(e.to_string()))?;
            debug!("Opened audio output stream ({SAMPLE_RATE} Hz)");
            *guard = Some(stream);
        }
        let stream = guard.as_ref().unwrap();

        let duration = samples.len() as f32 / SAMPLE_RATE as f32;
        let sink = Sink::connect_new(stream.mixer());
        sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples));
        sink.detach();
        debug!("Playback started ({duration:.1}s)");

        Ok(())
    }

    /// Log-and-swallow wrapper around `play`.
    pub fn play_or_log(&self, samples: Vec<f32>) {
        if let Err(e) = self.play(samples) {
            warn!("Audio playback failed: {e}");
        }
    }
}

impl Default for AudioOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn normalizes_known_samples() {
        let bytes = le_bytes(&[0, 16384, -32768, 32767]);
        let out = pcm16_to_f32(&bytes);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.5);
        assert_eq!(out[2], -1.0);
        assert!((out[3] - 32767.0 / 32768.0).abs() < 1e-6);
    }

    #[test]
    fn output_length_matches_sample_count() {
        let bytes = le_bytes(&[1; 240]);
        assert_eq!(pcm16_to_f32(&bytes).len(), 240);
    }

    #[test]
    fn trailing_odd_byte_is_ignored() {
        let mut bytes = le_bytes(&[100, -100]);
        bytes.push(0x7f);
        assert_eq!(pcm16_to_f32(&bytes).len(), 2);
    }

    #[test]
    fn empty_input_decodes_to_empty() {
        assert!(pcm16_to_f32(&[]).is_empty());
    }

    #[test]
    fn all_samples_in_unit_range() {
        let bytes = le_bytes(&[i16::MIN, -1, 0, 1, i16::MAX]);
        for sample in pcm16_to_f32(&bytes) {
            assert!((-1.0..1.0).contains(&sample));
        }
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(matches!(
            decode_base64("not-valid-base64!!!"),
            Err(AudioError::Base64(_))
        ));
    }

    #[test]
    fn decodes_base64_to_bytes() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([0u8, 64, 0, 128]);
        assert_eq!(decode_base64(&encoded).unwrap(), vec![0, 64, 0, 128]);
    }
}
