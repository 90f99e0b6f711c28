//! Speech playback: TTS request → PCM decode → audio output.
//!
//! Fire-and-forget by design: `speak` returns once playback has started or
//! the attempt has failed silently. Overlapping requests are not serialized
//! here — the UI disables the triggering control until the call returns,
//! which is a best-effort gate only.

use std::sync::Arc;

use tracing::debug;

use crate::audio::{self, AudioOutput};
use crate::gemini::GeminiClient;

/// Where decoded samples go. `AudioOutput` is the production sink; tests
/// substitute a recording double to observe whether playback was started.
pub trait PlaybackSink: Send + Sync {
    fn play(&self, samples: Vec<f32>);
}

impl PlaybackSink for AudioOutput {
    fn play(&self, samples: Vec<f32>) {
        self.play_or_log(samples);
    }
}

pub struct SpeechPlayer {
    gemini: Arc<GeminiClient>,
    output: Arc<AudioOutput>,
    default_voice: String,
    enabled: bool,
}

impl SpeechPlayer {
    pub fn new(
        gemini: Arc<GeminiClient>,
        output: Arc<AudioOutput>,
        default_voice: String,
        enabled: bool,
    ) -> Self {
        Self {
            gemini,
            output,
            default_voice,
            enabled,
        }
    }

    /// Speak a piece of text. Empty text, a failed request, or an absent
    /// audio payload are all silent no-ops; the audio output is only
    /// touched once decoded samples are in hand.
    pub async fn speak(&self, text: &str, voice: Option<&str>) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.enabled {
            debug!("Speech disabled, ignoring request");
            return;
        }

        let voice = voice.unwrap_or(&self.default_voice);
        let payload = self.gemini.fetch_speech(text, voice).await;
        debug!("Speaking {} chars", text.chars().count());
        deliver(payload, self.output.as_ref());
    }
}

/// Post-fetch decision point: an absent payload never touches the sink;
/// present bytes are decoded and playback starts.
fn deliver(payload: Option<Vec<u8>>, sink: &dyn PlaybackSink) {
    let Some(bytes) = payload else {
        return;
    };
    sink.play(audio::pcm16_to_f32(&bytes));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every clip handed to it.
    #[derive(Default)]
    struct RecordingSink {
        clips: Mutex<Vec<Vec<f32>>>,
    }

    impl PlaybackSink for RecordingSink {
        fn play(&self, samples: Vec<f32>) {
            self.clips.lock().unwrap().push(samples);
        }
    }

    #[test]
    fn absent_payload_never_starts_playback() {
        let sink = RecordingSink::default();
        deliver(None, &sink);
        assert!(sink.clips.lock().unwrap().is_empty());
    }

    #[test]
    fn present_payload_is_decoded_and_played() {
        let sink = RecordingSink::default();
        let bytes: Vec<u8> = [0i16, 16384].iter().flat_map(|s| s.to_le_bytes()).collect();

        deliver(Some(bytes), &sink);

        let clips = sink.clips.lock().unwrap();
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0], vec![0.0, 0.5]);
    }

    #[test]
    fn empty_payload_plays_an_empty_clip_without_panicking() {
        let sink = RecordingSink::default();
        deliver(Some(Vec::new()), &sink);
        assert_eq!(sink.clips.lock().unwrap().len(), 1);
    }
}
