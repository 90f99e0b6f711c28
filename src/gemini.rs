//! Gemini API client: character detail lookups and text-to-speech.
//!
//! Two call shapes against the generateContent endpoint:
//! 1. Detail lookup — structured JSON output constrained by a response
//!    schema with four required string fields.
//! 2. TTS — audio response modality; the reply carries base64-encoded raw
//!    PCM (16-bit LE mono 24 kHz) as inline data on the first part.
//!
//! Every failure mode (transport, non-2xx status, missing candidate,
//! malformed JSON, schema violation) is logged and collapsed to `None`;
//! callers never see an error. No retries, no caching.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::audio;
use crate::config::ApiConfig;

/// Everything the detail panel shows for one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDetail {
    pub character: char,
    pub pinyin: String,
    pub definition: String,
    pub example_sentence: String,
    pub example_translation: String,
}

/// The four schema-constrained fields of a detail reply.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailFields {
    pinyin: String,
    definition: String,
    example_sentence: String,
    example_translation: String,
}

// --- Response-shape mirrors of the Gemini REST schema ---

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate, if any.
    fn first_text(&self) -> Option<&str> {
        self.first_part()?.text.as_deref()
    }

    /// Base64 inline payload of the first part of the first candidate.
    fn first_inline_data(&self) -> Option<&str> {
        Some(self.first_part()?.inline_data.as_ref()?.data.as_str())
    }

    fn first_part(&self) -> Option<&Part> {
        self.candidates.first()?.content.as_ref()?.parts.first()
    }
}

/// Combine the input character with a parsed JSON detail body.
fn parse_detail(character: char, body: &str) -> Option<CharacterDetail> {
    match serde_json::from_str::<DetailFields>(body) {
        Ok(fields) => Some(CharacterDetail {
            character,
            pinyin: fields.pinyin,
            definition: fields.definition,
            example_sentence: fields.example_sentence,
            example_translation: fields.example_translation,
        }),
        Err(e) => {
            warn!("Detail response is not the expected JSON shape: {e}");
            None
        }
    }
}

pub struct GeminiClient {
    client: Client,
    host: String,
    key: String,
    detail_model: String,
    tts_model: String,
}

impl GeminiClient {
    pub fn new(config: &ApiConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            host: config.host.clone(),
            key: config.resolved_key(),
            detail_model: config.detail_model.clone(),
            tts_model: config.tts_model.clone(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.host, model, self.key
        )
    }

    /// POST a generateContent body and parse the reply envelope.
    /// All failures are logged here and become `None`.
    async fn generate(&self, model: &str, body: serde_json::Value) -> Option<GenerateResponse> {
        let resp = match self.client.post(self.endpoint(model)).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Request to {model} failed: {e}");
                return None;
            }
        };

        if !resp.status().is_success() {
            warn!("{model} returned status {}", resp.status());
            return None;
        }

        match resp.json::<GenerateResponse>().await {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Failed to parse {model} response: {e}");
                None
            }
        }
    }

    /// Look up pinyin, definition, and an example sentence for one character.
    pub async fn fetch_details(&self, character: char) -> Option<CharacterDetail> {
        let prompt = format!(
            "Analyze the Chinese character: \"{character}\". \
             Provide the Pinyin, a concise English definition, and a simple \
             example sentence in Chinese with its English translation. \
             Ensure the example sentence uses the character."
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "pinyin": {
                            "type": "STRING",
                            "description": "The pinyin with tone marks"
                        },
                        "definition": {
                            "type": "STRING",
                            "description": "Concise definition in English"
                        },
                        "exampleSentence": {
                            "type": "STRING",
                            "description": "A simple example sentence using the character"
                        },
                        "exampleTranslation": {
                            "type": "STRING",
                            "description": "English translation of the example sentence"
                        }
                    },
                    "required": [
                        "pinyin", "definition", "exampleSentence", "exampleTranslation"
                    ]
                }
            }
        });

        let response = self.generate(&self.detail_model, body).await?;
        let Some(text) = response.first_text() else {
            warn!("Detail response for '{character}' has no text candidate");
            return None;
        };

        let detail = parse_detail(character, text)?;
        info!("Fetched details for '{character}' ({})", detail.pinyin);
        Some(detail)
    }

    /// Synthesize speech for a piece of text. Returns raw PCM bytes
    /// (16-bit LE mono 24 kHz), or `None` on any failure or absent payload.
    pub async fn fetch_speech(&self, text: &str, voice: &str) -> Option<Vec<u8>> {
        let body = json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": voice }
                    }
                }
            }
        });

        let response = self.generate(&self.tts_model, body).await?;
        let Some(payload) = response.first_inline_data() else {
            warn!("TTS response has no inline audio payload");
            return None;
        };

        match audio::decode_base64(payload) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Failed to decode TTS audio payload: {e}");
                None
            }
        }
    }
}
