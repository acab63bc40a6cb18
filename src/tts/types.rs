// src/tts/types.rs
// TTS request types and error definitions

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

pub const SPEED_RANGE: (f32, f32) = (0.5, 1.5);
pub const VOLUME_RANGE: (f32, f32) = (0.5, 1.5);
pub const PITCH_RANGE: (f32, f32) = (0.1, 2.0);

/// Voice parameters shared by every request of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    pub spk_name: String,
    pub speed: f32,
    pub volume: f32,
    pub pitch: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            spk_name: String::new(),
            speed: 1.0,
            volume: 1.0,
            pitch: 1.0,
        }
    }
}

impl VoiceSettings {
    /// Clamp every parameter into the range the backend accepts.
    pub fn normalized(mut self) -> Self {
        self.speed = clamp_param(self.speed, SPEED_RANGE);
        self.volume = clamp_param(self.volume, VOLUME_RANGE);
        self.pitch = clamp_param(self.pitch, PITCH_RANGE);
        self.spk_name = self.spk_name.trim().to_string();
        self
    }
}

fn clamp_param(value: f32, (min, max): (f32, f32)) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        1.0f32.clamp(min, max)
    }
}

/// Body of `POST /synthesize`. Numeric parameters go over the wire as
/// one-decimal strings, the form the backend's option lists use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub spk_name: String,
    #[serde(serialize_with = "one_decimal")]
    pub speed: f32,
    #[serde(serialize_with = "one_decimal")]
    pub volume: f32,
    #[serde(serialize_with = "one_decimal")]
    pub pitch: f32,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, voice: &VoiceSettings) -> Self {
        Self {
            text: text.into(),
            spk_name: voice.spk_name.clone(),
            speed: voice.speed,
            volume: voice.volume,
            pitch: voice.pitch,
        }
    }
}

fn one_decimal<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.1}", value))
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct BackendErrorBody {
    pub error: Option<String>,
}

/// Synthesis error types with retry classification
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Backend error (HTTP {status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Backend returned no audio")]
    EmptyAudio,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl SynthesisError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            SynthesisError::Network(_) | SynthesisError::Timeout | SynthesisError::RateLimit => true,
            SynthesisError::Backend { status, .. } => *status >= 500,
            SynthesisError::EmptyAudio | SynthesisError::InvalidRequest(_) => false,
        }
    }
}
