// src/tts/mod.rs
// TTS Module - Speech synthesis adapters

mod http;
mod types;

pub use http::HttpSynthesizer;
pub use types::{
    BackendErrorBody, SynthesisError, SynthesisRequest, VoiceSettings, PITCH_RANGE, SPEED_RANGE,
    VOLUME_RANGE,
};

use async_trait::async_trait;

/// Unified synthesis adapter trait
#[async_trait]
pub trait SynthesisAdapter: Send + Sync {
    /// Synthesize one text segment into encoded audio bytes (WAV)
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, SynthesisError>;

    /// Get provider name
    fn name(&self) -> &str;
}
