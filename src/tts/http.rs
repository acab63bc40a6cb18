// src/tts/http.rs
// HTTP synthesis backend: POST {endpoint}/synthesize

use super::{BackendErrorBody, SynthesisAdapter, SynthesisError, SynthesisRequest};
use async_trait::async_trait;
use std::time::Duration;

const SYNTHESIZE_PATH: &str = "/synthesize";

pub struct HttpSynthesizer {
    url: String,
    client: reqwest::Client,
}

impl HttpSynthesizer {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, SynthesisError> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(SynthesisError::InvalidRequest(
                "Synthesis endpoint is not configured".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SynthesisError::Network(e.to_string()))?;

        let url = format!("{}{}", endpoint, SYNTHESIZE_PATH);
        tracing::info!("HTTP synthesizer initialized: {}", url);

        Ok(Self { url, client })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Pull the `error` field out of a failure body, falling back to the raw text.
    fn error_message(status: reqwest::StatusCode, body: &str) -> String {
        serde_json::from_str::<BackendErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("Request failed: {}", status)
                } else {
                    body.trim().to_string()
                }
            })
    }
}

#[async_trait]
impl SynthesisAdapter for HttpSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, SynthesisError> {
        if request.text.trim().is_empty() {
            return Err(SynthesisError::InvalidRequest("Empty text".to_string()));
        }

        tracing::debug!(
            "Synthesizing {} chars with voice '{}'",
            request.text.chars().count(),
            request.spk_name
        );

        let response = self.client.post(&self.url).json(request).send().await;

        match response {
            Ok(resp) => {
                let status = resp.status();

                if status.is_success() {
                    let bytes = resp
                        .bytes()
                        .await
                        .map_err(|e| SynthesisError::Network(e.to_string()))?;
                    if bytes.is_empty() {
                        return Err(SynthesisError::EmptyAudio);
                    }
                    Ok(bytes.to_vec())
                } else if status.as_u16() == 429 {
                    Err(SynthesisError::RateLimit)
                } else {
                    let body = resp.text().await.unwrap_or_default();
                    Err(SynthesisError::Backend {
                        status: status.as_u16(),
                        message: Self::error_message(status, &body),
                    })
                }
            }
            Err(e) => {
                if e.is_timeout() {
                    Err(SynthesisError::Timeout)
                } else {
                    Err(SynthesisError::Network(e.to_string()))
                }
            }
        }
    }

    fn name(&self) -> &str {
        "HTTP"
    }
}
