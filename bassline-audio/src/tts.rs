//! Speech synthesis boundary.
//!
//! Synthesis runs on a remote service consumed as a black box: text and a
//! voice id go in, encoded audio bytes come out. Network and auth failures
//! surface to the caller; nothing here touches the motor scheduler.

use async_trait::async_trait;
use bassline_core::{BasslineError, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Synthesizes text into an encoded audio byte stream.
#[async_trait]
pub trait TtsEngine: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>>;
}

/// Remote synthesis service configuration.
#[derive(Debug, Clone)]
pub struct HttpTtsConfig {
    /// Synthesis endpoint; takes a JSON body, returns audio bytes.
    pub endpoint: String,
    /// Optional bearer token. A missing or invalid token shows up as an
    /// auth failure from the service and propagates as a TTS error.
    pub api_token: Option<String>,
    /// Sample rate requested from the service.
    pub sample_rate: u32,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for HttpTtsConfig {
    fn default() -> Self {
        Self {
            endpoint: std::env::var("TTS_ENDPOINT")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "http://localhost:8020/synthesize".to_string()),
            api_token: std::env::var("TTS_API_TOKEN").ok().filter(|s| !s.is_empty()),
            sample_rate: std::env::var("TTS_SAMPLE_RATE")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(22_050),
            timeout_ms: std::env::var("TTS_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(20_000),
            user_agent: "bassline/0.1".to_string(),
        }
    }
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    sample_rate: u32,
    output_format: &'a str,
}

/// HTTP client for a remote synthesis service.
pub struct HttpTts {
    cfg: HttpTtsConfig,
    http: reqwest::Client,
}

impl HttpTts {
    pub fn new(cfg: HttpTtsConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .user_agent(&cfg.user_agent)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { cfg, http }
    }
}

impl Default for HttpTts {
    fn default() -> Self {
        Self::new(HttpTtsConfig::default())
    }
}

#[async_trait]
impl TtsEngine for HttpTts {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>> {
        debug!(target: "tts", voice_id, chars = text.len(), "requesting synthesis");

        let body = SynthesisRequest {
            text,
            voice_id,
            sample_rate: self.cfg.sample_rate,
            output_format: "wav",
        };
        let mut request = self.http.post(&self.cfg.endpoint).json(&body);
        if let Some(token) = &self.cfg.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            warn!(target: "tts", error = %e, "synthesis request failed");
            BasslineError::TtsError(format!("synthesis request failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(target: "tts", status = %status, "synthesis service returned error");
            return Err(BasslineError::TtsError(format!(
                "synthesis service returned status {status}"
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            BasslineError::TtsError(format!("failed to read synthesis stream: {e}"))
        })?;
        debug!(target: "tts", bytes = bytes.len(), "synthesis complete");
        Ok(bytes.to_vec())
    }
}
