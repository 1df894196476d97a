//! Hosted transcript API provider
//!
//! Delegates to a remote transcript service that serves both manually
//! authored ("native") and auto-generated captions for a watch URL.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{watch_url, Phrase, SubtitleFetchOptions, SubtitleProvider};
use crate::error::{Result, SubtitleError};

/// Languages tried in order when no language was requested and the
/// service could not detect one on its own
pub const FALLBACK_LANGUAGES: [&str; 5] = ["nl", "en", "de", "fr", "es"];

/// Which caption kind the service should return
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptMode {
    /// Manually authored captions
    Native,
    /// Auto-generated captions
    Auto,
}

impl TranscriptMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptMode::Native => "native",
            TranscriptMode::Auto => "auto",
        }
    }
}

/// A single transcript request
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TranscriptRequest {
    pub url: String,
    /// Omitted to let the service detect the language
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Always false: timestamped chunks are required, not flat text
    pub text: bool,
    pub mode: TranscriptMode,
}

impl TranscriptRequest {
    pub fn new(url: &str, lang: Option<&str>, mode: TranscriptMode) -> Self {
        Self {
            url: url.to_string(),
            lang: lang.map(str::to_string),
            text: false,
            mode,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptResponse {
    #[serde(default)]
    pub content: Vec<TranscriptChunk>,
    #[serde(default)]
    pub lang: Option<String>,
}

/// Timestamped transcript chunk, times in milliseconds
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptChunk {
    #[serde(default)]
    pub offset: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub text: String,
}

/// Transport to the hosted transcript service
#[async_trait]
pub trait TranscriptApi: Send + Sync {
    async fn transcript(&self, request: &TranscriptRequest) -> Result<TranscriptResponse>;
}

/// reqwest client for the Supadata transcript endpoint
pub struct SupadataClient {
    endpoint: Url,
    api_key: String,
    client: reqwest::Client,
}

impl SupadataClient {
    pub fn new(endpoint: String, api_key: String, timeout_seconds: u64) -> Result<Self> {
        let endpoint = Url::parse(&endpoint).map_err(|e| {
            SubtitleError::Config(format!("Invalid transcript endpoint {}: {}", endpoint, e))
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            endpoint,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl TranscriptApi for SupadataClient {
    async fn transcript(&self, request: &TranscriptRequest) -> Result<TranscriptResponse> {
        debug!("Sending transcript request to {} ({:?})", self.endpoint, request);

        let response = self
            .client
            .get(self.endpoint.clone())
            .header("x-api-key", &self.api_key)
            .query(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SubtitleError::Upstream(format!(
                "Transcript API error {}: {}",
                status, text
            )));
        }

        Ok(response.json::<TranscriptResponse>().await?)
    }
}

/// Provider backed by a hosted transcript API
pub struct HostedTranscriptProvider {
    api: Arc<dyn TranscriptApi>,
}

impl HostedTranscriptProvider {
    pub fn new(api: Arc<dyn TranscriptApi>) -> Self {
        Self { api }
    }

    /// Native captions for a language, then auto-generated ones
    async fn fetch_with_language(&self, url: &str, lang: &str) -> Vec<Phrase> {
        let phrases = self.attempt(url, Some(lang), TranscriptMode::Native).await;
        if !phrases.is_empty() {
            info!("📝 Got {} phrases from native {} captions", phrases.len(), lang);
            return phrases;
        }

        debug!("No native captions, trying auto-generated for {}", lang);
        let phrases = self.attempt(url, Some(lang), TranscriptMode::Auto).await;
        if !phrases.is_empty() {
            info!("📝 Got {} phrases from auto-generated {} captions", phrases.len(), lang);
        }
        phrases
    }

    /// One request. A failed request counts as an empty result so the
    /// caller can move on to the next option.
    async fn attempt(&self, url: &str, lang: Option<&str>, mode: TranscriptMode) -> Vec<Phrase> {
        let request = TranscriptRequest::new(url, lang, mode);
        match self.api.transcript(&request).await {
            Ok(response) => {
                if let Some(answered) = response.lang.as_deref() {
                    debug!("Transcript service answered in {} ({})", answered, mode.as_str());
                }
                transform_response(response)
            }
            Err(e) => {
                warn!(
                    "Transcript request failed (lang: {}, mode: {}): {}",
                    lang.unwrap_or("auto"),
                    mode.as_str(),
                    e
                );
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl SubtitleProvider for HostedTranscriptProvider {
    async fn fetch_subtitles(
        &self,
        video_id: &str,
        options: &SubtitleFetchOptions,
    ) -> Result<Vec<Phrase>> {
        let url = watch_url(video_id);

        if let Some(lang) = options.requested_language() {
            info!("🌐 Fetching subtitles for {} (explicit lang: {})", video_id, lang);
            let phrases = self.fetch_with_language(&url, lang).await;
            if phrases.is_empty() {
                return Err(SubtitleError::Fetch(format!(
                    "No subtitles found for {} in language {}",
                    video_id, lang
                )));
            }
            return Ok(phrases);
        }

        info!("🌐 Fetching subtitles for {} (auto-detect language)", video_id);

        for mode in [TranscriptMode::Native, TranscriptMode::Auto] {
            let phrases = self.attempt(&url, None, mode).await;
            if !phrases.is_empty() {
                info!("🔍 Auto-detected language with {} captions", mode.as_str());
                return Ok(phrases);
            }
        }

        for lang in FALLBACK_LANGUAGES {
            debug!("Trying fallback language: {}", lang);
            let phrases = self.fetch_with_language(&url, lang).await;
            if !phrases.is_empty() {
                info!("✅ Found subtitles for {} with fallback language {}", video_id, lang);
                return Ok(phrases);
            }
        }

        Err(SubtitleError::Fetch(format!(
            "No subtitles found for {} in any supported language",
            video_id
        )))
    }

    fn name(&self) -> &'static str {
        "supadata"
    }
}

/// Convert millisecond chunks into phrases, dropping chunks without text
fn transform_response(response: TranscriptResponse) -> Vec<Phrase> {
    response
        .content
        .into_iter()
        .filter(|chunk| !chunk.text.trim().is_empty())
        .enumerate()
        .map(|(index, chunk)| {
            let start_sec = chunk.offset.max(0.0) / 1000.0;
            let end_sec = (chunk.offset.max(0.0) + chunk.duration.max(0.0)) / 1000.0;
            Phrase::new(index as u32, start_sec, end_sec, chunk.text)
        })
        .collect()
}
