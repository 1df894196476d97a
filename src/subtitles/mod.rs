//! Caption providers and the phrase model they produce
//!
//! A provider turns a video identifier into an ordered list of [`Phrase`]s.
//! Two providers exist: a hosted transcript API and a local caption
//! extractor. Callers only see the [`SubtitleProvider`] trait and pick a
//! variant through [`create_provider`].

pub mod export;
pub mod extractor;
pub mod hosted;
pub mod local;
pub mod vtt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use crate::error::{Result, SubtitleError};

pub use extractor::{CaptionExtractor, CaptionTrack, ExtractedVideoInfo, YtDlpExtractor};
pub use hosted::{HostedTranscriptProvider, SupadataClient, TranscriptApi, TranscriptMode};
pub use local::LocalExtractorProvider;
pub use vtt::parse_vtt;

/// One timed caption unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Phrase {
    /// Position in the sequence, starting at zero
    pub id: u32,
    /// Start of the phrase in seconds from the video start
    pub start_sec: f64,
    /// End of the phrase in seconds, never before `start_sec`
    pub end_sec: f64,
    /// Plain caption text without markup
    pub text: String,
}

impl Phrase {
    pub fn new(id: u32, start_sec: f64, end_sec: f64, text: impl Into<String>) -> Self {
        Self {
            id,
            start_sec,
            end_sec,
            text: text.into(),
        }
    }
}

/// Wire shape of a successful subtitle lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubtitleResponse {
    pub phrases: Vec<Phrase>,
}

/// Caption document formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    Vtt,
    Srt,
    Text,
}

impl FromStr for SubtitleFormat {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "vtt" => Ok(SubtitleFormat::Vtt),
            "srt" => Ok(SubtitleFormat::Srt),
            "text" | "txt" => Ok(SubtitleFormat::Text),
            other => Err(SubtitleError::InvalidRequest(format!(
                "Unknown subtitle format: {}",
                other
            ))),
        }
    }
}

/// Options passed to a provider for a single lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtitleFetchOptions {
    /// Requested caption language; `None` lets the provider pick the original
    pub language: Option<String>,
    pub format: Option<SubtitleFormat>,
}

impl SubtitleFetchOptions {
    /// Options for a language code as received from callers, where `"auto"`
    /// and the empty string both mean "no preference"
    pub fn for_language(language: &str) -> Self {
        Self {
            language: normalize_language(language).map(str::to_string),
            format: None,
        }
    }

    /// The concrete language requested, if any
    pub fn requested_language(&self) -> Option<&str> {
        self.language.as_deref().and_then(normalize_language)
    }
}

/// Trim a language code and map the "let the provider decide" values to `None`
pub fn normalize_language(language: &str) -> Option<&str> {
    let language = language.trim();
    if language.is_empty() || language.eq_ignore_ascii_case("auto") {
        None
    } else {
        Some(language)
    }
}

/// Trait for caption providers
#[async_trait]
pub trait SubtitleProvider: Send + Sync {
    /// Fetch the phrases for a video. Fails with [`SubtitleError::Fetch`]
    /// once every language and mode the provider knows has come back empty.
    async fn fetch_subtitles(
        &self,
        video_id: &str,
        options: &SubtitleFetchOptions,
    ) -> Result<Vec<Phrase>>;

    /// Short provider name for logs
    fn name(&self) -> &'static str;
}

/// Available provider types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProviderType {
    #[serde(rename = "supadata")]
    Supadata,
    #[serde(rename = "yt-dlp")]
    YtDlp,
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::Supadata => write!(f, "supadata"),
            ProviderType::YtDlp => write!(f, "yt-dlp"),
        }
    }
}

impl FromStr for ProviderType {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supadata" => Ok(ProviderType::Supadata),
            "yt-dlp" | "ytdlp" => Ok(ProviderType::YtDlp),
            other => Err(SubtitleError::Config(format!(
                "Unknown provider type: {}",
                other
            ))),
        }
    }
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub provider: ProviderType,
    /// API key for the hosted transcript service
    pub api_key: Option<String>,
    /// Transcript endpoint of the hosted service
    pub api_endpoint: String,
    /// Path to the yt-dlp executable
    pub ytdlp_path: String,
    /// Upper bound for any single upstream request or extractor run
    pub timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderType::Supadata,
            api_key: None,
            api_endpoint: "https://api.supadata.ai/v1/youtube/transcript".to_string(),
            ytdlp_path: "/usr/bin/yt-dlp".to_string(),
            timeout_seconds: 60,
        }
    }
}

/// Create a provider instance based on configuration
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn SubtitleProvider>> {
    info!("🎬 Using subtitle provider: {}", config.provider);

    match config.provider {
        ProviderType::Supadata => {
            let api_key = config
                .api_key
                .as_deref()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    SubtitleError::Config("API key is required for Supadata provider".to_string())
                })?;

            let client = SupadataClient::new(
                config.api_endpoint.clone(),
                api_key.to_string(),
                config.timeout_seconds,
            )?;
            Ok(Box::new(HostedTranscriptProvider::new(Arc::new(client))))
        }
        ProviderType::YtDlp => {
            let extractor = YtDlpExtractor::new(config.ytdlp_path.clone(), config.timeout_seconds)?;
            Ok(Box::new(LocalExtractorProvider::new(Arc::new(extractor))))
        }
    }
}

/// Watch page URL for a video identifier
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}
