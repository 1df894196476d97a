//! Local caption extractor (yt-dlp)
//!
//! Runs the extractor once per lookup to read the video's caption tracks,
//! then downloads the chosen track over HTTP.

use async_trait::async_trait;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use super::watch_url;
use crate::error::{Result, SubtitleError};

/// One downloadable caption track
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CaptionTrack {
    /// Format tag, e.g. `vtt`, `srv3`, `json3`
    #[serde(default)]
    pub ext: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl CaptionTrack {
    pub fn new(ext: &str, url: &str) -> Self {
        Self {
            ext: ext.to_string(),
            url: Some(url.to_string()),
        }
    }
}

/// Caption tracks keyed by language, in the order the extractor listed them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LanguageTracks(Vec<(String, Vec<CaptionTrack>)>);

impl LanguageTracks {
    pub fn from_pairs(pairs: Vec<(String, Vec<CaptionTrack>)>) -> Self {
        Self(pairs)
    }

    /// Tracks for a language, if the language is listed
    pub fn get(&self, language: &str) -> Option<&[CaptionTrack]> {
        self.0
            .iter()
            .find(|(lang, _)| lang == language)
            .map(|(_, tracks)| tracks.as_slice())
    }

    /// The first listed language and its tracks
    pub fn first(&self) -> Option<(&str, &[CaptionTrack])> {
        self.0
            .first()
            .map(|(lang, tracks)| (lang.as_str(), tracks.as_slice()))
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(lang, _)| lang.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for LanguageTracks {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TracksVisitor;

        impl<'de> Visitor<'de> for TracksVisitor {
            type Value = LanguageTracks;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of language codes to caption tracks")
            }

            fn visit_unit<E>(self) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(LanguageTracks::default())
            }

            fn visit_none<E>(self) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(LanguageTracks::default())
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((lang, tracks)) = map.next_entry::<String, Vec<CaptionTrack>>()? {
                    pairs.push((lang, tracks));
                }
                Ok(LanguageTracks(pairs))
            }
        }

        deserializer.deserialize_any(TracksVisitor)
    }
}

/// The part of the extractor's video info that caption lookup needs
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ExtractedVideoInfo {
    /// Spoken language declared for the video, if any
    #[serde(default)]
    pub language: Option<String>,
    /// Manually authored tracks
    #[serde(default)]
    pub subtitles: LanguageTracks,
    /// Auto-generated tracks
    #[serde(default)]
    pub automatic_captions: LanguageTracks,
}

/// Trait for local caption extractors
#[async_trait]
pub trait CaptionExtractor: Send + Sync {
    /// Read caption metadata for a video without downloading media
    async fn extract_info(&self, video_id: &str) -> Result<ExtractedVideoInfo>;

    /// Download the raw content of a caption track
    async fn download_track(&self, url: &str) -> Result<String>;
}

/// yt-dlp backed extractor
pub struct YtDlpExtractor {
    ytdlp_path: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl YtDlpExtractor {
    pub fn new(ytdlp_path: String, timeout_seconds: u64) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_seconds);
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            ytdlp_path,
            timeout,
            client,
        })
    }
}

#[async_trait]
impl CaptionExtractor for YtDlpExtractor {
    async fn extract_info(&self, video_id: &str) -> Result<ExtractedVideoInfo> {
        let url = watch_url(video_id);
        debug!("Running {} for {}", self.ytdlp_path, url);

        let run = Command::new(&self.ytdlp_path)
            .args(["--dump-single-json", "--skip-download", "--no-warnings"])
            .arg(&url)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                SubtitleError::Upstream(format!(
                    "yt-dlp timed out after {}s for {}",
                    self.timeout.as_secs(),
                    video_id
                ))
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SubtitleError::Upstream(format!(
                "yt-dlp failed for {}: {}",
                video_id,
                stderr.trim()
            )));
        }

        let info: ExtractedVideoInfo = serde_json::from_slice(&output.stdout)?;
        info!(
            "📋 yt-dlp listed {} manual and {} automatic caption languages for {}",
            info.subtitles.languages().count(),
            info.automatic_captions.languages().count(),
            video_id
        );
        Ok(info)
    }

    async fn download_track(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(SubtitleError::Upstream(format!(
                "Failed to fetch caption track: {}",
                response.status()
            )));
        }

        let content = response.text().await?;
        debug!("Fetched {} characters of caption track", content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_keeps_listing_order() {
        let json = r#"{
            "id": "abc123",
            "title": "Koken met Jan",
            "language": null,
            "subtitles": {
                "nl": [{"ext": "json3", "url": "https://x/nl.json3"}, {"ext": "vtt", "url": "https://x/nl.vtt"}],
                "de": [{"ext": "vtt", "url": "https://x/de.vtt", "name": "German"}]
            },
            "automatic_captions": {
                "zz": [{"ext": "vtt", "url": "https://x/zz.vtt"}],
                "af": [{"ext": "vtt", "url": "https://x/af.vtt"}]
            }
        }"#;

        let info: ExtractedVideoInfo = serde_json::from_str(json).unwrap();

        assert_eq!(info.language, None);
        assert_eq!(info.subtitles.languages().collect::<Vec<_>>(), vec!["nl", "de"]);
        assert_eq!(info.automatic_captions.first().unwrap().0, "zz");
        assert_eq!(info.subtitles.get("nl").unwrap()[1], CaptionTrack::new("vtt", "https://x/nl.vtt"));
        assert_eq!(info.subtitles.get("de").unwrap()[0], CaptionTrack::new("vtt", "https://x/de.vtt"));
        assert!(info.subtitles.get("en").is_none());
    }

    #[test]
    fn test_decode_missing_and_null_collections() {
        let info: ExtractedVideoInfo =
            serde_json::from_str(r#"{"id": "abc", "subtitles": null}"#).unwrap();

        assert!(info.subtitles.is_empty());
        assert!(info.automatic_captions.is_empty());
        assert!(info.automatic_captions.first().is_none());
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let extractor = YtDlpExtractor::new("/nonexistent/yt-dlp".to_string(), 5).unwrap();
        let result = extractor.extract_info("abc123").await;
        assert!(matches!(result, Err(SubtitleError::Io(_))));
    }

    /// Local caption host serving one VTT track; other paths are 404
    async fn spawn_caption_host() -> String {
        use axum::routing::get;
        use axum::Router;

        let app = Router::new().route(
            "/nl.vtt",
            get(|| async { "WEBVTT\n\n00:00:01.000 --> 00:00:02.500\nhallo\n" }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_download_track_returns_body() {
        let host = spawn_caption_host().await;
        let extractor = YtDlpExtractor::new("yt-dlp".to_string(), 5).unwrap();

        let content = extractor.download_track(&format!("{}/nl.vtt", host)).await.unwrap();
        assert!(content.starts_with("WEBVTT"));
        assert!(content.contains("hallo"));
    }

    #[tokio::test]
    async fn test_download_track_error_status_is_upstream() {
        let host = spawn_caption_host().await;
        let extractor = YtDlpExtractor::new("yt-dlp".to_string(), 5).unwrap();

        match extractor.download_track(&format!("{}/missing.vtt", host)).await {
            Err(SubtitleError::Upstream(message)) => assert!(message.contains("404"), "{}", message),
            other => panic!("expected upstream error, got {:?}", other),
        }
    }
}
