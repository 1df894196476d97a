//! Subtitle acquisition service
//!
//! Cache first, then the configured provider, then the built-in demo phrases
//! for the one reserved video id. Successful lookups are written back to the
//! cache.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::cache::{subtitle_key, SubtitleCache, VideoInfoCache};
use crate::config::Config;
use crate::error::{Result, SubtitleError};
use crate::metadata::{LanguageResolver, VideoLanguageInfo};
use crate::subtitles::export;
use crate::subtitles::{
    create_provider, CaptionExtractor, Phrase, SubtitleFetchOptions, SubtitleFormat,
    SubtitleProvider, YtDlpExtractor,
};

/// Builds the active provider for one lookup
pub type ProviderFactory = Arc<dyn Fn() -> Result<Box<dyn SubtitleProvider>> + Send + Sync>;

/// Phrases served for the demo video when no provider has captions for it
pub fn demo_phrases() -> Vec<Phrase> {
    vec![
        Phrase::new(0, 0.0, 2.0, "We're no strangers to love"),
        Phrase::new(1, 2.0, 4.5, "You know the rules and so do I"),
        Phrase::new(2, 4.5, 8.0, "A full commitment's what I'm thinking of"),
        Phrase::new(3, 8.0, 10.0, "You wouldn't get this from any other guy"),
    ]
}

/// Entry point for subtitle and video-info lookups
#[derive(Clone)]
pub struct SubtitleService {
    demo_video_id: String,
    provider_factory: ProviderFactory,
    subtitle_cache: SubtitleCache,
    video_info_cache: VideoInfoCache,
    resolver: LanguageResolver,
}

impl SubtitleService {
    /// Build the service from configuration. The provider is resolved again
    /// for every lookup, so credentials are only checked when used.
    pub fn new(config: &Config) -> Result<Self> {
        let provider_config = config.provider.clone();
        let factory: ProviderFactory = Arc::new(move || create_provider(&provider_config));

        let extractor = YtDlpExtractor::new(
            config.provider.ytdlp_path.clone(),
            config.provider.timeout_seconds,
        )?;

        Ok(Self::with_parts(config, factory, Arc::new(extractor)))
    }

    /// Build the service around an explicit provider factory and extractor
    pub fn with_parts(
        config: &Config,
        provider_factory: ProviderFactory,
        extractor: Arc<dyn CaptionExtractor>,
    ) -> Self {
        Self {
            demo_video_id: config.server.demo_video_id.clone(),
            provider_factory,
            subtitle_cache: SubtitleCache::for_subtitles(
                config.cache.subtitle_dir.clone(),
                config.cache.subtitle_ttl_hours,
            ),
            video_info_cache: VideoInfoCache::for_video_info(
                config.cache.video_info_dir.clone(),
                config.cache.video_info_ttl_hours,
            ),
            resolver: LanguageResolver::new(extractor),
        }
    }

    pub fn subtitle_cache(&self) -> &SubtitleCache {
        &self.subtitle_cache
    }

    pub fn video_info_cache(&self) -> &VideoInfoCache {
        &self.video_info_cache
    }

    /// Phrases for a video in a language (`"auto"` for the original).
    ///
    /// Fails with [`SubtitleError::NoSubtitles`] when nothing is cached, the
    /// provider has nothing and the video is not the demo video. A provider
    /// configuration error is returned as is.
    pub async fn get_subtitles(&self, video_id: &str, language: &str) -> Result<Vec<Phrase>> {
        let video_id = require_video_id(video_id)?;
        let cache_key = subtitle_key(video_id, language);

        if let Some(phrases) = self.subtitle_cache.get(&cache_key).await {
            info!("📦 Serving {} phrases for {} from cache", phrases.len(), cache_key);
            return Ok(phrases);
        }

        let provider = (self.provider_factory)()?;
        let options = SubtitleFetchOptions::for_language(language);

        let phrases = match provider.fetch_subtitles(video_id, &options).await {
            Ok(phrases) if !phrases.is_empty() => phrases,
            outcome => {
                match outcome {
                    Err(e) => warn!("{} provider failed for {}: {}", provider.name(), video_id, e),
                    Ok(_) => warn!("{} provider returned no phrases for {}", provider.name(), video_id),
                }

                if video_id != self.demo_video_id {
                    error!("❌ No subtitles available for {}", video_id);
                    return Err(SubtitleError::NoSubtitles(video_id.to_string()));
                }

                info!("🎭 Using demo phrases for {}", video_id);
                demo_phrases()
            }
        };

        self.subtitle_cache.set(&cache_key, &phrases).await;
        info!("✅ Loaded {} phrases for {}", phrases.len(), cache_key);
        Ok(phrases)
    }

    /// Phrases rendered as a caption document
    pub async fn export_subtitles(
        &self,
        video_id: &str,
        language: &str,
        format: SubtitleFormat,
    ) -> Result<String> {
        let phrases = self.get_subtitles(video_id, language).await?;
        Ok(export::render(&phrases, format))
    }

    /// Language info for a video. Failed lookups return the empty info and
    /// are not cached.
    pub async fn get_video_info(&self, video_id: &str) -> Result<VideoLanguageInfo> {
        let video_id = require_video_id(video_id)?;

        if let Some(info) = self.video_info_cache.get(video_id).await {
            return Ok(info);
        }

        match self.resolver.try_detect_video_language(video_id).await {
            Ok(info) => {
                self.video_info_cache.set(video_id, &info).await;
                Ok(info)
            }
            Err(e) => {
                warn!("Could not resolve video info for {}: {}", video_id, e);
                Ok(VideoLanguageInfo::default())
            }
        }
    }
}

fn require_video_id(video_id: &str) -> Result<&str> {
    let video_id = video_id.trim();
    if video_id.is_empty() {
        return Err(SubtitleError::InvalidRequest("Missing videoId".to_string()));
    }
    Ok(video_id)
}
