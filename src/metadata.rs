//! Video language detection
//!
//! Works out the spoken language of a video and which caption languages
//! exist, without fetching any caption content.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::Result;
use crate::subtitles::extractor::{CaptionExtractor, ExtractedVideoInfo};

/// Language and caption availability for one video
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoLanguageInfo {
    pub original_language: Option<String>,
    /// Union of manual and automatic caption languages
    pub available_languages: BTreeSet<String>,
    pub has_manual_captions: bool,
    pub has_auto_captions: bool,
}

impl VideoLanguageInfo {
    /// Derive language info from extractor output.
    ///
    /// The original language is the declared video language, else the first
    /// manual caption language, else the first automatic one.
    pub fn from_extracted(info: &ExtractedVideoInfo) -> Self {
        let original_language = info
            .language
            .as_deref()
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .or_else(|| info.subtitles.first().map(|(lang, _)| lang))
            .or_else(|| info.automatic_captions.first().map(|(lang, _)| lang))
            .map(str::to_string);

        let available_languages = info
            .subtitles
            .languages()
            .chain(info.automatic_captions.languages())
            .map(str::to_string)
            .collect();

        Self {
            original_language,
            available_languages,
            has_manual_captions: !info.subtitles.is_empty(),
            has_auto_captions: !info.automatic_captions.is_empty(),
        }
    }
}

/// Resolves [`VideoLanguageInfo`] through a caption extractor
#[derive(Clone)]
pub struct LanguageResolver {
    extractor: Arc<dyn CaptionExtractor>,
}

impl LanguageResolver {
    pub fn new(extractor: Arc<dyn CaptionExtractor>) -> Self {
        Self { extractor }
    }

    /// Detect language info, returning the empty info on any failure
    pub async fn detect_video_language(&self, video_id: &str) -> VideoLanguageInfo {
        match self.try_detect_video_language(video_id).await {
            Ok(info) => info,
            Err(e) => {
                warn!("Language detection failed for {}: {}", video_id, e);
                VideoLanguageInfo::default()
            }
        }
    }

    /// Detect language info, surfacing extractor failures
    pub async fn try_detect_video_language(&self, video_id: &str) -> Result<VideoLanguageInfo> {
        info!("🔍 Detecting language for {}", video_id);
        let extracted = self.extractor.extract_info(video_id).await?;
        let language_info = VideoLanguageInfo::from_extracted(&extracted);

        info!(
            "🗣️ {}: original language {:?}, {} caption languages",
            video_id,
            language_info.original_language,
            language_info.available_languages.len()
        );
        Ok(language_info)
    }
}
