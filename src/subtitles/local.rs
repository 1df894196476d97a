//! Local-extractor provider

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::extractor::{CaptionExtractor, CaptionTrack, ExtractedVideoInfo};
use super::vtt::parse_vtt;
use super::{Phrase, SubtitleFetchOptions, SubtitleProvider};
use crate::error::{Result, SubtitleError};

const DEFAULT_LANGUAGE: &str = "en";

/// Provider that reads caption tracks through a local extractor and parses
/// the VTT track itself
pub struct LocalExtractorProvider {
    extractor: Arc<dyn CaptionExtractor>,
}

impl LocalExtractorProvider {
    pub fn new(extractor: Arc<dyn CaptionExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl SubtitleProvider for LocalExtractorProvider {
    async fn fetch_subtitles(
        &self,
        video_id: &str,
        options: &SubtitleFetchOptions,
    ) -> Result<Vec<Phrase>> {
        info!("🎞️ Fetching subtitles for {} via yt-dlp", video_id);

        let video_info = self
            .extractor
            .extract_info(video_id)
            .await
            .map_err(|e| SubtitleError::Fetch(format!("Failed to read captions for {}: {}", video_id, e)))?;

        let requested = options.requested_language().unwrap_or(DEFAULT_LANGUAGE);
        let (language, tracks) = select_tracks(&video_info, requested).ok_or_else(|| {
            SubtitleError::Fetch(format!("No subtitles found for {}", video_id))
        })?;
        debug!("Selected {} caption tracks for {}", language, video_id);

        let track_url = tracks
            .iter()
            .find(|track| track.ext == "vtt")
            .and_then(|track| track.url.as_deref())
            .ok_or_else(|| {
                SubtitleError::Fetch(format!("VTT format not available for {} ({})", video_id, language))
            })?;

        let content = self
            .extractor
            .download_track(track_url)
            .await
            .map_err(|e| SubtitleError::Fetch(format!("Failed to fetch VTT for {}: {}", video_id, e)))?;

        let phrases = parse_vtt(&content);
        if phrases.is_empty() {
            warn!("VTT track for {} ({}) contained no usable cues", video_id, language);
            return Err(SubtitleError::Fetch(format!(
                "Caption track for {} contained no phrases",
                video_id
            )));
        }

        info!("📝 Parsed {} phrases for {} ({})", phrases.len(), video_id, language);
        Ok(phrases)
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// Pick the caption tracks to use.
///
/// Tries the requested language, then `nl`, then `en`, each first among the
/// manual tracks and then among the automatic ones. Falls back to the first
/// listed manual language, then the first listed automatic language. A
/// language with an empty track list counts as absent.
fn select_tracks<'a>(
    info: &'a ExtractedVideoInfo,
    requested: &'a str,
) -> Option<(&'a str, &'a [CaptionTrack])> {
    let present = |tracks: Option<&'a [CaptionTrack]>| tracks.filter(|t| !t.is_empty());

    for lang in [requested, "nl", DEFAULT_LANGUAGE] {
        if let Some(tracks) =
            present(info.subtitles.get(lang)).or_else(|| present(info.automatic_captions.get(lang)))
        {
            return Some((lang, tracks));
        }
    }

    [info.subtitles.first(), info.automatic_captions.first()]
        .into_iter()
        .flatten()
        .find(|(_, tracks)| !tracks.is_empty())
}
