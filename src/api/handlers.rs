//! API request handlers

use serde_json::Value;
use tracing::{info, warn};

use super::models::{DictionaryQuery, ExportQuery, SubtitleQuery, VideoInfoQuery, VideoInfoResponse};
use crate::error::{Result, SubtitleError};
use crate::service::SubtitleService;
use crate::subtitles::export::content_type;
use crate::subtitles::{SubtitleFormat, SubtitleResponse};

/// Handle health check requests
pub async fn health_check() -> Result<Value> {
    Ok(serde_json::json!({
        "status": "healthy",
        "service": "phrase-loop",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Handle subtitle lookups
pub async fn get_subtitles(service: &SubtitleService, query: &SubtitleQuery) -> Result<Value> {
    let video_id = required(&query.video_id, "Missing videoId")?;
    info!("🎬 Subtitle request for {} ({})", video_id, query.language());

    let phrases = service.get_subtitles(video_id, query.language()).await?;
    Ok(serde_json::to_value(SubtitleResponse { phrases })?)
}

/// Handle caption document exports; returns the content type and body
pub async fn export_subtitles(
    service: &SubtitleService,
    query: &ExportQuery,
) -> Result<(&'static str, String)> {
    let video_id = required(&query.video_id, "Missing videoId")?;
    let format = match query.format.as_deref() {
        Some(format) => format.parse::<SubtitleFormat>()?,
        None => SubtitleFormat::Vtt,
    };
    let language = query.lang.as_deref().unwrap_or("auto");

    let document = service.export_subtitles(video_id, language, format).await?;
    Ok((content_type(format), document))
}

/// Handle video info requests
pub async fn get_video_info(service: &SubtitleService, query: &VideoInfoQuery) -> Result<Value> {
    let video_id = required(&query.video_id, "Missing videoId")?;
    info!("🔍 Video info request for {}", video_id);

    let info = service.get_video_info(video_id).await?;
    Ok(serde_json::to_value(VideoInfoResponse {
        video_id: video_id.to_string(),
        info,
    })?)
}

/// Handle dictionary lookups by passing the word to the dictionary service.
///
/// An unknown word is not an error: the caller gets a translate link instead.
pub async fn lookup_word(
    client: &reqwest::Client,
    endpoint: &str,
    query: &DictionaryQuery,
) -> Result<Value> {
    let word = required(&query.word, "Missing word")?;
    let url = format!("{}{}", endpoint, urlencoding::encode(word));

    let response = client.get(&url).send().await.map_err(|e| {
        warn!("Dictionary request for {} failed: {}", word, e);
        SubtitleError::Upstream("Failed to fetch definition".to_string())
    })?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(serde_json::json!({
            "error": "Not found",
            "translateUrl": translate_url(word),
        }));
    }

    if !response.status().is_success() {
        warn!("Dictionary lookup for {} failed with {}", word, response.status());
        return Err(SubtitleError::Upstream("Failed to fetch definition".to_string()));
    }

    let payload: Value = response.json().await.map_err(|e| {
        warn!("Dictionary response for {} was not JSON: {}", word, e);
        SubtitleError::Upstream("Failed to fetch definition".to_string())
    })?;

    Ok(serde_json::json!({ "result": payload }))
}

/// Machine translation link offered when the dictionary has no entry
pub fn translate_url(word: &str) -> String {
    format!(
        "https://translate.google.com/?sl=en&tl=en&text={}&op=translate",
        urlencoding::encode(word)
    )
}

fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SubtitleError::InvalidRequest(message.to_string()))
}
