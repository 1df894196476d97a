//! API data models

use serde::{Deserialize, Serialize};

use crate::metadata::VideoLanguageInfo;

/// Query for subtitle lookups
#[derive(Debug, Default, Deserialize)]
pub struct SubtitleQuery {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
    pub lang: Option<String>,
}

impl SubtitleQuery {
    /// Requested language, `auto` when absent
    pub fn language(&self) -> &str {
        self.lang.as_deref().unwrap_or("auto")
    }
}

/// Query for caption document exports
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
    pub lang: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VideoInfoQuery {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DictionaryQuery {
    pub word: Option<String>,
}

/// Video info payload: the video id next to its language info
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfoResponse {
    pub video_id: String,
    #[serde(flatten)]
    pub info: VideoLanguageInfo,
}
