/// Phrase Loop - subtitle acquisition backend
///
/// Fetches, parses and caches timed captions for YouTube videos so a player
/// can loop phrase by phrase. Captions come from a hosted transcript API or a
/// local yt-dlp install, selected by configuration.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod metadata;
pub mod service;
pub mod subtitles;

// Re-export main types for easy access
pub use crate::cache::{CacheStats, CachedEntryInfo, FileCache, SubtitleCache, VideoInfoCache};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Result, SubtitleError};
pub use crate::metadata::{LanguageResolver, VideoLanguageInfo};
pub use crate::service::{demo_phrases, SubtitleService};
pub use crate::subtitles::{
    create_provider, parse_vtt, Phrase, ProviderConfig, ProviderType, SubtitleFetchOptions,
    SubtitleFormat, SubtitleProvider,
};
