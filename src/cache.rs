/// File-backed JSON cache with versioning and lazy expiry
///
/// One JSON file per key, named `<version>_<sanitized key>.json`. Entries
/// older than the TTL are removed by the read that finds them. Writes go to
/// a temporary file in the cache directory which is then renamed over the
/// target, so concurrent writers never leave a torn file behind.
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::metadata::VideoLanguageInfo;
use crate::subtitles::{normalize_language, Phrase};

/// Bump when the cached phrase shape or selection logic changes
pub const SUBTITLE_CACHE_VERSION: &str = "v3";
pub const VIDEO_INFO_CACHE_VERSION: &str = "v1";

/// Subtitles rarely change
pub const SUBTITLE_TTL_HOURS: u64 = 24 * 7;
/// Video metadata changes even less
pub const VIDEO_INFO_TTL_HOURS: u64 = 24 * 30;

/// Stored cache record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub value: T,
    /// Milliseconds since the Unix epoch
    pub created_at: i64,
    pub version: String,
}

/// Entry metadata read without decoding the value
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryHeader {
    created_at: i64,
    #[serde(default)]
    version: String,
}

/// Generic file cache for values of type `T`
pub struct FileCache<T> {
    /// Label used in log lines
    name: &'static str,
    cache_dir: PathBuf,
    version: String,
    ttl_millis: i64,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for FileCache<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            cache_dir: self.cache_dir.clone(),
            version: self.version.clone(),
            ttl_millis: self.ttl_millis,
            _value: PhantomData,
        }
    }
}

/// Phrase lists keyed by video and language
pub type SubtitleCache = FileCache<Vec<Phrase>>;

/// Language info keyed by video
pub type VideoInfoCache = FileCache<VideoLanguageInfo>;

impl SubtitleCache {
    pub fn for_subtitles(cache_dir: PathBuf, ttl_hours: u64) -> Self {
        FileCache::new("SubtitleCache", cache_dir, SUBTITLE_CACHE_VERSION, ttl_hours)
    }
}

impl VideoInfoCache {
    pub fn for_video_info(cache_dir: PathBuf, ttl_hours: u64) -> Self {
        FileCache::new("VideoInfoCache", cache_dir, VIDEO_INFO_CACHE_VERSION, ttl_hours)
    }
}

/// Cache key for a subtitle lookup: the bare video id when no language was
/// requested, `<videoId>_<language>` otherwise
pub fn subtitle_key(video_id: &str, language: &str) -> String {
    match normalize_language(language) {
        Some(lang) => format!("{}_{}", video_id, lang),
        None => video_id.to_string(),
    }
}

/// Keep ASCII alphanumerics, `_` and `-`; replace everything else with `_`
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl<T> FileCache<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a cache manager
    pub fn new(name: &'static str, cache_dir: PathBuf, version: &str, ttl_hours: u64) -> Self {
        Self {
            name,
            cache_dir,
            version: version.to_string(),
            ttl_millis: i64::try_from(ttl_hours)
                .unwrap_or(i64::MAX)
                .saturating_mul(3_600_000),
            _value: PhantomData,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn ttl_millis(&self) -> i64 {
        self.ttl_millis
    }

    /// File that holds the entry for a key
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}_{}.json", self.version, sanitize_key(key)))
    }

    fn is_expired(&self, created_at: i64, now: i64) -> bool {
        now.saturating_sub(created_at) > self.ttl_millis
    }

    /// Delete an entry that can no longer be served; a concurrent removal is fine
    async fn remove_stale(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("[{}] Failed to remove stale entry {}: {}", self.name, path.display(), e);
            }
        }
    }

    /// Read a live entry. Expired entries and entries from another version
    /// are deleted and reported as absent; unreadable entries are absent too.
    pub async fn get(&self, key: &str) -> Option<T> {
        let path = self.entry_path(key);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("[{}] Cache miss for {}", self.name, key);
                return None;
            }
            Err(e) => {
                warn!("[{}] Failed to read cache file {}: {}", self.name, path.display(), e);
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("[{}] Failed to parse cache file {}: {}", self.name, path.display(), e);
                return None;
            }
        };

        if entry.version != self.version {
            debug!(
                "[{}] Version mismatch for {} (found {}, want {})",
                self.name, key, entry.version, self.version
            );
            self.remove_stale(&path).await;
            return None;
        }

        if self.is_expired(entry.created_at, now_millis()) {
            info!("⏰ [{}] Cache expired for {}", self.name, key);
            self.remove_stale(&path).await;
            return None;
        }

        debug!("[{}] Cache hit for {}", self.name, key);
        Some(entry.value)
    }

    /// Store a value. Failures are logged and swallowed.
    pub async fn set(&self, key: &str, value: &T) {
        if let Err(e) = self.write_entry(key, value).await {
            warn!("[{}] Error writing cache for {}: {}", self.name, key, e);
        }
    }

    async fn write_entry(&self, key: &str, value: &T) -> Result<()> {
        let entry = CacheEntry {
            value,
            created_at: now_millis(),
            version: self.version.clone(),
        };
        let json_content = serde_json::to_vec_pretty(&entry)?;

        let dir = self.cache_dir.clone();
        let path = self.entry_path(key);
        tokio::task::spawn_blocking(move || write_atomic(&dir, &path, &json_content))
            .await
            .map_err(std::io::Error::other)??;

        info!("💾 [{}] Cached entry for {}", self.name, key);
        Ok(())
    }

    /// Remove the entry for a key
    pub async fn invalidate(&self, key: &str) -> Result<bool> {
        let path = self.entry_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("🗑️ [{}] Invalidated cache for {}", self.name, key);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("[{}] No cache file for {}", self.name, key);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every file in the cache directory
    pub async fn clear_all(&self) -> Result<usize> {
        let mut cleared_count = 0;
        for path in self.files().await? {
            if tokio::fs::remove_file(&path).await.is_ok() {
                cleared_count += 1;
                debug!("🗑️ Removed cache file: {}", path.display());
            }
        }

        if cleared_count > 0 {
            info!("🧹 [{}] Cleared {} cached files", self.name, cleared_count);
        }
        Ok(cleared_count)
    }

    /// Delete expired, unparseable and other-version entries
    pub async fn sweep_expired(&self) -> Result<usize> {
        let now = now_millis();
        let mut cleaned_count = 0;

        for path in self.files().await? {
            let stale = match self.read_header(&path).await {
                Some(header) => header.version != self.version || self.is_expired(header.created_at, now),
                None => true,
            };

            if stale && tokio::fs::remove_file(&path).await.is_ok() {
                cleaned_count += 1;
                debug!("🗑️ Removed stale cache file: {}", path.display());
            }
        }

        if cleaned_count > 0 {
            info!("🧹 [{}] Cleaned up {} expired cache entries", self.name, cleaned_count);
        }
        Ok(cleaned_count)
    }

    /// Count entries by state
    pub async fn stats(&self) -> Result<CacheStats> {
        let now = now_millis();
        let mut stats = CacheStats::default();

        for path in self.files().await? {
            stats.total_files += 1;
            match self.read_header(&path).await {
                Some(header) if header.version != self.version => stats.other_version_files += 1,
                Some(header) if self.is_expired(header.created_at, now) => stats.expired_files += 1,
                Some(_) => stats.valid_files += 1,
                None => stats.unreadable_files += 1,
            }
        }

        Ok(stats)
    }

    /// Describe every readable entry, newest first
    pub async fn list_entries(&self) -> Result<Vec<CachedEntryInfo>> {
        let now = now_millis();
        let mut entries = Vec::new();

        for path in self.files().await? {
            if let Some(header) = self.read_header(&path).await {
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                entries.push(CachedEntryInfo {
                    file_name,
                    is_valid: header.version == self.version && !self.is_expired(header.created_at, now),
                    age_hours: (now.saturating_sub(header.created_at) / 3_600_000).max(0) as u64,
                    version: header.version,
                    created_at: header.created_at,
                });
            }
        }

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn read_header(&self, path: &Path) -> Option<EntryHeader> {
        let content = tokio::fs::read_to_string(path).await.ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Regular files in the cache directory; empty when it does not exist yet
    async fn files(&self) -> Result<Vec<PathBuf>> {
        let mut entries = match tokio::fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(entry.path());
            }
        }
        Ok(files)
    }
}

fn write_atomic(dir: &Path, path: &Path, content: &[u8]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(content)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Cache statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStats {
    pub total_files: usize,
    pub valid_files: usize,
    pub expired_files: usize,
    pub other_version_files: usize,
    pub unreadable_files: usize,
}

/// Information about a cached entry
#[derive(Debug, Clone)]
pub struct CachedEntryInfo {
    pub file_name: String,
    pub version: String,
    pub is_valid: bool,
    pub age_hours: u64,
    pub created_at: i64,
}
