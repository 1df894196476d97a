use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use phrase_loop::cache::subtitle_key;
use phrase_loop::{Config, FileCache, SubtitleCache, VideoInfoCache};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "cache-manager")]
#[command(about = "Subtitle and video-info cache management utility")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file; the cache directories are taken from it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Which cache to operate on
    #[arg(long, value_enum, default_value_t = CacheSelection::All)]
    cache: CacheSelection,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CacheSelection {
    Subtitles,
    VideoInfo,
    All,
}

#[derive(Subcommand)]
enum Commands {
    /// List all cached entries
    List,
    /// Get cache statistics
    Stats,
    /// Invalidate the entries for a video
    Invalidate {
        /// YouTube video id
        video_id: String,
        /// Subtitle language; omit for the original-language entry
        #[arg(long, default_value = "auto")]
        lang: String,
    },
    /// Clear all cache entries
    Clear,
    /// Clean up expired and outdated cache entries
    Cleanup,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let subtitle_cache = SubtitleCache::for_subtitles(
        config.cache.subtitle_dir.clone(),
        config.cache.subtitle_ttl_hours,
    );
    let video_info_cache = VideoInfoCache::for_video_info(
        config.cache.video_info_dir.clone(),
        config.cache.video_info_ttl_hours,
    );

    if cli.cache != CacheSelection::VideoInfo {
        let key = match &cli.command {
            Commands::Invalidate { video_id, lang } => subtitle_key(video_id, lang),
            _ => String::new(),
        };
        run_command(&subtitle_cache, "Subtitle cache", &cli.command, &key).await?;
    }

    if cli.cache != CacheSelection::Subtitles {
        let key = match &cli.command {
            Commands::Invalidate { video_id, .. } => video_id.clone(),
            _ => String::new(),
        };
        run_command(&video_info_cache, "Video info cache", &cli.command, &key).await?;
    }

    Ok(())
}

async fn run_command<T>(
    cache: &FileCache<T>,
    label: &str,
    command: &Commands,
    invalidate_key: &str,
) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    match command {
        Commands::List => {
            let entries = cache.list_entries().await?;

            if entries.is_empty() {
                info!("📭 {}: no cached entries in {}", label, cache.cache_dir().display());
                return Ok(());
            }

            info!("📚 {}: {} cached entries", label, entries.len());

            for entry in entries {
                let status = if entry.is_valid { "✅ Valid" } else { "❌ Stale" };
                info!(
                    "  {} - version {}, {} hours old, {}",
                    entry.file_name, entry.version, entry.age_hours, status
                );
            }
        }

        Commands::Stats => {
            let stats = cache.stats().await?;
            info!("📊 {} Statistics ({}):", label, cache.cache_dir().display());
            info!("  Total files: {}", stats.total_files);
            info!("  Valid files: {}", stats.valid_files);
            info!("  Expired files: {}", stats.expired_files);
            info!("  Other version files: {}", stats.other_version_files);
            info!("  Unreadable files: {}", stats.unreadable_files);
        }

        Commands::Invalidate { .. } => {
            let removed = cache.invalidate(invalidate_key).await?;
            if removed {
                info!("✅ {}: invalidated {}", label, invalidate_key);
            } else {
                warn!("⚠️ {}: key not found: {}", label, invalidate_key);
            }
        }

        Commands::Clear => {
            let count = cache.clear_all().await?;
            info!("🧹 {}: cleared {} cache files", label, count);
        }

        Commands::Cleanup => {
            let count = cache.sweep_expired().await?;
            info!("🗑️ {}: cleaned up {} stale cache files", label, count);
        }
    }

    Ok(())
}
