use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use phrase_loop::api::ApiServer;
use phrase_loop::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("Phrase Loop")
        .version(env!("CARGO_PKG_VERSION"))
        .author("TigreRoll")
        .about("Subtitle backend for phrase-by-phrase YouTube listening practice")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (defaults to phrase-loop.toml if present)"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Address to bind"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Port to listen on")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    // Load configuration
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from(&PathBuf::from(path))?,
        None => Config::load()?,
    };

    if let Some(host) = matches.get_one::<String>("host") {
        config.server.host = host.clone();
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }

    let verbose = matches.get_flag("verbose");
    let level = if verbose { "debug" } else { config.server.log_level.as_str() };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("phrase_loop={0},tower_http={0},warn", level))),
        )
        .init();

    if verbose {
        info!("Verbose logging enabled");
    }

    config.validate()?;

    info!("🚀 Phrase Loop starting...");
    info!("{}", config.summary());

    ApiServer::new(Arc::new(config)).start().await
}
