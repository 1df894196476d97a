//! API module for Phrase Loop
//!
//! Serves phrases, video language info and dictionary lookups to the player UI.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;

pub mod handlers;
pub mod models;
pub mod server;

/// API Server for handling REST requests
#[derive(Debug)]
pub struct ApiServer {
    config: Arc<Config>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Run the API server until it stops
    pub async fn start(self) -> Result<()> {
        info!("🚀 Starting API server on {}", self.config.bind_address());
        server::start_http_server(self.config).await
    }
}
