//! API module for the YouTube extractor
//!
//! Exposes extraction as JSON endpoints, CSV upload/download and browser-friendly test routes.

use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;
use crate::extractor::VideoExtractor;

pub mod handlers;
pub mod models;
pub mod server;

pub use server::{router, AppState};

/// API Server for handling REST requests
pub struct ApiServer {
    extractor: Arc<VideoExtractor>,
    config: Arc<Config>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(extractor: Arc<VideoExtractor>, config: Arc<Config>) -> Self {
        Self { extractor, config }
    }

    /// Start the API server in the background
    pub fn start_background(self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move { self.start().await })
    }

    /// Start the API server
    pub async fn start(self) -> Result<()> {
        info!(
            "🚀 Starting API server on {}:{} (backends: {})",
            self.config.server.host,
            self.config.server.port,
            self.extractor.transcript_backends().join(", ")
        );
        server::start_http_server(self.extractor, self.config).await
    }
}
