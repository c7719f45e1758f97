//! Jellyfin library server collaborator.

use crate::models::config::JellyfinConfig;
use crate::{Error, Result};

/// Library server interface consumed by the core.
#[allow(async_fn_in_trait)]
pub trait LibraryServer {
    /// Ask the server to rescan its libraries.
    async fn trigger_rescan(&self) -> Result<()>;
}

/// Jellyfin HTTP client.
pub struct JellyfinClient {
    config: JellyfinConfig,
    client: reqwest::Client,
}

impl JellyfinClient {
    pub fn new(config: JellyfinConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

impl LibraryServer for JellyfinClient {
    async fn trigger_rescan(&self) -> Result<()> {
        if self.config.api_key.is_empty() {
            tracing::warn!("Jellyfin API key not configured, skipping rescan");
            return Ok(());
        }

        let url = format!(
            "{}/Library/Refresh?api_key={}",
            self.config.url.trim_end_matches('/'),
            self.config.api_key
        );
        self.client
            .post(&url)
            .send()
            .await
            .map_err(|e| Error::unavailable("jellyfin", e))?
            .error_for_status()
            .map_err(|e| Error::unavailable("jellyfin", e))?;

        tracing::info!("Triggered Jellyfin library scan");
        Ok(())
    }
}
