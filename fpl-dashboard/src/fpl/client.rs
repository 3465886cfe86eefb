// FPL REST client.
//
// `FplSource` is the seam between the loader and the network: the reqwest
// implementation below talks to the public FPL API (optionally through a
// relay prefix), while tests plug in in-memory fixtures.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::wire::{
    Bootstrap, ElementSummary, EntryHistory, EntryPicks, EntryTransfer, Fixtures, LeagueStandings,
    LiveGameweek,
};
use crate::config::FplConfig;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FplError {
    #[error("Failed to fetch data from {url}. Status: {status}. Details: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Build(reqwest::Error),
}

// ---------------------------------------------------------------------------
// FplSource
// ---------------------------------------------------------------------------

/// One method per FPL endpoint the dashboard consumes.
#[async_trait]
pub trait FplSource: Send + Sync {
    async fn bootstrap(&self) -> Result<Bootstrap, FplError>;
    async fn league_standings(&self, league_id: u64) -> Result<LeagueStandings, FplError>;
    async fn entry_picks(&self, entry: u64, gameweek: u32) -> Result<EntryPicks, FplError>;
    async fn entry_history(&self, entry: u64) -> Result<EntryHistory, FplError>;
    async fn entry_transfers(&self, entry: u64) -> Result<Vec<EntryTransfer>, FplError>;
    async fn live_gameweek(&self, gameweek: u32) -> Result<LiveGameweek, FplError>;
    /// `None` fetches the whole season.
    async fn fixtures(&self, gameweek: Option<u32>) -> Result<Fixtures, FplError>;
    async fn element_summary(&self, element: u32) -> Result<ElementSummary, FplError>;
}

// ---------------------------------------------------------------------------
// FplClient
// ---------------------------------------------------------------------------

/// reqwest-backed `FplSource`.
#[derive(Debug, Clone)]
pub struct FplClient {
    http: reqwest::Client,
    api_base: String,
    relay_prefix: String,
}

impl FplClient {
    pub fn new(config: &FplConfig) -> Result<Self, FplError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(FplError::Build)?;
        Ok(FplClient {
            http,
            api_base: config.api_base.clone(),
            relay_prefix: config.relay_prefix.clone(),
        })
    }

    /// Full request URL for an API path such as `bootstrap-static/`.
    pub fn url(&self, path: &str) -> String {
        let target = format!("{}{}", self.api_base, path);
        if self.relay_prefix.is_empty() {
            target
        } else {
            format!("{}{}", self.relay_prefix, target)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FplError> {
        let url = self.url(path);
        debug!(%url, "GET");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| FplError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FplError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| FplError::Transport {
                url: url.clone(),
                source,
            })?;
        serde_json::from_slice(&bytes).map_err(|source| FplError::Decode { url, source })
    }
}

#[async_trait]
impl FplSource for FplClient {
    async fn bootstrap(&self) -> Result<Bootstrap, FplError> {
        self.get_json("bootstrap-static/").await
    }

    async fn league_standings(&self, league_id: u64) -> Result<LeagueStandings, FplError> {
        self.get_json(&format!("leagues-classic/{league_id}/standings/"))
            .await
    }

    async fn entry_picks(&self, entry: u64, gameweek: u32) -> Result<EntryPicks, FplError> {
        self.get_json(&format!("entry/{entry}/event/{gameweek}/picks/"))
            .await
    }

    async fn entry_history(&self, entry: u64) -> Result<EntryHistory, FplError> {
        self.get_json(&format!("entry/{entry}/history/")).await
    }

    async fn entry_transfers(&self, entry: u64) -> Result<Vec<EntryTransfer>, FplError> {
        self.get_json(&format!("entry/{entry}/transfers/")).await
    }

    async fn live_gameweek(&self, gameweek: u32) -> Result<LiveGameweek, FplError> {
        self.get_json(&format!("event/{gameweek}/live/")).await
    }

    async fn fixtures(&self, gameweek: Option<u32>) -> Result<Fixtures, FplError> {
        match gameweek {
            Some(gw) => self.get_json(&format!("fixtures/?event={gw}")).await,
            None => self.get_json("fixtures/").await,
        }
    }

    async fn element_summary(&self, element: u32) -> Result<ElementSummary, FplError> {
        self.get_json(&format!("element-summary/{element}/")).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
