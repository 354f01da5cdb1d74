//! Hub client: registration, best-effort sync and leaderboard
//!
//! The hub is a remote, optional collaborator. Sync is fire-and-forget:
//! a failed push gets exactly one retry after a fixed delay and is then
//! dropped silently. Nothing here ever blocks gameplay or surfaces an
//! error to the player.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::HubConfig;
use crate::pet::Tacomon;
use crate::storage::JsonStore;
use crate::training::{TrainingEntry, TrainingProgress};

pub const REGISTERED_KEY: &str = "hub-registered";
pub const HUB_ID_KEY: &str = "hub-regenmon-id";

/// Friendly downtime message; the hub never shows a raw error
pub const HUB_RESTING: &str = "El HUB está descansando, intenta después 🌮";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Registration request, wire shape fixed by the hub
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub owner_name: String,
    pub sprite_url: String,
    pub app_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub stats: StatsPayload,
    pub balance: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatsPayload {
    pub happiness: u8,
    pub energy: u8,
    pub hunger: u8,
}

impl From<&Tacomon> for StatsPayload {
    fn from(pet: &Tacomon) -> Self {
        Self {
            happiness: pet.happiness,
            energy: pet.energy,
            hunger: pet.hunger,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterOutcome {
    pub id: String,
    pub already_registered: bool,
}

/// Periodic sync payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    pub regenmon_id: String,
    pub stats: StatsPayload,
    pub total_points: u64,
    pub training_history: Vec<TrainingEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owner_name: String,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub total_points: u64,
    #[serde(default)]
    pub balance: u32,
}

/// Registration flag and hub id, persisted locally
pub struct HubState {
    store: Arc<JsonStore>,
}

impl HubState {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }

    pub fn is_registered(&self) -> bool {
        self.store.get(REGISTERED_KEY).unwrap_or(false)
    }

    pub fn hub_id(&self) -> Option<String> {
        self.store.get(HUB_ID_KEY)
    }

    pub fn mark_registered(&self, id: &str) {
        self.store.put(REGISTERED_KEY, &true);
        self.store.put(HUB_ID_KEY, &id.to_string());
    }
}

/// HTTP client for the hub endpoints
#[derive(Clone)]
pub struct HubClient {
    http: Arc<Client>,
    config: HubConfig,
}

impl HubClient {
    pub fn new(config: HubConfig) -> Result<Self> {
        config.url()?;
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http: Arc::new(http),
            config,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Register the pet. Retries once after the configured delay, then
    /// reports the themed downtime message.
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterOutcome> {
        let url = self.endpoint("/api/register");
        let response = match self.post_json(&url, request).await {
            Ok(r) => r,
            Err(_) => {
                tokio::time::sleep(Duration::from_secs(self.config.retry_delay_secs)).await;
                match self.post_json(&url, request).await {
                    Ok(r) => r,
                    Err(_) => bail!("{}", HUB_RESTING),
                }
            }
        };

        let body: Value = response
            .json()
            .await
            .map_err(|_| anyhow::anyhow!("{}", HUB_RESTING))?;

        let id = body
            .get("regenmonId")
            .or_else(|| body.get("id"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("{}", HUB_RESTING))?;

        Ok(RegisterOutcome {
            id,
            already_registered: body
                .get("alreadyRegistered")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        })
    }

    /// Best-effort sync push: one retry after the fixed delay, then
    /// the attempt is dropped silently.
    pub async fn sync(&self, payload: &SyncPayload) {
        let url = self.endpoint("/api/sync");
        if self.post_json(&url, payload).await.is_ok() {
            debug!("Hub sync ok");
            return;
        }
        tokio::time::sleep(Duration::from_secs(self.config.retry_delay_secs)).await;
        match self.post_json(&url, payload).await {
            Ok(_) => debug!("Hub sync ok after retry"),
            Err(e) => warn!("Hub sync dropped: {}", e),
        }
    }

    /// Fetch a leaderboard page. The hub has shipped both `leaderboard`
    /// and `entries` as the array key.
    pub async fn leaderboard(&self, page: u32, limit: u32) -> Result<Vec<LeaderboardEntry>> {
        let url = self.endpoint("/api/leaderboard");
        let body: Value = self
            .http
            .get(&url)
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await
            .map_err(|_| anyhow::anyhow!("{}", HUB_RESTING))?
            .error_for_status()
            .map_err(|_| anyhow::anyhow!("{}", HUB_RESTING))?
            .json()
            .await
            .map_err(|_| anyhow::anyhow!("{}", HUB_RESTING))?;

        let list = body
            .get("leaderboard")
            .or_else(|| body.get("entries"))
            .cloned()
            .unwrap_or(body);
        Ok(serde_json::from_value(list).unwrap_or_default())
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        payload: &T,
    ) -> Result<reqwest::Response> {
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .context("Hub request failed")?;
        response.error_for_status().context("Hub returned an error")
    }
}

/// Spawn the periodic sync task. Complete no-op (no timer started)
/// unless the profile is hub-registered.
pub fn spawn_sync_loop(client: HubClient, store: Arc<JsonStore>) -> Option<JoinHandle<()>> {
    let state = HubState::new(store.clone());
    if !state.is_registered() {
        return None;
    }
    let interval_minutes = client.config.sync_interval_minutes;
    Some(tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(Duration::from_secs(interval_minutes.max(1) * 60));
        loop {
            // first tick fires immediately: one push on startup
            ticker.tick().await;
            if let Some(payload) = payload_from_store(&store) {
                client.sync(&payload).await;
            }
        }
    }))
}

/// Assemble the sync payload from the persisted pet, training progress
/// and hub id. `None` when anything required is missing.
pub fn payload_from_store(store: &JsonStore) -> Option<SyncPayload> {
    let hub_id: String = store.get(HUB_ID_KEY)?;
    let pet: Tacomon = store.get(crate::pet::PET_KEY)?;
    let training: TrainingProgress = store.get(crate::training::TRAINING_KEY).unwrap_or_default();
    Some(SyncPayload {
        regenmon_id: hub_id,
        stats: StatsPayload::from(&pet),
        total_points: training.total_points,
        training_history: training.history,
    })
}
