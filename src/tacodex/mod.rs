//! Tacodex: the per-wallet collection log of real-world tacos
//!
//! Separate from the pet. Each wallet address keeps its own entry
//! list; derived stats cover total count, distinct taquerías
//! (case-insensitive) and a streak of consecutive calendar days with
//! at least one logged taco, walking backward from today.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use crate::storage::{scoped_key, JsonStore};
use crate::types::{Clock, SystemClock};

pub const TACODEX_KEY: &str = "tacodex-entries";

const UPLOAD_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// One logged real-world taco
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TacoEntry {
    pub id: String,
    pub name: String,
    pub taqueria: String,
    pub location: String,
    pub image_url: String,
    /// Epoch milliseconds, matching the original save format
    pub timestamp: i64,
    pub minted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TacodexStats {
    pub total_tacos: usize,
    pub unique_taquerias: usize,
    pub streak: u32,
}

/// Asset upload response
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedAsset {
    pub url: String,
    pub key: String,
}

/// Per-wallet persistent collection
pub struct TacodexStore {
    store: Arc<JsonStore>,
    wallet: Option<String>,
    clock: Arc<dyn Clock>,
}

impl TacodexStore {
    pub fn new(store: Arc<JsonStore>, wallet: Option<String>) -> Self {
        Self::with_clock(store, wallet, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<JsonStore>,
        wallet: Option<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            wallet: wallet.map(|w| w.to_lowercase()),
            clock,
        }
    }

    fn key(&self) -> String {
        scoped_key(TACODEX_KEY, self.wallet.as_deref())
    }

    /// Entries, newest first
    pub fn entries(&self) -> Vec<TacoEntry> {
        self.store.get(&self.key()).unwrap_or_default()
    }

    /// Log a new taco. Newest entries go to the front.
    pub fn add_entry(
        &self,
        name: &str,
        taqueria: &str,
        location: &str,
        image_url: &str,
    ) -> TacoEntry {
        let entry = TacoEntry {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            taqueria: taqueria.to_string(),
            location: location.to_string(),
            image_url: image_url.to_string(),
            timestamp: self.clock.now().timestamp_millis(),
            minted: false,
            token_id: None,
        };
        let mut entries = self.entries();
        entries.insert(0, entry.clone());
        self.store.put(&self.key(), &entries);
        entry
    }

    /// Record the token id of an externally minted entry. Returns
    /// false when the id is unknown.
    pub fn mark_minted(&self, id: &str, token_id: u64) -> bool {
        let mut entries = self.entries();
        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        entry.minted = true;
        entry.token_id = Some(token_id);
        self.store.put(&self.key(), &entries);
        true
    }

    /// Derived collection statistics
    pub fn stats(&self) -> TacodexStats {
        let entries = self.entries();
        let unique_taquerias = entries
            .iter()
            .map(|e| e.taqueria.to_lowercase())
            .collect::<HashSet<_>>()
            .len();

        let days: HashSet<NaiveDate> = entries
            .iter()
            .filter_map(|e| DateTime::<Utc>::from_timestamp_millis(e.timestamp))
            .map(|dt| dt.date_naive())
            .collect();

        let today = self.clock.now().date_naive();
        let mut streak = 0;
        loop {
            let day = today - Duration::days(streak as i64);
            if days.contains(&day) {
                streak += 1;
            } else {
                break;
            }
        }

        TacodexStats {
            total_tacos: entries.len(),
            unique_taquerias,
            streak,
        }
    }
}

/// Upload a taco photo to the asset endpoint as `{file, wallet}`
/// multipart form data. The service stores it under
/// `tacodex/<wallet_lowercase>/<epoch_ms>.<ext>`.
pub async fn upload_photo(
    asset_base_url: &str,
    path: &Path,
    wallet: &str,
) -> Result<UploadedAsset> {
    if wallet.trim().is_empty() {
        bail!("Falta la wallet para subir la foto");
    }
    let bytes = std::fs::read(path)
        .with_context(|| format!("No se pudo leer {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("taco.jpg")
        .to_string();

    let form = multipart::Form::new()
        .part("file", multipart::Part::bytes(bytes).file_name(file_name))
        .text("wallet", wallet.to_lowercase());

    let client = reqwest::Client::builder()
        .timeout(UPLOAD_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .post(format!(
            "{}/api/upload-taco",
            asset_base_url.trim_end_matches('/')
        ))
        .multipart(form)
        .send()
        .await
        .context("Upload request failed")?;

    if response.status().is_client_error() {
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = body
            .get("error")
            .and_then(|e| e.as_str())
            .unwrap_or("Solicitud inválida");
        bail!("{}", message);
    }

    response
        .error_for_status()
        .context("Upload failed")?
        .json()
        .await
        .context("Invalid upload response")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex;

    struct FakeClock(Mutex<DateTime<Utc>>);

    impl FakeClock {
        fn at(t: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(t)))
        }

        fn set(&self, t: DateTime<Utc>) {
            *self.0.lock().unwrap() = t;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn t(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, day, hour, 0, 0).unwrap()
    }

    fn tacodex(clock: Arc<FakeClock>) -> (tempfile::TempDir, TacodexStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonStore::open(dir.path()).unwrap());
        let dex = TacodexStore::with_clock(store, Some("0xABCdef".to_string()), clock);
        (dir, dex)
    }

    #[test]
    fn entries_are_newest_first() {
        let clock = FakeClock::at(t(30, 10));
        let (_dir, dex) = tacodex(clock.clone());
        dex.add_entry("Pastor", "El Huequito", "CDMX", "http://img/1");
        clock.set(t(30, 11));
        dex.add_entry("Asada", "La Vaquita", "Monterrey", "http://img/2");

        let entries = dex.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Asada");
        assert!(!entries[0].minted);
    }

    #[test]
    fn mark_minted_sets_flag_and_token() {
        let clock = FakeClock::at(t(30, 10));
        let (_dir, dex) = tacodex(clock);
        let entry = dex.add_entry("Pastor", "El Huequito", "CDMX", "http://img/1");

        assert!(dex.mark_minted(&entry.id, 42));
        let entries = dex.entries();
        assert!(entries[0].minted);
        assert_eq!(entries[0].token_id, Some(42));

        assert!(!dex.mark_minted("no-such-id", 1));
    }

    #[test]
    fn taquerias_are_deduped_case_insensitively() {
        let clock = FakeClock::at(t(30, 10));
        let (_dir, dex) = tacodex(clock);
        dex.add_entry("Pastor", "El Huequito", "CDMX", "u");
        dex.add_entry("Asada", "el huequito", "CDMX", "u");
        dex.add_entry("Carnitas", "La Vaquita", "MTY", "u");

        let stats = dex.stats();
        assert_eq!(stats.total_tacos, 3);
        assert_eq!(stats.unique_taquerias, 2);
    }

    #[test]
    fn streak_counts_consecutive_days_back_from_today() {
        let clock = FakeClock::at(t(28, 9));
        let (_dir, dex) = tacodex(clock.clone());
        dex.add_entry("Lunes", "A", "X", "u");
        clock.set(t(29, 9));
        dex.add_entry("Martes", "B", "X", "u");
        clock.set(t(30, 9));
        dex.add_entry("Miércoles", "C", "X", "u");

        assert_eq!(dex.stats().streak, 3);
    }

    #[test]
    fn a_gap_breaks_the_streak() {
        let clock = FakeClock::at(t(26, 9));
        let (_dir, dex) = tacodex(clock.clone());
        dex.add_entry("Viejo", "A", "X", "u");
        // nothing on the 27th..29th
        clock.set(t(30, 9));
        dex.add_entry("Hoy", "B", "X", "u");

        assert_eq!(dex.stats().streak, 1);
    }

    #[test]
    fn no_entry_today_means_zero_streak() {
        let clock = FakeClock::at(t(29, 9));
        let (_dir, dex) = tacodex(clock.clone());
        dex.add_entry("Ayer", "A", "X", "u");
        clock.set(t(30, 9));

        assert_eq!(dex.stats().streak, 0);
    }

    #[test]
    fn wallets_are_independent_and_lowercased() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonStore::open(dir.path()).unwrap());
        let clock = FakeClock::at(t(30, 9));

        let upper = TacodexStore::with_clock(
            store.clone(),
            Some("0xAAAA".to_string()),
            clock.clone(),
        );
        upper.add_entry("Uno", "A", "X", "u");

        // same wallet, different casing: same namespace
        let lower =
            TacodexStore::with_clock(store.clone(), Some("0xaaaa".to_string()), clock.clone());
        assert_eq!(lower.entries().len(), 1);

        let other = TacodexStore::with_clock(store, Some("0xBBBB".to_string()), clock);
        assert!(other.entries().is_empty());
    }
}
