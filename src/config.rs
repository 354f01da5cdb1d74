//! Configuration management
//!
//! Manages game configuration: LLM provider settings, hub endpoint,
//! and the shared game rules (costs, rewards, timers) that the rest of
//! the crate reads from one place instead of scattering constants.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// LLM provider settings (chat + training relays)
    #[serde(default)]
    pub llm: LlmConfig,
    /// Hub endpoint settings
    #[serde(default)]
    pub hub: HubConfig,
    /// Game rules: costs, rewards, cooldowns, thresholds
    #[serde(default)]
    pub rules: GameRules,
    /// Active identity for the $SALSA namespace (None = anonymous)
    #[serde(default)]
    pub identity: Option<String>,
    /// Wallet address for the tacodex namespace
    #[serde(default)]
    pub wallet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key lives in the keyring, this is never serialized
    #[serde(skip)]
    pub api_key: Option<String>,
    /// OpenAI-compatible API base URL
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Model for pet chat
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    /// Vision-capable model for training evaluation
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
}

fn default_llm_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_chat_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_vision_model() -> String {
    "openai/gpt-4o".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            chat_model: default_chat_model(),
            vision_model: default_vision_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Hub base URL
    #[serde(default = "default_hub_url")]
    pub base_url: String,
    /// Minutes between periodic syncs
    #[serde(default = "default_sync_interval")]
    pub sync_interval_minutes: u64,
    /// Delay before the single sync retry
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

fn default_hub_url() -> String {
    "https://regenmon-final.vercel.app".to_string()
}

fn default_sync_interval() -> u64 {
    5
}

fn default_retry_delay() -> u64 {
    2
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            base_url: default_hub_url(),
            sync_interval_minutes: default_sync_interval(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

impl HubConfig {
    /// Parsed base URL, validating the configured string
    pub fn url(&self) -> Result<Url> {
        Url::parse(&self.base_url).context("Invalid hub base URL")
    }
}

/// All tunable game numbers in one place. Historically these were
/// duplicated at every call site; every module reads them from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRules {
    /// $SALSA cost of feed/play, checked before the quiz is offered
    #[serde(default = "default_action_cost")]
    pub action_cost: u32,
    /// Stat reward for a correct quiz answer
    #[serde(default = "default_correct_reward")]
    pub correct_reward: i32,
    /// Smaller stat reward for an incorrect answer
    #[serde(default = "default_incorrect_reward")]
    pub incorrect_reward: i32,
    /// Cooldown after a completed action
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Penalty lock after a failed feed/play quiz
    #[serde(default = "default_block_secs")]
    pub block_secs: u64,
    /// First-load $SALSA grant
    #[serde(default = "default_starting_balance")]
    pub starting_balance: u32,
    /// Ledger history ring size
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    /// Inclusive chat reward range
    #[serde(default = "default_chat_reward_min")]
    pub chat_reward_min: u32,
    #[serde(default = "default_chat_reward_max")]
    pub chat_reward_max: u32,
    /// Above this balance chat rewards are throttled
    #[serde(default = "default_comfort_balance")]
    pub comfort_balance: u32,
    /// Probability a throttled chat reward is still granted
    #[serde(default = "default_chat_reward_probability")]
    pub chat_reward_probability: f64,
    /// Training points needed for Young and Adult
    #[serde(default = "default_stage_thresholds")]
    pub stage_thresholds: [u64; 2],
    /// One-time $SALSA bonus per stage transition
    #[serde(default = "default_stage_bonus")]
    pub stage_bonus: u32,
}

fn default_action_cost() -> u32 {
    10
}

fn default_correct_reward() -> i32 {
    15
}

fn default_incorrect_reward() -> i32 {
    5
}

fn default_cooldown_secs() -> u64 {
    120
}

fn default_block_secs() -> u64 {
    30
}

fn default_starting_balance() -> u32 {
    100
}

fn default_max_history() -> usize {
    50
}

fn default_chat_reward_min() -> u32 {
    2
}

fn default_chat_reward_max() -> u32 {
    5
}

fn default_comfort_balance() -> u32 {
    100
}

fn default_chat_reward_probability() -> f64 {
    0.2
}

fn default_stage_thresholds() -> [u64; 2] {
    [500, 1500]
}

fn default_stage_bonus() -> u32 {
    100
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            action_cost: default_action_cost(),
            correct_reward: default_correct_reward(),
            incorrect_reward: default_incorrect_reward(),
            cooldown_secs: default_cooldown_secs(),
            block_secs: default_block_secs(),
            starting_balance: default_starting_balance(),
            max_history: default_max_history(),
            chat_reward_min: default_chat_reward_min(),
            chat_reward_max: default_chat_reward_max(),
            comfort_balance: default_comfort_balance(),
            chat_reward_probability: default_chat_reward_probability(),
            stage_thresholds: default_stage_thresholds(),
            stage_bonus: default_stage_bonus(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            hub: HubConfig::default(),
            rules: GameRules::default(),
            identity: None,
            wallet: None,
        }
    }
}

impl Config {
    /// Load configuration from file, creating defaults on first run
    pub fn load() -> Result<Self> {
        let config_path = config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: Config = toml::from_str(&contents)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = config_path()?;
        let parent = config_path.parent().context("Config path has no parent")?;

        std::fs::create_dir_all(parent).context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents).context("Failed to write config file")?;

        Ok(())
    }
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "tacomon", "tacomon")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "tacomon", "tacomon")
        .context("Failed to get project directories")?;
    Ok(base.data_dir().to_path_buf())
}

/// Store the LLM API key
pub fn set_api_key(key: &str) -> Result<()> {
    crate::security::keyring::set_api_key(key)?;
    println!("API key stored securely.");
    Ok(())
}

/// Set the active ledger identity (None clears back to anonymous)
pub fn set_identity(identity: Option<&str>) -> Result<()> {
    let mut config = Config::load()?;
    config.identity = identity.map(str::to_string);
    config.save()?;
    match identity {
        Some(id) => println!("Identidad activa: {}", id),
        None => println!("Jugando en modo anónimo."),
    }
    Ok(())
}

/// Set the wallet address for the tacodex
pub fn set_wallet(wallet: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.wallet = Some(wallet.to_lowercase());
    config.save()?;
    println!("Wallet de la Tacodex: {}", wallet.to_lowercase());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_rules() {
        let rules = GameRules::default();
        assert_eq!(rules.action_cost, 10);
        assert_eq!(rules.correct_reward, 15);
        assert_eq!(rules.incorrect_reward, 5);
        assert_eq!(rules.cooldown_secs, 120);
        assert_eq!(rules.block_secs, 30);
        assert_eq!(rules.starting_balance, 100);
        assert_eq!(rules.max_history, 50);
        assert_eq!(rules.stage_thresholds, [500, 1500]);
        assert_eq!(rules.stage_bonus, 100);
    }

    #[test]
    fn empty_toml_fills_every_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.hub.sync_interval_minutes, 5);
        assert_eq!(config.hub.retry_delay_secs, 2);
        assert_eq!(config.rules.comfort_balance, 100);
        assert!(config.identity.is_none());
    }

    #[test]
    fn hub_url_parses() {
        let hub = HubConfig::default();
        assert!(hub.url().is_ok());
        let bad = HubConfig {
            base_url: "not a url".into(),
            ..HubConfig::default()
        };
        assert!(bad.url().is_err());
    }
}
