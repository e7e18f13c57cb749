//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys) are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub weights: WeightsConfig,
    pub sources: SourcesConfig,
    pub costs: CostsConfig,
    pub simulation: SimulationConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Niche search terms fed to every source.
    pub niches: Vec<String>,
    /// Tokens stripped from niche names before cross-source matching.
    pub noise_tokens: Vec<String>,
    /// Fuzzy-match fallback threshold; 0 disables fuzzy matching.
    pub match_threshold: f64,
    /// Score substituted for a source that contributed nothing.
    pub neutral_score: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeightsConfig {
    pub marketplace: f64,
    pub trends: f64,
    pub community: f64,
    pub adjustment: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    pub mercado: MercadoConfig,
    pub trends: TrendsSourceConfig,
    pub reddit: RedditConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MercadoConfig {
    pub enabled: bool,
    /// Marketplace site code, e.g. "MLM" for Mexico.
    pub site_id: String,
    pub limit: u32,
    pub request_delay_ms: u64,
    pub max_retries: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrendsSourceConfig {
    pub enabled: bool,
    /// Base URL of the trends proxy service.
    pub base_url: String,
    pub geo: String,
    pub timeframe: String,
    pub request_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedditConfig {
    pub enabled: bool,
    pub subreddits: Vec<String>,
    pub limit: u32,
    /// "hour" | "day" | "week" | "month" | "year" | "all"
    pub time_filter: String,
    pub user_agent: String,
    pub request_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CostsConfig {
    pub commission_standard: f64,
    pub commission_technology: f64,
    pub commission_collectibles: f64,
    pub processor_rate: f64,
    /// Tax applied on top of the processor fee.
    pub processor_tax_rate: f64,
    pub shipping: f64,
    pub packaging: f64,
    pub sourcing_hours: f64,
    pub listing_hours: f64,
    pub packing_hours: f64,
    pub hourly_rate: f64,
    pub transport: f64,
    pub min_roi_pct: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    pub starting_capital: f64,
    pub profit_target: f64,
    pub weeks_normal: usize,
    pub weeks_exam: usize,
    pub weeks_vacation: usize,
    pub weekly_hours_normal: f64,
    pub weekly_hours_exam: f64,
    pub weekly_hours_vacation: f64,
    /// Hours to source, list, manage, and ship one unit.
    pub hours_per_unit: f64,
    /// Fraction of theoretical capacity actually achieved.
    pub efficiency: f64,
    /// Fraction of current inventory sold each week.
    pub sell_through_rate: f64,
    pub base_rate_conservative: u32,
    pub base_rate_realistic: u32,
    pub base_rate_optimistic: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    pub enabled: bool,
    pub out_dir: String,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
