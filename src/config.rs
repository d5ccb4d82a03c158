//! Configuration for the pool tracker
//!
//! Loaded from `.env` / environment variables or a TOML file, then
//! overridden by command-line flags in `main`.

use eyre::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::chains::{ChainId, DexSource};
use crate::types::SourceStrategy;

// ============================================
// DEFAULTS
// ============================================

/// The Graph decentralized network gateway (key is inserted after this)
const DEFAULT_GATEWAY_URL: &str = "https://gateway.thegraph.com/api";

/// DexScreener token lookup (address is appended)
const DEFAULT_AGGREGATOR_URL: &str = "https://api.dexscreener.com/latest/dex/tokens";

/// Pools kept after ranking across all sources
const DEFAULT_MAX_RESULTS: usize = 10;

/// `first:` for each of the pools0 / pools1 angles
const DEFAULT_POOLS_PER_QUERY: usize = 20;

/// Top positions fetched per pool
const DEFAULT_POSITIONS_PER_POOL: usize = 10;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// ± fraction of current price used when a source has no range data
const DEFAULT_ESTIMATED_RANGE_PCT: f64 = 0.20;

// ============================================
// CONFIG
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // ========== Sources ==========
    /// Which family of sources answers a search
    pub strategy: SourceStrategy,

    /// The Graph API key (opaque, only ever placed in the gateway URL)
    pub graph_api_key: Option<String>,

    /// Gateway base, e.g. https://gateway.thegraph.com/api
    pub gateway_url: String,

    /// Direct subgraph URLs by DEX id; these bypass the gateway and need no key
    pub subgraph_overrides: HashMap<String, String>,

    /// DexScreener token endpoint
    pub aggregator_url: String,

    // ========== Search ==========
    /// Chains searched when the caller does not pick any
    pub default_chains: Vec<ChainId>,

    /// Pools kept after ranking
    pub max_results: usize,

    pub pools_per_query: usize,

    pub positions_per_pool: usize,

    /// Range half-width for sources without tick data (0.20 = ±20%)
    pub estimated_range_pct: f64,

    // ========== Transport ==========
    pub http_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Ok(Self {
            strategy: env::var("POOL_STRATEGY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.strategy),
            graph_api_key: env::var("GRAPH_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            gateway_url: env::var("GRAPH_GATEWAY_URL").unwrap_or(defaults.gateway_url),
            subgraph_overrides: env::var("SUBGRAPH_OVERRIDES")
                .map(|s| Self::parse_overrides(&s))
                .unwrap_or_default(),
            aggregator_url: env::var("AGGREGATOR_URL").unwrap_or(defaults.aggregator_url),
            default_chains: env::var("DEFAULT_CHAINS")
                .map(|s| s.split(',').filter_map(|c| c.parse().ok()).collect())
                .unwrap_or(defaults.default_chains),
            max_results: env::var("MAX_RESULTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_results),
            pools_per_query: env::var("POOLS_PER_QUERY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.pools_per_query),
            positions_per_pool: env::var("POSITIONS_PER_POOL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.positions_per_pool),
            estimated_range_pct: env::var("ESTIMATED_RANGE_PCT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.estimated_range_pct),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.http_timeout_secs),
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file (the API key is left out)
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut redacted = self.clone();
        redacted.graph_api_key = None;
        let content = toml::to_string_pretty(&redacted)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// "uniswap-v3-eth=https://...,pancakeswap-v3-bsc=https://..."
    fn parse_overrides(raw: &str) -> HashMap<String, String> {
        raw.split(',')
            .filter_map(|entry| {
                let (id, url) = entry.split_once('=')?;
                let (id, url) = (id.trim(), url.trim());
                if id.is_empty() || url.is_empty() {
                    None
                } else {
                    Some((id.to_string(), url.to_string()))
                }
            })
            .collect()
    }

    /// Non-blank API key, if any
    pub fn api_key(&self) -> Option<&str> {
        self.graph_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Endpoint for a DEX subgraph. `None` means the gateway needs a key we don't have.
    pub fn subgraph_url(&self, dex: &DexSource) -> Option<String> {
        if let Some(url) = self.subgraph_overrides.get(dex.id) {
            return Some(url.clone());
        }
        self.api_key().map(|key| {
            format!(
                "{}/{}/subgraphs/id/{}",
                self.gateway_url.trim_end_matches('/'),
                key,
                dex.subgraph_id
            )
        })
    }

    /// Validate before any search runs
    pub fn validate(&self) -> Result<()> {
        if self.max_results == 0 {
            return Err(eyre::eyre!("MAX_RESULTS must be at least 1"));
        }
        if self.pools_per_query == 0 || self.pools_per_query > 1000 {
            return Err(eyre::eyre!(
                "POOLS_PER_QUERY must be between 1 and 1000 (subgraph limit), got {}",
                self.pools_per_query
            ));
        }
        if self.positions_per_pool > 1000 {
            return Err(eyre::eyre!(
                "POSITIONS_PER_POOL must be at most 1000 (subgraph limit), got {}",
                self.positions_per_pool
            ));
        }
        if !(0.0..1.0).contains(&self.estimated_range_pct) {
            return Err(eyre::eyre!(
                "ESTIMATED_RANGE_PCT must be in [0, 1), got {}",
                self.estimated_range_pct
            ));
        }
        if self.http_timeout_secs == 0 {
            return Err(eyre::eyre!("HTTP_TIMEOUT_SECS must be greater than zero"));
        }
        if self.strategy == SourceStrategy::Subgraph && !self.gateway_url.starts_with("http") {
            return Err(eyre::eyre!("Invalid GRAPH_GATEWAY_URL: {}", self.gateway_url));
        }
        if self.strategy == SourceStrategy::Aggregator && !self.aggregator_url.starts_with("http") {
            return Err(eyre::eyre!("Invalid AGGREGATOR_URL: {}", self.aggregator_url));
        }
        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        let chains = self
            .default_chains
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║              POOL TRACKER - CONFIGURATION                  ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ Strategy:          {:^40} ║", self.strategy);
        println!("║ Default Chains:    {:^40} ║", chains);
        println!("║ Max Results:       {:^40} ║", self.max_results);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ THE GRAPH                                                  ║");
        println!("║ • API Key:         {:^40} ║",
            if self.api_key().is_some() { "✓ Configured" } else { "✗ Not Set" }
        );
        println!("║ • Overrides:       {:^40} ║", self.subgraph_overrides.len());
        println!("║ • Pools/Query:     {:^40} ║", self.pools_per_query);
        println!("║ • Positions/Pool:  {:^40} ║", self.positions_per_pool);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ AGGREGATOR                                                 ║");
        println!("║ • Est. Range:      {:>38.0}% ║", self.estimated_range_pct * 100.0);
        println!("║ • HTTP Timeout:    {:>38}s ║", self.http_timeout_secs);
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: SourceStrategy::Subgraph,
            graph_api_key: None,
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            subgraph_overrides: HashMap::new(),
            aggregator_url: DEFAULT_AGGREGATOR_URL.to_string(),
            default_chains: ChainId::ALL.to_vec(),
            max_results: DEFAULT_MAX_RESULTS,
            pools_per_query: DEFAULT_POOLS_PER_QUERY,
            positions_per_pool: DEFAULT_POSITIONS_PER_POOL,
            estimated_range_pct: DEFAULT_ESTIMATED_RANGE_PCT,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

// ============================================
// TESTS
// ============================================
