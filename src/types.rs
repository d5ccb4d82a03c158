//! Result shapes shared by every pool source
//!
//! - `TokenAddress`: validated `0x` + 40 hex input
//! - `PoolResult` / `PositionResult`: one request/response cycle, never persisted
//! - `SearchReport`: ranked pools plus bookkeeping about the fan-out

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chains::ChainId;
use crate::error::DiscoveryError;

// ============================================
// INPUT
// ============================================

/// A token contract address that passed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenAddress(Address);

impl TokenAddress {
    /// Accepts exactly `0x` followed by 40 hex characters (any case)
    pub fn parse(input: &str) -> Result<Self, DiscoveryError> {
        let trimmed = input.trim();
        let invalid = || DiscoveryError::InvalidTokenAddress(trimmed.to_string());

        let hex_part = trimmed.strip_prefix("0x").ok_or_else(invalid)?;
        if hex_part.len() != 40 {
            return Err(invalid());
        }
        let bytes = hex::decode(hex_part).map_err(|_| invalid())?;

        Ok(Self(Address::from_slice(&bytes)))
    }

    /// Lowercase `0x…` form, as subgraphs store entity ids
    pub fn to_lowercase_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0.as_slice()))
    }

    /// Case-insensitive comparison against an upstream address string
    pub fn matches(&self, other: &str) -> bool {
        other.trim().eq_ignore_ascii_case(&self.to_lowercase_hex())
    }
}

impl std::fmt::Display for TokenAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0.to_checksum(None))
    }
}

/// Chain selection must be non-empty; duplicates collapse
pub fn validate_chains(chains: &[ChainId]) -> Result<Vec<ChainId>, DiscoveryError> {
    if chains.is_empty() {
        return Err(DiscoveryError::EmptyChainSelection);
    }
    let mut selected = chains.to_vec();
    selected.sort();
    selected.dedup();
    Ok(selected)
}

/// Parse user-supplied chain names ("bsc,eth")
pub fn parse_chain_list(raw: &[String]) -> Result<Vec<ChainId>, DiscoveryError> {
    raw.iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<ChainId>()
                .map_err(|_| DiscoveryError::UnsupportedChain(s.to_string()))
        })
        .collect()
}

// ============================================
// RESULTS
// ============================================

/// One liquidity position inside a pool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionResult {
    /// 1-based rank by on-chain liquidity
    pub rank: usize,
    pub id: String,
    pub owner: String,
    pub liquidity_usd: String,
    pub price_lower: String,
    pub price_upper: String,
    pub is_in_range: bool,
    pub platform: String,
    pub chain: ChainId,
    pub pair: String,
    pub fee_tier: String,
}

/// One pool for the searched token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolResult {
    /// Pool / pair contract address
    pub pool_id: String,
    pub platform: String,
    pub chain: ChainId,
    pub pair: String,
    pub fee_tier: String,
    pub tvl_usd: String,
    pub volume_24h_usd: String,
    pub current_price: String,
    pub price_range: String,
    pub price_lower: f64,
    pub price_upper: f64,
    pub current_price_num: f64,
    /// True when the range is a heuristic rather than real position data
    pub range_is_estimated: bool,
    pub positions: Vec<PositionResult>,
}

/// Which family of sources answered a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStrategy {
    /// The Graph subgraphs, with per-pool positions
    Subgraph,
    /// DexScreener token pairs, no positions
    Aggregator,
}

impl Default for SourceStrategy {
    fn default() -> Self {
        SourceStrategy::Subgraph
    }
}

impl std::fmt::Display for SourceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceStrategy::Subgraph => f.pad("subgraph"),
            SourceStrategy::Aggregator => f.pad("aggregator"),
        }
    }
}

impl std::str::FromStr for SourceStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "subgraph" | "thegraph" | "graph" => Ok(SourceStrategy::Subgraph),
            "aggregator" | "dexscreener" | "rest" => Ok(SourceStrategy::Aggregator),
            other => Err(format!("unknown strategy: {}", other)),
        }
    }
}

/// Outcome of one search
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReport {
    pub token_address: String,
    pub chains: Vec<ChainId>,
    pub strategy: SourceStrategy,
    pub pools: Vec<PoolResult>,
    pub sources_queried: usize,
    pub sources_failed: usize,
    pub searched_at: DateTime<Utc>,
    pub elapsed_ms: u128,
}

impl SearchReport {
    /// Nothing came back from any source
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} pools from {} sources ({} failed) in {}ms",
            self.pools.len(),
            self.sources_queried,
            self.sources_failed,
            self.elapsed_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_validation() {
        assert_eq!(
            TokenAddress::parse("0x123"),
            Err(DiscoveryError::InvalidTokenAddress("0x123".to_string()))
        );

        let ok = TokenAddress::parse(&format!("0x{}", "a".repeat(40))).unwrap();
        assert_eq!(ok.to_lowercase_hex(), format!("0x{}", "a".repeat(40)));

        // missing prefix, bad hex, too long
        assert!(TokenAddress::parse(&"a".repeat(42)).is_err());
        assert!(TokenAddress::parse(&format!("0x{}", "g".repeat(40))).is_err());
        assert!(TokenAddress::parse(&format!("0x{}", "a".repeat(41))).is_err());
    }

    #[test]
    fn test_address_case_and_matching() {
        let token = TokenAddress::parse("  0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2 ").unwrap();
        assert_eq!(
            token.to_lowercase_hex(),
            "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"
        );
        assert!(token.matches("0xC02AAA39B223FE8D0A0E5C4F27EAD9083C756CC2"));
        assert!(!token.matches("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"));
    }

    #[test]
    fn test_chain_selection() {
        assert_eq!(validate_chains(&[]), Err(DiscoveryError::EmptyChainSelection));
        assert_eq!(
            validate_chains(&[ChainId::Base, ChainId::Bsc, ChainId::Base]).unwrap(),
            vec![ChainId::Bsc, ChainId::Base]
        );

        let parsed = parse_chain_list(&["bsc, eth".to_string(), "base".to_string()]).unwrap();
        assert_eq!(parsed, vec![ChainId::Bsc, ChainId::Ethereum, ChainId::Base]);
        assert_eq!(
            parse_chain_list(&["polygon".to_string()]),
            Err(DiscoveryError::UnsupportedChain("polygon".to_string()))
        );
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("DexScreener".parse::<SourceStrategy>().unwrap(), SourceStrategy::Aggregator);
        assert_eq!(SourceStrategy::default(), SourceStrategy::Subgraph);
        assert!("rpc".parse::<SourceStrategy>().is_err());

        // summary box rows center these with {:^40}
        let centered = format!("{:^40}", SourceStrategy::Subgraph);
        assert_eq!(centered.len(), 40);
        assert_eq!(centered.trim(), "subgraph");
        assert_eq!(format!("{:>12}", SourceStrategy::Aggregator), "  aggregator");
    }
}
