//! DexScreener aggregator source
//!
//! One GET covers every chain: `{base}/{token}` returns `{ pairs: [...] }`
//! already merged across DEXes. There is no position data, so the price
//! range is an estimate around the current price.

use async_trait::async_trait;
use eyre::{eyre, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{dedup_by_key, PoolSource};
use crate::chains::{platform_name, ChainId};
use crate::config::Config;
use crate::format::{format_price, format_price_range, format_usd};
use crate::math::orient_price;
use crate::types::{PoolResult, TokenAddress};

/// DexScreener pairs carry no fee tier
const FEE_TIER_UNAVAILABLE: &str = "N/A";

// ============================================
// WIRE TYPES
// ============================================

#[derive(Debug, Deserialize)]
struct TokenPairsResponse {
    pairs: Option<Vec<RawPair>>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawPairToken {
    address: Option<String>,
    symbol: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawVolume {
    h24: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawLiquidity {
    usd: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPair {
    chain_id: Option<String>,
    dex_id: Option<String>,
    pair_address: Option<String>,
    base_token: Option<RawPairToken>,
    quote_token: Option<RawPairToken>,
    /// Base token priced in the quote token
    price_native: Option<String>,
    price_usd: Option<String>,
    volume: Option<RawVolume>,
    liquidity: Option<RawLiquidity>,
    labels: Option<Vec<String>>,
}

// ============================================
// SOURCE
// ============================================

pub struct AggregatorSource {
    client: Client,
    base_url: String,
    chains: Vec<ChainId>,
    range_pct: f64,
}

impl AggregatorSource {
    pub fn new(client: Client, config: &Config, chains: Vec<ChainId>) -> Self {
        Self {
            client,
            base_url: config.aggregator_url.trim_end_matches('/').to_string(),
            chains,
            range_pct: config.estimated_range_pct,
        }
    }
}

#[async_trait]
impl PoolSource for AggregatorSource {
    fn name(&self) -> String {
        "DexScreener".to_string()
    }

    async fn fetch_pools(&self, token: &TokenAddress) -> Result<Vec<PoolResult>> {
        let url = format!("{}/{}", self.base_url, token.to_lowercase_hex());
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(eyre!("DexScreener HTTP {}", status));
        }

        let body: TokenPairsResponse = response.json().await?;
        let pairs = body.pairs.unwrap_or_default();
        debug!("DexScreener returned {} pairs", pairs.len());

        let pools = convert_pairs(pairs, token, &self.chains, self.range_pct);
        if !pools.is_empty() {
            warn!(
                "Aggregator ranges are estimated at ±{:.0}% of current price",
                self.range_pct * 100.0
            );
        }
        Ok(pools)
    }
}

// ============================================
// NORMALIZATION
// ============================================

/// Filter to selected chains, dedup by pair address, normalize each pair
fn convert_pairs(
    pairs: Vec<RawPair>,
    token: &TokenAddress,
    chains: &[ChainId],
    range_pct: f64,
) -> Vec<PoolResult> {
    let selected = pairs.into_iter().filter_map(|pair| {
        let chain = pair.chain_id.as_deref()?.parse::<ChainId>().ok()?;
        chains.contains(&chain).then_some((chain, pair))
    });

    dedup_by_key(selected, |entry: &(ChainId, RawPair)| {
        entry.1.pair_address.clone().unwrap_or_default().to_lowercase()
    })
    .into_iter()
    .filter_map(|(chain, pair)| build_pool_result(chain, &pair, token, range_pct))
    .collect()
}

fn build_pool_result(
    chain: ChainId,
    pair: &RawPair,
    token: &TokenAddress,
    range_pct: f64,
) -> Option<PoolResult> {
    let pool_id = pair.pair_address.clone().filter(|a| !a.is_empty())?;
    let base = pair.base_token.as_ref()?;
    let quote = pair.quote_token.as_ref()?;

    let token_is_base = base.address.as_deref().map(|a| token.matches(a)).unwrap_or(false);
    let (ours, theirs) = if token_is_base { (base, quote) } else { (quote, base) };

    let price_native = pair
        .price_native
        .as_deref()
        .and_then(|p| p.trim().parse::<f64>().ok())
        .filter(|p| p.is_finite() && *p > 0.0)
        .unwrap_or(0.0);
    let current_price = orient_price(price_native, token_is_base);
    // band is taken around the oriented price
    let price_lower = current_price * (1.0 - range_pct);
    let price_upper = current_price * (1.0 + range_pct);

    let dex_id = pair.dex_id.as_deref().unwrap_or("unknown");
    let mut platform = platform_name(chain, dex_id);
    if let Some(label) = pair.labels.as_ref().and_then(|l| l.first()) {
        platform = format!("{} {}", platform, label);
    }

    if let Some(usd) = pair.price_usd.as_deref() {
        debug!("{} {} priceUsd={}", chain, pool_id, usd);
    }

    Some(PoolResult {
        pool_id,
        platform,
        chain,
        pair: format!(
            "{}/{}",
            ours.symbol.as_deref().unwrap_or("?"),
            theirs.symbol.as_deref().unwrap_or("?")
        ),
        fee_tier: FEE_TIER_UNAVAILABLE.to_string(),
        tvl_usd: format_usd(pair.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0)),
        volume_24h_usd: format_usd(pair.volume.as_ref().and_then(|v| v.h24).unwrap_or(0.0)),
        current_price: format_price(current_price),
        price_range: format_price_range(price_lower, price_upper),
        price_lower,
        price_upper,
        current_price_num: current_price,
        range_is_estimated: true,
        positions: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TOKEN: &str = "0x6982508145454ce325ddbe47a25d4ec3d2311933";

    fn token() -> TokenAddress {
        TokenAddress::parse(TOKEN).unwrap()
    }

    fn pairs_fixture() -> Vec<RawPair> {
        let body: TokenPairsResponse = serde_json::from_value(json!({
            "schemaVersion": "1.0.0",
            "pairs": [
                {
                    "chainId": "ethereum",
                    "dexId": "uniswap",
                    "url": "https://dexscreener.com/ethereum/0xa43fe16908251ee70ef74718545e4fe6c5ccec9f",
                    "pairAddress": "0xA43fe16908251ee70EF74718545e4FE6C5cCEc9f",
                    "labels": ["v2"],
                    "baseToken": { "address": "0x6982508145454Ce325dDbE47a25d4ec3d2311933", "name": "Pepe", "symbol": "PEPE" },
                    "quoteToken": { "address": "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", "name": "Wrapped Ether", "symbol": "WETH" },
                    "priceNative": "0.000000004",
                    "priceUsd": "0.00001",
                    "volume": { "h24": 1234567.0 },
                    "liquidity": { "usd": 25000000.0 }
                },
                {
                    "chainId": "ethereum",
                    "dexId": "uniswap",
                    "pairAddress": "0xa43fe16908251ee70ef74718545e4fe6c5ccec9f",
                    "baseToken": { "address": TOKEN, "symbol": "PEPE" },
                    "quoteToken": { "address": "0xdup", "symbol": "DUP" },
                    "priceNative": "1"
                },
                {
                    "chainId": "bsc",
                    "dexId": "pancakeswap",
                    "pairAddress": "0xbsc0000000000000000000000000000000000001",
                    "baseToken": { "address": "0x55d398326f99059ff775485246999027b3197955", "symbol": "USDT" },
                    "quoteToken": { "address": TOKEN, "symbol": "PEPE" },
                    "priceNative": "4.0",
                    "liquidity": { "usd": 1500.0 }
                },
                {
                    "chainId": "solana",
                    "dexId": "raydium",
                    "pairAddress": "So1ana",
                    "baseToken": { "address": TOKEN, "symbol": "PEPE" },
                    "quoteToken": { "address": "x", "symbol": "SOL" },
                    "priceNative": "1"
                }
            ]
        }))
        .unwrap();
        body.pairs.unwrap()
    }

    #[test]
    fn test_filters_chains_and_dedups() {
        let pools = convert_pairs(pairs_fixture(), &token(), &ChainId::ALL, 0.20);
        assert_eq!(pools.len(), 2);
        assert_eq!(pools[0].chain, ChainId::Ethereum);
        assert_eq!(pools[1].chain, ChainId::Bsc);

        let eth_only = convert_pairs(pairs_fixture(), &token(), &[ChainId::Ethereum], 0.20);
        assert_eq!(eth_only.len(), 1);
        assert_eq!(eth_only[0].pool_id, "0xA43fe16908251ee70EF74718545e4FE6C5cCEc9f");
    }

    #[test]
    fn test_base_side_pair() {
        let pools = convert_pairs(pairs_fixture(), &token(), &[ChainId::Ethereum], 0.20);
        let pool = &pools[0];

        assert_eq!(pool.platform, "Uniswap v2");
        assert_eq!(pool.pair, "PEPE/WETH");
        assert_eq!(pool.fee_tier, "N/A");
        assert_eq!(pool.tvl_usd, "$25.00M");
        assert_eq!(pool.volume_24h_usd, "$1.23M");
        assert_eq!(pool.current_price, "$4.0000e-9");
        assert!(pool.range_is_estimated);
        assert!(pool.positions.is_empty());
        assert!((pool.price_lower - 0.000000004 * 0.8).abs() < 1e-18);
        assert!((pool.price_upper - 0.000000004 * 1.2).abs() < 1e-18);
    }

    #[test]
    fn test_quote_side_pair_inverts() {
        let pools = convert_pairs(pairs_fixture(), &token(), &[ChainId::Bsc], 0.20);
        let pool = &pools[0];

        assert_eq!(pool.platform, "PancakeSwap");
        assert_eq!(pool.pair, "PEPE/USDT");
        assert!((pool.current_price_num - 0.25).abs() < 1e-12);
        // ±20% of the inverted price, not the inverse of ±20%
        assert!((pool.price_lower - 0.2).abs() < 1e-12);
        assert!((pool.price_upper - 0.3).abs() < 1e-12);
        assert!((pool.price_lower / pool.current_price_num - 0.8).abs() < 1e-12);
        assert!((pool.price_upper / pool.current_price_num - 1.2).abs() < 1e-12);
        assert_eq!(pool.tvl_usd, "$1.50K");
        assert_eq!(pool.volume_24h_usd, "$0.00");
    }

    #[test]
    fn test_null_pairs() {
        let body: TokenPairsResponse =
            serde_json::from_value(json!({ "schemaVersion": "1.0.0", "pairs": null })).unwrap();
        assert!(body.pairs.is_none());
        assert!(convert_pairs(Vec::new(), &token(), &ChainId::ALL, 0.2).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let config = Config {
            aggregator_url: "http://127.0.0.1:1/tokens".to_string(),
            ..Config::default()
        };
        let source = AggregatorSource::new(Client::new(), &config, ChainId::ALL.to_vec());
        assert!(source.fetch_pools(&token()).await.is_err());
    }
}
