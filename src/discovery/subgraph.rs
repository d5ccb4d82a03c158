//! The Graph subgraph source
//!
//! Two round-trips per DEX deployment:
//! 1. `pools0` / `pools1`: pools where the token is token0 or token1
//! 2. `positions` for each pool, top N by liquidity (pools run concurrently)
//!
//! Gateway endpoints need an API key. Without one the source returns an
//! empty list and never touches the network.

use alloy_primitives::U256;
use async_trait::async_trait;
use eyre::{eyre, Result};
use futures::future::join_all;
use reqwest::Client;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Display;
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::{dedup_by_key, PoolSource};
use crate::chains::DexSource;
use crate::config::Config;
use crate::format::{format_fee_tier, format_price, format_price_range, format_usd};
use crate::math::{
    default_tick_band, estimate_position_liquidity_usd, is_in_range, orient_bounds, orient_price,
    price_to_tick, sqrt_price_x96_to_price, tick_to_price,
};
use crate::types::{PoolResult, PositionResult, TokenAddress};

/// Tick spacings either side of the current tick when a pool has no positions
const FALLBACK_BAND_SPACINGS: i32 = 10;

// ============================================
// QUERIES
// ============================================

const POOL_FIELDS: &str = r#"
      id
      token0 { id symbol name decimals }
      token1 { id symbol name decimals }
      feeTier
      sqrtPrice
      tick
      liquidity
      totalValueLockedUSD
      volumeUSD
      poolDayData(first: 1, orderBy: date, orderDirection: desc) { volumeUSD }
"#;

fn pools_query() -> String {
    format!(
        r#"
  query GetPoolsByToken($tokenAddress: String!, $first: Int!) {{
    pools0: pools(first: $first, where: {{ token0: $tokenAddress }}, orderBy: totalValueLockedUSD, orderDirection: desc) {{{fields}    }}
    pools1: pools(first: $first, where: {{ token1: $tokenAddress }}, orderBy: totalValueLockedUSD, orderDirection: desc) {{{fields}    }}
  }}
"#,
        fields = POOL_FIELDS
    )
}

const POSITIONS_QUERY: &str = r#"
  query GetTopPositions($poolId: String!, $first: Int!) {
    positions(first: $first, where: { pool: $poolId, liquidity_gt: "0" }, orderBy: liquidity, orderDirection: desc) {
      id
      owner
      liquidity
      tickLower { tickIdx }
      tickUpper { tickIdx }
    }
  }
"#;

// ============================================
// WIRE TYPES
// ============================================

/// Subgraphs encode BigInt / BigDecimal as strings; accept numbers too
fn de_number<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => s.trim().parse().map_err(de::Error::custom),
        Value::Number(n) => n.to_string().parse().map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("expected a number, got {}", other))),
    }
}

fn de_opt_number<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => s.trim().parse().map(Some).map_err(de::Error::custom),
        Value::Number(n) => n.to_string().parse().map(Some).map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("expected a number, got {}", other))),
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct PoolsData {
    #[serde(default)]
    pools0: Vec<RawPool>,
    #[serde(default)]
    pools1: Vec<RawPool>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawToken {
    id: String,
    symbol: String,
    #[serde(deserialize_with = "de_number")]
    decimals: u8,
}

#[derive(Debug, Clone, Deserialize)]
struct RawDayData {
    #[serde(rename = "volumeUSD", deserialize_with = "de_number")]
    volume_usd: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPool {
    id: String,
    token0: RawToken,
    token1: RawToken,
    #[serde(deserialize_with = "de_number")]
    fee_tier: u32,
    sqrt_price: String,
    #[serde(default, deserialize_with = "de_opt_number")]
    tick: Option<i32>,
    #[serde(deserialize_with = "de_number")]
    liquidity: f64,
    #[serde(rename = "totalValueLockedUSD", deserialize_with = "de_number")]
    total_value_locked_usd: f64,
    #[serde(default)]
    pool_day_data: Vec<RawDayData>,
}

#[derive(Debug, Deserialize)]
struct PositionsData {
    #[serde(default)]
    positions: Vec<RawPosition>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawTick {
    #[serde(rename = "tickIdx", deserialize_with = "de_number")]
    tick_idx: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPosition {
    id: String,
    owner: String,
    #[serde(deserialize_with = "de_number")]
    liquidity: f64,
    tick_lower: RawTick,
    tick_upper: RawTick,
}

// ============================================
// SOURCE
// ============================================

/// One DEX deployment queried through its subgraph
pub struct SubgraphSource {
    client: Client,
    dex: &'static DexSource,
    /// `None` when the gateway needs a key we don't have
    endpoint: Option<String>,
    pools_per_query: usize,
    positions_per_pool: usize,
}

impl SubgraphSource {
    pub fn new(client: Client, dex: &'static DexSource, config: &Config) -> Self {
        Self {
            client,
            dex,
            endpoint: config.subgraph_url(dex),
            pools_per_query: config.pools_per_query,
            positions_per_pool: config.positions_per_pool,
        }
    }

    /// POST a GraphQL query and unwrap `data`, turning `errors` into an Err
    async fn query<T: DeserializeOwned>(&self, endpoint: &str, query: &str, variables: Value) -> Result<T> {
        let response = self
            .client
            .post(endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(eyre!("HTTP {}: {}", status, truncate(&body, 200)));
        }

        let parsed: GraphQlResponse<T> = response.json().await?;

        if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
            let messages = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(eyre!("Subgraph error: {}", messages));
        }

        parsed.data.ok_or_else(|| eyre!("Subgraph returned no data"))
    }

    async fn fetch_positions(&self, endpoint: &str, pool_id: &str) -> Result<Vec<RawPosition>> {
        let data: PositionsData = self
            .query(
                endpoint,
                POSITIONS_QUERY,
                json!({ "poolId": pool_id, "first": self.positions_per_pool }),
            )
            .await?;
        Ok(data.positions)
    }
}

#[async_trait]
impl PoolSource for SubgraphSource {
    fn name(&self) -> String {
        format!("{} {} ({})", self.dex.name, self.dex.version, self.dex.chain)
    }

    async fn fetch_pools(&self, token: &TokenAddress) -> Result<Vec<PoolResult>> {
        let Some(endpoint) = self.endpoint.as_deref() else {
            info!("Skipping {}: no Graph API key configured", self.dex.id);
            return Ok(Vec::new());
        };

        let data: PoolsData = self
            .query(
                endpoint,
                &pools_query(),
                json!({ "tokenAddress": token.to_lowercase_hex(), "first": self.pools_per_query }),
            )
            .await?;

        let pools = dedup_by_key(data.pools0.into_iter().chain(data.pools1), |p| p.id.clone());
        debug!("{}: {} unique pools", self.dex.id, pools.len());

        let positions = if self.positions_per_pool == 0 {
            vec![Vec::new(); pools.len()]
        } else {
            join_all(pools.iter().map(|pool| async move {
                match self.fetch_positions(endpoint, &pool.id).await {
                    Ok(positions) => positions,
                    Err(e) => {
                        warn!("Positions for {} on {} failed: {:#}", pool.id, self.dex.id, e);
                        Vec::new()
                    }
                }
            }))
            .await
        };

        Ok(pools
            .iter()
            .zip(positions)
            .map(|(pool, positions)| build_pool_result(self.dex, pool, token, &positions))
            .collect())
    }
}

// ============================================
// NORMALIZATION
// ============================================

/// Turn one raw subgraph pool (plus its top positions) into a `PoolResult`
fn build_pool_result(
    dex: &DexSource,
    pool: &RawPool,
    token: &TokenAddress,
    positions: &[RawPosition],
) -> PoolResult {
    let (d0, d1) = (pool.token0.decimals, pool.token1.decimals);
    let token_is_token0 = token.matches(&pool.token0.id);
    let (ours, theirs) = if token_is_token0 {
        (&pool.token0, &pool.token1)
    } else {
        (&pool.token1, &pool.token0)
    };

    let raw_price = U256::from_str(pool.sqrt_price.trim())
        .ok()
        .filter(|sp| !sp.is_zero())
        .map(|sp| sqrt_price_x96_to_price(sp, d0, d1))
        .or_else(|| pool.tick.map(|t| tick_to_price(t, d0, d1)))
        .unwrap_or(0.0);
    let current_tick = pool
        .tick
        .or_else(|| price_to_tick(raw_price, d0, d1))
        .unwrap_or(0);
    let current_price = orient_price(raw_price, token_is_token0);

    let pair = format!("{}/{}", ours.symbol, theirs.symbol);
    let fee_tier = format_fee_tier(pool.fee_tier);
    let tvl = pool.total_value_locked_usd;

    let position_results: Vec<PositionResult> = positions
        .iter()
        .enumerate()
        .map(|(i, pos)| {
            let (lower, upper) = orient_bounds(
                tick_to_price(pos.tick_lower.tick_idx, d0, d1),
                tick_to_price(pos.tick_upper.tick_idx, d0, d1),
                token_is_token0,
            );
            PositionResult {
                rank: i + 1,
                id: pos.id.clone(),
                owner: pos.owner.clone(),
                liquidity_usd: format_usd(estimate_position_liquidity_usd(
                    pos.liquidity,
                    pool.liquidity,
                    tvl,
                )),
                price_lower: format_price(lower),
                price_upper: format_price(upper),
                is_in_range: is_in_range(current_tick, pos.tick_lower.tick_idx, pos.tick_upper.tick_idx),
                platform: dex.name.to_string(),
                chain: dex.chain,
                pair: pair.clone(),
                fee_tier: fee_tier.clone(),
            }
        })
        .collect();

    let (price_lower, price_upper) = if positions.is_empty() {
        let (tick_lower, tick_upper) =
            default_tick_band(current_tick, pool.fee_tier, FALLBACK_BAND_SPACINGS);
        orient_bounds(
            tick_to_price(tick_lower, d0, d1),
            tick_to_price(tick_upper, d0, d1),
            token_is_token0,
        )
    } else {
        // widest span covered by the top positions
        positions
            .iter()
            .map(|pos| {
                orient_bounds(
                    tick_to_price(pos.tick_lower.tick_idx, d0, d1),
                    tick_to_price(pos.tick_upper.tick_idx, d0, d1),
                    token_is_token0,
                )
            })
            .fold((f64::INFINITY, 0.0_f64), |(lo, hi), (l, u)| (lo.min(l), hi.max(u)))
    };

    let volume_24h = pool
        .pool_day_data
        .first()
        .map(|d| d.volume_usd)
        .unwrap_or(0.0);

    PoolResult {
        pool_id: pool.id.clone(),
        platform: dex.name.to_string(),
        chain: dex.chain,
        pair,
        fee_tier,
        tvl_usd: format_usd(tvl),
        volume_24h_usd: format_usd(volume_24h),
        current_price: format_price(current_price),
        price_range: format_price_range(price_lower, price_upper),
        price_lower,
        price_upper,
        current_price_num: current_price,
        range_is_estimated: positions.is_empty(),
        positions: position_results,
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
