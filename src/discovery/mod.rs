//! Pool Discovery
//!
//! Fans out one query per selected source, merges whatever comes back and
//! ranks it by TVL.
//!
//! ## Sources
//!
//! - **SubgraphSource**: one per DEX deployment, GraphQL pools + positions
//! - **AggregatorSource**: one DexScreener call covering every chain
//!
//! ## Failure model
//!
//! A source that errors contributes nothing. The search itself only fails
//! on bad input, never because an upstream did.

mod aggregator;
mod subgraph;

pub use aggregator::AggregatorSource;
pub use subgraph::SubgraphSource;

use async_trait::async_trait;
use chrono::Utc;
use eyre::Result;
use futures::future::join_all;
use reqwest::Client;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::chains::{dexes_for_chains, ChainId};
use crate::config::Config;
use crate::error::DiscoveryError;
use crate::format::parse_usd;
use crate::types::{validate_chains, PoolResult, SearchReport, SourceStrategy, TokenAddress};

// ============================================
// SOURCE INTERFACE
// ============================================

/// Anything that can list pools for a token
#[async_trait]
pub trait PoolSource: Send + Sync {
    /// Label used in logs
    fn name(&self) -> String;

    /// Pools for `token`. Errors are isolated by the caller.
    async fn fetch_pools(&self, token: &TokenAddress) -> Result<Vec<PoolResult>>;
}

/// Shared HTTP client for every source in a search
pub fn build_http_client(config: &Config) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .user_agent(concat!("pool-tracker/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Sources for the configured strategy, restricted to `chains`
pub fn build_sources(
    config: &Config,
    client: &Client,
    chains: &[ChainId],
) -> Vec<Box<dyn PoolSource>> {
    match config.strategy {
        SourceStrategy::Subgraph => dexes_for_chains(chains)
            .into_iter()
            .map(|dex| {
                Box::new(SubgraphSource::new(client.clone(), dex, config)) as Box<dyn PoolSource>
            })
            .collect(),
        SourceStrategy::Aggregator => vec![Box::new(AggregatorSource::new(
            client.clone(),
            config,
            chains.to_vec(),
        ))],
    }
}

// ============================================
// SEARCH
// ============================================

/// Validate input, query every matching source, and rank the results
pub async fn search_pools(
    config: &Config,
    token_input: &str,
    chains: &[ChainId],
) -> std::result::Result<SearchReport, DiscoveryError> {
    let token = TokenAddress::parse(token_input)?;
    let chains = validate_chains(chains)?;

    let client = match build_http_client(config) {
        Ok(client) => client,
        Err(e) => {
            // builder only fails on TLS backend init; searching without sources is still a result
            warn!("HTTP client setup failed: {}", e);
            return Ok(empty_report(config, &token, chains));
        }
    };
    let sources = build_sources(config, &client, &chains);

    info!(
        "🔎 Searching {} on {} via {} ({} sources)",
        token,
        chains.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", "),
        config.strategy,
        sources.len()
    );

    let start = Instant::now();
    let (pools, failed) = gather_pools(&sources, &token).await;
    let pools = rank_and_truncate(pools, config.max_results);

    let report = SearchReport {
        token_address: token.to_string(),
        chains,
        strategy: config.strategy,
        pools,
        sources_queried: sources.len(),
        sources_failed: failed,
        searched_at: Utc::now(),
        elapsed_ms: start.elapsed().as_millis(),
    };

    info!("✓ {}", report.summary());
    Ok(report)
}

fn empty_report(config: &Config, token: &TokenAddress, chains: Vec<ChainId>) -> SearchReport {
    SearchReport {
        token_address: token.to_string(),
        chains,
        strategy: config.strategy,
        pools: Vec::new(),
        sources_queried: 0,
        sources_failed: 0,
        searched_at: Utc::now(),
        elapsed_ms: 0,
    }
}

/// Query every source concurrently. Returns merged pools and the failure count.
pub async fn gather_pools(
    sources: &[Box<dyn PoolSource>],
    token: &TokenAddress,
) -> (Vec<PoolResult>, usize) {
    let results = join_all(sources.iter().map(|source| async move {
        let started = Instant::now();
        let result = source.fetch_pools(token).await;
        (source.name(), started.elapsed(), result)
    }))
    .await;

    let mut merged = Vec::new();
    let mut failed = 0;

    for (name, elapsed, result) in results {
        match result {
            Ok(pools) => {
                debug!("{}: {} pools in {:?}", name, pools.len(), elapsed);
                merged.extend(pools);
            }
            Err(e) => {
                warn!("Error querying {}: {:#}", name, e);
                failed += 1;
            }
        }
    }

    (merged, failed)
}

// ============================================
// MERGE / RANK
// ============================================

/// Keep the first occurrence of every key
pub fn dedup_by_key<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    K: Eq + std::hash::Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}

/// Sort by parsed TVL (descending, stable) and keep the top `limit`
pub fn rank_and_truncate(mut pools: Vec<PoolResult>, limit: usize) -> Vec<PoolResult> {
    pools.sort_by(|a, b| parse_usd(&b.tvl_usd).total_cmp(&parse_usd(&a.tvl_usd)));
    pools.truncate(limit);
    pools
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use eyre::eyre;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    pub(crate) fn pool(id: &str, tvl: &str) -> PoolResult {
        PoolResult {
            pool_id: id.to_string(),
            platform: "Uniswap".to_string(),
            chain: ChainId::Ethereum,
            pair: "TKN/WETH".to_string(),
            fee_tier: "0.30%".to_string(),
            tvl_usd: tvl.to_string(),
            volume_24h_usd: "$0.00".to_string(),
            current_price: "$1.0000".to_string(),
            price_range: "$0.800000 - $1.2000".to_string(),
            price_lower: 0.8,
            price_upper: 1.2,
            current_price_num: 1.0,
            range_is_estimated: false,
            positions: Vec::new(),
        }
    }

    fn token() -> TokenAddress {
        TokenAddress::parse(&format!("0x{}", "a".repeat(40))).unwrap()
    }

    struct StaticSource {
        pools: Vec<PoolResult>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PoolSource for StaticSource {
        fn name(&self) -> String {
            "static".to_string()
        }

        async fn fetch_pools(&self, _token: &TokenAddress) -> Result<Vec<PoolResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.pools.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl PoolSource for FailingSource {
        fn name(&self) -> String {
            "failing".to_string()
        }

        async fn fetch_pools(&self, _token: &TokenAddress) -> Result<Vec<PoolResult>> {
            Err(eyre!("HTTP 502 Bad Gateway"))
        }
    }

    #[test]
    fn test_ranking_by_suffix() {
        let ranked = rank_and_truncate(
            vec![pool("c", "$10.00"), pool("a", "$2.00M"), pool("b", "$500.00K")],
            10,
        );
        let tvls: Vec<_> = ranked.iter().map(|p| p.tvl_usd.as_str()).collect();
        assert_eq!(tvls, vec!["$2.00M", "$500.00K", "$10.00"]);
    }

    #[test]
    fn test_truncation() {
        let pools = (0..15)
            .map(|i| pool(&format!("p{}", i), &format!("${}.00", i)))
            .collect();
        let ranked = rank_and_truncate(pools, 10);
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].pool_id, "p14");
        assert_eq!(ranked[9].pool_id, "p5");
    }

    #[test]
    fn test_dedup_keeps_first() {
        let angle0 = vec![pool("0x1", "$1.00"), pool("0x2", "$2.00")];
        let angle1 = vec![pool("0x2", "$99.00"), pool("0x3", "$3.00")];
        let merged = dedup_by_key(angle0.into_iter().chain(angle1), |p| p.pool_id.clone());

        let ids: Vec<_> = merged.iter().map(|p| p.pool_id.as_str()).collect();
        assert_eq!(ids, vec!["0x1", "0x2", "0x3"]);
        assert_eq!(merged[1].tvl_usd, "$2.00");
    }

    #[tokio::test]
    async fn test_failing_source_is_isolated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sources: Vec<Box<dyn PoolSource>> = vec![
            Box::new(FailingSource),
            Box::new(StaticSource {
                pools: vec![pool("0xgood", "$1.00K")],
                calls: calls.clone(),
            }),
        ];

        let (pools, failed) = gather_pools(&sources, &token()).await;
        assert_eq!(failed, 1);
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].pool_id, "0xgood");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_search_rejects_bad_input_before_querying() {
        let config = Config::default();

        let err = search_pools(&config, "0x123", &ChainId::ALL).await.unwrap_err();
        assert_eq!(err, DiscoveryError::InvalidTokenAddress("0x123".to_string()));

        let err = search_pools(&config, &format!("0x{}", "a".repeat(40)), &[])
            .await
            .unwrap_err();
        assert_eq!(err, DiscoveryError::EmptyChainSelection);
    }

    #[tokio::test]
    async fn test_search_without_key_is_empty_not_error() {
        // Gateway sources short-circuit without a key, so nothing hits the network
        let config = Config::default();
        let report = search_pools(&config, &format!("0x{}", "a".repeat(40)), &ChainId::ALL)
            .await
            .unwrap();

        assert!(report.is_empty());
        assert_eq!(report.sources_queried, 3);
        assert_eq!(report.sources_failed, 0);
    }

    #[test]
    fn test_build_sources_per_strategy() {
        let client = Client::new();
        let config = Config::default();
        assert_eq!(build_sources(&config, &client, &[ChainId::Bsc, ChainId::Base]).len(), 2);

        let config = Config {
            strategy: SourceStrategy::Aggregator,
            ..Config::default()
        };
        assert_eq!(build_sources(&config, &client, &ChainId::ALL).len(), 1);
    }
}
