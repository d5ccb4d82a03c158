//! Diagnostic tool - Check pool-tracker settings
//!
//! Run with: cargo run --bin diagnose

use std::env;

// Registry shared with the main binary
#[allow(dead_code)]
#[path = "../chains.rs"]
mod chains;

use chains::DEX_LIST;

fn mask(secret: &str) -> String {
    let secret = secret.trim();
    if secret.len() <= 8 || !secret.is_ascii() {
        "****".to_string()
    } else {
        format!("{}…{}", &secret[..4], &secret[secret.len() - 4..])
    }
}

/// Aliases accepted by `SourceStrategy::from_str` in src/types.rs
fn is_aggregator_strategy(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "aggregator" | "dexscreener" | "rest")
}

fn main() {
    println!("🔍 POOL TRACKER DIAGNOSTIC CHECK\n");

    // Load .env
    dotenvy::dotenv().ok();

    println!("═══════════════════════════════════════════════════");
    println!("                  CONFIGURATION                     ");
    println!("═══════════════════════════════════════════════════\n");

    // Defaults mirror the DEFAULT_* constants in src/config.rs
    let checks = [
        ("POOL_STRATEGY", "subgraph", "subgraph or aggregator"),
        ("DEFAULT_CHAINS", "bsc,ethereum,base", "Chains searched when --chains is absent"),
        ("MAX_RESULTS", "10", "Pools kept after ranking"),
        ("POOLS_PER_QUERY", "20", "first: for pools0 / pools1"),
        ("POSITIONS_PER_POOL", "10", "Top positions per pool"),
        ("ESTIMATED_RANGE_PCT", "0.20", "± range for aggregator pools"),
        ("HTTP_TIMEOUT_SECS", "30", "Per-request timeout"),
    ];

    for (key, default, desc) in checks {
        let value = env::var(key).unwrap_or_else(|_| default.to_string());
        let marker = if env::var(key).is_err() { "(default)" } else { "(from .env)" };
        println!("  {}: {} {}", key, value, marker);
        println!("    └─ {}\n", desc);
    }

    let api_key = env::var("GRAPH_API_KEY").ok().filter(|k| !k.trim().is_empty());
    let overrides = env::var("SUBGRAPH_OVERRIDES").unwrap_or_default();

    println!("═══════════════════════════════════════════════════");
    println!("                   SUBGRAPHS                        ");
    println!("═══════════════════════════════════════════════════\n");

    println!(
        "  GRAPH_API_KEY: {}",
        api_key.as_deref().map(|k| format!("✅ {}", mask(k))).unwrap_or_else(|| "❌ Not set".to_string())
    );

    let mut reachable = 0;
    for dex in DEX_LIST.iter() {
        let (id, chain) = (dex.id, dex.chain.descriptor().name);
        let overridden = overrides
            .split(',')
            .filter_map(|entry| entry.split_once('='))
            .any(|(key, url)| key.trim() == id && !url.trim().is_empty());
        let status = if overridden {
            reachable += 1;
            "✅ direct URL override"
        } else if api_key.is_some() {
            reachable += 1;
            "✅ via gateway"
        } else {
            "❌ skipped (no key, no override)"
        };
        println!("  {:<20} {:<10} {}", id, chain, status);
    }

    let strategy = env::var("POOL_STRATEGY").unwrap_or_else(|_| "subgraph".to_string());

    println!("\n═══════════════════════════════════════════════════");
    println!("                     STATUS                         ");
    println!("═══════════════════════════════════════════════════\n");

    if is_aggregator_strategy(&strategy) {
        println!("  ✅ Aggregator strategy: no key needed, ranges are estimated");
    } else if reachable == 0 {
        println!("  ⚠️  No subgraph is queryable - every search will come back empty");
        println!("     Set GRAPH_API_KEY or use --strategy aggregator");
    } else {
        println!("  ✅ {}/{} subgraphs queryable", reachable, DEX_LIST.len());
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_aliases() {
        assert!(is_aggregator_strategy(" DexScreener "));
        assert!(is_aggregator_strategy("rest"));
        assert!(!is_aggregator_strategy("subgraph"));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("short"), "****");
        assert_eq!(mask("abcd1234efgh5678"), "abcd…5678");
    }
}
