//! Console and JSON output for a search report

use console::{style, StyledObject};
use eyre::Result;

use crate::chains::ChainId;
use crate::types::{PoolResult, PositionResult, SearchReport};

pub const EMPTY_MESSAGE: &str =
    "No liquidity pools found. Please check the Token Address and API Key.";

const RULE: &str = "───────────────────────────────────────────────────────────────";

/// Colored badge per chain
fn chain_badge(chain: ChainId) -> StyledObject<String> {
    let label = format!(" {} ", chain.descriptor().name);
    match chain {
        ChainId::Bsc => style(label).black().on_yellow().bold(),
        ChainId::Ethereum => style(label).white().on_blue().bold(),
        ChainId::Base => style(label).white().on_magenta().bold(),
    }
}

/// Estimated ranges read "~$0.80 - $1.20"
pub fn display_range(pool: &PoolResult) -> String {
    if pool.range_is_estimated {
        format!("~{}", pool.price_range)
    } else {
        pool.price_range.clone()
    }
}

fn status_label(in_range: bool) -> StyledObject<&'static str> {
    if in_range {
        style("Active").green()
    } else {
        style("Inactive").red()
    }
}

/// 0x1234…abcd
fn short_address(address: &str) -> String {
    if address.len() <= 12 || !address.is_char_boundary(6) || !address.is_char_boundary(address.len() - 4) {
        return address.to_string();
    }
    format!("{}…{}", &address[..6], &address[address.len() - 4..])
}

fn explorer_link(pool: &PoolResult) -> String {
    format!("{}/address/{}", pool.chain.descriptor().explorer_url, pool.pool_id)
}

fn position_row(position: &PositionResult) -> String {
    format!(
        "   {:>3}  {:<14} {:>12}  {:>14} - {:<14} {}",
        position.rank,
        short_address(&position.owner),
        position.liquidity_usd,
        position.price_lower,
        position.price_upper,
        status_label(position.is_in_range)
    )
}

/// One pool as a block of lines
pub fn pool_card(rank: usize, pool: &PoolResult) -> Vec<String> {
    let mut lines = vec![
        format!(
            "{} {} {}  {}  {}",
            style(format!("#{}", rank)).bold(),
            chain_badge(pool.chain),
            style(&pool.pair).cyan().bold(),
            pool.platform,
            style(&pool.fee_tier).dim()
        ),
        format!("   Pool:          {}", explorer_link(pool)),
        format!("   TVL:           {}", style(&pool.tvl_usd).green()),
        format!("   24h Volume:    {}", pool.volume_24h_usd),
        format!("   Current Price: {}", pool.current_price),
        format!("   Price Range:   {}", display_range(pool)),
    ];

    if pool.positions.is_empty() {
        if pool.range_is_estimated {
            lines.push(format!("   {}", style("(range estimated, no position data)").dim()));
        }
    } else {
        lines.push(format!(
            "   {:>3}  {:<14} {:>12}  {:>31} {}",
            style("#").dim(),
            style("Owner").dim(),
            style("Liquidity").dim(),
            style("Range").dim(),
            style("Status").dim()
        ));
        lines.extend(pool.positions.iter().map(position_row));
    }

    lines
}

/// Print every pool card, or the empty message
pub fn print_report(report: &SearchReport) {
    if report.is_empty() {
        println!("{}", style(EMPTY_MESSAGE).yellow());
        return;
    }

    println!(
        "{}",
        style(format!("═══ TOP {} POOLS ═══", report.pools.len())).green().bold()
    );
    for (i, pool) in report.pools.iter().enumerate() {
        println!("{}", style(RULE).dim());
        for line in pool_card(i + 1, pool) {
            println!("{}", line);
        }
    }
    println!("{}", style(RULE).dim());
    println!();
    println!("  • {}", report.summary());
}

/// Pretty JSON of the whole report
pub fn to_json(report: &SearchReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::tests::pool;
    use crate::types::SourceStrategy;
    use chrono::Utc;

    fn position(rank: usize, in_range: bool) -> PositionResult {
        PositionResult {
            rank,
            id: rank.to_string(),
            owner: "0x000000000000000000000000000000000000dEaD".to_string(),
            liquidity_usd: "$1.00K".to_string(),
            price_lower: "$0.900000".to_string(),
            price_upper: "$1.1000".to_string(),
            is_in_range: in_range,
            platform: "Uniswap".to_string(),
            chain: ChainId::Ethereum,
            pair: "TKN/WETH".to_string(),
            fee_tier: "0.30%".to_string(),
        }
    }

    fn report(pools: Vec<PoolResult>) -> SearchReport {
        SearchReport {
            token_address: format!("0x{}", "a".repeat(40)),
            chains: ChainId::ALL.to_vec(),
            strategy: SourceStrategy::Subgraph,
            pools,
            sources_queried: 3,
            sources_failed: 0,
            searched_at: Utc::now(),
            elapsed_ms: 42,
        }
    }

    fn plain(lines: &[String]) -> String {
        console::strip_ansi_codes(&lines.join("\n")).to_string()
    }

    #[test]
    fn test_card_with_positions() {
        let mut p = pool("0xpool", "$2.00M");
        p.positions = vec![position(1, true), position(2, false)];

        let text = plain(&pool_card(1, &p));
        assert!(text.contains("#1"));
        assert!(text.contains("Ethereum"));
        assert!(text.contains("TKN/WETH"));
        assert!(text.contains("$2.00M"));
        assert!(text.contains("https://etherscan.io/address/0xpool"));
        assert!(text.contains("0x0000…dEaD"));
        assert!(text.contains("Active"));
        assert!(text.contains("Inactive"));
        assert!(!text.contains("~$"));
    }

    #[test]
    fn test_estimated_range_prefix() {
        let mut p = pool("0xpair", "$10.00K");
        p.range_is_estimated = true;
        p.fee_tier = "N/A".to_string();

        assert_eq!(display_range(&p), "~$0.800000 - $1.2000");
        let text = plain(&pool_card(3, &p));
        assert!(text.contains("range estimated"));
        assert!(text.contains("N/A"));
    }

    #[test]
    fn test_short_address() {
        assert_eq!(short_address("0x1234567890abcdef"), "0x1234…cdef");
        assert_eq!(short_address("0xabc"), "0xabc");
    }

    #[test]
    fn test_json_output() {
        let json = to_json(&report(vec![pool("0xpool", "$1.00K")])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["strategy"], "subgraph");
        assert_eq!(value["sourcesQueried"], 3);
        assert_eq!(value["pools"][0]["poolId"], "0xpool");
        assert_eq!(value["pools"][0]["tvlUsd"], "$1.00K");
        assert_eq!(value["pools"][0]["chain"], "ethereum");
        assert_eq!(value["pools"][0]["rangeIsEstimated"], false);
    }

    #[test]
    fn test_empty_report_is_empty() {
        let empty = report(Vec::new());
        assert!(empty.is_empty());
        assert_eq!(
            EMPTY_MESSAGE,
            "No liquidity pools found. Please check the Token Address and API Key."
        );
    }
}
