//! Chain and DEX registries
//!
//! Fixed lookup tables loaded once at startup:
//! - Supported chains (BNB Chain, Ethereum, Base)
//! - DEX sources per chain with their subgraph deployments
//!
//! Nothing here is mutated after initialization.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================
// CHAIN IDENTIFIERS
// ============================================

/// Chains we know how to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainId {
    Bsc,
    Ethereum,
    Base,
}

impl ChainId {
    /// Every supported chain, in display order
    pub const ALL: [ChainId; 3] = [ChainId::Bsc, ChainId::Ethereum, ChainId::Base];

    /// Registry identifier (also the DexScreener chain id)
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainId::Bsc => "bsc",
            ChainId::Ethereum => "ethereum",
            ChainId::Base => "base",
        }
    }

    /// Static descriptor for this chain
    pub fn descriptor(&self) -> &'static Chain {
        // CHAINS is declared in ChainId::ALL order
        match self {
            ChainId::Bsc => &CHAINS[0],
            ChainId::Ethereum => &CHAINS[1],
            ChainId::Base => &CHAINS[2],
        }
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ChainId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bsc" | "bnb" | "binance" => Ok(ChainId::Bsc),
            "ethereum" | "eth" | "mainnet" => Ok(ChainId::Ethereum),
            "base" => Ok(ChainId::Base),
            other => Err(format!("unsupported chain: {}", other)),
        }
    }
}

// ============================================
// DESCRIPTORS
// ============================================

/// Represents a chain we can search
#[derive(Debug, Clone)]
pub struct Chain {
    pub id: ChainId,
    pub name: &'static str,
    pub native_currency: &'static str,
    pub explorer_url: &'static str,
}

/// Protocol generation of a DEX deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    V2,
    V3,
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolVersion::V2 => f.pad("v2"),
            ProtocolVersion::V3 => f.pad("v3"),
        }
    }
}

/// A DEX deployment on one chain
#[derive(Debug, Clone)]
pub struct DexSource {
    /// Registry key, e.g. `uniswap-v3-eth`
    pub id: &'static str,
    /// Platform name shown to users
    pub name: &'static str,
    pub chain: ChainId,
    /// Subgraph deployment id on The Graph decentralized network
    pub subgraph_id: &'static str,
    pub version: ProtocolVersion,
    /// `dexId` the aggregator API reports for this platform
    pub aggregator_dex_id: &'static str,
}

// ============================================
// REGISTRIES
// ============================================

lazy_static::lazy_static! {
    pub static ref CHAINS: Vec<Chain> = vec![
        Chain {
            id: ChainId::Bsc,
            name: "BNB Chain",
            native_currency: "BNB",
            explorer_url: "https://bscscan.com",
        },
        Chain {
            id: ChainId::Ethereum,
            name: "Ethereum",
            native_currency: "ETH",
            explorer_url: "https://etherscan.io",
        },
        Chain {
            id: ChainId::Base,
            name: "Base",
            native_currency: "ETH",
            explorer_url: "https://basescan.org",
        },
    ];

    pub static ref DEX_LIST: Vec<DexSource> = vec![
        // BSC
        DexSource {
            id: "pancakeswap-v3-bsc",
            name: "PancakeSwap",
            chain: ChainId::Bsc,
            subgraph_id: "78EUqzJmEVJsAKvWghn7qotf9LVGqcTQxJhT5z84ZmgJ",
            version: ProtocolVersion::V3,
            aggregator_dex_id: "pancakeswap",
        },
        // Ethereum
        DexSource {
            id: "uniswap-v3-eth",
            name: "Uniswap",
            chain: ChainId::Ethereum,
            subgraph_id: "5zvR82QoaXYFyDEKLZ9t6v9adgnptxYpKpSbxtgVENFV",
            version: ProtocolVersion::V3,
            aggregator_dex_id: "uniswap",
        },
        // Base
        DexSource {
            id: "uniswap-v3-base",
            name: "Uniswap",
            chain: ChainId::Base,
            subgraph_id: "43Hwfi3dJSoGpyas9VwNoDAv55yjgGrPpNSmbQZArzMG",
            version: ProtocolVersion::V3,
            aggregator_dex_id: "uniswap",
        },
    ];
}

// ============================================
// LOOKUPS
// ============================================

/// All DEX sources deployed on `chain`
pub fn dexes_by_chain(chain: ChainId) -> Vec<&'static DexSource> {
    DEX_LIST.iter().filter(|dex| dex.chain == chain).collect()
}

/// All DEX sources whose chain is in `chains`
pub fn dexes_for_chains(chains: &[ChainId]) -> Vec<&'static DexSource> {
    chains.iter().flat_map(|chain| dexes_by_chain(*chain)).collect()
}

/// Display name for an aggregator `dexId` on a chain, falling back to the raw id
pub fn platform_name(chain: ChainId, aggregator_dex_id: &str) -> String {
    DEX_LIST
        .iter()
        .find(|dex| dex.chain == chain && dex.aggregator_dex_id.eq_ignore_ascii_case(aggregator_dex_id))
        .map(|dex| dex.name.to_string())
        .unwrap_or_else(|| aggregator_dex_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_chain_has_descriptor() {
        for chain in ChainId::ALL {
            assert_eq!(chain.descriptor().id, chain);
        }
        assert_eq!(ChainId::Bsc.descriptor().native_currency, "BNB");
    }

    #[test]
    fn test_dex_filtering() {
        let bsc = dexes_by_chain(ChainId::Bsc);
        assert_eq!(bsc.len(), 1);
        assert_eq!(bsc[0].name, "PancakeSwap");

        let selected = dexes_for_chains(&[ChainId::Ethereum, ChainId::Base]);
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|d| d.chain != ChainId::Bsc));

        assert!(dexes_for_chains(&[]).is_empty());
    }

    #[test]
    fn test_chain_parsing() {
        assert_eq!("BSC".parse::<ChainId>().unwrap(), ChainId::Bsc);
        assert_eq!(" eth ".parse::<ChainId>().unwrap(), ChainId::Ethereum);
        assert!("solana".parse::<ChainId>().is_err());
    }

    #[test]
    fn test_display_honors_width() {
        assert_eq!(format!("[{:^9}]", ChainId::Base), "[  base   ]");
        assert_eq!(format!("[{:<4}]", ProtocolVersion::V3), "[v3  ]");
    }

    #[test]
    fn test_platform_name_lookup() {
        assert_eq!(platform_name(ChainId::Bsc, "pancakeswap"), "PancakeSwap");
        assert_eq!(platform_name(ChainId::Base, "aerodrome"), "aerodrome");
    }
}
