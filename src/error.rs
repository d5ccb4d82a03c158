//! Validation errors surfaced to the caller before any network activity.
//!
//! Upstream failures never reach this type: each source reports them as an
//! `eyre::Report` that the fan-out logs and drops.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("invalid token address {0:?}: expected 0x followed by 40 hex characters")]
    InvalidTokenAddress(String),

    #[error("no chains selected")]
    EmptyChainSelection,

    #[error("unsupported chain: {0}")]
    UnsupportedChain(String),
}
