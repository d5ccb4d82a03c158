//! Concentrated-liquidity price math
//!
//! Converts on-chain tick / sqrtPriceX96 values into human prices and
//! estimates how much of a pool's TVL a single position represents.
//!
//! All prices are "token1 per token0", scaled by the decimal difference.

use alloy_primitives::U256;

/// 2^96 as f64
const Q96: f64 = 79_228_162_514_264_337_593_543_950_336.0;

/// Base of the tick price scale
const TICK_BASE: f64 = 1.0001;

/// 10^(decimals0 - decimals1)
fn decimal_adjustment(decimals0: u8, decimals1: u8) -> f64 {
    10_f64.powi(decimals0 as i32 - decimals1 as i32)
}

/// price = 1.0001^tick * 10^(decimals0 - decimals1)
pub fn tick_to_price(tick: i32, decimals0: u8, decimals1: u8) -> f64 {
    TICK_BASE.powi(tick) * decimal_adjustment(decimals0, decimals1)
}

/// tick = log_1.0001(price / 10^(decimals0 - decimals1)), rounded down
pub fn price_to_tick(price: f64, decimals0: u8, decimals1: u8) -> Option<i32> {
    if price <= 0.0 || !price.is_finite() {
        return None;
    }
    let raw = price / decimal_adjustment(decimals0, decimals1);
    Some((raw.ln() / TICK_BASE.ln()).floor() as i32)
}

/// Lossy U256 -> f64, summing limbs from the most significant one
pub fn u256_to_f64(value: U256) -> f64 {
    value
        .as_limbs()
        .iter()
        .rev()
        .fold(0.0, |acc, limb| acc * 18_446_744_073_709_551_616.0 + *limb as f64)
}

/// price = (sqrtPriceX96 / 2^96)^2 * 10^(decimals0 - decimals1)
pub fn sqrt_price_x96_to_price(sqrt_price_x96: U256, decimals0: u8, decimals1: u8) -> f64 {
    if sqrt_price_x96.is_zero() {
        return 0.0;
    }
    let ratio = u256_to_f64(sqrt_price_x96) / Q96;
    ratio * ratio * decimal_adjustment(decimals0, decimals1)
}

/// Inverse of [`sqrt_price_x96_to_price`], saturating at zero for bad input
pub fn price_to_sqrt_price_x96(price: f64, decimals0: u8, decimals1: u8) -> U256 {
    if price <= 0.0 || !price.is_finite() {
        return U256::ZERO;
    }
    let raw = price / decimal_adjustment(decimals0, decimals1);
    let scaled = raw.sqrt() * Q96;
    U256::from_str_radix(&format!("{:.0}", scaled), 10).unwrap_or(U256::ZERO)
}

/// Tick spacing implied by a fee tier (hundredths of a bip)
pub fn tick_spacing_for_fee(fee_tier: u32) -> i32 {
    match fee_tier {
        100 => 1,
        500 => 10,
        3000 => 60,
        _ => 200,
    }
}

/// Band of `spacings` tick spacings either side of `tick`, aligned to the grid.
/// Used when a pool has no position data to derive a range from.
pub fn default_tick_band(tick: i32, fee_tier: u32, spacings: i32) -> (i32, i32) {
    let spacing = tick_spacing_for_fee(fee_tier);
    let lower = tick.div_euclid(spacing) * spacing - spacing * spacings;
    let upper = (tick + spacing - 1).div_euclid(spacing) * spacing + spacing * spacings;
    (lower, upper)
}

/// A position is active while `tick_lower <= current_tick < tick_upper`
pub fn is_in_range(current_tick: i32, tick_lower: i32, tick_upper: i32) -> bool {
    current_tick >= tick_lower && current_tick < tick_upper
}

/// Position share of pool TVL: (position_liquidity / pool_liquidity) * pool_tvl_usd.
/// Zero when the pool reports no liquidity.
pub fn estimate_position_liquidity_usd(
    position_liquidity: f64,
    pool_liquidity: f64,
    pool_tvl_usd: f64,
) -> f64 {
    if pool_liquidity <= 0.0 {
        return 0.0;
    }
    (position_liquidity / pool_liquidity) * pool_tvl_usd
}

/// Orient a token1-per-token0 price so it reads "queried token in counterpart".
/// Bounds swap when inverted; zero stays zero.
pub fn orient_price(price: f64, token_is_token0: bool) -> f64 {
    if token_is_token0 {
        price
    } else if price == 0.0 {
        0.0
    } else {
        1.0 / price
    }
}

/// Orient a (lower, upper) pair the same way as [`orient_price`]
pub fn orient_bounds(lower: f64, upper: f64, token_is_token0: bool) -> (f64, f64) {
    if token_is_token0 {
        (lower, upper)
    } else {
        (orient_price(upper, false), orient_price(lower, false))
    }
}
