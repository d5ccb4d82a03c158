//! Display formatting for pool metrics
//!
//! Pure functions only. The ranking step parses `format_usd` output back
//! with `parse_usd`, so the two must stay in sync.

/// Prices at or above this render with 6 decimals, below it in exponential form
const SMALL_PRICE_THRESHOLD: f64 = 0.0001;

/// Fee tier in hundredths of a bip -> "0.30%"
pub fn format_fee_tier(fee_tier: u32) -> String {
    format!("{:.2}%", fee_tier as f64 / 10_000.0)
}

/// USD amount with K/M suffix: "$1.23M", "$45.60K", "$7.89"
pub fn format_usd(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    if value >= 1_000_000.0 {
        format!("${:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("${:.2}K", value / 1_000.0)
    } else {
        format!("${:.2}", value)
    }
}

/// Price with magnitude-dependent precision
pub fn format_price(price: f64) -> String {
    if !price.is_finite() {
        return "$0.00".to_string();
    }
    if price >= 1000.0 {
        format!("${:.2}", price)
    } else if price >= 1.0 {
        format!("${:.4}", price)
    } else if price >= SMALL_PRICE_THRESHOLD {
        format!("${:.6}", price)
    } else if price == 0.0 {
        "$0.00".to_string()
    } else {
        format!("${:.4e}", price)
    }
}

/// "$lower - $upper"
pub fn format_price_range(lower: f64, upper: f64) -> String {
    format!("{} - {}", format_price(lower), format_price(upper))
}

/// Parse a `format_usd` string back to a magnitude, honoring K/M.
/// Unparseable input ranks as zero.
pub fn parse_usd(formatted: &str) -> f64 {
    let trimmed = formatted.trim().trim_start_matches('$').replace(',', "");
    let (digits, multiplier) = if let Some(stripped) = trimmed.strip_suffix('M') {
        (stripped, 1_000_000.0)
    } else if let Some(stripped) = trimmed.strip_suffix('K') {
        (stripped, 1_000.0)
    } else {
        (trimmed.as_str(), 1.0)
    };

    digits
        .trim()
        .parse::<f64>()
        .map(|v| v * multiplier)
        .unwrap_or(0.0)
}
