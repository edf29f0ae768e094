//! # Utility Functions
//!
//! Display and conversion helpers for timestamps, fixed-point feed prices
//! and basis points.

/// Format a unix timestamp as UTC for display.
pub fn format_timestamp(ts: u64) -> String {
    chrono::DateTime::from_timestamp(ts as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("@{ts}"))
}

/// Render an unscaled fixed-point price at the given feed exponent.
///
/// `format_price(210_000_000_000, -8)` is `"2100.00000000"`.
pub fn format_price(price: i64, exponent: i32) -> String {
    let sign = if price < 0 { "-" } else { "" };
    let abs = (price as i128).unsigned_abs();
    if exponent >= 0 {
        let scaled = abs * 10u128.pow(exponent as u32);
        return format!("{sign}{scaled}");
    }
    let decimals = (-exponent) as u32;
    let scale = 10u128.pow(decimals);
    let whole = abs / scale;
    let frac = abs % scale;
    format!("{sign}{whole}.{frac:0width$}", width = decimals as usize)
}

/// Render basis points as a percentage, `200` -> `"2.00%"`.
pub fn format_bps(bps: u16) -> String {
    format!("{}.{:02}%", bps / 100, bps % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_prices_at_negative_exponents() {
        assert_eq!(format_price(210_000_000_000, -8), "2100.00000000");
        assert_eq!(format_price(200_000_000_000, -8), "2000.00000000");
        assert_eq!(format_price(1, -8), "0.00000001");
        assert_eq!(format_price(-150_000_000, -8), "-1.50000000");
    }

    #[test]
    fn formats_prices_at_zero_exponent() {
        assert_eq!(format_price(42, 0), "42");
    }

    #[test]
    fn formats_basis_points() {
        assert_eq!(format_bps(200), "2.00%");
        assert_eq!(format_bps(50), "0.50%");
        assert_eq!(format_bps(10_000), "100.00%");
        assert_eq!(format_bps(0), "0.00%");
    }

    #[test]
    fn formats_timestamps() {
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14 22:13:20 UTC");
    }
}
