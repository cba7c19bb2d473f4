//! Fixed-point scaling shared by tickers, trades and candles.
//!
//! Raw amounts are integers in the asset's smallest unit. A raw price is
//! `quote_qty / base_qty`; turning it into a display price multiplies by
//! `10^(base_decimals - quote_decimals)`.

/// `10^(base_decimals - quote_decimals)`.
pub fn price_coefficient(base_decimals: u32, quote_decimals: u32) -> f64 {
    10f64.powi(base_decimals as i32 - quote_decimals as i32)
}

/// Raw price of one base unit in quote units. `None` when the base leg is empty.
pub fn raw_price(base_qty: i64, quote_qty: i64) -> Option<f64> {
    if base_qty == 0 {
        return None;
    }
    Some(quote_qty as f64 / base_qty as f64)
}

/// Divides a raw amount by `10^decimals`.
pub fn scale_amount(raw: f64, decimals: u32) -> f64 {
    raw / 10f64.powi(decimals as i32)
}
