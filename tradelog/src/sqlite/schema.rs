use anyhow::Context;
use corelib::{FeeBreakdown, Period};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// Fee accumulator columns shared by `pool_history` and both candle tables.
pub(super) const FEE_COLUMNS: [&str; 12] = [
    "base_interest",
    "quote_interest",
    "base_swap_fee",
    "quote_swap_fee",
    "base_arb_profit_tax",
    "quote_arb_profit_tax",
    "base_l_tax",
    "quote_l_tax",
    "base_exit_fee",
    "quote_exit_fee",
    "base_total_fee",
    "quote_total_fee",
];

pub(super) fn candle_table(period: Period) -> &'static str {
    match period {
        Period::Hourly => "hourly_candles",
        Period::Daily => "daily_candles",
    }
}

/// Values in `FEE_COLUMNS` order.
pub(super) fn fee_values(f: &FeeBreakdown) -> [f64; 12] {
    [
        f.base_interest,
        f.quote_interest,
        f.base_swap_fee,
        f.quote_swap_fee,
        f.base_arb_profit_tax,
        f.quote_arb_profit_tax,
        f.base_l_tax,
        f.quote_l_tax,
        f.base_exit_fee,
        f.quote_exit_fee,
        f.base_total_fee,
        f.quote_total_fee,
    ]
}

pub(super) fn fees_from_row(row: &SqliteRow) -> anyhow::Result<FeeBreakdown> {
    let mut v = [0.0f64; 12];
    for (slot, col) in v.iter_mut().zip(FEE_COLUMNS) {
        *slot = row.try_get(col).with_context(|| format!("fee column {col}"))?;
    }

    Ok(FeeBreakdown {
        base_interest: v[0],
        quote_interest: v[1],
        base_swap_fee: v[2],
        quote_swap_fee: v[3],
        base_arb_profit_tax: v[4],
        quote_arb_profit_tax: v[5],
        base_l_tax: v[6],
        quote_l_tax: v[7],
        base_exit_fee: v[8],
        quote_exit_fee: v[9],
        base_total_fee: v[10],
        quote_total_fee: v[11],
    })
}

fn fee_column_ddl() -> String {
    FEE_COLUMNS
        .iter()
        .map(|c| format!("{c} REAL NOT NULL DEFAULT 0.0"))
        .collect::<Vec<_>>()
        .join(",\n                ")
}

fn candle_ddl(table: &str) -> String {
    format!(
        r#"
            CREATE TABLE IF NOT EXISTS {table} (
                pool_id TEXT NOT NULL,
                base TEXT NOT NULL,
                quote TEXT NOT NULL,
                start_ms INTEGER NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                base_volume REAL NOT NULL DEFAULT 0.0,
                quote_volume REAL NOT NULL DEFAULT 0.0,
                {fees},
                UNIQUE (pool_id, base, quote, start_ms)
            );
        "#,
        fees = fee_column_ddl()
    )
}

pub(super) fn statements() -> Vec<String> {
    vec![
        r#"
            CREATE TABLE IF NOT EXISTS trades (
                pool_id TEXT NOT NULL,
                trade_ref TEXT NOT NULL,
                sub_index INTEGER NOT NULL DEFAULT 0,
                base TEXT NOT NULL,
                quote TEXT NOT NULL,
                base_qty INTEGER NOT NULL,
                quote_qty INTEGER NOT NULL,
                side TEXT NOT NULL,
                ts_ms INTEGER NOT NULL,
                UNIQUE (trade_ref, sub_index)
            );
        "#
        .to_string(),
        "CREATE INDEX IF NOT EXISTS trades_by_market_and_time ON trades(pool_id, base, quote, ts_ms);"
            .to_string(),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS pool_history (
                pool_id TEXT NOT NULL,
                settlement_ref TEXT NOT NULL,
                base TEXT NOT NULL,
                quote TEXT NOT NULL,
                kind TEXT NOT NULL,
                ts_ms INTEGER NOT NULL,
                {fees}
            );
        "#,
            fees = fee_column_ddl()
        ),
        "CREATE INDEX IF NOT EXISTS pool_history_by_market ON pool_history(pool_id, base, quote, ts_ms);"
            .to_string(),
        candle_ddl(candle_table(Period::Hourly)),
        candle_ddl(candle_table(Period::Daily)),
        r#"
            CREATE TABLE IF NOT EXISTS assets (
                asset TEXT PRIMARY KEY,
                symbol TEXT NOT NULL UNIQUE,
                decimals INTEGER NOT NULL,
                description TEXT
            );
        "#
        .to_string(),
        r#"
            CREATE TABLE IF NOT EXISTS supplies (
                asset TEXT PRIMARY KEY,
                supply REAL
            );
        "#
        .to_string(),
    ]
}
