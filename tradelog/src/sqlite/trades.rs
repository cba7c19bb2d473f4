use anyhow::Context;
use async_trait::async_trait;
use corelib::{Candle, FeeBreakdown, MarketKey, Period, TimeRange, TradeRow};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracing::{debug, warn};

use super::SqliteStore;
use super::schema::{FEE_COLUMNS, candle_table, fee_values, fees_from_row};
use crate::log::{SettlementRecord, TradeLog};

const TRADE_COLUMNS: &str = "pool_id, trade_ref, sub_index, base, quote, base_qty, quote_qty, side, ts_ms";

fn trade_from_row(row: &SqliteRow) -> anyhow::Result<TradeRow> {
    let side: String = row.try_get("side").context("trades.side")?;

    Ok(TradeRow {
        pool_id: row.try_get("pool_id").context("trades.pool_id")?,
        base: row.try_get("base").context("trades.base")?,
        quote: row.try_get("quote").context("trades.quote")?,
        base_qty: row.try_get("base_qty").context("trades.base_qty")?,
        quote_qty: row.try_get("quote_qty").context("trades.quote_qty")?,
        side: side.parse().map_err(anyhow::Error::msg)?,
        ts_ms: row.try_get("ts_ms").context("trades.ts_ms")?,
        trade_ref: row.try_get("trade_ref").context("trades.trade_ref")?,
        sub_index: u32::try_from(row.try_get::<i64, _>("sub_index")?).context("trades.sub_index")?,
    })
}

fn candle_from_row(period: Period, row: &SqliteRow) -> anyhow::Result<Candle> {
    Ok(Candle {
        key: MarketKey::new(
            row.try_get::<String, _>("pool_id")?,
            row.try_get::<String, _>("base")?,
            row.try_get::<String, _>("quote")?,
        ),
        period,
        start_ms: row.try_get("start_ms").context("candle start_ms")?,
        open: row.try_get("open")?,
        high: row.try_get("high")?,
        low: row.try_get("low")?,
        close: row.try_get("close")?,
        base_volume: row.try_get("base_volume")?,
        quote_volume: row.try_get("quote_volume")?,
        fees: fees_from_row(row)?,
    })
}

/// Decodes every row, dropping (and logging) the ones that do not map.
fn decode_all<T>(rows: &[SqliteRow], what: &str, f: impl Fn(&SqliteRow) -> anyhow::Result<T>) -> Vec<T> {
    rows.iter()
        .filter_map(|row| match f(row) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = %e, what, "skipping malformed row");
                None
            }
        })
        .collect()
}

impl SqliteStore {
    /// Appends a trade. A repeated `(trade_ref, sub_index)` is ignored.
    pub async fn record_trade(&self, trade: &TradeRow) -> anyhow::Result<bool> {
        let res = sqlx::query(&format!(
            "INSERT OR IGNORE INTO trades ({TRADE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&trade.pool_id)
        .bind(&trade.trade_ref)
        .bind(trade.sub_index as i64)
        .bind(&trade.base)
        .bind(&trade.quote)
        .bind(trade.base_qty)
        .bind(trade.quote_qty)
        .bind(trade.side.to_string())
        .bind(trade.ts_ms)
        .execute(&self.pool)
        .await?;

        let inserted = res.rows_affected() > 0;
        if !inserted {
            debug!(trade_id = %trade.trade_id(), "duplicate trade ignored");
        }
        Ok(inserted)
    }

    pub async fn record_settlement(&self, record: &SettlementRecord) -> anyhow::Result<()> {
        let sql = format!(
            "INSERT INTO pool_history (pool_id, settlement_ref, base, quote, kind, ts_ms, {}) VALUES (?, ?, ?, ?, ?, ?, {})",
            FEE_COLUMNS.join(", "),
            vec!["?"; FEE_COLUMNS.len()].join(", ")
        );

        let mut q = sqlx::query(&sql)
            .bind(&record.pool_id)
            .bind(&record.settlement_ref)
            .bind(&record.base)
            .bind(&record.quote)
            .bind(&record.kind)
            .bind(record.ts_ms);
        for v in fee_values(&record.fees) {
            q = q.bind(v);
        }
        q.execute(&self.pool).await?;

        Ok(())
    }

    async fn one_trade(&self, key: &MarketKey, order: &str) -> anyhow::Result<Option<TradeRow>> {
        let row = sqlx::query(&format!(
            "SELECT {TRADE_COLUMNS} FROM trades WHERE pool_id = ? AND base = ? AND quote = ? \
             ORDER BY ts_ms {order}, trade_ref {order}, sub_index {order} LIMIT 1"
        ))
        .bind(&key.pool_id)
        .bind(&key.base)
        .bind(&key.quote)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(trade_from_row).transpose()
    }
}

#[async_trait]
impl TradeLog for SqliteStore {
    async fn query_trades(&self, key: &MarketKey, range: TimeRange) -> anyhow::Result<Vec<TradeRow>> {
        let rows = sqlx::query(&format!(
            "SELECT {TRADE_COLUMNS} FROM trades \
             WHERE pool_id = ? AND base = ? AND quote = ? AND ts_ms >= ? AND ts_ms < ? \
             ORDER BY ts_ms ASC, trade_ref ASC, sub_index ASC"
        ))
        .bind(&key.pool_id)
        .bind(&key.base)
        .bind(&key.quote)
        .bind(range.start_ms)
        .bind(range.end_ms)
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_all(&rows, "trade", trade_from_row))
    }

    async fn first_trade(&self, key: &MarketKey) -> anyhow::Result<Option<TradeRow>> {
        self.one_trade(key, "ASC").await
    }

    async fn last_trade(&self, key: &MarketKey) -> anyhow::Result<Option<TradeRow>> {
        self.one_trade(key, "DESC").await
    }

    async fn query_aggregate_fees(&self, key: &MarketKey, range: TimeRange) -> anyhow::Result<FeeBreakdown> {
        // TOTAL() yields 0.0 on an empty set, so a mismatched orientation decodes as zeroes.
        let sums = FEE_COLUMNS
            .iter()
            .map(|c| format!("TOTAL({c}) AS {c}"))
            .collect::<Vec<_>>()
            .join(", ");

        let row = sqlx::query(&format!(
            "SELECT {sums} FROM pool_history \
             WHERE pool_id = ? AND base = ? AND quote = ? AND ts_ms >= ? AND ts_ms < ?"
        ))
        .bind(&key.pool_id)
        .bind(&key.base)
        .bind(&key.quote)
        .bind(range.start_ms)
        .bind(range.end_ms)
        .fetch_one(&self.pool)
        .await?;

        fees_from_row(&row)
    }

    async fn upsert_candle(&self, candle: &Candle) -> anyhow::Result<()> {
        let table = candle_table(candle.period);
        let updates = ["open", "high", "low", "close", "base_volume", "quote_volume"]
            .iter()
            .chain(FEE_COLUMNS.iter())
            .map(|c| format!("{c} = excluded.{c}"))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            "INSERT INTO {table} (pool_id, base, quote, start_ms, open, high, low, close, base_volume, quote_volume, {fees}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, {marks}) \
             ON CONFLICT(pool_id, base, quote, start_ms) DO UPDATE SET {updates}",
            fees = FEE_COLUMNS.join(", "),
            marks = vec!["?"; FEE_COLUMNS.len()].join(", "),
        );

        let mut q = sqlx::query(&sql)
            .bind(&candle.key.pool_id)
            .bind(&candle.key.base)
            .bind(&candle.key.quote)
            .bind(candle.start_ms)
            .bind(candle.open)
            .bind(candle.high)
            .bind(candle.low)
            .bind(candle.close)
            .bind(candle.base_volume)
            .bind(candle.quote_volume);
        for v in fee_values(&candle.fees) {
            q = q.bind(v);
        }
        q.execute(&self.pool).await?;

        Ok(())
    }

    async fn last_candle(&self, period: Period, key: &MarketKey) -> anyhow::Result<Option<Candle>> {
        let row = sqlx::query(&format!(
            "SELECT * FROM {} WHERE pool_id = ? AND base = ? AND quote = ? ORDER BY start_ms DESC LIMIT 1",
            candle_table(period)
        ))
        .bind(&key.pool_id)
        .bind(&key.base)
        .bind(&key.quote)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| candle_from_row(period, &r)).transpose()
    }

    async fn query_candles(&self, period: Period, key: &MarketKey, range: TimeRange) -> anyhow::Result<Vec<Candle>> {
        let rows = sqlx::query(&format!(
            "SELECT * FROM {} WHERE pool_id = ? AND base = ? AND quote = ? AND start_ms >= ? AND start_ms < ? \
             ORDER BY start_ms ASC",
            candle_table(period)
        ))
        .bind(&key.pool_id)
        .bind(&key.base)
        .bind(&key.quote)
        .bind(range.start_ms)
        .bind(range.end_ms)
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_all(&rows, "candle", |r| candle_from_row(period, r)))
    }

    async fn known_markets(&self) -> anyhow::Result<Vec<MarketKey>> {
        let rows = sqlx::query("SELECT DISTINCT pool_id, base, quote FROM trades ORDER BY pool_id, base, quote")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| {
                Ok(MarketKey::new(
                    r.try_get::<String, _>("pool_id")?,
                    r.try_get::<String, _>("base")?,
                    r.try_get::<String, _>("quote")?,
                ))
            })
            .collect()
    }
}
