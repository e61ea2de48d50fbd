//! Persistence for bitcoin.de trades
//!
//! Rows are only ever inserted. A `tid` that is already stored is skipped
//! rather than duplicated or overwritten.

use rust_decimal::Decimal;
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::BTreeMap;

use crate::entities::{bitcoin_de_trades, prelude::*};
use crate::services::bitcoin_de::TradeRecord;

/// Column scales of the trades table
const PRICE_SCALE: u32 = 3;
const AMOUNT_SCALE: u32 = 10;

/// Rows shown in the tabular view
pub const TABLE_WINDOW: u64 = 100;

/// Result of writing one fetched batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertSummary {
    /// Distinct trade ids in the batch
    pub received: usize,
    pub inserted: u64,
}

impl InsertSummary {
    pub fn skipped(&self) -> u64 {
        self.received as u64 - self.inserted
    }
}

/// Highest stored trade id for one pair, 0 when the pair has no rows.
/// Ids only increase within a pair, so marks are never shared across pairs.
pub async fn max_tid<C: ConnectionTrait>(db: &C, trading_pair: &str) -> Result<i64, DbErr> {
    let max: Option<Option<i64>> = BitcoinDeTrades::find()
        .filter(bitcoin_de_trades::Column::TradingPair.eq(trading_pair))
        .select_only()
        .column_as(bitcoin_de_trades::Column::Tid.max(), "max_tid")
        .into_tuple()
        .one(db)
        .await?;

    Ok(max.flatten().unwrap_or(0))
}

fn to_active_model(trading_pair: &str, trade: &TradeRecord) -> bitcoin_de_trades::ActiveModel {
    bitcoin_de_trades::ActiveModel {
        tid: Set(trade.tid),
        trading_pair: Set(trading_pair.to_string()),
        date: Set(trade.date.fixed_offset()),
        price: Set(round_to_scale(trade.price, PRICE_SCALE)),
        amount: Set(round_to_scale(trade.amount, AMOUNT_SCALE)),
    }
}

fn round_to_scale(value: Decimal, scale: u32) -> Decimal {
    value.round_dp(scale)
}

/// Insert a batch atomically, skipping ids that are already stored.
///
/// Duplicate ids inside the batch collapse to the first occurrence. Any
/// database error other than an id conflict rolls the whole batch back.
pub async fn insert_trades(
    db: &DatabaseConnection,
    trading_pair: &str,
    trades: &[TradeRecord],
) -> Result<InsertSummary, DbErr> {
    let mut unique: BTreeMap<i64, &TradeRecord> = BTreeMap::new();
    for trade in trades {
        unique.entry(trade.tid).or_insert(trade);
    }

    if unique.is_empty() {
        return Ok(InsertSummary {
            received: 0,
            inserted: 0,
        });
    }

    let models: Vec<bitcoin_de_trades::ActiveModel> = unique
        .values()
        .map(|trade| to_active_model(trading_pair, trade))
        .collect();

    let txn = db.begin().await?;

    let inserted = BitcoinDeTrades::insert_many(models)
        .on_conflict(
            OnConflict::column(bitcoin_de_trades::Column::Tid)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

    txn.commit().await?;

    let summary = InsertSummary {
        received: unique.len(),
        inserted,
    };

    tracing::debug!(
        received = summary.received,
        inserted = summary.inserted,
        skipped = summary.skipped(),
        "Stored trade batch"
    );

    Ok(summary)
}

/// Every stored trade, ascending by id
pub async fn all_trades<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<bitcoin_de_trades::Model>, DbErr> {
    BitcoinDeTrades::find()
        .order_by_asc(bitcoin_de_trades::Column::Tid)
        .all(db)
        .await
}

pub async fn count_trades<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
    BitcoinDeTrades::find().count(db).await
}

/// The `limit` most recent trades, returned ascending by id
pub async fn latest_trades<C: ConnectionTrait>(
    db: &C,
    limit: u64,
) -> Result<Vec<bitcoin_de_trades::Model>, DbErr> {
    let mut rows = BitcoinDeTrades::find()
        .order_by_desc(bitcoin_de_trades::Column::Tid)
        .limit(limit)
        .all(db)
        .await?;
    rows.reverse();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_to_column_scale() {
        assert_eq!(round_to_scale(dec!(2300.12345), PRICE_SCALE), dec!(2300.123));
        assert_eq!(
            round_to_scale(dec!(0.123456789012), AMOUNT_SCALE),
            dec!(0.1234567890)
        );
    }

    #[test]
    fn test_insert_summary_skipped() {
        let summary = InsertSummary {
            received: 5,
            inserted: 3,
        };
        assert_eq!(summary.skipped(), 2);
    }
}
