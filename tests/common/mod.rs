#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use migration::{Migrator, MigratorTrait};
use price_chart::services::bitcoin_de::TradeRecord;
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use serde_json::{json, Value};

/// Fresh in-memory SQLite database with all migrations applied.
/// A single pooled connection keeps every query on the same in-memory file.
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Trade `tid` executed `tid` minutes after 2017-07-14 02:40:00 UTC
pub fn trade(tid: i64, price: Decimal) -> TradeRecord {
    TradeRecord {
        tid,
        date: Utc
            .timestamp_opt(1_500_000_000 + tid * 60, 0)
            .single()
            .expect("valid timestamp"),
        price,
        amount: Decimal::new(25, 2),
    }
}

/// JSON body of a bitcoin.de trade history response
pub fn history_json(tids: &[i64], credits: i64) -> Value {
    let trades: Vec<Value> = tids
        .iter()
        .map(|tid| {
            json!({
                "tid": tid,
                "date": 1_500_000_000 + tid * 60,
                "price": format!("{}.5", 2300 + tid),
                "amount": "0.25"
            })
        })
        .collect();

    json!({
        "trading_pair": "btceur",
        "trades": trades,
        "credits": credits
    })
}
