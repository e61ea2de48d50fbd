//! Incremental trade ingestion
//!
//! Reads the local high-water mark, asks bitcoin.de for newer trades and
//! stores them in a single transaction. API failures never escape: they are
//! reported as [`IngestOutcome::Unavailable`] so the caller can still serve
//! what is already stored and the user can simply retry.

use sea_orm::{DatabaseConnection, DbErr};
use tracing::{debug, info, warn};

use crate::services::bitcoin_de::{ApiError, BitcoinDeClient};
use crate::services::trade_store;

#[derive(Debug)]
pub enum IngestOutcome {
    Ingested {
        fetched: usize,
        inserted: u64,
        high_water_mark: i64,
    },
    /// The API answered but had nothing newer than the mark
    NoNewTrades { high_water_mark: i64 },
    /// The API could not be used; nothing was written
    Unavailable(ApiError),
}

impl IngestOutcome {
    pub fn inserted(&self) -> u64 {
        match self {
            IngestOutcome::Ingested { inserted, .. } => *inserted,
            _ => 0,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, IngestOutcome::Unavailable(_))
    }
}

/// Fetch and store every trade newer than the stored maximum `tid`
pub async fn ingest_new_trades(
    db: &DatabaseConnection,
    client: &BitcoinDeClient,
    trading_pair: &str,
) -> Result<IngestOutcome, DbErr> {
    let max_tid = trade_store::max_tid(db, trading_pair).await?;
    debug!(trading_pair, "Max tid = {}", max_tid);

    let history = match client.trade_history(trading_pair, Some(max_tid)).await {
        Ok(history) => history,
        Err(e) => {
            warn!(error = %e, trading_pair, "Trade history unavailable, nothing ingested");
            return Ok(IngestOutcome::Unavailable(e));
        }
    };

    if history.trading_pair != trading_pair {
        warn!(
            requested = trading_pair,
            received = %history.trading_pair,
            "bitcoin.de answered for a different trading pair, nothing ingested"
        );
        return Ok(IngestOutcome::Unavailable(ApiError::Decode(format!(
            "requested trades for {} but received {:?}",
            trading_pair, history.trading_pair
        ))));
    }

    if history.trades.is_empty() {
        info!(trading_pair, max_tid, "No new trades");
        return Ok(IngestOutcome::NoNewTrades {
            high_water_mark: max_tid,
        });
    }

    // The requested pair has already passed validation, so it fits the column
    let summary = trade_store::insert_trades(db, trading_pair, &history.trades).await?;
    let high_water_mark = trade_store::max_tid(db, trading_pair).await?;

    info!(
        trading_pair,
        fetched = history.trades.len(),
        inserted = summary.inserted,
        skipped = summary.skipped(),
        high_water_mark,
        "Ingested bitcoin.de trades"
    );

    Ok(IngestOutcome::Ingested {
        fetched: history.trades.len(),
        inserted: summary.inserted,
        high_water_mark,
    })
}
