use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::bitcoin_de_trades;
use crate::services::trade_ingestor::IngestOutcome;

/// Form body for POST /data
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsForm {
    pub key: Option<String>,
    pub sec: Option<String>,
}

impl CredentialsForm {
    /// Both fields present and non-blank
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let key = self.key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
        let sec = self.sec.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((key, sec))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRow {
    pub tid: i64,
    pub trading_pair: String,
    pub date: DateTime<FixedOffset>,
    pub price: Decimal,
    pub amount: Decimal,
}

impl From<bitcoin_de_trades::Model> for TradeRow {
    fn from(model: bitcoin_de_trades::Model) -> Self {
        Self {
            tid: model.tid,
            trading_pair: model.trading_pair,
            date: model.date,
            price: model.price,
            amount: model.amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStatus {
    Ingested,
    NoNewTrades,
    Unavailable,
}

/// What happened to the ingestion triggered by a form submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionReport {
    pub status: IngestionStatus,
    pub fetched: usize,
    pub inserted: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_water_mark: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&IngestOutcome> for IngestionReport {
    fn from(outcome: &IngestOutcome) -> Self {
        match outcome {
            IngestOutcome::Ingested {
                fetched,
                inserted,
                high_water_mark,
            } => Self {
                status: IngestionStatus::Ingested,
                fetched: *fetched,
                inserted: *inserted,
                high_water_mark: Some(*high_water_mark),
                error: None,
            },
            IngestOutcome::NoNewTrades { high_water_mark } => Self {
                status: IngestionStatus::NoNewTrades,
                fetched: 0,
                inserted: 0,
                high_water_mark: Some(*high_water_mark),
                error: None,
            },
            IngestOutcome::Unavailable(e) => Self {
                status: IngestionStatus::Unavailable,
                fetched: 0,
                inserted: 0,
                high_water_mark: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Response for /data: the most recent rows plus the table size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse {
    pub data: Vec<TradeRow>,
    pub num_total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingestion: Option<IngestionReport>,
}
