use axum::{extract::State, Form, Json};

use crate::handlers::{database_error, ApiResult};
use crate::models::trade::{CredentialsForm, DataResponse, IngestionReport, TradeRow};
use crate::services::bitcoin_de::BitcoinDeClient;
use crate::services::signer::ApiCredentials;
use crate::services::trade_ingestor::{self, IngestOutcome};
use crate::services::trade_store::{self, TABLE_WINDOW};
use crate::AppState;

/// Handler for GET /data
/// Last trades currently stored plus the total count
pub async fn get_data(State(state): State<AppState>) -> ApiResult<DataResponse> {
    load_table(&state, None).await
}

/// Handler for POST /data
/// Pulls new trades from bitcoin.de when `key` and `sec` are both submitted,
/// then answers like GET /data. A failed API call still returns stored rows.
pub async fn post_data(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> ApiResult<DataResponse> {
    let report = match form.credentials() {
        Some((key, sec)) => {
            tracing::info!("Retrieving new trades from bitcoin.de");

            let outcome =
                match BitcoinDeClient::from_config(&state.config, ApiCredentials::new(key, sec)) {
                    Ok(client) => trade_ingestor::ingest_new_trades(
                        &state.db,
                        &client,
                        &state.config.trading_pair,
                    )
                    .await
                    .map_err(database_error)?,
                    Err(e) => IngestOutcome::Unavailable(e),
                };

            Some(IngestionReport::from(&outcome))
        }
        None => {
            tracing::debug!("No API credentials submitted, skipping ingestion");
            None
        }
    };

    load_table(&state, report).await
}

async fn load_table(
    state: &AppState,
    ingestion: Option<IngestionReport>,
) -> ApiResult<DataResponse> {
    let num_total = trade_store::count_trades(&state.db)
        .await
        .map_err(database_error)?;
    let rows = trade_store::latest_trades(&state.db, TABLE_WINDOW)
        .await
        .map_err(database_error)?;

    Ok(Json(DataResponse {
        data: rows.into_iter().map(TradeRow::from).collect(),
        num_total,
        ingestion,
    }))
}
