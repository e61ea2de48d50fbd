use axum::{extract::State, Json};

use crate::handlers::{database_error, ApiResult};
use crate::models::chart::ChartResponse;
use crate::services::trade_store;
use crate::AppState;

/// Handler for GET /chart
/// Full price series ordered by trade id
pub async fn get_chart(State(state): State<AppState>) -> ApiResult<ChartResponse> {
    let trades = trade_store::all_trades(&state.db)
        .await
        .map_err(database_error)?;

    tracing::debug!("Rendering chart with {} points", trades.len());

    Ok(Json(trades.into_iter().collect()))
}
