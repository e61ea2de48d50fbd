use axum::{http::StatusCode, Json};
use sea_orm::DbErr;

use crate::models::error::ErrorResponse;

pub mod chart;
pub mod data;

pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

pub async fn index() -> &'static str {
    "Hello from the bitcoin.de price chart backend!"
}

pub(crate) fn database_error(e: DbErr) -> (StatusCode, Json<ErrorResponse>) {
    tracing::error!("Database error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("Database error: {}", e),
        }),
    )
}
