// src/lib.rs

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
}

pub mod config;

pub mod entities {
    pub mod prelude;
    pub mod bitcoin_de_trades;
}

pub mod services {
    pub mod bitcoin_de;
    pub mod signer;
    pub mod throttle;
    pub mod trade_ingestor;
    pub mod trade_store;
}

pub mod models;
pub mod handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/chart", get(handlers::chart::get_chart))
        .route(
            "/data",
            get(handlers::data::get_data).post(handlers::data::post_data),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
