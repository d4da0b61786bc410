//! Heatmap API Routes
//!
//! Cached sector heatmap for the catalog, plus an uncached variant for an
//! arbitrary ticker list.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use heatmap_core::{HeatmapResult, Period, TickerSnapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{parse_tickers, AppError, AppState};

#[derive(Deserialize)]
pub struct CachedHeatmapQuery {
    pub period: Option<String>,
}

#[derive(Deserialize)]
pub struct HeatmapQuery {
    pub tickers: Option<String>,
    pub period: Option<String>,
}

#[derive(Serialize)]
pub struct HeatmapStocksResponse {
    pub stocks: Vec<TickerSnapshot>,
}

pub fn heatmap_routes() -> Router<AppState> {
    Router::new()
        .route("/api/heatmap-cached", get(get_cached_heatmap))
        .route("/api/heatmap", get(get_heatmap))
}

async fn get_cached_heatmap(
    State(state): State<AppState>,
    Query(query): Query<CachedHeatmapQuery>,
) -> Result<Json<Arc<HeatmapResult>>, AppError> {
    let token = query.period.as_deref().unwrap_or("1d");
    let result = state.engine.heatmap_for_token(token).await?;
    Ok(Json(result))
}

async fn get_heatmap(
    State(state): State<AppState>,
    Query(query): Query<HeatmapQuery>,
) -> Result<Json<HeatmapStocksResponse>, AppError> {
    let period = match query.period.as_deref() {
        Some(token) => Period::resolve(token)?,
        None => Period::default(),
    };
    let tickers = parse_tickers(query.tickers.as_deref().unwrap_or_default());
    if tickers.is_empty() {
        return Ok(Json(HeatmapStocksResponse { stocks: Vec::new() }));
    }

    let stocks = state.engine.snapshots(&tickers, period).await;
    Ok(Json(HeatmapStocksResponse { stocks }))
}
