use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use heatmap_engine::{CompareRange, ComparePeriod, CompareSeries};
use serde::{Deserialize, Serialize};

use crate::{parse_tickers, AppError, AppState};

#[derive(Deserialize)]
pub struct CompareQuery {
    pub tickers: Option<String>,
    pub period: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Serialize)]
pub struct CompareResponse {
    pub stocks: Vec<CompareSeries>,
}

#[derive(Serialize)]
pub struct PopularSymbol {
    pub symbol: &'static str,
    pub name: &'static str,
}

#[derive(Serialize)]
pub struct PopularResponse {
    pub us: Vec<PopularSymbol>,
    pub kr: Vec<PopularSymbol>,
}

const POPULAR_US: &[(&str, &str)] = &[
    ("AAPL", "Apple"),
    ("MSFT", "Microsoft"),
    ("GOOGL", "Google"),
    ("NVDA", "NVIDIA"),
    ("TSLA", "Tesla"),
    ("AMZN", "Amazon"),
];

const POPULAR_KR: &[(&str, &str)] = &[
    ("005930.KS", "삼성전자"),
    ("000660.KS", "SK하이닉스"),
    ("035420.KS", "NAVER"),
    ("035720.KS", "카카오"),
];

pub fn compare_routes() -> Router<AppState> {
    Router::new()
        .route("/api/compare", get(compare_stocks))
        .route("/api/popular", get(popular))
}

async fn compare_stocks(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<CompareResponse>, AppError> {
    let tickers = parse_tickers(query.tickers.as_deref().unwrap_or_default());
    if tickers.is_empty() {
        return Err(AppError::BadRequest("No tickers given".to_string()));
    }

    let range = match (query.start.as_deref(), query.end.as_deref()) {
        (Some(start), Some(end)) => CompareRange::Dates {
            from: parse_date(start)?,
            to: parse_date(end)?,
        },
        _ => CompareRange::Period(ComparePeriod::parse_or_default(
            query.period.as_deref().unwrap_or("1mo"),
        )),
    };

    let stocks = state.engine.compare(&tickers, range).await;
    Ok(Json(CompareResponse { stocks }))
}

fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date '{}', expected YYYY-MM-DD", value)))
}

fn symbols(items: &[(&'static str, &'static str)]) -> Vec<PopularSymbol> {
    items
        .iter()
        .map(|&(symbol, name)| PopularSymbol { symbol, name })
        .collect()
}

async fn popular() -> Json<PopularResponse> {
    Json(PopularResponse {
        us: symbols(POPULAR_US),
        kr: symbols(POPULAR_KR),
    })
}
