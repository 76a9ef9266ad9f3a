use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, instrument};

use crate::{
    error::AppError,
    market::{
        client::{chart_url, MarketError},
        dto::{
            close_summary, ChartResponse, GlobalNewsResponse, HistoryQuery, HistoryResponse,
            HistorySummaryResponse,
        },
    },
    state::AppState,
};

pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/stock/:symbol", get(stock_summary))
        .route("/stock/:symbol/chart", get(stock_chart))
        .route("/stock/:symbol/history", get(historical_prices))
        .route("/stock/:symbol/history/summary", get(historical_summary))
}

pub fn news_routes() -> Router<AppState> {
    Router::new()
        .route("/news/global", get(global_news))
        .route("/news/:symbol", get(symbol_news))
}

// History and news report every provider failure as a plain 500.
fn provider_failure(e: MarketError) -> AppError {
    error!(error = %e, "provider call failed");
    AppError::Internal(e.into())
}

fn history_query(
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<HistoryQuery, AppError> {
    let Query(q) = query?;
    Ok(q)
}

#[instrument(skip(state))]
pub async fn stock_summary(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Value>, AppError> {
    let summary = state.market.ticker_summary(&symbol).await?;
    Ok(Json(summary))
}

pub async fn stock_chart(Path(symbol): Path<String>) -> Json<ChartResponse> {
    Json(ChartResponse {
        chart_url: chart_url(&symbol),
    })
}

#[instrument(skip(state, query))]
pub async fn historical_prices(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, AppError> {
    let q = history_query(query)?;
    let prices = state
        .market
        .historical_prices(&symbol, q.timespan, &q.from_date, &q.to_date)
        .await
        .map_err(provider_failure)?;

    Ok(Json(HistoryResponse {
        symbol,
        timespan: q.timespan,
        from: q.from_date,
        to: q.to_date,
        prices,
    }))
}

#[instrument(skip(state, query))]
pub async fn historical_summary(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistorySummaryResponse>, AppError> {
    let q = history_query(query)?;
    let prices = state
        .market
        .historical_prices(&symbol, q.timespan, &q.from_date, &q.to_date)
        .await
        .map_err(provider_failure)?;

    let summary = match close_summary(&prices) {
        Some(s) => json!(s),
        None => json!({}),
    };
    Ok(Json(HistorySummaryResponse {
        symbol,
        timespan: q.timespan,
        from: q.from_date,
        to: q.to_date,
        summary,
    }))
}

#[instrument(skip(state))]
pub async fn symbol_news(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Value>, AppError> {
    let news = state
        .market
        .company_news(&symbol)
        .await
        .map_err(provider_failure)?;
    Ok(Json(news))
}

pub async fn global_news() -> Json<GlobalNewsResponse> {
    Json(GlobalNewsResponse {
        news: Vec::new(),
        message: "Global news not implemented yet.",
    })
}
