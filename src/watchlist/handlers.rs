use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::CurrentUser,
    error::AppError,
    state::AppState,
    watchlist::{
        dto::{WatchlistCreate, WatchlistRead},
        services,
    },
};

pub fn watchlist_routes() -> Router<AppState> {
    Router::new()
        .route("/watchlist", get(list_watchlist).post(add_to_watchlist))
        .route("/watchlist/:stock_symbol", delete(remove_from_watchlist))
}

#[instrument(skip_all)]
pub async fn list_watchlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<WatchlistRead>>, AppError> {
    let entries = services::list(&state, user.id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

#[instrument(skip_all)]
pub async fn add_to_watchlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    item: Result<Json<WatchlistCreate>, JsonRejection>,
) -> Result<Json<WatchlistRead>, AppError> {
    let Json(item) = item?;
    let entry = services::add(&state, user.id, &item.stock_symbol).await?;
    Ok(Json(entry.into()))
}

#[instrument(skip(state, user))]
pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(stock_symbol): Path<String>,
) -> Result<StatusCode, AppError> {
    services::remove(&state, user.id, &stock_symbol).await?;
    Ok(StatusCode::NO_CONTENT)
}
