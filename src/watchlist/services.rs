use tracing::{info, warn};

use crate::{error::AppError, state::AppState, watchlist::repo_types::WatchlistEntry};

fn normalize_symbol(raw: &str) -> Result<&str, AppError> {
    let symbol = raw.trim();
    if symbol.is_empty() {
        return Err(AppError::validation("stock_symbol must not be empty"));
    }
    Ok(symbol)
}

pub async fn list(state: &AppState, user_id: i64) -> Result<Vec<WatchlistEntry>, AppError> {
    Ok(state.watchlists.list(user_id).await?)
}

/// Idempotent: watching an already-watched symbol returns the existing entry.
pub async fn add(state: &AppState, user_id: i64, symbol: &str) -> Result<WatchlistEntry, AppError> {
    let symbol = normalize_symbol(symbol)?;
    let entry = state.watchlists.add(user_id, symbol).await?;
    info!(user_id, entry_id = entry.id, symbol = %entry.stock_symbol, "watchlist add");
    Ok(entry)
}

pub async fn remove(
    state: &AppState,
    user_id: i64,
    symbol: &str,
) -> Result<WatchlistEntry, AppError> {
    let symbol = normalize_symbol(symbol)?;
    match state.watchlists.remove(user_id, symbol).await? {
        Some(entry) => {
            info!(user_id, entry_id = entry.id, symbol = %entry.stock_symbol, "watchlist remove");
            Ok(entry)
        }
        None => {
            warn!(user_id, symbol = %symbol, "watchlist symbol not found");
            Err(AppError::NotFound("Stock not found in watchlist".into()))
        }
    }
}
