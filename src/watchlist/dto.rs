use serde::{Deserialize, Serialize};

use crate::watchlist::repo_types::WatchlistEntry;

#[derive(Debug, Deserialize)]
pub struct WatchlistCreate {
    pub stock_symbol: String,
}

#[derive(Debug, Serialize)]
pub struct WatchlistRead {
    pub id: i64,
    pub stock_symbol: String,
}

impl From<WatchlistEntry> for WatchlistRead {
    fn from(e: WatchlistEntry) -> Self {
        Self {
            id: e.id,
            stock_symbol: e.stock_symbol,
        }
    }
}
