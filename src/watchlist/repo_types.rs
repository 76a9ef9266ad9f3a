use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// One watched symbol. (user_id, stock_symbol) is unique.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WatchlistEntry {
    pub id: i64,
    pub user_id: i64,
    pub stock_symbol: String,
    pub created_at: OffsetDateTime,
}
