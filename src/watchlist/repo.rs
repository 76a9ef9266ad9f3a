use async_trait::async_trait;

use crate::{
    db::{PgStore, StoreError},
    watchlist::repo_types::WatchlistEntry,
};

#[async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Entries owned by `user_id`, oldest first.
    async fn list(&self, user_id: i64) -> Result<Vec<WatchlistEntry>, StoreError>;

    /// Inserts the pair or returns the row that already holds it.
    async fn add(&self, user_id: i64, symbol: &str) -> Result<WatchlistEntry, StoreError>;

    async fn remove(&self, user_id: i64, symbol: &str)
        -> Result<Option<WatchlistEntry>, StoreError>;
}

#[async_trait]
impl WatchlistStore for PgStore {
    async fn list(&self, user_id: i64) -> Result<Vec<WatchlistEntry>, StoreError> {
        let rows = sqlx::query_as::<_, WatchlistEntry>(
            r#"
            SELECT id, user_id, stock_symbol, created_at
            FROM watchlists
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn add(&self, user_id: i64, symbol: &str) -> Result<WatchlistEntry, StoreError> {
        // The no-op update makes RETURNING yield the existing row on conflict,
        // so concurrent adds of one symbol all see the same entry.
        let row = sqlx::query_as::<_, WatchlistEntry>(
            r#"
            INSERT INTO watchlists (user_id, stock_symbol)
            VALUES ($1, $2)
            ON CONFLICT (user_id, stock_symbol)
            DO UPDATE SET stock_symbol = EXCLUDED.stock_symbol
            RETURNING id, user_id, stock_symbol, created_at
            "#,
        )
        .bind(user_id)
        .bind(symbol)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn remove(
        &self,
        user_id: i64,
        symbol: &str,
    ) -> Result<Option<WatchlistEntry>, StoreError> {
        let row = sqlx::query_as::<_, WatchlistEntry>(
            r#"
            DELETE FROM watchlists
             WHERE user_id = $1 AND stock_symbol = $2
            RETURNING id, user_id, stock_symbol, created_at
            "#,
        )
        .bind(user_id)
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
