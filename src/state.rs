use std::sync::Arc;

use crate::{
    audit::AuditLog,
    auth::repo::UserStore,
    config::AppConfig,
    db::{self, PgStore},
    market::client::MarketClient,
    watchlist::repo::WatchlistStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub watchlists: Arc<dyn WatchlistStore>,
    pub market: MarketClient,
    pub audit: Arc<AuditLog>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let pool = db::connect(&config).await?;
        db::migrate(&pool).await?;
        tracing::info!("database ready");

        let store = Arc::new(PgStore::new(pool));
        Self::from_parts(config, store.clone(), store)
    }

    pub fn from_parts(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        watchlists: Arc<dyn WatchlistStore>,
    ) -> anyhow::Result<Self> {
        let market = MarketClient::new(config.providers.clone())?;
        Ok(Self {
            config: Arc::new(config),
            users,
            watchlists,
            market,
            audit: Arc::new(AuditLog::default()),
        })
    }
}
