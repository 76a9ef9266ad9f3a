use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::{info, instrument};

use crate::{audit::AuditEvent, auth::extractors::AdminUser, error::AppError, state::AppState};

#[derive(Debug, Serialize)]
pub struct AdminUserItem {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub logs: Vec<AuditEvent>,
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/logs", get(view_logs))
}

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Vec<AdminUserItem>>, AppError> {
    let users = state.users.list().await?;
    info!(admin_id = admin.id, count = users.len(), "admin listed users");
    Ok(Json(
        users
            .into_iter()
            .map(|u| AdminUserItem {
                id: u.id,
                email: u.email,
            })
            .collect(),
    ))
}

#[instrument(skip_all)]
pub async fn view_logs(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Json<LogsResponse> {
    Json(LogsResponse {
        logs: state.audit.recent(),
    })
}
