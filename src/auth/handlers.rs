use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    routing::{get, post},
    Form, Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            LoginForm, MessageResponse, RegisterRequest, StatusResponse, TokenResponse,
            UpdateProfileRequest, UserRead,
        },
        extractors::CurrentUser,
        services,
    },
    error::AppError,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/logout", post(logout))
        .route("/users/ping", get(ping))
        .route("/users/me", get(get_me).put(update_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<UserRead>, AppError> {
    let Json(payload) = payload?;
    let user = services::register(&state, &payload.email, &payload.password).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Form(form) = form?;
    let token = services::login(&state, &form.username, &form.password).await?;
    Ok(Json(TokenResponse::bearer(token)))
}

/// Tokens are stateless, so logout only confirms the token is valid; the
/// client is expected to discard it.
#[instrument(skip_all)]
pub async fn logout(CurrentUser(_user): CurrentUser) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logout successful. Please delete your token on the client.".into(),
    })
}

pub async fn ping() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ok" })
}

#[instrument(skip_all)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserRead> {
    Json(user.into())
}

#[instrument(skip_all)]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<UserRead>, AppError> {
    let Json(payload) = payload?;
    let updated =
        services::update_profile(&state, &user, &payload.email, &payload.password).await?;
    Ok(Json(updated.into()))
}
