use anyhow::Context;
use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    audit::AuditAction,
    auth::{
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::User,
    },
    db::StoreError,
    error::AppError,
    state::AppState,
};

const EMAIL_TAKEN: &str = "Email already registered";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if !is_valid_email(email) {
        return Err(AppError::validation("value is not a valid email address"));
    }
    if password.is_empty() {
        return Err(AppError::validation("password must not be empty"));
    }
    Ok(())
}

fn email_taken(e: StoreError) -> AppError {
    match e {
        StoreError::UniqueViolation(_) => AppError::Conflict(EMAIL_TAKEN.into()),
        other => other.into(),
    }
}

/// Creates a non-admin user. The unique index on email is the final word on
/// duplicates; the lookup only gives the common case a cheap early exit.
pub async fn register(state: &AppState, email: &str, password: &str) -> Result<User, AppError> {
    validate_credentials(email, password)?;

    if state.users.find_by_email(email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict(EMAIL_TAKEN.into()));
    }

    let hash = hash_password(password)?;
    let user = state.users.create(email, &hash).await.map_err(email_taken)?;

    state.audit.record(AuditAction::Register, &user.email);
    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<String, AppError> {
    let user = match state.users.find_by_email(email).await? {
        Some(u) if verify_password(password, &u.hashed_password) => u,
        Some(u) => {
            warn!(user_id = u.id, "login invalid password");
            state.audit.record(AuditAction::LoginFailed, email);
            return Err(AppError::InvalidCredentials);
        }
        None => {
            warn!("login unknown email");
            state.audit.record(AuditAction::LoginFailed, email);
            return Err(AppError::InvalidCredentials);
        }
    };

    let token = JwtKeys::from_ref(state)
        .issue_access(&user.email)
        .context("sign access token")?;

    state.audit.record(AuditAction::LoginSucceeded, &user.email);
    info!(user_id = user.id, "user logged in");
    Ok(token)
}

pub async fn resolve_current_user(state: &AppState, token: &str) -> Result<User, AppError> {
    let email = JwtKeys::from_ref(state).validate(token).map_err(|e| {
        warn!(reason = %e, "token rejected");
        AppError::Unauthorized
    })?;

    match state.users.find_by_email(&email).await? {
        Some(user) => Ok(user),
        None => {
            warn!("token subject no longer exists");
            Err(AppError::Unauthorized)
        }
    }
}

/// Changes email and/or password. The hash is rewritten only when the new
/// password does not already match the stored one.
pub async fn update_profile(
    state: &AppState,
    current: &User,
    new_email: &str,
    new_password: &str,
) -> Result<User, AppError> {
    validate_credentials(new_email, new_password)?;

    let email_changed = new_email != current.email;
    if email_changed {
        if let Some(other) = state.users.find_by_email(new_email).await? {
            if other.id != current.id {
                warn!(user_id = current.id, "new email already registered");
                return Err(AppError::Conflict(EMAIL_TAKEN.into()));
            }
        }
    }

    let password_changed = !verify_password(new_password, &current.hashed_password);
    if !email_changed && !password_changed {
        return Ok(current.clone());
    }

    let hash = if password_changed {
        hash_password(new_password)?
    } else {
        current.hashed_password.clone()
    };

    let user = state
        .users
        .update_credentials(current.id, new_email, &hash)
        .await
        .map_err(email_taken)?;

    state.audit.record(AuditAction::ProfileUpdated, &user.email);
    info!(user_id = user.id, email_changed, password_changed, "profile updated");
    Ok(user)
}

pub fn require_admin(user: User) -> Result<User, AppError> {
    if user.is_admin {
        Ok(user)
    } else {
        warn!(user_id = user.id, "admin privileges required");
        Err(AppError::Forbidden("Admin privileges required".into()))
    }
}
