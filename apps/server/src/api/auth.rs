//! # Account Routes
//!
//! Sign-up and sign-in hand out a session token; `me` and `profile` need one.
//!
//! ```text
//! POST /api/auth/sign-up   { email, password, displayName? }  → 201 { token, expiresIn, account }
//! POST /api/auth/sign-in   { email, password }                → 200 { token, expiresIn, account }
//! GET  /api/auth/me                                           → 200 Account
//! PATCH /api/auth/profile  { displayName?, currentPassword?, newPassword? } → 200 Account
//! ```

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use stockbook_core::validation::{normalize_email, validate_name, validate_password};
use stockbook_core::{new_id, Account, ActivityAction, NewActivity};
use stockbook_db::password::{hash_password, verify_password};

use super::log_activity;
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/sign-up", post(sign_up))
        .route("/api/auth/sign-in", post(sign_in))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/auth/profile", patch(update_profile))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    /// Required when changing the password.
    #[serde(default)]
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
    pub account: Account,
}

fn session_for(state: &AppState, account: Account) -> Result<AuthResponse, ApiError> {
    Ok(AuthResponse {
        token: state.jwt.generate_token(&account.id, &account.email)?,
        expires_in: state.jwt.lifetime_secs(),
        account,
    })
}

/// POST /api/auth/sign-up
pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let email = normalize_email(&req.email)?;
    validate_password(&req.password)?;

    let display_name = match req.display_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => validate_name("display name", name)?,
        _ => email.split('@').next().unwrap_or(&email).to_string(),
    };

    let now = Utc::now();
    let account = Account {
        id: new_id(),
        email,
        display_name,
        password_hash: hash_password(&req.password)?,
        created_at: now,
        updated_at: now,
    };
    state.db.accounts().insert(&account).await?;

    info!(account_id = %account.id, "Account signed up");
    Ok((StatusCode::CREATED, Json(session_for(&state, account)?)))
}

/// POST /api/auth/sign-in
///
/// Unknown email and wrong password get the same answer.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> ApiResult<AuthResponse> {
    let rejected = || ApiError::unauthorized("Invalid email or password");

    let email = normalize_email(&req.email).map_err(|_| rejected())?;
    let account = state
        .db
        .accounts()
        .find_by_email(&email)
        .await?
        .ok_or_else(rejected)?;

    if !verify_password(&req.password, &account.password_hash) {
        return Err(rejected());
    }

    info!(account_id = %account.id, "Account signed in");
    Ok(Json(session_for(&state, account)?))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Account> {
    let account = state.db.accounts().get(&session.owner_id).await?;
    Ok(Json(account))
}

/// PATCH /api/auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Account> {
    let display_name = req
        .display_name
        .as_deref()
        .map(|name| validate_name("display name", name))
        .transpose()?;

    let password_hash = match req.new_password.as_deref() {
        None => None,
        Some(new_password) => {
            let current = state.db.accounts().get(&session.owner_id).await?;
            let confirmed = req
                .current_password
                .as_deref()
                .is_some_and(|p| verify_password(p, &current.password_hash));
            if !confirmed {
                return Err(ApiError::validation("Current password is incorrect"));
            }
            validate_password(new_password)?;
            Some(hash_password(new_password)?)
        }
    };

    if display_name.is_none() && password_hash.is_none() {
        return Err(ApiError::validation("Nothing to update"));
    }

    let account = state
        .db
        .accounts()
        .update_profile(
            &session.owner_id,
            display_name.as_deref(),
            password_hash.as_deref(),
            Utc::now(),
        )
        .await?;

    let changed: Vec<&str> = [
        display_name.as_ref().map(|_| "display name"),
        password_hash.as_ref().map(|_| "password"),
    ]
    .into_iter()
    .flatten()
    .collect();
    log_activity(
        &state,
        &session,
        NewActivity::new(ActivityAction::ProfileUpdated, "Updated profile")
            .with_changes(changed.join("; ")),
    )
    .await;

    Ok(Json(account))
}
