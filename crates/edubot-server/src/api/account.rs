//! Signup, login, logout and per-user settings.

use axum::{extract::State, http::StatusCode, Extension, Json};
use tracing::info;

use edubot_shared::constants::MIN_PASSWORD_LEN;
use edubot_shared::protocol::{
    Credentials, LoginResponse, MessageResponse, SettingsResponse, UpdateSettingsRequest,
    UpdateSettingsResponse, UserIdResponse,
};
use edubot_store::StoreError;

use super::extract::ApiJson;
use super::{not_found_as, AppState, USER_NOT_FOUND};
use crate::auth::Identity;
use crate::error::ServerError;

const EMAIL_TAKEN: &str = "An account with this email already exists.";

fn require_credentials(creds: &Credentials) -> Result<(&str, &str), ServerError> {
    let email = creds.email.trim();
    if email.is_empty() {
        return Err(ServerError::BadRequest("Empty or missing email.".into()));
    }
    if creds.password.is_empty() {
        return Err(ServerError::BadRequest("Empty or missing password.".into()));
    }
    Ok((email, &creds.password))
}

pub(super) async fn signup(
    State(state): State<AppState>,
    ApiJson(creds): ApiJson<Credentials>,
) -> Result<(StatusCode, Json<MessageResponse>), ServerError> {
    let (email, password) = require_credentials(&creds)?;

    // Length is counted in Unicode scalar values, not bytes or UTF-16 units.
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServerError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long."
        )));
    }

    if state.db.lock().await.user_exists(email)? {
        return Err(ServerError::BadRequest(EMAIL_TAKEN.into()));
    }

    let hash = state.passwords.hash(password).await?;

    // A concurrent signup may have claimed the email while we were hashing.
    let user = state
        .db
        .lock()
        .await
        .create_user(email, &hash)
        .map_err(|e| match e {
            StoreError::EmailTaken => ServerError::BadRequest(EMAIL_TAKEN.into()),
            other => ServerError::Store(other),
        })?;

    info!(user_id = %user.id, "User signed up");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User created successfully.")),
    ))
}

pub(super) async fn login(
    State(state): State<AppState>,
    ApiJson(creds): ApiJson<Credentials>,
) -> Result<Json<LoginResponse>, ServerError> {
    let (email, password) = require_credentials(&creds)?;

    let user = state
        .db
        .lock()
        .await
        .get_user_by_email(email)
        .map_err(not_found_as("No account exists with this email."))?;

    if !state.passwords.verify(password, &user.password_hash).await? {
        info!(user_id = %user.id, "Login rejected: wrong password");
        return Err(ServerError::Unauthorized("The password is incorrect.".into()));
    }

    let token = state.tokens.issue(&user.email)?;

    info!(
        user_id = %user.id,
        expires_in_secs = state.tokens.lifetime().num_seconds(),
        "User logged in"
    );

    Ok(Json(LoginResponse {
        message: "Success".into(),
        token,
    }))
}

pub(super) async fn logout(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<MessageResponse>, ServerError> {
    state
        .revocations
        .revoke(&identity.token, identity.expires_at)
        .await?;
    Ok(Json(MessageResponse::new("Session terminated")))
}

pub(super) async fn get_user_id(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<UserIdResponse>, ServerError> {
    let user = state
        .db
        .lock()
        .await
        .get_user_by_email(&identity.email)
        .map_err(not_found_as(USER_NOT_FOUND))?;
    Ok(Json(UserIdResponse {
        user_id: user.id.to_string(),
    }))
}

pub(super) async fn get_user_settings(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<SettingsResponse>, ServerError> {
    let user = state
        .db
        .lock()
        .await
        .get_user_by_email(&identity.email)
        .map_err(not_found_as(USER_NOT_FOUND))?;
    Ok(Json(SettingsResponse {
        settings: user.settings,
    }))
}

/// Always updates the caller's own record. A `userId` naming anyone else is
/// answered as if that user did not exist.
pub(super) async fn update_settings(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<UpdateSettingsRequest>,
) -> Result<Json<UpdateSettingsResponse>, ServerError> {
    let db = state.db.lock().await;
    let user = db
        .get_user_by_email(&identity.email)
        .map_err(not_found_as(USER_NOT_FOUND))?;

    if let Some(requested) = req.user_id.as_deref() {
        if requested != user.id.to_string() {
            return Err(ServerError::NotFound(USER_NOT_FOUND.into()));
        }
    }

    let updated = user.settings.merged(&req.settings);
    db.update_user_settings(&user.email, &updated)
        .map_err(not_found_as(USER_NOT_FOUND))?;

    info!(user_id = %user.id, settings = ?updated, "Settings updated");

    Ok(Json(UpdateSettingsResponse {
        message: "Settings updated successfully.".into(),
        updated_settings: updated,
    }))
}

pub(super) async fn protected_route() -> Json<MessageResponse> {
    Json(MessageResponse::new("This is protected data."))
}
