//! Registration, signup, and login handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{jwt, password};
use crate::config;
use crate::db;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /users - quick registration by name only
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Name is required"));
    }
    if name.len() < 2 {
        return Err(ApiError::validation("Name must be at least 2 characters"));
    }

    let conn = db::try_lock(&state.db)?;
    let user_id = db::insert_user(&conn, name, None, None)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "userId": user_id,
            "userName": name,
        })),
    ))
}

/// POST /auth/signup - full account with email and password
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let name = req.name.trim().to_string();
    let email = req.email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("All fields are required"));
    }
    if name.len() < 2 {
        return Err(ApiError::validation("Name must be at least 2 characters"));
    }
    if req.password.len() < 6 {
        return Err(ApiError::validation("Password must be at least 6 characters"));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::validation("Please provide a valid email"));
    }

    let conn = db::try_lock(&state.db)?;
    if db::email_exists(&conn, &email)? {
        return Err(ApiError::validation("Email already registered"));
    }

    let password_hash = password::hash_password(&req.password)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;

    let user_id = db::insert_user(&conn, &name, Some(&email), Some(&password_hash))?;
    drop(conn);

    let token = jwt::create_token(user_id, &email, &name, &config::jwt_secret())
        .map_err(|e| ApiError::Internal(format!("Failed to sign token: {}", e)))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Account created successfully",
            "token": token,
            "user": { "userId": user_id, "name": name, "email": email },
        })),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let email = req.email.trim().to_lowercase();

    let conn = db::try_lock(&state.db)?;
    let user = db::get_user_by_email(&conn, &email)?;
    drop(conn);

    // One message for both unknown email and wrong password
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = user.ok_or_else(invalid)?;
    let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
    if !password::verify_password(&req.password, hash) {
        return Err(invalid());
    }

    let user_email = user.email.clone().unwrap_or(email);
    let token = jwt::create_token(user.id, &user_email, &user.name, &config::jwt_secret())
        .map_err(|e| ApiError::Internal(format!("Failed to sign token: {}", e)))?;

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "token": token,
        "user": { "userId": user.id, "name": user.name, "email": user_email },
    })))
}

/// Matches the loose `\S+@\S+.\S+` shape: some local part, an @, a domain
/// with at least one dot, and no whitespace anywhere.
fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
