//! Registration, login, and session handling.
//!
//! Passwords are hashed with Argon2. Sessions are opaque bearer tokens;
//! only a SHA-256 hash of the token is stored. Each request rebuilds an
//! [`AuthContext`] from the presented token, so there is no mutable session
//! state outside the database.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap},
    response::Redirect,
    Json,
};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::db::{
    DbPool, LoginRequest, LoginResponse, RegisterRequest, Session, User, UserResponse, ROLE_ADMIN,
    ROLE_USER,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    validate_email, validate_name, validate_optional_pincode, validate_password,
};

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random session token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Extract the bearer token from request headers
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("Authorization").and_then(|h| h.to_str().ok())?;
    auth_header
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

/// Per-request authentication context: the verified user id and role,
/// resolved once at request entry and passed into handlers.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub role: String,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin access required"))
        }
    }

    pub fn require_user(&self) -> Result<(), ApiError> {
        if self.role == ROLE_USER {
            Ok(())
        } else {
            Err(ApiError::forbidden("User access required"))
        }
    }
}

/// Resolve the user behind a session token
async fn resolve_session(pool: &DbPool, token: &str) -> Result<User, ApiError> {
    let token_hash = hash_token(token);
    let session: Option<Session> = sqlx::query_as(
        "SELECT * FROM sessions WHERE token_hash = ? AND expires_at > datetime('now')",
    )
    .bind(&token_hash)
    .fetch_optional(pool)
    .await?;

    let session = session.ok_or_else(|| ApiError::unauthorized("Login required"))?;

    let user = User::find(pool, &session.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Login required"))?;

    Ok(user)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token =
            extract_token(&parts.headers).ok_or_else(|| ApiError::unauthorized("Login required"))?;
        let user = resolve_session(&state.db, &token).await?;
        Ok(AuthContext {
            user_id: user.id,
            role: user.role,
        })
    }
}

/// Register a new user account with role `user`
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    // The admin address can never be registered, no matter what else is valid
    if req.email == state.config.auth.admin_email {
        return Err(ApiError::forbidden("Admin registration is not allowed"));
    }

    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_email(&req.email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_password(&req.password) {
        errors.add("password", e);
    }
    if let Err(e) = validate_name(&req.name) {
        errors.add("name", e);
    }
    if let Err(e) = validate_optional_pincode(&req.pincode) {
        errors.add("pincode", e);
    }
    errors.finish()?;

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::business_rule("Email already registered"));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let password_hash = hash_password(&req.password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, role, address, pincode, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&req.email)
    .bind(&password_hash)
    .bind(ROLE_USER)
    .bind(&req.address)
    .bind(&req.pincode)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    tracing::info!(email = %req.email, "Registered new user");

    let user = User::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::internal("User vanished after insert"))?;

    Ok(Json(UserResponse::from(user)))
}

/// Login endpoint: verifies credentials and issues a session token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User does not exist"))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Incorrect password"));
    }

    let token = generate_token();
    let token_hash = hash_token(&token);
    let expires_at = (chrono::Utc::now()
        + chrono::Duration::days(state.config.auth.session_ttl_days))
    .to_rfc3339();

    let session_id = uuid::Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES (?, ?, ?, ?)")
        .bind(&session_id)
        .bind(&user.id)
        .bind(&token_hash)
        .bind(&expires_at)
        .execute(&state.db)
        .await?;

    tracing::info!(email = %user.email, role = %user.role, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(user),
    }))
}

/// Logout endpoint: deletes the presented session
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(token) = extract_token(&headers) {
        let token_hash = hash_token(&token);
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(&token_hash)
            .execute(&state.db)
            .await?;
    }

    Ok(Json(serde_json::json!({ "message": "Logged out successfully" })))
}

/// Current-user endpoint
pub async fn me(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<Json<UserResponse>, ApiError> {
    let user = User::find(&state.db, &ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Login required"))?;
    Ok(Json(UserResponse::from(user)))
}

/// Landing route: sends each role to its own dashboard
pub async fn home(ctx: Option<AuthContext>) -> Result<Redirect, ApiError> {
    match ctx {
        Some(ctx) if ctx.is_admin() => Ok(Redirect::to("/api/admin/dashboard")),
        Some(_) => Ok(Redirect::to("/api/user/dashboard")),
        None => Err(ApiError::unauthorized("Login required")),
    }
}

/// Create the bootstrap admin account if it does not exist yet
pub async fn ensure_admin_user(pool: &DbPool, auth: &AuthConfig) -> anyhow::Result<()> {
    if User::find_by_email(pool, &auth.admin_email).await?.is_some() {
        tracing::debug!(email = %auth.admin_email, "Admin user already exists");
        return Ok(());
    }

    let id = uuid::Uuid::new_v4().to_string();
    let password_hash = hash_password(&auth.admin_password)
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {}", e))?;
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, role, address, pincode, created_at, updated_at)
        VALUES (?, 'Admin', ?, ?, ?, 'Admin HQ', '000000', ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&auth.admin_email)
    .bind(&password_hash)
    .bind(ROLE_ADMIN)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    tracing::info!(email = %auth.admin_email, "Created admin user");
    if auth.admin_password == AuthConfig::default().admin_password {
        tracing::warn!("Admin account uses the default password; change it in the config file");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("parkr-secret").unwrap();
        assert!(verify_password("parkr-secret", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_token_hash_is_stable_and_hex() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), token);
    }

    #[test]
    fn test_auth_context_role_checks() {
        let admin = AuthContext {
            user_id: "u1".to_string(),
            role: ROLE_ADMIN.to_string(),
        };
        let user = AuthContext {
            user_id: "u2".to_string(),
            role: ROLE_USER.to_string(),
        };

        assert!(admin.require_admin().is_ok());
        assert!(admin.require_user().is_err());
        assert!(user.require_user().is_ok());
        assert!(user.require_admin().is_err());
    }
}
