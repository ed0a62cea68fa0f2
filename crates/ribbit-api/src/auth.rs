use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{Path, State},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info};

use ribbit_db::Database;
use ribbit_types::api::{Claims, LoginRequest, LoginResponse, RefreshResponse};
use ribbit_types::models::User;

use crate::error::AppError;
use crate::rbac::RoleRbac;
use crate::request::Payload;
use crate::run_blocking;
use crate::service::Service;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub service: Service,
    pub jwt: JwtSettings,
}

impl AppStateInner {
    pub fn new(db: Database, jwt: JwtSettings) -> AppState {
        let db = Arc::new(db);
        Arc::new(Self {
            service: Service::new(db.clone(), Arc::new(RoleRbac)),
            db,
            jwt,
        })
    }
}

#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub ttl_minutes: i64,
}

pub async fn login(
    State(state): State<AppState>,
    Payload(req): Payload<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let db = state.db.clone();
    let user = run_blocking(move || {
        let mut user = db
            .get_user_by_username(&req.username)
            .map_err(|_| AppError::Unauthorized)?;

        let parsed_hash = PasswordHash::new(&user.password).map_err(|e| {
            error!(user_id = user.id, "stored password hash unreadable: {}", e);
            AppError::Internal
        })?;
        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| AppError::Unauthorized)?;

        if !user.profile.active {
            return Err(AppError::Unauthorized);
        }

        user.token = Some(generate_refresh_token());
        db.update_last_login(&mut user)?;
        Ok(user)
    })
    .await?;

    let (token, expires) = create_token(&state.jwt, &user)?;
    info!(user_id = user.id, "user logged in");

    Ok(Json(LoginResponse {
        token,
        expires,
        refresh_token: user.token.unwrap_or_default(),
    }))
}

/// Issues a fresh access token for the session holding `token`.
pub async fn refresh(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<RefreshResponse>, AppError> {
    let db = state.db.clone();
    let user = run_blocking(move || {
        db.get_user_by_token(&token)
            .ok()
            .filter(|user| user.profile.active)
            .ok_or(AppError::Unauthorized)
    })
    .await?;

    let (token, expires) = create_token(&state.jwt, &user)?;
    Ok(Json(RefreshResponse { token, expires }))
}

/// Argon2id hash for storage in `users.password`.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("password hashing failed: {}", e);
            AppError::Internal
        })
}

pub fn create_token(jwt: &JwtSettings, user: &User) -> Result<(String, DateTime<Utc>), AppError> {
    let expires = Utc::now() + chrono::Duration::minutes(jwt.ttl_minutes);
    let claims = Claims {
        sub: user.id,
        username: user.profile.username.clone(),
        email: user.email.clone(),
        role: user.role.access_level,
        exp: expires.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt.secret.as_bytes()),
    )
    .map_err(|e| {
        error!("token signing failed: {}", e);
        AppError::Internal
    })?;

    Ok((token, expires))
}

fn generate_refresh_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}
