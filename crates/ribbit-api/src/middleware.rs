use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use ribbit_types::api::Claims;
use ribbit_types::models::AuthUser;

use crate::auth::AppState;
use crate::error::AppError;
use crate::run_blocking;

/// Validate the bearer JWT and resolve it to a live user. The resolved
/// `AuthUser` carries the role currently stored, not the one in the token,
/// and soft-deleted or deactivated users are turned away.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized)?
    .claims;

    let db = state.db.clone();
    let user = run_blocking(move || {
        db.get_user_by_id(claims.sub)
            .ok()
            .filter(|user| user.profile.active)
            .ok_or(AppError::Unauthorized)
    })
    .await?;

    req.extensions_mut().insert(AuthUser::from(&user));
    Ok(next.run(req).await)
}
