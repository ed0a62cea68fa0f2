use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde_json::{Value, json};

use ribbit_types::api::{ListResponse, ReferralCodeVerifyResponse, SearchQuery, UserUpdate};
use ribbit_types::models::{AuthUser, User};

use crate::auth::AppState;
use crate::error::AppError;
use crate::request::{Id, Page, Payload};
use crate::run_blocking;

pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Page(p): Page,
) -> Result<Json<ListResponse<User>>, AppError> {
    let users = run_blocking(move || state.service.list_users(&caller, &p)).await?;
    Ok(Json(ListResponse {
        items: users,
        page: p.page,
    }))
}

pub async fn view(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Id(id): Id,
) -> Result<Json<User>, AppError> {
    let user = run_blocking(move || state.service.view_user(&caller, id)).await?;
    Ok(Json(user))
}

pub async fn search(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<User>, AppError> {
    let user = run_blocking(move || state.service.search_user(&q.s)).await?;
    Ok(Json(user))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Id(id): Id,
    Payload(update): Payload<UserUpdate>,
) -> Result<Json<User>, AppError> {
    let user = run_blocking(move || state.service.update_user(&caller, id, update)).await?;
    Ok(Json(user))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Id(id): Id,
) -> Result<Json<Value>, AppError> {
    run_blocking(move || state.service.delete_user(&caller, id)).await?;
    Ok(Json(json!({})))
}

/// Public: lets a sign-up form confirm who owns a referral code.
pub async fn verify_referral(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ReferralCodeVerifyResponse>, AppError> {
    let found = run_blocking(move || state.service.verify_referral_code(&code)).await?;
    Ok(Json(found))
}
