use axum::{
    Extension, Json,
    extract::State,
};
use serde_json::{Value, json};

use ribbit_types::api::{CommentUpdate, ListResponse, PostCreate, PostUpdate, PostWithCount};
use ribbit_types::models::{AuthUser, Post};

use crate::auth::AppState;
use crate::error::AppError;
use crate::request::{Id, Page, Payload};
use crate::run_blocking;

// -- Posts --

pub async fn create_post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Payload(req): Payload<PostCreate>,
) -> Result<Json<Post>, AppError> {
    let post = run_blocking(move || state.service.create_post(&caller, req)).await?;
    Ok(Json(post))
}

/// Public feed. Each post carries the number of live comments under it.
pub async fn list_posts(
    State(state): State<AppState>,
    Page(p): Page,
) -> Result<Json<ListResponse<PostWithCount>>, AppError> {
    let (posts, counts) = run_blocking(move || {
        let posts = state.service.list_posts(&p)?;
        let post_ids: Vec<i64> = posts.iter().map(|post| post.id).collect();
        let counts = state.service.comment_counts(&post_ids)?;
        Ok((posts, counts))
    })
    .await?;

    let items = posts
        .into_iter()
        .map(|post| PostWithCount {
            comment_count: counts.get(&post.id).copied().unwrap_or(0),
            post,
        })
        .collect();

    Ok(Json(ListResponse {
        items,
        page: p.page,
    }))
}

pub async fn list_private_posts(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Page(p): Page,
) -> Result<Json<ListResponse<Post>>, AppError> {
    let posts = run_blocking(move || state.service.list_private_posts(&caller, &p)).await?;
    Ok(Json(ListResponse {
        items: posts,
        page: p.page,
    }))
}

pub async fn update_post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Id(id): Id,
    Payload(update): Payload<PostUpdate>,
) -> Result<Json<Post>, AppError> {
    let post = run_blocking(move || state.service.update_post(&caller, id, update)).await?;
    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Id(id): Id,
) -> Result<Json<Value>, AppError> {
    run_blocking(move || state.service.delete_post(&caller, id)).await?;
    Ok(Json(json!({})))
}

// -- Comments --

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Payload(req): Payload<PostCreate>,
) -> Result<Json<Post>, AppError> {
    let comment = run_blocking(move || state.service.create_comment(&caller, req)).await?;
    Ok(Json(comment))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Id(post_id): Id,
    Page(p): Page,
) -> Result<Json<ListResponse<Post>>, AppError> {
    let comments = run_blocking(move || state.service.list_post_comments(post_id, &p)).await?;
    Ok(Json(ListResponse {
        items: comments,
        page: p.page,
    }))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Id(id): Id,
    Payload(update): Payload<CommentUpdate>,
) -> Result<Json<Post>, AppError> {
    let comment = run_blocking(move || state.service.update_comment(&caller, id, update)).await?;
    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Id(id): Id,
) -> Result<Json<Value>, AppError> {
    run_blocking(move || state.service.delete_comment(&caller, id)).await?;
    Ok(Json(json!({})))
}
