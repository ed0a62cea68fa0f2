//! Request extractors. Every rejection becomes an `AppError::Validation`, so
//! malformed input always answers 400 with the usual JSON error body.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use ribbit_types::api::{CommentUpdate, LoginRequest, PageQuery, PostCreate, PostUpdate, UserUpdate};
use ribbit_types::models::Pagination;

use crate::error::AppError;

/// Field constraints checked after a payload deserializes.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

/// JSON body that has been deserialized and validated.
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Positive numeric id taken from the single path parameter.
pub struct Id(pub i64);

impl<S> FromRequestParts<S> for Id
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        if id <= 0 {
            return Err(AppError::Validation("id must be a positive integer".into()));
        }
        Ok(Self(id))
    }
}

/// `?limit=&page=` query, defaulted and clamped.
pub struct Page(pub Pagination);

impl<S> FromRequestParts<S> for Page
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(q) = Query::<PageQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        Ok(Self(Pagination::new(q.limit, q.page)))
    }
}

fn check_len(field: &str, value: Option<&str>, min: usize, max: usize) -> Result<(), AppError> {
    match value {
        Some(v) if v.chars().count() < min || v.chars().count() > max => Err(AppError::Validation(
            format!("{field} must be between {min} and {max} characters"),
        )),
        _ => Ok(()),
    }
}

fn check_id(field: &str, value: Option<i64>) -> Result<(), AppError> {
    match value {
        Some(id) if id <= 0 => Err(AppError::Validation(format!("{field} must be a positive integer"))),
        _ => Ok(()),
    }
}

const MAX_TEXT: usize = 10_000;

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(AppError::Validation("username and password are required".into()));
        }
        Ok(())
    }
}

impl Validate for UserUpdate {
    fn validate(&self) -> Result<(), AppError> {
        check_len("username", self.username.as_deref(), 3, 32)?;
        check_len("first_name", self.first_name.as_deref(), 1, 64)?;
        check_len("last_name", self.last_name.as_deref(), 1, 64)?;
        check_len("bio", self.bio.as_deref(), 0, 1024)
    }
}

impl Validate for PostCreate {
    fn validate(&self) -> Result<(), AppError> {
        check_id("id", self.id)?;
        check_id("parent_id", self.parent_id)?;
        check_len("title", self.title.as_deref(), 2, 255)?;
        check_len("description", self.description.as_deref(), 2, MAX_TEXT)
    }
}

impl Validate for PostUpdate {
    fn validate(&self) -> Result<(), AppError> {
        check_len("title", self.title.as_deref(), 2, 255)?;
        check_len("description", self.description.as_deref(), 2, MAX_TEXT)
    }
}

impl Validate for CommentUpdate {
    fn validate(&self) -> Result<(), AppError> {
        check_len("description", self.description.as_deref(), 2, MAX_TEXT)
    }
}
