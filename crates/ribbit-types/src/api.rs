use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::Post;

// -- JWT Claims --

/// Canonical claims carried in access tokens. `role` is the access level of
/// the user at the time the token was issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub email: String,
    pub role: i32,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires: chrono::DateTime<chrono::Utc>,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub token: String,
    pub expires: chrono::DateTime<chrono::Utc>,
}

/// Public projection returned when a sign-up form checks a referral code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralCodeVerifyResponse {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub referral_code: String,
    pub username: String,
}

// -- Users --

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub s: String,
}

/// Partial profile update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub mobile: Option<String>,
    pub country_code: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub zip_code: Option<String>,
    pub dob: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub occupation: Option<String>,
    pub employer_name: Option<String>,
    pub facebook_url: Option<String>,
    pub twitter_url: Option<String>,
    pub instagram_url: Option<String>,
    pub public_portfolio: Option<bool>,
}

// -- Posts --

/// Body of both `POST /users/post` and `POST /users/comment`. Comments
/// require `parent_id`; posts must not carry one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostCreate {
    /// Client-chosen identity. Omitted means the store assigns one.
    pub id: Option<i64>,
    pub parent_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub attachments: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_private: Option<bool>,
    pub attachments: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentUpdate {
    pub description: Option<String>,
}

/// A post in the public listing, with its live comment count.
#[derive(Debug, Serialize)]
pub struct PostWithCount {
    #[serde(flatten)]
    pub post: Post,
    pub comment_count: i64,
}

// -- Lists --

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub page: u32,
}
