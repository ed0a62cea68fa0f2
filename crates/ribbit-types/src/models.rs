use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Access level of a plain account.
pub const USER_ACCESS: i32 = 1;
/// Lowest access level that may act on other users' records.
pub const ADMIN_ACCESS: i32 = 2;
pub const SUPER_ADMIN_ACCESS: i32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    /// Higher is more privileged.
    pub access_level: i32,
    pub name: String,
}

/// The mutable part of a user record. A profile update rewrites exactly
/// these columns (plus `updated_at`), never identity or deletion state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
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
    pub account_status: Option<String>,
    pub facebook_url: Option<String>,
    pub twitter_url: Option<String>,
    pub instagram_url: Option<String>,
    pub referred_by: Option<String>,
    pub public_portfolio: bool,
    pub active: bool,
    pub verified: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub referral_code: Option<String>,
    pub role: Role,
    #[serde(flatten)]
    pub profile: UserProfile,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn update_last_login(&mut self) {
        self.last_login = Some(Utc::now());
    }

    pub fn mark_deleted(&mut self) {
        self.deleted_at = Some(Utc::now());
    }
}

/// The caller of a request, resolved from its bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub access_level: i32,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.profile.username.clone(),
            email: user.email.clone(),
            access_level: user.role.access_level,
        }
    }
}

/// Rows of the posts table are either top-level posts or comments attached
/// to a parent post. A row with a parent is always a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PostKind {
    Post,
    Comment { parent_id: i64 },
}

impl PostKind {
    pub fn from_parent(parent_id: Option<i64>) -> Self {
        match parent_id {
            Some(parent_id) => Self::Comment { parent_id },
            None => Self::Post,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment { .. } => "comment",
        }
    }

    pub fn parent_id(&self) -> Option<i64> {
        match self {
            Self::Post => None,
            Self::Comment { parent_id } => Some(*parent_id),
        }
    }
}

/// Columns a post update may rewrite. Comment updates only touch
/// `description`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostContent {
    pub title: String,
    pub description: String,
    pub is_private: bool,
    pub attachments: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: i64,
    #[serde(flatten)]
    pub kind: PostKind,
    pub added_by: i64,
    pub email: Option<String>,
    #[serde(flatten)]
    pub content: PostContent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn is_comment(&self) -> bool {
        matches!(self.kind, PostKind::Comment { .. })
    }

    pub fn mark_deleted(&mut self) {
        self.deleted_at = Some(Utc::now());
    }
}

/// Limit/offset window for list queries. `page` is echoed back to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
    pub page: u32,
}

impl Pagination {
    pub const DEFAULT_LIMIT: u32 = 100;
    pub const MAX_LIMIT: u32 = 1000;

    pub fn new(limit: Option<u32>, page: Option<u32>) -> Self {
        let limit = match limit {
            None | Some(0) => Self::DEFAULT_LIMIT,
            Some(l) => l.min(Self::MAX_LIMIT),
        };
        let page = page.unwrap_or(0);
        Self {
            limit,
            offset: page.saturating_mul(limit),
            page,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}
