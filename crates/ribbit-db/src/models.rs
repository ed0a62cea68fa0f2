//! Insert-side types. Read-side rows map straight onto `ribbit_types::models`.

use ribbit_types::models::PostContent;

/// Restricts a list query to records owned by one user. Absent means the
/// caller may see every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub owner_id: i64,
}

pub struct NewUser {
    pub username: String,
    pub email: String,
    /// Already-hashed password.
    pub password: String,
    pub role_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub referral_code: Option<String>,
    pub country_code: Option<String>,
    pub mobile: Option<String>,
}

pub struct NewPost {
    /// Explicit identity; `None` lets SQLite assign one.
    pub id: Option<i64>,
    pub added_by: i64,
    pub email: Option<String>,
    pub content: PostContent,
}

/// Seeded role ids. Each matches the role's access level.
pub const USER_ROLE_ID: i64 = 1;
pub const ADMIN_ROLE_ID: i64 = 2;
pub const SUPER_ADMIN_ROLE_ID: i64 = 3;
