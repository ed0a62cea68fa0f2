use chrono::Utc;
use rusqlite::{Connection, Params, Row, named_params, params, params_from_iter};
use tracing::warn;

use ribbit_types::models::{Pagination, Role, User, UserProfile};

use crate::error::lookup_failed;
use crate::models::{ListQuery, NewUser};
use crate::{Database, DbError};

const USER_SELECT: &str = "
    SELECT u.id, u.email, u.password, u.token, u.referral_code, u.username,
           u.first_name, u.last_name, u.mobile, u.country_code, u.address, u.city,
           u.state, u.country, u.zip_code, u.dob, u.bio, u.avatar, u.occupation,
           u.employer_name, u.account_status, u.facebook_url, u.twitter_url,
           u.instagram_url, u.referred_by, u.public_portfolio, u.active, u.verified,
           u.last_login, u.created_at, u.updated_at, u.deleted_at,
           r.id AS role_id, r.access_level AS role_access_level, r.name AS role_name
    FROM users u
    JOIN roles r ON r.id = u.role_id";

impl Database {
    // -- Lookups --

    pub fn get_user_by_id(&self, id: i64) -> Result<User, DbError> {
        self.with_conn(|conn| query_user(conn, "u.id = ?1", [id]))
    }

    pub fn get_user_by_referral_code(&self, referral_code: &str) -> Result<User, DbError> {
        self.with_conn(|conn| query_user(conn, "u.referral_code = ?1", [referral_code]))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<User, DbError> {
        self.with_conn(|conn| query_user(conn, "u.username = ?1", [username]))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<User, DbError> {
        self.with_conn(|conn| query_user(conn, "u.email = ?1", [email]))
    }

    pub fn get_user_by_mobile(&self, country_code: &str, mobile: &str) -> Result<User, DbError> {
        self.with_conn(|conn| {
            query_user(
                conn,
                "u.country_code = ?1 AND u.mobile = ?2",
                [country_code, mobile],
            )
        })
    }

    /// Resolves a session from the refresh token issued at login.
    pub fn get_user_by_token(&self, token: &str) -> Result<User, DbError> {
        self.with_conn(|conn| query_user(conn, "u.token = ?1", [token]))
    }

    // -- Writes --

    pub fn create_user(&self, new: &NewUser) -> Result<User, DbError> {
        let now = Utc::now();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password, role_id, first_name, last_name,
                                    referral_code, country_code, mobile, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                params![
                    new.username,
                    new.email,
                    new.password,
                    new.role_id,
                    new.first_name,
                    new.last_name,
                    new.referral_code,
                    new.country_code,
                    new.mobile,
                    now,
                ],
            )
            .map_err(|e| DbError::from_write(e, "User already exists."))?;

            query_user(conn, "u.id = ?1", [conn.last_insert_rowid()])
        })
    }

    /// Stamps `last_login` on the user and persists it together with the
    /// session token. No other column is written.
    pub fn update_last_login(&self, user: &mut User) -> Result<(), DbError> {
        user.update_last_login();
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET last_login = ?1, token = ?2 WHERE id = ?3",
                params![user.last_login, user.token, user.id],
            )?;
            if n == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
        .inspect_err(|e| warn!(user_id = user.id, "UserRepo update_last_login error: {}", e))
    }

    /// Active users, newest first. `query` narrows the list to a single owner.
    pub fn list_users(&self, query: Option<ListQuery>, p: &Pagination) -> Result<Vec<User>, DbError> {
        self.with_conn(|conn| {
            let mut sql = format!("{USER_SELECT} WHERE u.deleted_at IS NULL");
            let mut args: Vec<i64> = Vec::with_capacity(3);
            if let Some(q) = query {
                sql.push_str(" AND u.id = ?");
                args.push(q.owner_id);
            }
            sql.push_str(" ORDER BY u.id DESC LIMIT ? OFFSET ?");
            args.push(i64::from(p.limit));
            args.push(i64::from(p.offset));

            let mut stmt = conn.prepare(&sql)?;
            let users = stmt
                .query_map(params_from_iter(args), user_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(users)
        })
        .inspect_err(|e| warn!("UserRepo list error: {}", e))
    }

    /// Rewrites every profile column plus `updated_at`. Identity, role,
    /// credentials and deletion state are never touched here.
    pub fn update_user(&self, mut user: User) -> Result<User, DbError> {
        user.updated_at = Utc::now();
        self.with_conn(|conn| {
            let p = &user.profile;
            let n = conn
                .execute(
                    "UPDATE users SET
                        username = :username,
                        first_name = :first_name,
                        last_name = :last_name,
                        mobile = :mobile,
                        country_code = :country_code,
                        address = :address,
                        city = :city,
                        state = :state,
                        country = :country,
                        zip_code = :zip_code,
                        dob = :dob,
                        bio = :bio,
                        avatar = :avatar,
                        occupation = :occupation,
                        employer_name = :employer_name,
                        account_status = :account_status,
                        facebook_url = :facebook_url,
                        twitter_url = :twitter_url,
                        instagram_url = :instagram_url,
                        referred_by = :referred_by,
                        public_portfolio = :public_portfolio,
                        active = :active,
                        verified = :verified,
                        updated_at = :updated_at
                     WHERE id = :id",
                    named_params! {
                        ":username": p.username,
                        ":first_name": p.first_name,
                        ":last_name": p.last_name,
                        ":mobile": p.mobile,
                        ":country_code": p.country_code,
                        ":address": p.address,
                        ":city": p.city,
                        ":state": p.state,
                        ":country": p.country,
                        ":zip_code": p.zip_code,
                        ":dob": p.dob,
                        ":bio": p.bio,
                        ":avatar": p.avatar,
                        ":occupation": p.occupation,
                        ":employer_name": p.employer_name,
                        ":account_status": p.account_status,
                        ":facebook_url": p.facebook_url,
                        ":twitter_url": p.twitter_url,
                        ":instagram_url": p.instagram_url,
                        ":referred_by": p.referred_by,
                        ":public_portfolio": p.public_portfolio,
                        ":active": p.active,
                        ":verified": p.verified,
                        ":updated_at": user.updated_at,
                        ":id": user.id,
                    },
                )
                .map_err(|e| DbError::from_write(e, "Username already taken."))?;
            if n == 0 {
                return Err(DbError::NotFound);
            }
            Ok(())
        })
        .inspect_err(|e| warn!(user_id = user.id, "UserRepo update error: {}", e))?;
        Ok(user)
    }

    /// Marks the user deleted. Only `deleted_at` is written.
    pub fn soft_delete_user(&self, user: &mut User) -> Result<(), DbError> {
        user.mark_deleted();
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET deleted_at = ?1 WHERE id = ?2",
                params![user.deleted_at, user.id],
            )?;
            Ok(())
        })
        .inspect_err(|e| warn!(user_id = user.id, "UserRepo delete error: {}", e))
    }
}

fn query_user<P: Params>(conn: &Connection, clause: &str, params: P) -> Result<User, DbError> {
    let sql = format!("{USER_SELECT} WHERE {clause} AND u.deleted_at IS NULL");
    conn.query_row(&sql, params, user_from_row)
        .map_err(|e| lookup_failed(e, clause))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        email: row.get("email")?,
        password: row.get("password")?,
        token: row.get("token")?,
        referral_code: row.get("referral_code")?,
        role: Role {
            id: row.get("role_id")?,
            access_level: row.get("role_access_level")?,
            name: row.get("role_name")?,
        },
        profile: UserProfile {
            username: row.get("username")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            mobile: row.get("mobile")?,
            country_code: row.get("country_code")?,
            address: row.get("address")?,
            city: row.get("city")?,
            state: row.get("state")?,
            country: row.get("country")?,
            zip_code: row.get("zip_code")?,
            dob: row.get("dob")?,
            bio: row.get("bio")?,
            avatar: row.get("avatar")?,
            occupation: row.get("occupation")?,
            employer_name: row.get("employer_name")?,
            account_status: row.get("account_status")?,
            facebook_url: row.get("facebook_url")?,
            twitter_url: row.get("twitter_url")?,
            instagram_url: row.get("instagram_url")?,
            referred_by: row.get("referred_by")?,
            public_portfolio: row.get("public_portfolio")?,
            active: row.get("active")?,
            verified: row.get("verified")?,
        },
        last_login: row.get("last_login")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}
