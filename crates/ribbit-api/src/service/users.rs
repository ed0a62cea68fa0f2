use ribbit_types::api::{ReferralCodeVerifyResponse, UserUpdate};
use ribbit_types::models::{AuthUser, Pagination, User, UserProfile};

use super::{Service, merge, merge_opt};
use crate::error::AppError;

impl Service {
    pub fn list_users(&self, caller: &AuthUser, p: &Pagination) -> Result<Vec<User>, AppError> {
        Ok(self.db.list_users(self.list_query(caller), p)?)
    }

    pub fn view_user(&self, caller: &AuthUser, id: i64) -> Result<User, AppError> {
        if !self.rbac.enforce_user(caller, id) {
            return Err(AppError::Forbidden);
        }
        Ok(self.db.get_user_by_id(id)?)
    }

    /// Looks `key` up as a username, then as an email. A hit without a
    /// positive identity still counts as not found.
    pub fn search_user(&self, key: &str) -> Result<User, AppError> {
        let found = self
            .db
            .get_user_by_username(key)
            .or_else(|_| self.db.get_user_by_email(key));
        match found {
            Ok(user) if user.id > 0 => Ok(user),
            // Rows written outside the service (imports, manual fixes) can
            // carry id 0; they are not addressable by the other routes.
            Ok(_) => Err(AppError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub fn update_user(
        &self,
        caller: &AuthUser,
        id: i64,
        update: UserUpdate,
    ) -> Result<User, AppError> {
        if !self.rbac.enforce_user(caller, id) {
            return Err(AppError::Forbidden);
        }
        let mut user = self.db.get_user_by_id(id)?;
        merge_profile(&mut user.profile, update);
        Ok(self.db.update_user(user)?)
    }

    /// Users may delete themselves; deleting anyone else needs a strictly
    /// higher role than the target's.
    pub fn delete_user(&self, caller: &AuthUser, id: i64) -> Result<(), AppError> {
        let mut user = self.db.get_user_by_id(id)?;
        if caller.id != user.id && !self.rbac.is_lower_role(caller, user.role.access_level) {
            return Err(AppError::Forbidden);
        }
        self.db.soft_delete_user(&mut user)?;
        Ok(())
    }

    pub fn verify_referral_code(&self, code: &str) -> Result<ReferralCodeVerifyResponse, AppError> {
        let user = self.db.get_user_by_referral_code(code)?;
        Ok(ReferralCodeVerifyResponse {
            first_name: user.profile.first_name,
            last_name: user.profile.last_name,
            referral_code: user.referral_code.unwrap_or_default(),
            username: user.profile.username,
        })
    }
}

fn merge_profile(profile: &mut UserProfile, update: UserUpdate) {
    merge(&mut profile.username, update.username);
    merge_opt(&mut profile.first_name, update.first_name);
    merge_opt(&mut profile.last_name, update.last_name);
    merge_opt(&mut profile.mobile, update.mobile);
    merge_opt(&mut profile.country_code, update.country_code);
    merge_opt(&mut profile.address, update.address);
    merge_opt(&mut profile.city, update.city);
    merge_opt(&mut profile.state, update.state);
    merge_opt(&mut profile.country, update.country);
    merge_opt(&mut profile.zip_code, update.zip_code);
    merge_opt(&mut profile.dob, update.dob);
    merge_opt(&mut profile.bio, update.bio);
    merge_opt(&mut profile.avatar, update.avatar);
    merge_opt(&mut profile.occupation, update.occupation);
    merge_opt(&mut profile.employer_name, update.employer_name);
    merge_opt(&mut profile.facebook_url, update.facebook_url);
    merge_opt(&mut profile.twitter_url, update.twitter_url);
    merge_opt(&mut profile.instagram_url, update.instagram_url);
    merge(&mut profile.public_portfolio, update.public_portfolio);
}
