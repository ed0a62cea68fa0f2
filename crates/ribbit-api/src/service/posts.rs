use std::collections::HashMap;

use ribbit_db::models::NewPost;
use ribbit_types::api::{CommentUpdate, PostCreate, PostUpdate};
use ribbit_types::models::{AuthUser, Pagination, Post, PostContent};

use super::{Service, merge};
use crate::error::AppError;

/// Highest identity a client may pick for a new post or comment. The rest of
/// the rowid space stays reserved for store-assigned ids.
pub const MAX_CLIENT_ID: i64 = i32::MAX as i64;

impl Service {
    pub fn create_post(&self, caller: &AuthUser, req: PostCreate) -> Result<Post, AppError> {
        if !self.rbac.enforce_user(caller, caller.id) {
            return Err(AppError::Forbidden);
        }
        if req.parent_id.is_some() {
            return Err(AppError::Validation("A post cannot have a parent_id.".into()));
        }
        check_client_id(req.id)?;
        Ok(self.db.create_post(&new_post(caller, req))?)
    }

    /// Comments hang off an existing post and are always public.
    pub fn create_comment(&self, caller: &AuthUser, req: PostCreate) -> Result<Post, AppError> {
        if !self.rbac.enforce_user(caller, caller.id) {
            return Err(AppError::Forbidden);
        }
        let parent_id = req
            .parent_id
            .ok_or_else(|| AppError::Validation("A comment requires a parent_id.".into()))?;
        check_client_id(req.id)?;
        let parent = self.db.get_post_by_id(parent_id)?;
        if parent.is_comment() {
            return Err(AppError::Validation("Comments can only be added to posts.".into()));
        }

        let mut new = new_post(caller, req);
        new.content.is_private = false;
        Ok(self.db.create_comment(parent.id, &new)?)
    }

    pub fn list_posts(&self, p: &Pagination) -> Result<Vec<Post>, AppError> {
        Ok(self.db.list_posts(None, p)?)
    }

    pub fn list_private_posts(&self, caller: &AuthUser, p: &Pagination) -> Result<Vec<Post>, AppError> {
        Ok(self.db.list_private_posts(self.list_query(caller), p)?)
    }

    pub fn list_post_comments(&self, post_id: i64, p: &Pagination) -> Result<Vec<Post>, AppError> {
        Ok(self.db.list_post_comments(post_id, None, p)?)
    }

    pub fn comment_counts(&self, post_ids: &[i64]) -> Result<HashMap<i64, i64>, AppError> {
        Ok(self.db.count_comments_by_parents(post_ids)?)
    }

    pub fn update_post(&self, caller: &AuthUser, id: i64, update: PostUpdate) -> Result<Post, AppError> {
        let mut post = self.top_level_post(id)?;
        if !self.rbac.enforce_user(caller, post.added_by) {
            return Err(AppError::Forbidden);
        }

        let content = &mut post.content;
        merge(&mut content.title, update.title);
        merge(&mut content.description, update.description);
        merge(&mut content.is_private, update.is_private);
        merge(&mut content.attachments, update.attachments);
        Ok(self.db.update_post(post)?)
    }

    pub fn update_comment(
        &self,
        caller: &AuthUser,
        id: i64,
        update: CommentUpdate,
    ) -> Result<Post, AppError> {
        let mut comment = self.db.get_comment_by_id(id)?;
        if !self.rbac.enforce_user(caller, comment.added_by) {
            return Err(AppError::Forbidden);
        }

        merge(&mut comment.content.description, update.description);
        Ok(self.db.update_comment(comment)?)
    }

    pub fn delete_post(&self, caller: &AuthUser, id: i64) -> Result<(), AppError> {
        let mut post = self.top_level_post(id)?;
        if !self.rbac.enforce_user(caller, post.added_by) {
            return Err(AppError::Forbidden);
        }
        self.db.soft_delete_post(&mut post)?;
        Ok(())
    }

    pub fn delete_comment(&self, caller: &AuthUser, id: i64) -> Result<(), AppError> {
        let mut comment = self.db.get_comment_by_id(id)?;
        if !self.rbac.enforce_user(caller, comment.added_by) {
            return Err(AppError::Forbidden);
        }
        self.db.soft_delete_comment(&mut comment)?;
        Ok(())
    }

    /// Comments are reached through the comment routes only.
    fn top_level_post(&self, id: i64) -> Result<Post, AppError> {
        let post = self.db.get_post_by_id(id)?;
        if post.is_comment() {
            return Err(AppError::NotFound);
        }
        Ok(post)
    }
}

fn check_client_id(id: Option<i64>) -> Result<(), AppError> {
    match id {
        Some(id) if id > MAX_CLIENT_ID => Err(AppError::Validation(format!(
            "id must not exceed {MAX_CLIENT_ID}"
        ))),
        _ => Ok(()),
    }
}

fn new_post(caller: &AuthUser, req: PostCreate) -> NewPost {
    NewPost {
        id: req.id,
        added_by: caller.id,
        email: Some(caller.email.clone()),
        content: PostContent {
            title: req.title.unwrap_or_default(),
            description: req.description.unwrap_or_default(),
            is_private: req.is_private,
            attachments: req.attachments,
        },
    }
}
