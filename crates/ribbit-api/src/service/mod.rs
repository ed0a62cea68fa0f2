//! Application use cases. Each method runs at most one authorization check
//! and one or two repository calls; nothing here spans a transaction.

mod posts;
mod users;

use std::sync::Arc;

use ribbit_db::Database;
use ribbit_db::models::ListQuery;
use ribbit_types::models::AuthUser;

use crate::rbac::Rbac;

pub struct Service {
    db: Arc<Database>,
    rbac: Arc<dyn Rbac>,
}

impl Service {
    pub fn new(db: Arc<Database>, rbac: Arc<dyn Rbac>) -> Self {
        Self { db, rbac }
    }

    /// Admins list everything; everyone else only sees their own records.
    fn list_query(&self, caller: &AuthUser) -> Option<ListQuery> {
        if self.rbac.is_admin(caller) {
            None
        } else {
            Some(ListQuery {
                owner_id: caller.id,
            })
        }
    }
}

/// Overwrite `slot` only when the payload carried a value.
fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn merge_opt<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}
