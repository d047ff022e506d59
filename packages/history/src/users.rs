//! Request-scoped user lookup.

use std::collections::BTreeMap;

use denuncia_database::{DbError, DenunciaStore};
use denuncia_database_models::UserIdentity;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User payload embedded in history entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Account ID.
    pub id: Uuid,
    /// Login identifier.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Whether the account is active.
    pub is_active: bool,
    /// Whether the account belongs to staff.
    pub is_staff: bool,
}

impl From<&UserIdentity> for UserSummary {
    fn from(user: &UserIdentity) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            is_active: user.is_active,
            is_staff: user.is_staff(),
        }
    }
}

/// Memoizes user lookups for the lifetime of one request.
///
/// Misses are cached as well, so an unknown id is looked up once.
pub struct UserCache<'a> {
    store: &'a dyn DenunciaStore,
    resolved: BTreeMap<Uuid, Option<UserSummary>>,
}

impl<'a> UserCache<'a> {
    /// Creates an empty cache over `store`.
    #[must_use]
    pub fn new(store: &'a dyn DenunciaStore) -> Self {
        Self {
            store,
            resolved: BTreeMap::new(),
        }
    }

    /// Resolves `id`; `None` and unknown ids resolve to `None`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the lookup fails.
    pub async fn resolve(&mut self, id: Option<Uuid>) -> Result<Option<UserSummary>, DbError> {
        let Some(id) = id else {
            return Ok(None);
        };
        if let Some(cached) = self.resolved.get(&id) {
            return Ok(cached.clone());
        }

        let user = self.store.find_user(id).await?.as_ref().map(UserSummary::from);
        if user.is_none() {
            log::debug!("History references unknown user {id}");
        }
        self.resolved.insert(id, user.clone());
        Ok(user)
    }
}
