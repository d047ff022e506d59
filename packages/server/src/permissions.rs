//! Who may change which incident.

use actix_web::HttpRequest;
use denuncia_database::{DbError, DenunciaStore};
use denuncia_database_models::{DenunciaRow, UserIdentity, UserRole};
use uuid::Uuid;

/// Header carrying the id of the acting user.
pub const ACTOR_HEADER: &str = "X-User-Id";

/// A mutation subject to a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create a new incident.
    Create,
    /// Edit an incident's fields or status.
    Update,
    /// Change the assigned staff member.
    Assign,
    /// Delete an incident.
    Delete,
}

/// Decides whether an actor may perform an action. `actor` is `None` for
/// anonymous requests; `incident` is `None` for [`Action::Create`].
pub trait PermissionPolicy: Send + Sync {
    /// Returns whether the action is allowed.
    fn can_act(
        &self,
        actor: Option<&UserIdentity>,
        action: Action,
        incident: Option<&DenunciaRow>,
    ) -> bool;
}

/// Role based policy:
///
/// * anyone may create
/// * staff and admins may update and assign
/// * the reporting user or an admin may delete
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePolicy;

impl PermissionPolicy for RolePolicy {
    fn can_act(
        &self,
        actor: Option<&UserIdentity>,
        action: Action,
        incident: Option<&DenunciaRow>,
    ) -> bool {
        match (action, actor) {
            (Action::Create, _) => true,
            (_, None) => false,
            (Action::Update | Action::Assign, Some(user)) => user.is_staff(),
            (Action::Delete, Some(user)) => {
                user.role == UserRole::Admin
                    || incident.is_some_and(|row| row.reporter_id == Some(user.id))
            }
        }
    }
}

/// Resolves the acting user from [`ACTOR_HEADER`]. Missing or malformed
/// ids, unknown users and inactive accounts all count as anonymous.
///
/// The header is trusted as-is. It must be set by an authenticating proxy
/// in front of the server, which also strips any client-supplied value.
///
/// # Errors
///
/// Returns [`DbError`] if the user lookup fails.
pub async fn current_actor(
    req: &HttpRequest,
    store: &dyn DenunciaStore,
) -> Result<Option<UserIdentity>, DbError> {
    let Some(raw) = req.headers().get(ACTOR_HEADER) else {
        return Ok(None);
    };
    let Some(id) = raw.to_str().ok().and_then(|s| Uuid::parse_str(s.trim()).ok()) else {
        log::debug!("Ignoring malformed {ACTOR_HEADER} header");
        return Ok(None);
    };

    Ok(store.find_user(id).await?.filter(|user| user.is_active))
}
