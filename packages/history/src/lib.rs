#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Change history of one incident.
//!
//! Every mutation of an incident appends a [`HistorySnapshot`]. The
//! history shown to users is derived from those snapshots: adjacent pairs
//! are compared newest first and every tracked field that differs becomes
//! a [`HistoryEntry`]. Assignee ids are resolved to user payloads through
//! a [`users::UserCache`] that lives for one call only.
//!
//! [`HistorySnapshot`]: denuncia_database_models::HistorySnapshot

pub mod diff;
pub mod users;

use chrono::{DateTime, Utc};
use denuncia_database::{DbError, DenunciaStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use diff::{FieldChange, FieldValue, TrackedField, diff_snapshots};
pub use users::{UserCache, UserSummary};

/// Errors that can occur while building a history.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// Store error.
    #[error(transparent)]
    Store(#[from] DbError),

    /// The incident does not exist.
    #[error("Incident not found: {id}")]
    NotFound {
        /// Requested incident id.
        id: Uuid,
    },

    /// A value could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One change to a tracked field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// `"status"` or `"usuario"`.
    pub field: String,
    /// Value before the change: a raw status string or a user payload.
    pub old_value: serde_json::Value,
    /// Value after the change.
    pub new_value: serde_json::Value,
    /// When the change was recorded.
    pub changed_at: DateTime<Utc>,
    /// Who made the change.
    pub user: Option<UserSummary>,
}

async fn field_value(
    value: FieldValue,
    users: &mut UserCache<'_>,
) -> Result<serde_json::Value, HistoryError> {
    Ok(match value {
        FieldValue::Status(status) => serde_json::Value::String(status.into()),
        FieldValue::User(id) => serde_json::to_value(users.resolve(id).await?)?,
    })
}

/// Resolves raw changes into entries, keeping their order.
///
/// # Errors
///
/// Returns [`HistoryError`] if a user lookup fails.
pub async fn resolve_changes(
    changes: Vec<FieldChange>,
    users: &mut UserCache<'_>,
) -> Result<Vec<HistoryEntry>, HistoryError> {
    let mut entries = Vec::with_capacity(changes.len());
    for change in changes {
        entries.push(HistoryEntry {
            field: change.field.label().to_string(),
            old_value: field_value(change.old, users).await?,
            new_value: field_value(change.new, users).await?,
            changed_at: change.changed_at,
            user: users.resolve(change.actor_id).await?,
        });
    }
    Ok(entries)
}

/// Builds the change history of incident `id`, most recent change first.
///
/// # Errors
///
/// * [`HistoryError::NotFound`] if the incident does not exist
/// * [`HistoryError::Store`] if a store query fails
pub async fn load_history(
    store: &dyn DenunciaStore,
    id: Uuid,
) -> Result<Vec<HistoryEntry>, HistoryError> {
    if store.get(id).await?.is_none() {
        return Err(HistoryError::NotFound { id });
    }

    let snapshots = store.snapshots(id).await?;
    let changes = diff_snapshots(&snapshots);
    log::debug!(
        "Incident {id}: {} snapshots, {} tracked changes",
        snapshots.len(),
        changes.len()
    );

    let mut users = UserCache::new(store);
    resolve_changes(changes, &mut users).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use chrono::{Duration, TimeZone as _};
    use denuncia_database_models::{DenunciaChanges, DenunciaRow};
    use denuncia_models::{DenunciaStatus, RecordedStatus};

    use super::*;
    use crate::users::tests::{CountingStore, staff};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap()
    }

    async fn seeded(store: &CountingStore) -> Uuid {
        let row = DenunciaRow {
            id: Uuid::new_v4(),
            protocolo: "DEN20251001-ABC123".to_string(),
            categoria: "Vandalismo".to_string(),
            descricao: "Ponto de ônibus depredado".to_string(),
            longitude: -46.6333,
            latitude: -23.5505,
            midia: None,
            audio: None,
            status: RecordedStatus::default(),
            reporter_id: None,
            assigned_to: None,
            created_at: t0(),
            updated_at: t0(),
        };
        store.insert(&row, None).await.unwrap();
        row.id
    }

    #[tokio::test]
    async fn new_incident_has_empty_history() {
        let store = CountingStore::default();
        let id = seeded(&store).await;
        assert!(load_history(&store, id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_incident_is_not_found() {
        let store = CountingStore::default();
        let err = load_history(&store, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, HistoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn status_change_is_reported_with_actor() {
        let store = CountingStore::default();
        let reviewer = staff(1);
        store.save_user(&reviewer).await.unwrap();
        let id = seeded(&store).await;

        store
            .update(
                id,
                &DenunciaChanges {
                    status: Some(DenunciaStatus::Aprovado.into()),
                    ..DenunciaChanges::default()
                },
                Some(reviewer.id),
                t0() + Duration::hours(1),
            )
            .await
            .unwrap();

        let history = load_history(&store, id).await.unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].field, "status");
        assert_eq!(history[0].old_value, serde_json::json!("em_analise"));
        assert_eq!(history[0].new_value, serde_json::json!("aprovado"));
        assert_eq!(history[0].changed_at, t0() + Duration::hours(1));
        assert_eq!(history[0].user.as_ref().map(|u| u.id), Some(reviewer.id));
    }

    #[tokio::test]
    async fn assignee_values_resolve_to_user_payloads() {
        let store = CountingStore::default();
        let reviewer = staff(1);
        let assignee = staff(2);
        store.save_user(&reviewer).await.unwrap();
        store.save_user(&assignee).await.unwrap();
        let id = seeded(&store).await;

        for (minutes, assigned) in [(10, Some(assignee.id)), (20, None), (30, Some(assignee.id))] {
            store
                .update(
                    id,
                    &DenunciaChanges {
                        assigned_to: Some(assigned),
                        ..DenunciaChanges::default()
                    },
                    Some(reviewer.id),
                    t0() + Duration::minutes(minutes),
                )
                .await
                .unwrap();
        }

        let history = load_history(&store, id).await.unwrap();

        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|e| e.field == "usuario"));
        assert!(history[0].changed_at > history[1].changed_at);
        assert_eq!(history[0].old_value, serde_json::Value::Null);
        assert_eq!(history[0].new_value["email"], "fiscal2@prefeitura.gov.br");
        assert_eq!(history[1].new_value, serde_json::Value::Null);
        // Two distinct ids, each looked up once.
        assert_eq!(store.user_lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn description_edits_are_not_history() {
        let store = CountingStore::default();
        let id = seeded(&store).await;
        store
            .update(
                id,
                &DenunciaChanges {
                    descricao: Some("Atualizado".to_string()),
                    ..DenunciaChanges::default()
                },
                None,
                t0() + Duration::minutes(5),
            )
            .await
            .unwrap();

        assert!(load_history(&store, id).await.unwrap().is_empty());
    }
}
