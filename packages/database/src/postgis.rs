//! [`DenunciaStore`] backed by `PostGIS`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use denuncia_database_models::{
    DenunciaChanges, DenunciaFilter, DenunciaRow, HistorySnapshot, SortOrder, UserIdentity,
    Window,
};
use denuncia_models::RecordedStatus;
use switchy_database::{Database, DatabaseTransaction};
use uuid::Uuid;

use crate::store::DenunciaStore;
use crate::{DbError, queries};

/// Incident store over a `switchy_database` connection.
///
/// Inserts and updates run inside a transaction together with their
/// history snapshot and are rolled back as a unit on failure.
#[derive(Clone)]
pub struct PostgisStore {
    db: Arc<dyn Database>,
}

impl PostgisStore {
    /// Wraps an open connection. Migrations must already have run.
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub fn database(&self) -> &dyn Database {
        self.db.as_ref()
    }
}

/// Commits `txn` when `result` is `Ok`, otherwise rolls it back and
/// returns the original error.
async fn finish<T: Send>(
    txn: Box<dyn DatabaseTransaction>,
    result: Result<T, DbError>,
) -> Result<T, DbError> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = txn.rollback().await {
                log::error!("Rollback failed after {e}: {rollback}");
            }
            Err(e)
        }
    }
}

async fn insert_with_snapshot(
    db: &dyn Database,
    row: &DenunciaRow,
    actor_id: Option<Uuid>,
) -> Result<(), DbError> {
    if !queries::insert_denuncia(db, row).await? {
        return Err(DbError::DuplicateProtocol {
            protocolo: row.protocolo.clone(),
        });
    }
    queries::insert_snapshot(db, row, actor_id, row.created_at).await
}

async fn update_with_snapshot(
    db: &dyn Database,
    id: Uuid,
    changes: &DenunciaChanges,
    actor_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<Option<DenunciaRow>, DbError> {
    let Some(mut row) = queries::get_denuncia(db, id, true).await? else {
        return Ok(None);
    };
    changes.apply(&mut row, now);
    queries::update_denuncia(db, &row).await?;
    queries::insert_snapshot(db, &row, actor_id, now).await?;
    Ok(Some(row))
}

#[async_trait]
impl DenunciaStore for PostgisStore {
    async fn insert(&self, row: &DenunciaRow, actor_id: Option<Uuid>) -> Result<(), DbError> {
        let txn = self.db.begin_transaction().await?;
        let result = insert_with_snapshot(txn.as_ref(), row, actor_id).await;
        finish(txn, result).await
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &DenunciaChanges,
        actor_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Option<DenunciaRow>, DbError> {
        let txn = self.db.begin_transaction().await?;
        let result = update_with_snapshot(txn.as_ref(), id, changes, actor_id, now).await;
        finish(txn, result).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        queries::delete_denuncia(self.db.as_ref(), id).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<DenunciaRow>, DbError> {
        queries::get_denuncia(self.db.as_ref(), id, false).await
    }

    async fn get_by_protocol(&self, protocolo: &str) -> Result<Option<DenunciaRow>, DbError> {
        queries::get_denuncia_by_protocol(self.db.as_ref(), protocolo).await
    }

    async fn query(
        &self,
        filter: &DenunciaFilter,
        order: SortOrder,
        window: Window,
    ) -> Result<Vec<DenunciaRow>, DbError> {
        queries::query_denuncias(self.db.as_ref(), filter, order, window).await
    }

    async fn count(&self, filter: &DenunciaFilter) -> Result<u64, DbError> {
        queries::count_denuncias(self.db.as_ref(), filter).await
    }

    async fn count_by_status(
        &self,
        filter: &DenunciaFilter,
    ) -> Result<Vec<(RecordedStatus, u64)>, DbError> {
        queries::count_by_status(self.db.as_ref(), filter).await
    }

    async fn snapshots(&self, denuncia_id: Uuid) -> Result<Vec<HistorySnapshot>, DbError> {
        queries::get_snapshots(self.db.as_ref(), denuncia_id).await
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<UserIdentity>, DbError> {
        queries::find_user(self.db.as_ref(), id).await
    }

    async fn count_active_users(&self) -> Result<u64, DbError> {
        queries::count_active_users(self.db.as_ref()).await
    }

    async fn save_user(&self, user: &UserIdentity) -> Result<(), DbError> {
        queries::upsert_user(self.db.as_ref(), user).await
    }
}
