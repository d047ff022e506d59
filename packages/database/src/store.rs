//! The storage seam consumed by the query, aggregation, and history crates.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use denuncia_database_models::{
    DenunciaChanges, DenunciaFilter, DenunciaRow, HistorySnapshot, NewDenuncia, SortOrder,
    UserIdentity, Window,
};
use denuncia_models::{RecordedStatus, generate_protocol};
use uuid::Uuid;

use crate::DbError;

/// Maximum number of protocol codes tried before giving up on a create.
pub const MAX_PROTOCOL_ATTEMPTS: u32 = 5;

/// A store of incident records with point geometry, timestamps, and an
/// append-only snapshot log.
///
/// Implementations must write a [`HistorySnapshot`] in the same atomic
/// step as every insert and update: either both are persisted or neither.
#[async_trait]
pub trait DenunciaStore: Send + Sync {
    /// Inserts a new incident together with its creation snapshot.
    ///
    /// # Errors
    ///
    /// * [`DbError::DuplicateProtocol`] if the protocol code is taken
    /// * [`DbError`] if the write fails; nothing is persisted in that case
    async fn insert(&self, row: &DenunciaRow, actor_id: Option<Uuid>) -> Result<(), DbError>;

    /// Applies `changes` to an incident and appends a snapshot of the
    /// result. Returns `None` when the incident does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the write fails; the incident is left
    /// untouched in that case.
    async fn update(
        &self,
        id: Uuid,
        changes: &DenunciaChanges,
        actor_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Option<DenunciaRow>, DbError>;

    /// Deletes an incident. Its snapshots are kept. Returns whether a row
    /// was removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the delete fails.
    async fn delete(&self, id: Uuid) -> Result<bool, DbError>;

    /// Fetches one incident by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the lookup fails.
    async fn get(&self, id: Uuid) -> Result<Option<DenunciaRow>, DbError>;

    /// Fetches one incident by protocol code.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the lookup fails.
    async fn get_by_protocol(&self, protocolo: &str) -> Result<Option<DenunciaRow>, DbError>;

    /// Returns the rows matching `filter`, ordered by creation time (ties
    /// broken by id in the same direction) and sliced to `window`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    async fn query(
        &self,
        filter: &DenunciaFilter,
        order: SortOrder,
        window: Window,
    ) -> Result<Vec<DenunciaRow>, DbError>;

    /// Counts the rows matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    async fn count(&self, filter: &DenunciaFilter) -> Result<u64, DbError>;

    /// Counts the rows matching `filter` grouped by raw status value,
    /// sorted by that value. Statuses with no rows are absent.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    async fn count_by_status(
        &self,
        filter: &DenunciaFilter,
    ) -> Result<Vec<(RecordedStatus, u64)>, DbError>;

    /// Returns every snapshot of one incident, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    async fn snapshots(&self, denuncia_id: Uuid) -> Result<Vec<HistorySnapshot>, DbError>;

    /// Looks up a user projection by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the lookup fails.
    async fn find_user(&self, id: Uuid) -> Result<Option<UserIdentity>, DbError>;

    /// Counts active user accounts.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    async fn count_active_users(&self) -> Result<u64, DbError>;

    /// Inserts or replaces a user projection.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the write fails.
    async fn save_user(&self, user: &UserIdentity) -> Result<(), DbError>;
}

/// Creates an incident with a freshly generated protocol code.
///
/// The protocol date is the creation date in `tz`. On a protocol collision
/// a new code is drawn, up to [`MAX_PROTOCOL_ATTEMPTS`] times.
///
/// # Errors
///
/// * [`DbError::ProtocolExhausted`] if every attempted code collided
/// * [`DbError`] if the insert fails for any other reason
pub async fn create_denuncia(
    store: &dyn DenunciaStore,
    new: NewDenuncia,
    actor_id: Option<Uuid>,
    now: DateTime<Utc>,
    tz: FixedOffset,
) -> Result<DenunciaRow, DbError> {
    let date = now.with_timezone(&tz).date_naive();
    let mut row = DenunciaRow {
        id: Uuid::new_v4(),
        protocolo: generate_protocol(date),
        categoria: new.categoria,
        descricao: new.descricao,
        longitude: new.longitude,
        latitude: new.latitude,
        midia: new.midia,
        audio: new.audio,
        status: new.status.unwrap_or_default().into(),
        reporter_id: new.reporter_id,
        assigned_to: None,
        created_at: now,
        updated_at: now,
    };

    for attempt in 1..=MAX_PROTOCOL_ATTEMPTS {
        match store.insert(&row, actor_id).await {
            Ok(()) => {
                log::info!("Created denuncia {} ({})", row.protocolo, row.id);
                return Ok(row);
            }
            Err(DbError::DuplicateProtocol { protocolo }) => {
                log::warn!("Protocol collision on {protocolo} (attempt {attempt})");
                row.protocolo = generate_protocol(date);
            }
            Err(e) => return Err(e),
        }
    }

    Err(DbError::ProtocolExhausted {
        attempts: MAX_PROTOCOL_ATTEMPTS,
    })
}
