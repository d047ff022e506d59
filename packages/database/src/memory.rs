//! In-process incident store.
//!
//! All state lives behind one [`RwLock`]; a mutation and its snapshot are
//! applied under the same write guard, so readers never observe one
//! without the other.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use denuncia_database_models::{
    DenunciaChanges, DenunciaFilter, DenunciaRow, HistorySnapshot, SortOrder, UserIdentity,
    Window,
};
use denuncia_models::RecordedStatus;
use uuid::Uuid;

use crate::DbError;
use crate::store::DenunciaStore;

#[derive(Debug, Default)]
struct State {
    rows: BTreeMap<Uuid, DenunciaRow>,
    snapshots: Vec<HistorySnapshot>,
    users: BTreeMap<Uuid, UserIdentity>,
    next_sequence: i64,
}

impl State {
    fn push_snapshot(&mut self, row: &DenunciaRow, actor_id: Option<Uuid>, at: DateTime<Utc>) {
        self.next_sequence += 1;
        self.snapshots
            .push(HistorySnapshot::capture(row, self.next_sequence, actor_id, at));
    }

    fn matching<'a>(
        &'a self,
        filter: &'a DenunciaFilter,
    ) -> impl Iterator<Item = &'a DenunciaRow> {
        self.rows.values().filter(move |row| filter.matches(row))
    }
}

/// Incident store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, DbError> {
        self.state.read().map_err(|_| DbError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, DbError> {
        self.state.write().map_err(|_| DbError::LockPoisoned)
    }
}

fn to_index(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[async_trait]
impl DenunciaStore for MemoryStore {
    async fn insert(&self, row: &DenunciaRow, actor_id: Option<Uuid>) -> Result<(), DbError> {
        let mut state = self.write()?;
        if state.rows.values().any(|r| r.protocolo == row.protocolo) {
            return Err(DbError::DuplicateProtocol {
                protocolo: row.protocolo.clone(),
            });
        }
        state.push_snapshot(row, actor_id, row.created_at);
        state.rows.insert(row.id, row.clone());
        drop(state);
        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &DenunciaChanges,
        actor_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Option<DenunciaRow>, DbError> {
        let mut state = self.write()?;
        let Some(mut row) = state.rows.get(&id).cloned() else {
            return Ok(None);
        };
        changes.apply(&mut row, now);
        state.push_snapshot(&row, actor_id, now);
        state.rows.insert(id, row.clone());
        drop(state);
        Ok(Some(row))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        Ok(self.write()?.rows.remove(&id).is_some())
    }

    async fn get(&self, id: Uuid) -> Result<Option<DenunciaRow>, DbError> {
        Ok(self.read()?.rows.get(&id).cloned())
    }

    async fn get_by_protocol(&self, protocolo: &str) -> Result<Option<DenunciaRow>, DbError> {
        Ok(self
            .read()?
            .rows
            .values()
            .find(|row| row.protocolo == protocolo)
            .cloned())
    }

    async fn query(
        &self,
        filter: &DenunciaFilter,
        order: SortOrder,
        window: Window,
    ) -> Result<Vec<DenunciaRow>, DbError> {
        let state = self.read()?;
        let mut rows: Vec<&DenunciaRow> = state.matching(filter).collect();
        rows.sort_by(|a, b| {
            let ascending = a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id));
            match order {
                SortOrder::CreatedAsc => ascending,
                SortOrder::CreatedDesc => ascending.reverse(),
            }
        });

        let rows = rows
            .into_iter()
            .skip(to_index(window.offset))
            .take(window.limit.map_or(usize::MAX, to_index))
            .cloned()
            .collect();
        drop(state);
        Ok(rows)
    }

    async fn count(&self, filter: &DenunciaFilter) -> Result<u64, DbError> {
        let count = self.read()?.matching(filter).count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn count_by_status(
        &self,
        filter: &DenunciaFilter,
    ) -> Result<Vec<(RecordedStatus, u64)>, DbError> {
        let state = self.read()?;
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for row in state.matching(filter) {
            *counts.entry(row.status.as_str().to_string()).or_default() += 1;
        }
        drop(state);
        Ok(counts
            .into_iter()
            .map(|(status, count)| (RecordedStatus::from(status), count))
            .collect())
    }

    async fn snapshots(&self, denuncia_id: Uuid) -> Result<Vec<HistorySnapshot>, DbError> {
        let state = self.read()?;
        let mut snapshots: Vec<HistorySnapshot> = state
            .snapshots
            .iter()
            .filter(|s| s.denuncia_id == denuncia_id)
            .cloned()
            .collect();
        drop(state);
        snapshots.sort_by(|a, b| {
            b.recorded_at
                .cmp(&a.recorded_at)
                .then_with(|| b.sequence.cmp(&a.sequence))
        });
        Ok(snapshots)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<UserIdentity>, DbError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn count_active_users(&self) -> Result<u64, DbError> {
        let count = self.read()?.users.values().filter(|u| u.is_active).count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn save_user(&self, user: &UserIdentity) -> Result<(), DbError> {
        self.write()?.users.insert(user.id, user.clone());
        Ok(())
    }
}
