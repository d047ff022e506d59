//! Pure diff over adjacent snapshots.

use chrono::{DateTime, Utc};
use denuncia_database_models::HistorySnapshot;
use denuncia_models::RecordedStatus;
use uuid::Uuid;

/// A field whose changes appear in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedField {
    /// Review status.
    Status,
    /// Assigned staff member.
    Assignee,
}

impl TrackedField {
    /// Every tracked field, in the order entries are emitted for one pair.
    pub const ALL: [Self; 2] = [Self::Status, Self::Assignee];

    /// Name reported in the `field` key.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Assignee => "usuario",
        }
    }

    fn value_of(self, snapshot: &HistorySnapshot) -> FieldValue {
        match self {
            Self::Status => FieldValue::Status(snapshot.status.clone()),
            Self::Assignee => FieldValue::User(snapshot.assigned_to),
        }
    }
}

/// Raw value of a tracked field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Stored status value.
    Status(RecordedStatus),
    /// User id, if any.
    User(Option<Uuid>),
}

/// One tracked field that differs between two adjacent snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    /// Which field changed.
    pub field: TrackedField,
    /// Value in the older snapshot.
    pub old: FieldValue,
    /// Value in the newer snapshot.
    pub new: FieldValue,
    /// When the newer snapshot was recorded.
    pub changed_at: DateTime<Utc>,
    /// Who produced the newer snapshot.
    pub actor_id: Option<Uuid>,
}

/// Diffs `snapshots` (newest first) pair by pair.
///
/// Changes come out newest first, and within one pair in
/// [`TrackedField::ALL`] order. Fewer than two snapshots yield nothing.
#[must_use]
pub fn diff_snapshots(snapshots: &[HistorySnapshot]) -> Vec<FieldChange> {
    snapshots
        .windows(2)
        .flat_map(|pair| {
            let (current, previous) = (&pair[0], &pair[1]);
            TrackedField::ALL.into_iter().filter_map(move |field| {
                let new = field.value_of(current);
                let old = field.value_of(previous);
                (new != old).then(|| FieldChange {
                    field,
                    old,
                    new,
                    changed_at: current.recorded_at,
                    actor_id: current.actor_id,
                })
            })
        })
        .collect()
}
