#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident rows, history snapshots, and query predicate definitions.
//!
//! These types represent the shapes of data as stored in and retrieved from
//! the incident store. They are distinct from the API response types in
//! `denuncia_server_models`.

pub mod query;

use chrono::{DateTime, Utc};
use denuncia_models::{DenunciaStatus, RecordedStatus};
use geo::{Intersects, Point, Polygon, Rect, coord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use query::{
    CategoryMatch, DEFAULT_PAGE_SIZE, DenunciaFilter, MAX_PAGE_SIZE, Page, PageRequest, SortOrder,
    Window,
};

/// Maximum length of an incident description, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Maximum length of an incident category, in characters.
pub const MAX_CATEGORY_LENGTH: usize = 100;

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Builds the rectangular polygon covered by this box.
    #[must_use]
    pub fn to_polygon(&self) -> Polygon<f64> {
        Rect::new(
            coord! { x: self.west, y: self.south },
            coord! { x: self.east, y: self.north },
        )
        .to_polygon()
    }

    /// Returns whether the point lies inside the box or on its boundary.
    #[must_use]
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        Point::new(longitude, latitude).intersects(&self.to_polygon())
    }
}

/// Access level of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular citizen account.
    #[default]
    User,
    /// Municipal staff handling reports.
    Staff,
    /// Administrator.
    Admin,
}

/// Lightweight projection of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Account ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Login identifier (e-mail).
    pub email: String,
    /// Whether the account is active.
    pub is_active: bool,
    /// Access level.
    pub role: UserRole,
}

impl UserIdentity {
    /// Whether this user may manage reports that are not their own.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        matches!(self.role, UserRole::Staff | UserRole::Admin)
    }
}

/// An incident report ("denúncia") row as retrieved from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenunciaRow {
    /// Primary key.
    pub id: Uuid,
    /// Public, immutable protocol code.
    pub protocolo: String,
    /// Free-text category.
    pub categoria: String,
    /// Description (at most [`MAX_DESCRIPTION_LENGTH`] characters).
    pub descricao: String,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Media attachment reference.
    pub midia: Option<String>,
    /// Audio attachment reference.
    pub audio: Option<String>,
    /// Review status.
    pub status: RecordedStatus,
    /// Reporting user; `None` for anonymous reports.
    pub reporter_id: Option<Uuid>,
    /// Staff member the report is assigned to.
    pub assigned_to: Option<Uuid>,
    /// Creation timestamp (never changes).
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Values for a new incident report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDenuncia {
    /// Free-text category.
    pub categoria: String,
    /// Description.
    pub descricao: String,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Media attachment reference.
    pub midia: Option<String>,
    /// Audio attachment reference.
    pub audio: Option<String>,
    /// Initial status; defaults to [`DenunciaStatus::EmAnalise`].
    pub status: Option<DenunciaStatus>,
    /// Reporting user; `None` for anonymous reports.
    pub reporter_id: Option<Uuid>,
}

/// A partial update to an incident report.
///
/// `None` leaves a field untouched. For nullable columns the inner
/// `Option` distinguishes "set to null" from "leave alone".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DenunciaChanges {
    /// New category.
    pub categoria: Option<String>,
    /// New description.
    pub descricao: Option<String>,
    /// New location as `(longitude, latitude)`.
    pub location: Option<(f64, f64)>,
    /// New media reference.
    pub midia: Option<Option<String>>,
    /// New audio reference.
    pub audio: Option<Option<String>>,
    /// New status.
    pub status: Option<RecordedStatus>,
    /// New assignee.
    pub assigned_to: Option<Option<Uuid>>,
}

impl DenunciaChanges {
    /// Whether the update touches the assignee.
    #[must_use]
    pub const fn changes_assignee(&self) -> bool {
        self.assigned_to.is_some()
    }

    /// Applies the changes to `row` and bumps `updated_at`.
    pub fn apply(&self, row: &mut DenunciaRow, now: DateTime<Utc>) {
        if let Some(categoria) = &self.categoria {
            row.categoria.clone_from(categoria);
        }
        if let Some(descricao) = &self.descricao {
            row.descricao.clone_from(descricao);
        }
        if let Some((longitude, latitude)) = self.location {
            row.longitude = longitude;
            row.latitude = latitude;
        }
        if let Some(midia) = &self.midia {
            row.midia.clone_from(midia);
        }
        if let Some(audio) = &self.audio {
            row.audio.clone_from(audio);
        }
        if let Some(status) = &self.status {
            row.status = status.clone();
        }
        if let Some(assigned_to) = self.assigned_to {
            row.assigned_to = assigned_to;
        }
        row.updated_at = now;
    }
}

/// Immutable copy of an incident's fields at one point in time.
///
/// One snapshot is appended for every persisted mutation, including
/// creation. Snapshots of one incident are totally ordered by
/// `(recorded_at, sequence)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    /// Store-wide insertion sequence; breaks timestamp ties.
    pub sequence: i64,
    /// Incident this snapshot belongs to.
    pub denuncia_id: Uuid,
    /// Category at this point.
    pub categoria: String,
    /// Description at this point.
    pub descricao: String,
    /// Status at this point.
    pub status: RecordedStatus,
    /// Assignee at this point.
    pub assigned_to: Option<Uuid>,
    /// User whose mutation produced this snapshot.
    pub actor_id: Option<Uuid>,
    /// When the snapshot was written.
    pub recorded_at: DateTime<Utc>,
}

impl HistorySnapshot {
    /// Captures the current state of `row`.
    #[must_use]
    pub fn capture(
        row: &DenunciaRow,
        sequence: i64,
        actor_id: Option<Uuid>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sequence,
            denuncia_id: row.id,
            categoria: row.categoria.clone(),
            descricao: row.descricao.clone(),
            status: row.status.clone(),
            assigned_to: row.assigned_to,
            actor_id,
            recorded_at,
        }
    }
}
