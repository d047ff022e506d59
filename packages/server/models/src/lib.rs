#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the denúncia server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the store row types to allow independent evolution of the API
//! contract. Query parameters are kept as raw strings; each endpoint
//! applies its own parsing policy.

use chrono::{DateTime, FixedOffset, Utc};
use denuncia_analytics_models::DashboardMetrics;
use denuncia_database_models::DenunciaRow;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// An incident as returned by the detail, list, create and update
/// endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiDenuncia {
    /// Incident ID.
    pub id: Uuid,
    /// Public protocol code.
    pub protocolo: String,
    /// Category.
    pub categoria: String,
    /// Description.
    pub descricao: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Media attachment reference.
    pub midia: Option<String>,
    /// Audio attachment reference.
    pub audio: Option<String>,
    /// Raw status value.
    pub status: String,
    /// Assigned staff member.
    pub usuario: Option<Uuid>,
    /// Reporting user.
    pub reporter: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl From<DenunciaRow> for ApiDenuncia {
    fn from(row: DenunciaRow) -> Self {
        Self {
            id: row.id,
            protocolo: row.protocolo,
            categoria: row.categoria,
            descricao: row.descricao,
            latitude: row.latitude,
            longitude: row.longitude,
            midia: row.midia,
            audio: row.audio,
            status: row.status.into(),
            usuario: row.assigned_to,
            reporter: row.reporter_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// A lightweight heatmap point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiHeatmapPoint {
    /// Incident ID.
    pub id: Uuid,
    /// Incident category.
    pub name: String,
    /// Latitude rounded to 6 decimals.
    pub lat: f64,
    /// Longitude rounded to 6 decimals.
    pub lng: f64,
    /// Creation time in the service time zone.
    pub date: DateTime<FixedOffset>,
    /// Point weight; always 1.
    pub weight: u32,
}

impl ApiHeatmapPoint {
    /// Builds a point from a row, localizing the date to `tz`.
    #[must_use]
    pub fn from_row(row: DenunciaRow, tz: FixedOffset) -> Self {
        Self {
            id: row.id,
            name: row.categoria,
            lat: round6(row.latitude),
            lng: round6(row.longitude),
            date: row.created_at.with_timezone(&tz),
            weight: 1,
        }
    }
}

/// A page of results with links to the neighbouring pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiPage<T> {
    /// Total number of matching rows.
    pub count: u64,
    /// Link to the next page, if any.
    pub next: Option<String>,
    /// Link to the previous page, if any.
    pub previous: Option<String>,
    /// Rows on this page.
    pub results: Vec<T>,
}

/// Dashboard response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiDashboard {
    /// Aggregate metrics.
    pub metrics: DashboardMetrics,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Query parameters for the list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQueryParams {
    /// Exact raw status value.
    pub status: Option<String>,
    /// Category, matched case-insensitively as a whole value.
    pub categoria: Option<String>,
    /// Lower creation bound (date or date-time).
    pub created_from: Option<String>,
    /// Upper creation bound (date or date-time).
    pub created_to: Option<String>,
    /// 1-based page number.
    pub page: Option<String>,
    /// Rows per page.
    pub page_size: Option<String>,
}

/// Query parameters for the heatmap endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeatmapQueryParams {
    /// Bounding box as `minx,miny,maxx,maxy`.
    pub bbox: Option<String>,
    /// First day (time of day is ignored).
    pub start_date: Option<String>,
    /// Last day (time of day is ignored).
    pub end_date: Option<String>,
    /// Maximum number of points.
    pub limit: Option<String>,
}

/// Query parameters for the report endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQueryParams {
    /// `csv` (default), `xlsx`, or `doc`/`docs`/`docx`.
    pub formato: Option<String>,
    /// Lower creation bound.
    pub data_inicio: Option<String>,
    /// Upper creation bound.
    pub data_fim: Option<String>,
}

/// Body of the create endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateDenunciaPayload {
    /// Category.
    pub categoria: String,
    /// Description.
    #[serde(default)]
    pub descricao: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Media attachment reference.
    #[serde(default)]
    pub midia: Option<String>,
    /// Audio attachment reference.
    #[serde(default)]
    pub audio: Option<String>,
    /// Initial status.
    #[serde(default)]
    pub status: Option<String>,
}

/// Treats blank attachment references as absent.
#[must_use]
pub fn attachment_ref(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of the update endpoint. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpdateDenunciaPayload {
    /// New category.
    #[serde(default)]
    pub categoria: Option<String>,
    /// New description.
    #[serde(default)]
    pub descricao: Option<String>,
    /// New latitude; requires `longitude`.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// New longitude; requires `latitude`.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// New media reference; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub midia: Option<Option<String>>,
    /// New audio reference; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub audio: Option<Option<String>>,
    /// New status.
    #[serde(default)]
    pub status: Option<String>,
    /// New assignee; `null` unassigns.
    #[serde(default, deserialize_with = "double_option")]
    pub usuario: Option<Option<Uuid>>,
}
