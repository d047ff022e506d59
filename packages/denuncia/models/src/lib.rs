#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident status taxonomy and protocol code definitions.
//!
//! This crate defines the closed status enumeration shared by every
//! denúncia crate, together with the raw status value as it is actually
//! stored (which may fall outside the enumeration for legacy rows), and
//! the public protocol code format.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Review status of an incident report.
///
/// Declaration order is the canonical display order used by every status
/// aggregation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DenunciaStatus {
    /// Waiting for review (the default for new reports).
    #[default]
    EmAnalise,
    /// Accepted by staff. Counts as "resolved" on the dashboard.
    Aprovado,
    /// Rejected by staff.
    Rejeitado,
}

impl DenunciaStatus {
    /// Human-readable label shown in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::EmAnalise => "Em análise",
            Self::Aprovado => "Aprovado",
            Self::Rejeitado => "Rejeitado",
        }
    }

    /// Returns all variants of this enum in declaration order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::EmAnalise, Self::Aprovado, Self::Rejeitado]
    }
}

/// A status value exactly as persisted.
///
/// Rows written by older clients may carry values outside
/// [`DenunciaStatus`]; those are preserved verbatim in [`Self::Other`] so
/// aggregations can still report them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordedStatus {
    /// One of the canonical statuses.
    Known(DenunciaStatus),
    /// Any other stored value.
    Other(String),
}

impl RecordedStatus {
    /// Machine value as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(status) => status.as_ref(),
            Self::Other(raw) => raw,
        }
    }

    /// Display label; unknown values are their own label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Known(status) => status.label(),
            Self::Other(raw) => raw,
        }
    }

    /// Returns the canonical status, if this value is one.
    #[must_use]
    pub const fn known(&self) -> Option<DenunciaStatus> {
        match self {
            Self::Known(status) => Some(*status),
            Self::Other(_) => None,
        }
    }
}

impl Default for RecordedStatus {
    fn default() -> Self {
        Self::Known(DenunciaStatus::default())
    }
}

impl From<DenunciaStatus> for RecordedStatus {
    fn from(status: DenunciaStatus) -> Self {
        Self::Known(status)
    }
}

impl From<String> for RecordedStatus {
    fn from(raw: String) -> Self {
        raw.parse::<DenunciaStatus>()
            .map_or(Self::Other(raw), Self::Known)
    }
}

impl From<&str> for RecordedStatus {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<RecordedStatus> for String {
    fn from(status: RecordedStatus) -> Self {
        match status {
            RecordedStatus::Known(status) => status.to_string(),
            RecordedStatus::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for RecordedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prefix of every protocol code.
pub const PROTOCOL_PREFIX: &str = "DEN";

/// Number of random hex characters at the end of a protocol code.
const PROTOCOL_SUFFIX_LEN: usize = 6;

/// Builds a new protocol code for an incident created on `date`.
///
/// Format: `DEN` + `YYYYMMDD` + `-` + six uppercase hex characters taken
/// from a fresh v4 UUID, e.g. `DEN20251019-3FA85F`. Uniqueness is enforced
/// by the store; callers retry on collision.
#[must_use]
pub fn generate_protocol(date: NaiveDate) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    let suffix: String = random.chars().take(PROTOCOL_SUFFIX_LEN).collect();
    format!("{PROTOCOL_PREFIX}{}-{suffix}", date.format("%Y%m%d"))
}

/// Returns whether `value` has the shape produced by [`generate_protocol`].
#[must_use]
pub fn is_valid_protocol(value: &str) -> bool {
    let Some(rest) = value.strip_prefix(PROTOCOL_PREFIX) else {
        return false;
    };
    let Some((date, suffix)) = rest.split_once('-') else {
        return false;
    };
    NaiveDate::parse_from_str(date, "%Y%m%d").is_ok()
        && suffix.len() == PROTOCOL_SUFFIX_LEN
        && suffix
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
}
