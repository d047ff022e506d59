#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Query service and status aggregation over a [`DenunciaStore`].
//!
//! * [`query`] applies a predicate set with ordering and pagination for the
//!   list, heatmap, and report use cases.
//! * [`aggregation`] produces per-status counts in canonical order and the
//!   report summary.
//! * [`dashboard`] computes the month-over-month resolution metrics.
//!
//! [`DenunciaStore`]: denuncia_database::DenunciaStore

pub mod aggregation;
pub mod dashboard;
pub mod query;

use thiserror::Error;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] denuncia_database::DbError),

    /// Data conversion error.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
