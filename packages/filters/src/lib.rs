#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Turns raw query-string values into typed incident predicates.
//!
//! Each endpoint family has its own failure policy and the policies are
//! deliberately not unified:
//!
//! | Input | Heatmap | List | Report |
//! |---|---|---|---|
//! | malformed `bbox` | ignored | n/a | n/a |
//! | malformed date | ignored | [`FilterError::InvalidParameter`] | [`FilterError::InvalidParameter`] |
//! | time of day | dropped | honored | dropped |
//! | start after end | allowed | allowed | [`FilterError::InvalidRange`] |

pub mod bbox;
pub mod endpoint;
pub mod params;
pub mod temporal;

pub use bbox::parse_bbox;
pub use endpoint::{ListParams, category_filter, heatmap_filter, list_filter};
pub use params::{parse_limit, parse_page_request};
pub use temporal::{
    ParsedInstant, day_boundary, heatmap_date_bounds, list_date_bound, parse_instant,
    parse_utc_offset, report_date_bounds,
};

/// Error raised when a strictly validated parameter is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// A single parameter could not be parsed.
    #[error("{param}: {reason}")]
    InvalidParameter {
        /// Query parameter name as sent by the client.
        param: String,
        /// Human-readable reason.
        reason: String,
    },

    /// Two individually valid parameters contradict each other.
    #[error("{reason}")]
    InvalidRange {
        /// Human-readable reason.
        reason: String,
    },
}

impl FilterError {
    pub(crate) fn invalid(param: &str, reason: &str) -> Self {
        Self::InvalidParameter {
            param: param.to_string(),
            reason: reason.to_string(),
        }
    }
}
