#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation result types.
//!
//! [`ReportSummary`] and [`ReportDetail`] are the renderer-facing inputs
//! of an export; [`DashboardMetrics`] is serialized as-is by the dashboard
//! endpoint, so its field names follow the camelCase contract.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Number of incidents with one status value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    /// Machine value as stored.
    pub status: String,
    /// Display label; unknown values are their own label.
    pub label: String,
    /// Number of incidents.
    pub count: u64,
}

/// Summary block at the top of every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Incidents inside the requested period.
    pub total: u64,
    /// Per-status counts inside the requested period, canonical order first.
    pub status_counts: Vec<StatusCount>,
    /// Incidents in the whole store.
    pub overall_total: u64,
    /// Per-status counts over the whole store. Identical to
    /// `status_counts` when `has_filters` is false.
    pub overall_status_counts: Vec<StatusCount>,
    /// Human-readable period, e.g. `"Período completo"`.
    pub period_label: String,
    /// Whether a start or end bound was supplied.
    pub has_filters: bool,
}

/// One incident line of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDetail {
    /// Protocol code.
    pub protocolo: String,
    /// Category.
    pub categoria: String,
    /// Status display label.
    pub status_label: String,
    /// Creation time in the service time zone.
    pub created_at: DateTime<FixedOffset>,
    /// Raw description (may contain newlines).
    pub descricao: String,
}

/// A summary plus its detail rows, ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Summary block.
    pub summary: ReportSummary,
    /// Detail rows, oldest first.
    pub details: Vec<ReportDetail>,
}

/// Incident totals per canonical status, keyed the way the dashboard
/// frontend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportsByStatus {
    /// Rejected incidents.
    pub rejected: u64,
    /// Incidents awaiting review.
    pub pending: u64,
    /// Approved incidents.
    pub resolved: u64,
}

/// Resolution figures for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSegment {
    /// Portuguese month label, e.g. `"outubro de 2025"`.
    pub month: String,
    /// Incidents created in the month.
    pub total: u64,
    /// Of those, incidents currently approved.
    pub resolved: u64,
    /// `resolved / total` as a percentage rounded to 2 decimals, `0.0` for
    /// an empty month.
    pub rate: f64,
}

/// Current versus previous month resolution rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionRateComparison {
    /// Month to date.
    pub current_month: MonthSegment,
    /// The whole previous month.
    pub last_month: MonthSegment,
    /// `current.rate - last.rate`, in percentage points.
    pub difference: f64,
    /// `difference / last.rate * 100`; `None` when last month's rate is 0
    /// and the difference is not.
    pub percentage_change: Option<f64>,
}

/// Everything the dashboard endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    /// Active user accounts.
    pub total_active_users: u64,
    /// Incidents in the store.
    pub total_reports: u64,
    /// Store-wide totals per status.
    pub reports_by_status: ReportsByStatus,
    /// Month-over-month resolution rate.
    pub resolution_rate_comparison: ResolutionRateComparison,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_serializes_camel_case() {
        let segment = MonthSegment {
            month: "outubro de 2025".to_string(),
            total: 4,
            resolved: 1,
            rate: 25.0,
        };
        let metrics = DashboardMetrics {
            total_active_users: 3,
            total_reports: 10,
            reports_by_status: ReportsByStatus {
                rejected: 2,
                pending: 5,
                resolved: 3,
            },
            resolution_rate_comparison: ResolutionRateComparison {
                current_month: segment.clone(),
                last_month: MonthSegment {
                    rate: 0.0,
                    ..segment
                },
                difference: 25.0,
                percentage_change: None,
            },
        };

        let json = serde_json::to_value(&metrics).unwrap();

        assert_eq!(json["totalActiveUsers"], 3);
        assert_eq!(json["reportsByStatus"]["pending"], 5);
        assert_eq!(
            json["resolutionRateComparison"]["currentMonth"]["month"],
            "outubro de 2025"
        );
        assert!(json["resolutionRateComparison"]["percentageChange"].is_null());
    }
}
