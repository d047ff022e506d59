//! Per-status counts and the report summary.

use chrono::{DateTime, FixedOffset, Utc};
use denuncia_analytics_models::{ReportSummary, StatusCount};
use denuncia_database::DenunciaStore;
use denuncia_database_models::DenunciaFilter;
use denuncia_models::{DenunciaStatus, RecordedStatus};

use crate::AnalyticsError;

/// Label used when the report has neither bound.
pub const FULL_PERIOD_LABEL: &str = "Período completo";

const PERIOD_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Orders raw `(status, count)` pairs for display.
///
/// Every canonical status is emitted in declaration order, with zero when
/// absent from `raw`. Values outside the enumeration follow in the order
/// they appear in `raw`, labelled with their raw value.
#[must_use]
pub fn order_status_counts(raw: Vec<(RecordedStatus, u64)>) -> Vec<StatusCount> {
    let mut counts: Vec<StatusCount> = DenunciaStatus::all()
        .iter()
        .map(|status| StatusCount {
            status: status.to_string(),
            label: status.label().to_string(),
            count: 0,
        })
        .collect();
    let canonical = counts.len();

    for (status, count) in raw {
        match status.known() {
            Some(known) => {
                if let Some(slot) = counts[..canonical]
                    .iter_mut()
                    .find(|c| c.status == known.as_ref())
                {
                    slot.count += count;
                }
            }
            None => counts.push(StatusCount {
                status: status.as_str().to_string(),
                label: status.label().to_string(),
                count,
            }),
        }
    }

    counts
}

/// Per-status counts over the rows matching `filter`.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the store query fails.
pub async fn status_counts(
    store: &dyn DenunciaStore,
    filter: &DenunciaFilter,
) -> Result<Vec<StatusCount>, AnalyticsError> {
    Ok(order_status_counts(store.count_by_status(filter).await?))
}

/// Describes the report period, e.g.
/// `"início: 01/10/2025 00:00 | fim: 31/10/2025 23:59"`.
#[must_use]
pub fn format_period(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    tz: FixedOffset,
) -> String {
    if start.is_none() && end.is_none() {
        return FULL_PERIOD_LABEL.to_string();
    }

    let mut parts = Vec::with_capacity(2);
    if let Some(start) = start {
        parts.push(format!(
            "início: {}",
            start.with_timezone(&tz).format(PERIOD_FORMAT)
        ));
    }
    if let Some(end) = end {
        parts.push(format!("fim: {}", end.with_timezone(&tz).format(PERIOD_FORMAT)));
    }
    parts.join(" | ")
}

/// Builds the report summary for the period `[start, end]`.
///
/// `window_total` is the number of detail rows already selected for the
/// period. The store-wide counts are only queried when a bound is present;
/// otherwise the window counts are reused.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if a store query fails.
pub async fn build_report_summary(
    store: &dyn DenunciaStore,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    window_total: u64,
    tz: FixedOffset,
) -> Result<ReportSummary, AnalyticsError> {
    let window = DenunciaFilter::default().with_created_range(start, end);
    let has_filters = window.has_temporal();
    let window_counts = status_counts(store, &window).await?;

    let (overall_total, overall_counts) = if has_filters {
        let everything = DenunciaFilter::default();
        (
            store.count(&everything).await?,
            status_counts(store, &everything).await?,
        )
    } else {
        (window_total, window_counts.clone())
    };

    Ok(ReportSummary {
        total: window_total,
        status_counts: window_counts,
        overall_total,
        overall_status_counts: overall_counts,
        period_label: format_period(start, end, tz),
        has_filters,
    })
}
