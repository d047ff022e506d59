//! Dashboard metrics: store totals and month-over-month resolution rate.

use chrono::{DateTime, Datelike as _, Duration, FixedOffset, NaiveDate, Utc};
use denuncia_analytics_models::{
    DashboardMetrics, MonthSegment, ReportsByStatus, ResolutionRateComparison,
};
use denuncia_database::DenunciaStore;
use denuncia_database_models::DenunciaFilter;
use denuncia_models::DenunciaStatus;

use crate::AnalyticsError;
use crate::aggregation::status_counts;

const MONTH_NAMES: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Inclusive `[start, end]` range of one month segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    /// First instant of the month.
    pub start: DateTime<FixedOffset>,
    /// Last instant counted.
    pub end: DateTime<FixedOffset>,
}

impl MonthRange {
    fn filter(&self) -> DenunciaFilter {
        DenunciaFilter::default().with_created_range(
            Some(self.start.with_timezone(&Utc)),
            Some(self.end.with_timezone(&Utc)),
        )
    }
}

/// Portuguese label for the month containing `date`, e.g.
/// `"março de 2025"`.
#[must_use]
pub fn month_label(date: NaiveDate) -> String {
    let name = MONTH_NAMES
        .get(date.month0() as usize)
        .copied()
        .unwrap_or_default();
    format!("{name} de {}", date.year())
}

/// The current month to date and the whole previous month, as seen from
/// `now` in `tz`.
///
/// The previous month ends one second before the current one starts.
#[must_use]
pub fn month_ranges(now: DateTime<Utc>, tz: FixedOffset) -> (MonthRange, MonthRange) {
    let local_now = now.with_timezone(&tz);
    let current_start = first_of_month(local_now.date_naive(), tz).unwrap_or(local_now);
    let last_end = current_start - Duration::seconds(1);
    let last_start = first_of_month(last_end.date_naive(), tz).unwrap_or(last_end);

    (
        MonthRange {
            start: current_start,
            end: local_now,
        },
        MonthRange {
            start: last_start,
            end: last_end,
        },
    )
}

fn first_of_month(date: NaiveDate, tz: FixedOffset) -> Option<DateTime<FixedOffset>> {
    date.with_day(1)?
        .and_hms_opt(0, 0, 0)?
        .and_local_timezone(tz)
        .single()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `resolved / total` as a percentage rounded to 2 decimals; `0.0` when
/// `total` is 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn resolution_rate(resolved: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(resolved as f64 / total as f64 * 100.0)
}

/// Compares two rates. Returns `(difference, percentage_change)`, both
/// rounded to 2 decimals; the change is `None` when `last` is 0 and the
/// difference is not.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn compare_rates(current: f64, last: f64) -> (f64, Option<f64>) {
    let difference = current - last;
    let change = if last != 0.0 {
        Some(round2(difference / last * 100.0))
    } else if difference == 0.0 {
        Some(0.0)
    } else {
        None
    };
    (round2(difference), change)
}

async fn segment(
    store: &dyn DenunciaStore,
    range: MonthRange,
) -> Result<MonthSegment, AnalyticsError> {
    let filter = range.filter();
    let total = store.count(&filter).await?;
    let resolved = store
        .count(&DenunciaFilter {
            status: Some(DenunciaStatus::Aprovado.to_string()),
            ..filter
        })
        .await?;

    Ok(MonthSegment {
        month: month_label(range.start.date_naive()),
        total,
        resolved,
        rate: resolution_rate(resolved, total),
    })
}

/// Builds the dashboard metrics as of `now`.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if a store query fails.
pub async fn build_dashboard(
    store: &dyn DenunciaStore,
    now: DateTime<Utc>,
    tz: FixedOffset,
) -> Result<DashboardMetrics, AnalyticsError> {
    let everything = DenunciaFilter::default();
    let by_status = status_counts(store, &everything).await?;
    let count_of = |status: DenunciaStatus| {
        by_status
            .iter()
            .find(|c| c.status == status.as_ref())
            .map_or(0, |c| c.count)
    };

    let (current_range, last_range) = month_ranges(now, tz);
    let current_month = segment(store, current_range).await?;
    let last_month = segment(store, last_range).await?;
    let (difference, percentage_change) = compare_rates(current_month.rate, last_month.rate);

    Ok(DashboardMetrics {
        total_active_users: store.count_active_users().await?,
        total_reports: store.count(&everything).await?,
        reports_by_status: ReportsByStatus {
            rejected: count_of(DenunciaStatus::Rejeitado),
            pending: count_of(DenunciaStatus::EmAnalise),
            resolved: count_of(DenunciaStatus::Aprovado),
        },
        resolution_rate_comparison: ResolutionRateComparison {
            current_month,
            last_month,
            difference,
            percentage_change,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;
    use denuncia_database::MemoryStore;
    use denuncia_database_models::DenunciaRow;
    use denuncia_models::RecordedStatus;
    use uuid::Uuid;

    fn brt() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    #[test]
    fn labels_months_in_portuguese() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(month_label(date), "março de 2025");
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        assert_eq!(month_label(date), "dezembro de 2024");
    }

    #[test]
    fn month_ranges_cross_year_boundary() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 15, 0, 0).unwrap();
        let (current, last) = month_ranges(now, brt());

        assert_eq!(current.start.to_rfc3339(), "2025-01-01T00:00:00-03:00");
        assert_eq!(current.end, now.with_timezone(&brt()));
        assert_eq!(last.start.to_rfc3339(), "2024-12-01T00:00:00-03:00");
        assert_eq!(last.end.to_rfc3339(), "2024-12-31T23:59:59-03:00");
    }

    #[test]
    fn month_ranges_use_local_date() {
        // 02:00 UTC on Nov 1st is still October in UTC-3.
        let now = Utc.with_ymd_and_hms(2025, 11, 1, 2, 0, 0).unwrap();
        let (current, last) = month_ranges(now, brt());
        assert_eq!(month_label(current.start.date_naive()), "outubro de 2025");
        assert_eq!(month_label(last.start.date_naive()), "setembro de 2025");
    }

    #[test]
    fn rate_rounds_to_two_decimals() {
        assert!((resolution_rate(1, 3) - 33.33).abs() < f64::EPSILON);
        assert!((resolution_rate(2, 3) - 66.67).abs() < f64::EPSILON);
        assert!(resolution_rate(0, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn percentage_change_rules() {
        assert_eq!(compare_rates(50.0, 25.0), (25.0, Some(100.0)));
        assert_eq!(compare_rates(0.0, 0.0), (0.0, Some(0.0)));
        assert_eq!(compare_rates(40.0, 0.0), (40.0, None));
        assert_eq!(compare_rates(10.0, 20.0), (-10.0, Some(-50.0)));
    }

    #[test]
    fn rate_change_uses_unrounded_difference() {
        assert_eq!(compare_rates(0.126, 0.1), (0.03, Some(26.0)));
    }

    #[tokio::test]
    async fn dashboard_counts_months_and_statuses() {
        let store = MemoryStore::new();
        let now = Utc.with_ymd_and_hms(2025, 10, 20, 15, 0, 0).unwrap();
        let rows = [
            (Utc.with_ymd_and_hms(2025, 10, 5, 12, 0, 0).unwrap(), DenunciaStatus::Aprovado),
            (Utc.with_ymd_and_hms(2025, 10, 6, 12, 0, 0).unwrap(), DenunciaStatus::EmAnalise),
            (Utc.with_ymd_and_hms(2025, 9, 10, 12, 0, 0).unwrap(), DenunciaStatus::Aprovado),
            (Utc.with_ymd_and_hms(2025, 9, 11, 12, 0, 0).unwrap(), DenunciaStatus::Aprovado),
            (Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap(), DenunciaStatus::Rejeitado),
        ];
        for (i, (created, status)) in rows.into_iter().enumerate() {
            let row = DenunciaRow {
                id: Uuid::new_v4(),
                protocolo: format!("DEN20251001-{i:06X}"),
                categoria: "Furto".to_string(),
                descricao: String::new(),
                longitude: -46.63,
                latitude: -23.55,
                midia: None,
                audio: None,
                status: RecordedStatus::Known(status),
                reporter_id: None,
                assigned_to: None,
                created_at: created,
                updated_at: created,
            };
            store.insert(&row, None).await.unwrap();
        }

        let metrics = build_dashboard(&store, now, brt()).await.unwrap();

        assert_eq!(metrics.total_reports, 5);
        assert_eq!(
            metrics.reports_by_status,
            ReportsByStatus {
                rejected: 1,
                pending: 1,
                resolved: 3,
            }
        );
        let comparison = metrics.resolution_rate_comparison;
        assert_eq!(comparison.current_month.month, "outubro de 2025");
        assert_eq!(comparison.current_month.total, 2);
        assert!((comparison.current_month.rate - 50.0).abs() < f64::EPSILON);
        assert_eq!(comparison.last_month.total, 2);
        assert!((comparison.last_month.rate - 100.0).abs() < f64::EPSILON);
        assert_eq!(comparison.percentage_change, Some(-50.0));
    }
}
