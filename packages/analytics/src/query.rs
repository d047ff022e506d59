//! Incident query service.

use chrono::{DateTime, FixedOffset, Utc};
use denuncia_analytics_models::{Report, ReportDetail};
use denuncia_database::DenunciaStore;
use denuncia_database_models::{DenunciaFilter, DenunciaRow, Page, PageRequest, SortOrder, Window};

use crate::AnalyticsError;
use crate::aggregation::build_report_summary;

/// One page of rows matching `filter`, newest first, plus the total count.
///
/// A page past the end comes back with no rows and the correct count.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if a store query fails.
pub async fn list_page(
    store: &dyn DenunciaStore,
    filter: &DenunciaFilter,
    request: PageRequest,
) -> Result<Page<DenunciaRow>, AnalyticsError> {
    let count = store.count(filter).await?;
    let results = if request.window().offset >= count {
        Vec::new()
    } else {
        store
            .query(filter, SortOrder::CreatedDesc, request.window())
            .await?
    };

    log::debug!(
        "list page {} (size {}): {} of {count}",
        request.page,
        request.page_size,
        results.len()
    );

    Ok(Page {
        count,
        page: request.page,
        page_size: request.page_size,
        results,
    })
}

/// Heatmap points matching `filter`, newest first, capped at `limit`.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the store query fails.
pub async fn heatmap_rows(
    store: &dyn DenunciaStore,
    filter: &DenunciaFilter,
    limit: Option<u64>,
) -> Result<Vec<DenunciaRow>, AnalyticsError> {
    let window = limit.map_or_else(Window::all, Window::first);
    Ok(store.query(filter, SortOrder::CreatedDesc, window).await?)
}

fn to_detail(row: DenunciaRow, tz: FixedOffset) -> ReportDetail {
    ReportDetail {
        status_label: row.status.label().to_string(),
        protocolo: row.protocolo,
        categoria: row.categoria,
        created_at: row.created_at.with_timezone(&tz),
        descricao: row.descricao,
    }
}

/// Selects the incidents created in `[start, end]`, oldest first, and
/// builds the report summary over them.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if a store query fails.
pub async fn build_report(
    store: &dyn DenunciaStore,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    tz: FixedOffset,
) -> Result<Report, AnalyticsError> {
    let filter = DenunciaFilter::default().with_created_range(start, end);
    let rows = store
        .query(&filter, SortOrder::CreatedAsc, Window::all())
        .await?;
    let window_total = u64::try_from(rows.len()).unwrap_or(u64::MAX);

    let summary = build_report_summary(store, start, end, window_total, tz).await?;
    let details: Vec<ReportDetail> = rows.into_iter().map(|row| to_detail(row, tz)).collect();

    log::info!(
        "Built report with {} rows ({})",
        details.len(),
        summary.period_label
    );

    Ok(Report { summary, details })
}
