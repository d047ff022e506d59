//! Format-neutral arrangement of a report.
//!
//! Every renderer walks the same sections in the same order, so the
//! conditional "overall" block and the detail columns cannot drift apart
//! between encodings.

use denuncia_analytics_models::{Report, ReportDetail, StatusCount};

/// Document title.
pub const TITLE: &str = "Relatório de Denúncias";

/// Heading of the per-status block for the requested period.
pub const WINDOW_HEADING: &str = "Totais por status (intervalo)";

/// Heading of the store-wide per-status block.
pub const OVERALL_HEADING: &str = "Totais por status (geral)";

/// Heading above the detail table (word-processing output only).
pub const DETAILS_HEADING: &str = "Detalhes das denúncias";

/// Detail table columns.
pub const DETAIL_HEADER: [&str; 5] = [
    "Protocolo",
    "Categoria",
    "Status",
    "Data de criação",
    "Descrição",
];

const CREATED_FORMAT: &str = "%d/%m/%Y %H:%M";

/// A titled list of status counts.
#[derive(Debug, Clone, Copy)]
pub struct StatusBlock<'a> {
    /// Block heading.
    pub heading: &'static str,
    /// Counts in display order.
    pub counts: &'a [StatusCount],
}

/// The sections of one report, borrowed from a [`Report`].
#[derive(Debug, Clone)]
pub struct ReportLayout<'a> {
    /// Period description.
    pub period: &'a str,
    /// Incidents in the period.
    pub total: u64,
    /// The window block, followed by the overall block when a date filter
    /// was supplied.
    pub status_blocks: Vec<StatusBlock<'a>>,
    /// Detail rows in report order.
    pub details: &'a [ReportDetail],
}

impl<'a> ReportLayout<'a> {
    /// Arranges `report` into sections.
    #[must_use]
    pub fn new(report: &'a Report) -> Self {
        let summary = &report.summary;
        let mut status_blocks = vec![StatusBlock {
            heading: WINDOW_HEADING,
            counts: &summary.status_counts,
        }];
        if summary.has_filters {
            status_blocks.push(StatusBlock {
                heading: OVERALL_HEADING,
                counts: &summary.overall_status_counts,
            });
        }

        Self {
            period: &summary.period_label,
            total: summary.total,
            status_blocks,
            details: &report.details,
        }
    }

    /// `"Total de denúncias: N"`.
    #[must_use]
    pub fn total_line(&self) -> String {
        format!("Total de denúncias: {}", self.total)
    }
}

/// Creation timestamp as shown in every format.
#[must_use]
pub fn format_created(detail: &ReportDetail) -> String {
    detail.created_at.format(CREATED_FORMAT).to_string()
}

/// `"label: count"`, used for list-style status lines.
#[must_use]
pub fn status_line(count: &StatusCount) -> String {
    format!("{}: {}", count.label, count.count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn overall_block_only_with_filters() {
        let filtered = fixtures::report(true);
        let unfiltered = fixtures::report(false);

        let headings: Vec<_> = ReportLayout::new(&filtered)
            .status_blocks
            .iter()
            .map(|b| b.heading)
            .collect();
        assert_eq!(headings, [WINDOW_HEADING, OVERALL_HEADING]);
        assert_eq!(ReportLayout::new(&unfiltered).status_blocks.len(), 1);
    }

    #[test]
    fn formats_created_in_local_time() {
        let report = fixtures::report(false);
        assert_eq!(format_created(&report.details[0]), "02/10/2025 09:15");
    }
}
