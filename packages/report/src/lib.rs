#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Multi-format report rendering.
//!
//! A [`Report`] is first arranged into a format-neutral
//! [`layout::ReportLayout`] (title, period, total, status blocks, detail
//! table). Each [`ReportRenderer`] then serializes that same layout:
//!
//! * [`delimited::CsvRenderer`]: semicolon-delimited text
//! * [`xlsx::XlsxRenderer`]: single-sheet `SpreadsheetML` workbook
//! * [`docx::DocxRenderer`]: `WordprocessingML` document
//!
//! Output is fully built in memory before it is returned, and identical
//! input always yields identical bytes.

pub mod delimited;
pub mod docx;
pub mod layout;
mod ooxml;
pub mod xlsx;

use chrono::{DateTime, FixedOffset};
use denuncia_analytics_models::Report;
use strum_macros::Display;

use crate::layout::ReportLayout;

/// Message returned for an unsupported `formato`.
pub const INVALID_FORMAT_REASON: &str = "Formato inválido. Use csv, xlsx ou docs.";

/// Errors that can occur while rendering a report.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The requested format is not supported.
    #[error("Unsupported report format: {value:?}")]
    InvalidFormat {
        /// Value as requested.
        value: String,
    },

    /// Delimited text encoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Archive encoding failed.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Buffer write failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output encoding of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ReportFormat {
    /// Semicolon-delimited text.
    Csv,
    /// Spreadsheet workbook.
    Xlsx,
    /// Word-processing document.
    Docx,
}

impl ReportFormat {
    /// Parses the `formato` parameter. Matching is case-insensitive;
    /// absent or empty means CSV and `doc`/`docs`/`docx` all mean DOCX.
    ///
    /// # Errors
    ///
    /// * [`RenderError::InvalidFormat`] for any other value
    pub fn parse(raw: Option<&str>) -> Result<Self, RenderError> {
        let normalized = raw.unwrap_or_default().to_lowercase();
        match normalized.as_str() {
            "" | "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            "doc" | "docs" | "docx" => Ok(Self::Docx),
            _ => Err(RenderError::InvalidFormat {
                value: raw.unwrap_or_default().to_string(),
            }),
        }
    }

    /// MIME type sent with the file.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Docx => "docx",
        }
    }

    /// Download file name, e.g. `relatorio_denuncias_20251019_143000.csv`.
    #[must_use]
    pub fn filename(self, generated_at: DateTime<FixedOffset>) -> String {
        format!(
            "relatorio_denuncias_{}.{}",
            generated_at.format("%Y%m%d_%H%M%S"),
            self.extension()
        )
    }

    /// The renderer for this format.
    #[must_use]
    pub fn renderer(self) -> &'static dyn ReportRenderer {
        match self {
            Self::Csv => &delimited::CsvRenderer,
            Self::Xlsx => &xlsx::XlsxRenderer,
            Self::Docx => &docx::DocxRenderer,
        }
    }
}

/// Serializes a [`ReportLayout`] into one output encoding.
pub trait ReportRenderer: Send + Sync {
    /// Renders the whole document into memory.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if encoding fails; no partial output is
    /// returned.
    fn render(&self, layout: &ReportLayout<'_>) -> Result<Vec<u8>, RenderError>;
}

/// A fully rendered report file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    /// File contents.
    pub bytes: Vec<u8>,
    /// MIME type.
    pub content_type: &'static str,
    /// Download file name.
    pub filename: String,
}

/// Renders `report` in `format`.
///
/// # Errors
///
/// Returns [`RenderError`] if encoding fails.
pub fn render(
    report: &Report,
    format: ReportFormat,
    generated_at: DateTime<FixedOffset>,
) -> Result<RenderedReport, RenderError> {
    let layout = ReportLayout::new(report);
    let bytes = format.renderer().render(&layout)?;
    log::debug!("Rendered {format} report: {} bytes", bytes.len());

    Ok(RenderedReport {
        bytes,
        content_type: format.content_type(),
        filename: format.filename(generated_at),
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{FixedOffset, TimeZone as _};
    use denuncia_analytics_models::{Report, ReportDetail, ReportSummary, StatusCount};

    fn counts(values: [u64; 3]) -> Vec<StatusCount> {
        [
            ("em_analise", "Em análise"),
            ("aprovado", "Aprovado"),
            ("rejeitado", "Rejeitado"),
        ]
        .into_iter()
        .zip(values)
        .map(|((status, label), count)| StatusCount {
            status: status.to_string(),
            label: label.to_string(),
            count,
        })
        .collect()
    }

    pub fn report(has_filters: bool) -> Report {
        let tz = FixedOffset::west_opt(3 * 3600).unwrap();
        let window = counts([1, 1, 0]);
        Report {
            summary: ReportSummary {
                total: 2,
                status_counts: window.clone(),
                overall_total: if has_filters { 5 } else { 2 },
                overall_status_counts: if has_filters { counts([2, 2, 1]) } else { window },
                period_label: if has_filters {
                    "início: 01/10/2025 00:00 | fim: 31/10/2025 23:59".to_string()
                } else {
                    "Período completo".to_string()
                },
                has_filters,
            },
            details: vec![
                ReportDetail {
                    protocolo: "DEN20251002-A1B2C3".to_string(),
                    categoria: "Vandalismo".to_string(),
                    status_label: "Em análise".to_string(),
                    created_at: tz.with_ymd_and_hms(2025, 10, 2, 9, 15, 0).unwrap(),
                    descricao: "Pichação no muro\ne portão quebrado".to_string(),
                },
                ReportDetail {
                    protocolo: "DEN20251003-D4E5F6".to_string(),
                    categoria: "Furto; arrombamento".to_string(),
                    status_label: "Aprovado".to_string(),
                    created_at: tz.with_ymd_and_hms(2025, 10, 3, 18, 40, 0).unwrap(),
                    descricao: "Loja <centro> & \"praça\"".to_string(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    #[test]
    fn parses_formats_and_aliases() {
        assert_eq!(ReportFormat::parse(None).unwrap(), ReportFormat::Csv);
        assert_eq!(ReportFormat::parse(Some("")).unwrap(), ReportFormat::Csv);
        assert_eq!(ReportFormat::parse(Some("XLSX")).unwrap(), ReportFormat::Xlsx);
        for alias in ["doc", "docs", "docx", "DOCX"] {
            assert_eq!(
                ReportFormat::parse(Some(alias)).unwrap(),
                ReportFormat::Docx,
                "{alias}"
            );
        }
    }

    #[test]
    fn rejects_unknown_format() {
        let err = ReportFormat::parse(Some("pdf")).unwrap_err();
        assert!(matches!(err, RenderError::InvalidFormat { ref value } if value == "pdf"));
    }

    #[test]
    fn filename_embeds_timestamp() {
        let tz = FixedOffset::west_opt(3 * 3600).unwrap();
        let at = tz.with_ymd_and_hms(2025, 10, 19, 14, 30, 5).unwrap();
        assert_eq!(
            ReportFormat::Xlsx.filename(at),
            "relatorio_denuncias_20251019_143005.xlsx"
        );
    }

    #[test]
    fn every_format_carries_the_same_counts() {
        let tz = FixedOffset::west_opt(3 * 3600).unwrap();
        let at = tz.with_ymd_and_hms(2025, 10, 19, 14, 30, 5).unwrap();
        let report = fixtures::report(true);

        let csv = render(&report, ReportFormat::Csv, at).unwrap();
        let csv_text = String::from_utf8(csv.bytes).unwrap();
        assert!(csv_text.contains("Total de denúncias: 2"));
        assert_eq!(csv.content_type, "text/csv; charset=utf-8");

        for format in [ReportFormat::Xlsx, ReportFormat::Docx] {
            let rendered = render(&report, format, at).unwrap();
            let text = ooxml::tests::all_text(&rendered.bytes);
            assert!(text.contains("Total de denúncias: 2"), "{format}");
            assert!(text.contains("Totais por status (geral)"), "{format}");
            assert!(text.contains("DEN20251003-D4E5F6"), "{format}");
        }
    }
}
