//! Semicolon-delimited text rendering.
//!
//! Layout, one record per line (CRLF terminated):
//!
//! ```text
//! Relatório de Denúncias
//! <period>
//! Total de denúncias: N
//!
//! Totais por status (intervalo)
//! <label>;<count>
//! ...
//! Protocolo;Categoria;Status;Data de criação;Descrição
//! <detail rows>
//! ```
//!
//! Fields containing the delimiter or quotes are quoted by the writer.
//! Line breaks inside descriptions are replaced with spaces so every
//! detail stays on one physical line.

use csv::{Terminator, WriterBuilder};

use crate::layout::{DETAIL_HEADER, ReportLayout, TITLE, format_created};
use crate::{RenderError, ReportRenderer};

/// Renders reports as `;`-delimited UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRenderer;

fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

impl ReportRenderer for CsvRenderer {
    fn render(&self, layout: &ReportLayout<'_>) -> Result<Vec<u8>, RenderError> {
        let mut writer = WriterBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .terminator(Terminator::CRLF)
            .from_writer(Vec::new());

        writer.write_record([TITLE])?;
        writer.write_record([layout.period])?;
        writer.write_record([layout.total_line()])?;

        for block in &layout.status_blocks {
            writer.flush()?;
            writer.get_mut().extend_from_slice(b"\r\n");
            writer.write_record([block.heading])?;
            for count in block.counts {
                writer.write_record([count.label.clone(), count.count.to_string()])?;
            }
        }

        writer.flush()?;
        writer.get_mut().extend_from_slice(b"\r\n");
        writer.write_record(DETAIL_HEADER)?;
        for detail in layout.details {
            writer.write_record([
                detail.protocolo.clone(),
                detail.categoria.clone(),
                detail.status_label.clone(),
                format_created(detail),
                single_line(&detail.descricao),
            ])?;
        }

        writer
            .into_inner()
            .map_err(|e| RenderError::Io(e.into_error()))
    }
}
