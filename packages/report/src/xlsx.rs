//! Single-sheet `SpreadsheetML` workbook rendering.
//!
//! The sheet follows the delimited layout row for row: column A holds the
//! text, status counts go to column B as numbers, and detail rows span
//! columns A to E. Strings are written inline so no shared string table is
//! needed. Descriptions keep their line breaks.

use std::fmt::Write as _;

use crate::layout::{DETAIL_HEADER, ReportLayout, TITLE, format_created};
use crate::ooxml::{self, DOCUMENT_RELATIONSHIPS_NS, PACKAGE_RELATIONSHIPS_NS, Part};
use crate::{RenderError, ReportRenderer};

/// Worksheet name.
pub const SHEET_NAME: &str = "Relatório";

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const COLUMNS: [char; 5] = ['A', 'B', 'C', 'D', 'E'];

/// Renders reports as `.xlsx` workbooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxRenderer;

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Bold(String),
    Number(u64),
}

fn rows(layout: &ReportLayout<'_>) -> Vec<Vec<Cell>> {
    let mut rows = vec![
        vec![Cell::Bold(TITLE.to_string())],
        vec![Cell::Text(layout.period.to_string())],
        vec![Cell::Text(layout.total_line())],
    ];

    for block in &layout.status_blocks {
        rows.push(Vec::new());
        rows.push(vec![Cell::Bold(block.heading.to_string())]);
        for count in block.counts {
            rows.push(vec![Cell::Text(count.label.clone()), Cell::Number(count.count)]);
        }
    }

    rows.push(Vec::new());
    rows.push(
        DETAIL_HEADER
            .iter()
            .map(|h| Cell::Bold((*h).to_string()))
            .collect(),
    );
    for detail in layout.details {
        rows.push(vec![
            Cell::Text(detail.protocolo.clone()),
            Cell::Text(detail.categoria.clone()),
            Cell::Text(detail.status_label.clone()),
            Cell::Text(format_created(detail)),
            Cell::Text(detail.descricao.clone()),
        ]);
    }

    rows
}

fn write_cell(xml: &mut String, reference: &str, cell: &Cell) {
    let _ = match cell {
        Cell::Text(text) => write!(
            xml,
            r#"<c r="{reference}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            ooxml::escape(text)
        ),
        Cell::Bold(text) => write!(
            xml,
            r#"<c r="{reference}" s="1" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            ooxml::escape(text)
        ),
        Cell::Number(value) => write!(xml, r#"<c r="{reference}"><v>{value}</v></c>"#),
    };
}

fn sheet_xml(rows: &[Vec<Cell>]) -> String {
    let mut xml = format!(
        r#"<worksheet xmlns="{MAIN_NS}"><cols><col min="1" max="1" width="32" customWidth="1"/><col min="2" max="4" width="20" customWidth="1"/><col min="5" max="5" width="60" customWidth="1"/></cols><sheetData>"#
    );

    for (index, cells) in rows.iter().enumerate() {
        if cells.is_empty() {
            continue;
        }
        let row_number = index + 1;
        let _ = write!(xml, r#"<row r="{row_number}">"#);
        for (column, cell) in COLUMNS.iter().zip(cells) {
            write_cell(&mut xml, &format!("{column}{row_number}"), cell);
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn parts(sheet: &str) -> Vec<Part> {
    vec![
        Part::new(
            "[Content_Types].xml",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#,
        ),
        ooxml::root_relationships("xl/workbook.xml"),
        Part::new(
            "xl/workbook.xml",
            &format!(
                r#"<workbook xmlns="{MAIN_NS}" xmlns:r="{DOCUMENT_RELATIONSHIPS_NS}"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
                ooxml::escape(SHEET_NAME)
            ),
        ),
        Part::new(
            "xl/_rels/workbook.xml.rels",
            &format!(
                r#"<Relationships xmlns="{PACKAGE_RELATIONSHIPS_NS}"><Relationship Id="rId1" Type="{DOCUMENT_RELATIONSHIPS_NS}/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="{DOCUMENT_RELATIONSHIPS_NS}/styles" Target="styles.xml"/></Relationships>"#
            ),
        ),
        Part::new(
            "xl/styles.xml",
            &format!(
                r#"<styleSheet xmlns="{MAIN_NS}"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs></styleSheet>"#
            ),
        ),
        Part::new("xl/worksheets/sheet1.xml", sheet),
    ]
}

impl ReportRenderer for XlsxRenderer {
    fn render(&self, layout: &ReportLayout<'_>) -> Result<Vec<u8>, RenderError> {
        let sheet = sheet_xml(&rows(layout));
        ooxml::package(&parts(&sheet))
    }
}
