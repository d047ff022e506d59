//! `WordprocessingML` document rendering.
//!
//! Document outline:
//!
//! * level 1 heading with the title
//! * period and total as plain paragraphs
//! * one level 2 heading per status block, followed by one bulleted
//!   `label: count` paragraph per status
//! * level 2 heading and a five-column detail table with a header row

use std::fmt::Write as _;

use crate::layout::{
    DETAIL_HEADER, DETAILS_HEADING, ReportLayout, TITLE, format_created, status_line,
};
use crate::ooxml::{self, DOCUMENT_RELATIONSHIPS_NS, PACKAGE_RELATIONSHIPS_NS, Part};
use crate::{RenderError, ReportRenderer};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Renders reports as `.docx` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxRenderer;

/// Runs for `text`, turning line breaks into `<w:br/>`.
fn runs(text: &str) -> String {
    let mut xml = String::from("<w:r>");
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            xml.push_str("<w:br/>");
        }
        let _ = write!(
            xml,
            r#"<w:t xml:space="preserve">{}</w:t>"#,
            ooxml::escape(line.trim_end_matches('\r'))
        );
    }
    xml.push_str("</w:r>");
    xml
}

fn paragraph(xml: &mut String, style: Option<&str>, text: &str) {
    xml.push_str("<w:p>");
    if let Some(style) = style {
        let _ = write!(xml, r#"<w:pPr><w:pStyle w:val="{style}"/></w:pPr>"#);
    }
    xml.push_str(&runs(text));
    xml.push_str("</w:p>");
}

fn table_row(xml: &mut String, cells: &[String], header: bool) {
    xml.push_str("<w:tr>");
    if header {
        xml.push_str("<w:trPr><w:tblHeader/></w:trPr>");
    }
    for cell in cells {
        xml.push_str(r#"<w:tc><w:tcPr><w:tcW w:w="0" w:type="auto"/></w:tcPr><w:p>"#);
        if header {
            let _ = write!(
                xml,
                r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
                ooxml::escape(cell)
            );
        } else {
            xml.push_str(&runs(cell));
        }
        xml.push_str("</w:p></w:tc>");
    }
    xml.push_str("</w:tr>");
}

fn document_xml(layout: &ReportLayout<'_>) -> String {
    let mut body = String::new();

    paragraph(&mut body, Some("Heading1"), TITLE);
    paragraph(&mut body, None, layout.period);
    paragraph(&mut body, None, &layout.total_line());

    for block in &layout.status_blocks {
        paragraph(&mut body, Some("Heading2"), block.heading);
        for count in block.counts {
            paragraph(&mut body, Some("ListBullet"), &status_line(count));
        }
    }

    paragraph(&mut body, Some("Heading2"), DETAILS_HEADING);
    body.push_str(
        r#"<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/><w:tblW w:w="5000" w:type="pct"/></w:tblPr><w:tblGrid><w:gridCol/><w:gridCol/><w:gridCol/><w:gridCol/><w:gridCol/></w:tblGrid>"#,
    );
    let header: Vec<String> = DETAIL_HEADER.iter().map(ToString::to_string).collect();
    table_row(&mut body, &header, true);
    for detail in layout.details {
        table_row(
            &mut body,
            &[
                detail.protocolo.clone(),
                detail.categoria.clone(),
                detail.status_label.clone(),
                format_created(detail),
                detail.descricao.clone(),
            ],
            false,
        );
    }
    body.push_str("</w:tbl>");

    format!(
        r#"<w:document xmlns:w="{MAIN_NS}" xmlns:r="{DOCUMENT_RELATIONSHIPS_NS}"><w:body>{body}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#
    )
}

fn styles_xml() -> String {
    format!(
        r#"<w:styles xmlns:w="{MAIN_NS}"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="120"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="240"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="200"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="26"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="ListBullet"><w:name w:val="List Bullet"/><w:basedOn w:val="Normal"/><w:pPr><w:numPr><w:numId w:val="1"/></w:numPr></w:pPr></w:style><w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders></w:tblPr></w:style></w:styles>"#
    )
}

fn numbering_xml() -> String {
    format!(
        r#"<w:numbering xmlns:w="{MAIN_NS}"><w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="•"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl></w:abstractNum><w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num></w:numbering>"#
    )
}

fn parts(document: &str) -> Vec<Part> {
    vec![
        Part::new(
            "[Content_Types].xml",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/></Types>"#,
        ),
        ooxml::root_relationships("word/document.xml"),
        Part::new(
            "word/_rels/document.xml.rels",
            &format!(
                r#"<Relationships xmlns="{PACKAGE_RELATIONSHIPS_NS}"><Relationship Id="rId1" Type="{DOCUMENT_RELATIONSHIPS_NS}/styles" Target="styles.xml"/><Relationship Id="rId2" Type="{DOCUMENT_RELATIONSHIPS_NS}/numbering" Target="numbering.xml"/></Relationships>"#
            ),
        ),
        Part::new("word/styles.xml", &styles_xml()),
        Part::new("word/numbering.xml", &numbering_xml()),
        Part::new("word/document.xml", document),
    ]
}

impl ReportRenderer for DocxRenderer {
    fn render(&self, layout: &ReportLayout<'_>) -> Result<Vec<u8>, RenderError> {
        ooxml::package(&parts(&document_xml(layout)))
    }
}
