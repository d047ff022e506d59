//! Office Open XML packaging shared by the XLSX and DOCX renderers.
//!
//! A package is a zip archive of XML parts. Entries are written in the
//! given order with a fixed modification time so the bytes only depend on
//! the parts.

use std::io::{Cursor, Write as _};

use zip::write::SimpleFileOptions;

use crate::RenderError;

/// Prolog of every part.
pub const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Package-level relationships namespace.
pub const PACKAGE_RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

/// Office document relationship types.
pub const OFFICE_DOCUMENT_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Namespace of the `r:` prefix inside document parts.
pub const DOCUMENT_RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// One named XML part of a package.
#[derive(Debug, Clone)]
pub struct Part {
    /// Path inside the archive, without a leading slash.
    pub path: &'static str,
    /// Full XML text, declaration included.
    pub xml: String,
}

impl Part {
    /// Creates a part, prefixing `body` with [`XML_DECLARATION`].
    #[must_use]
    pub fn new(path: &'static str, body: &str) -> Self {
        Self {
            path,
            xml: format!("{XML_DECLARATION}\n{body}"),
        }
    }
}

/// `_rels/.rels` pointing at the main document part.
#[must_use]
pub fn root_relationships(main_part: &str) -> Part {
    Part::new(
        "_rels/.rels",
        &format!(
            r#"<Relationships xmlns="{PACKAGE_RELATIONSHIPS_NS}"><Relationship Id="rId1" Type="{OFFICE_DOCUMENT_REL}" Target="{main_part}"/></Relationships>"#
        ),
    )
}

/// Zips `parts` into a package.
///
/// # Errors
///
/// * [`RenderError::Zip`] if an entry cannot be started or finished
/// * [`RenderError::Io`] if an entry cannot be written
pub fn package(parts: &[Part]) -> Result<Vec<u8>, RenderError> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    for part in parts {
        writer.start_file(part.path, options)?;
        writer.write_all(part.xml.as_bytes())?;
    }

    Ok(writer.finish()?.into_inner())
}

/// Escapes `text` for element content and attribute values.
///
/// Characters XML 1.0 cannot carry at all (C0 controls other than tab,
/// line feed and carriage return) are dropped.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            '\u{0}'..='\u{1f}' => {}
            c => out.push(c),
        }
    }
    out
}
