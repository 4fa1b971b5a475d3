//! Document Exporter — turns a resume record into a downloadable PDF or DOCX.
//!
//! Rendering is CPU-bound; handlers call [`render`] inside `spawn_blocking`.

pub mod docx;
pub mod font_metrics;
pub mod pdf;
pub mod sections;

use thiserror::Error;

use crate::models::resume::{non_blank, ResumeRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Include Experience, Education and Projects in DOCX exports.
    pub docx_full_sections: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            docx_full_sections: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("DOCX XML encoding failed: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("DOCX packaging failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to finalize document: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// True when the bytes were assembled but could not be written out.
    pub fn is_stream_failure(&self) -> bool {
        matches!(self, ExportError::Io(_) | ExportError::Zip(_))
    }
}

/// A rendered document ready to send as an attachment.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub format: ExportFormat,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Renders `record` in `format`. A pure function of its inputs.
pub fn render(
    record: &ResumeRecord,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<ExportedDocument, ExportError> {
    let bytes = match format {
        ExportFormat::Pdf => pdf::render_pdf(record)?,
        ExportFormat::Docx => docx::render_docx(record, options)?,
    };
    Ok(ExportedDocument {
        format,
        filename: attachment_filename(record, format),
        bytes,
    })
}

/// `{fullName or "resume"}.{ext}`, with quotes, backslashes, path separators
/// and control characters replaced by `_`. Non-ASCII letters are kept.
pub fn attachment_filename(record: &ResumeRecord, format: ExportFormat) -> String {
    let stem: String = non_blank(&record.personal_info.full_name)
        .unwrap_or("resume")
        .chars()
        .map(|c| match c {
            '"' | '\\' | '/' | ':' | '*' | '?' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{}.{}", stem, format.extension())
}

/// `Content-Disposition` value for `filename`.
///
/// The quoted `filename` is an ASCII fallback; names with non-ASCII characters
/// also get an RFC 6266 `filename*` carrying the UTF-8 name.
pub fn content_disposition(filename: &str) -> String {
    if filename.is_ascii() {
        return format!("attachment; filename=\"{filename}\"");
    }
    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        percent_encode(filename)
    )
}

/// RFC 5987 `value-chars`: attr-chars stay, every other byte becomes `%XX`.
fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
