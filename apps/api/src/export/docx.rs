//! DOCX export: a minimal WordprocessingML package built with quick-xml and zip.

use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::export::sections::{entries, Entry, SectionKind};
use crate::export::{ExportError, ExportOptions};
use crate::models::resume::{non_blank, ResumeRecord};

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Half-points, so 32 renders as 16pt.
const TITLE_SIZE: u32 = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub text: String,
    /// Paragraph style id, e.g. `Heading1`.
    pub style: Option<&'static str>,
    pub bold: bool,
    pub size: Option<u32>,
}

impl Paragraph {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
            bold: false,
            size: None,
        }
    }

    fn heading(text: &str) -> Self {
        Self {
            style: Some("Heading1"),
            ..Self::plain(text)
        }
    }
}

/// Paragraphs of the document body in order.
///
/// Title, the three contact lines (always present, even when empty), Summary,
/// then the list sections. The Skills heading is always emitted. With
/// `full_sections` off only Summary and Skills follow the contacts.
pub fn build_paragraphs(record: &ResumeRecord, options: &ExportOptions) -> Vec<Paragraph> {
    let info = &record.personal_info;
    let mut paragraphs = vec![
        Paragraph {
            bold: true,
            size: Some(TITLE_SIZE),
            ..Paragraph::plain(record.display_name())
        },
        Paragraph::plain(format!("Email: {}", info.email.trim())),
        Paragraph::plain(format!("Phone: {}", info.phone.trim())),
        Paragraph::plain(format!("Address: {}", info.address.trim())),
        Paragraph::heading("Summary"),
        Paragraph::plain(non_blank(&record.summary).unwrap_or("No summary added.")),
    ];

    if options.docx_full_sections {
        for kind in SectionKind::ORDER {
            let section_entries = entries(record, kind);
            // Skills keeps its heading in place even with no entries.
            if section_entries.is_empty() && kind != SectionKind::Skills {
                continue;
            }
            push_section(&mut paragraphs, kind, section_entries);
        }
    } else {
        push_section(
            &mut paragraphs,
            SectionKind::Skills,
            entries(record, SectionKind::Skills),
        );
    }

    paragraphs
}

fn push_section(
    paragraphs: &mut Vec<Paragraph>,
    kind: SectionKind,
    section_entries: Vec<Entry>,
) {
    paragraphs.push(Paragraph::heading(kind.heading()));
    for entry in section_entries {
        paragraphs.push(Paragraph::plain(entry.lead));
        paragraphs.extend(entry.body.into_iter().map(Paragraph::plain));
    }
}

/// Renders `record` to a DOCX package, buffered in memory.
pub fn render_docx(record: &ResumeRecord, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
    let paragraphs = build_paragraphs(record, options);
    debug!("Writing resume DOCX with {} paragraph(s)", paragraphs.len());

    let document_xml = document_xml(&paragraphs)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    // Fixed timestamp keeps the archive byte-identical across runs.
    let file_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    for (name, body) in [
        ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
        ("_rels/.rels", ROOT_RELS_XML.as_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.as_bytes()),
        ("word/styles.xml", STYLES_XML.as_bytes()),
        ("word/document.xml", document_xml.as_slice()),
    ] {
        zip.start_file(name, file_options)?;
        zip.write_all(body)?;
    }

    Ok(zip.finish()?.into_inner())
}

fn document_xml(paragraphs: &[Paragraph]) -> Result<Vec<u8>, ExportError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    let mut document = BytesStart::new("w:document");
    document.push_attribute(("xmlns:w", WORDML_NS));
    writer.write_event(Event::Start(document))?;
    writer.write_event(Event::Start(BytesStart::new("w:body")))?;

    for paragraph in paragraphs {
        write_paragraph(&mut writer, paragraph)?;
    }

    // US Letter, 1" margins (twentieths of a point)
    let mut page_size = BytesStart::new("w:pgSz");
    page_size.push_attribute(("w:w", "12240"));
    page_size.push_attribute(("w:h", "15840"));
    let mut margins = BytesStart::new("w:pgMar");
    for side in ["w:top", "w:right", "w:bottom", "w:left"] {
        margins.push_attribute((side, "1440"));
    }
    writer.write_event(Event::Start(BytesStart::new("w:sectPr")))?;
    writer.write_event(Event::Empty(page_size))?;
    writer.write_event(Event::Empty(margins))?;
    writer.write_event(Event::End(BytesEnd::new("w:sectPr")))?;

    writer.write_event(Event::End(BytesEnd::new("w:body")))?;
    writer.write_event(Event::End(BytesEnd::new("w:document")))?;
    Ok(writer.into_inner())
}

fn write_paragraph(writer: &mut Writer<Vec<u8>>, paragraph: &Paragraph) -> Result<(), ExportError> {
    writer.write_event(Event::Start(BytesStart::new("w:p")))?;

    if let Some(style) = paragraph.style {
        writer.write_event(Event::Start(BytesStart::new("w:pPr")))?;
        let mut p_style = BytesStart::new("w:pStyle");
        p_style.push_attribute(("w:val", style));
        writer.write_event(Event::Empty(p_style))?;
        writer.write_event(Event::End(BytesEnd::new("w:pPr")))?;
    }

    writer.write_event(Event::Start(BytesStart::new("w:r")))?;
    if paragraph.bold || paragraph.size.is_some() {
        writer.write_event(Event::Start(BytesStart::new("w:rPr")))?;
        if paragraph.bold {
            writer.write_event(Event::Empty(BytesStart::new("w:b")))?;
        }
        if let Some(size) = paragraph.size {
            let size = size.to_string();
            for tag in ["w:sz", "w:szCs"] {
                let mut el = BytesStart::new(tag);
                el.push_attribute(("w:val", size.as_str()));
                writer.write_event(Event::Empty(el))?;
            }
        }
        writer.write_event(Event::End(BytesEnd::new("w:rPr")))?;
    }

    let text = xml_safe(&paragraph.text);
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            writer.write_event(Event::Empty(BytesStart::new("w:br")))?;
        }
        let mut t = BytesStart::new("w:t");
        t.push_attribute(("xml:space", "preserve"));
        writer.write_event(Event::Start(t))?;
        writer.write_event(Event::Text(BytesText::new(line)))?;
        writer.write_event(Event::End(BytesEnd::new("w:t")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("w:r")))?;
    writer.write_event(Event::End(BytesEnd::new("w:p")))?;
    Ok(())
}

/// Drops characters XML 1.0 cannot carry and normalizes line endings.
fn xml_safe(text: &str) -> String {
    text.replace("\r\n", "\n")
        .chars()
        .filter(|&c| matches!(c, '\n' | '\t') || !(c.is_control() || is_noncharacter(c)))
        .collect()
}

/// U+FFFE and U+FFFF are outside the XML 1.0 `Char` production.
fn is_noncharacter(c: char) -> bool {
    matches!(c, '\u{FFFE}' | '\u{FFFF}')
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/><w:szCs w:val="22"/></w:rPr></w:rPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="60"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/><w:szCs w:val="28"/></w:rPr></w:style></w:styles>"#;
