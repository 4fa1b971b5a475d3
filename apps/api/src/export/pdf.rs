//! PDF export: a single-column flowing document drawn with lopdf.
//!
//! Three stages, each a pure function: the record becomes a list of blocks,
//! the blocks are flowed onto US Letter pages, and the pages are written as
//! content streams. Nothing time- or randomness-dependent enters the file, so
//! the same record always yields the same bytes.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use tracing::debug;

use crate::export::font_metrics::FontFace;
use crate::export::sections::list_sections;
use crate::export::ExportError;
use crate::models::resume::{non_blank, ResumeRecord};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 72.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const LINE_SPACING: f32 = 1.2;

// ────────────────────────────────────────────────────────────────────────────
// Blocks
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: f32,
    pub align: Align,
    pub underline: bool,
}

impl TextStyle {
    pub const TITLE: TextStyle = TextStyle {
        face: FontFace::HelveticaBold,
        size: 22.0,
        align: Align::Center,
        underline: true,
    };
    pub const HEADING: TextStyle = TextStyle {
        face: FontFace::HelveticaBold,
        size: 14.0,
        align: Align::Left,
        underline: true,
    };
    pub const BODY: TextStyle = TextStyle {
        face: FontFace::Helvetica,
        size: 12.0,
        align: Align::Left,
        underline: false,
    };

    fn line_height(&self) -> f32 {
        self.size * LINE_SPACING
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text { text: String, style: TextStyle },
    /// Vertical gap of one line at the given font size.
    MoveDown(f32),
}

impl Block {
    fn text(text: impl Into<String>, style: TextStyle) -> Self {
        Block::Text {
            text: text.into(),
            style,
        }
    }
}

/// Title, contact block, Summary, then the non-empty list sections in fixed order.
pub fn build_blocks(record: &ResumeRecord) -> Vec<Block> {
    let mut blocks = vec![
        Block::text(record.display_name(), TextStyle::TITLE),
        Block::MoveDown(TextStyle::TITLE.size),
    ];

    let info = &record.personal_info;
    for (label, value) in [
        ("Email", &info.email),
        ("Phone", &info.phone),
        ("Address", &info.address),
    ] {
        if let Some(value) = non_blank(value) {
            blocks.push(Block::text(format!("{label}: {value}"), TextStyle::BODY));
        }
    }
    blocks.push(Block::MoveDown(TextStyle::BODY.size));

    blocks.push(Block::text("Summary", TextStyle::HEADING));
    blocks.push(Block::text(
        non_blank(&record.summary).unwrap_or("No summary provided."),
        TextStyle::BODY,
    ));
    blocks.push(Block::MoveDown(TextStyle::BODY.size));

    for section in list_sections(record) {
        blocks.push(Block::text(section.kind.heading(), TextStyle::HEADING));
        for entry in section.entries {
            blocks.push(Block::text(entry.lead, TextStyle::BODY));
            for line in entry.body {
                blocks.push(Block::text(line, TextStyle::BODY));
            }
            if section.kind.spaced_entries() {
                blocks.push(Block::MoveDown(TextStyle::BODY.size));
            }
        }
        if !section.kind.spaced_entries() {
            blocks.push(Block::MoveDown(TextStyle::BODY.size));
        }
    }

    blocks
}

// ────────────────────────────────────────────────────────────────────────────
// Flowing layout
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub style: TextStyle,
    pub x: f32,
    pub baseline: f32,
    pub width: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub lines: Vec<PlacedLine>,
}

struct Flow {
    pages: Vec<Page>,
    current: Page,
    cursor_y: f32,
}

impl Flow {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Page::default(),
            cursor_y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn advance(&mut self, height: f32) {
        self.cursor_y -= height;
    }

    fn place(&mut self, text: String, style: TextStyle) {
        let height = style.line_height();
        if self.cursor_y - height < MARGIN && !self.current.lines.is_empty() {
            self.pages.push(std::mem::take(&mut self.current));
            self.cursor_y = PAGE_HEIGHT - MARGIN;
        }

        let width = style.face.metrics().width_pt(&text, style.size);
        let x = match style.align {
            Align::Left => MARGIN,
            Align::Center => MARGIN + (CONTENT_WIDTH - width).max(0.0) / 2.0,
        };
        self.current.lines.push(PlacedLine {
            text,
            style,
            x,
            baseline: self.cursor_y - style.size,
            width,
        });
        self.cursor_y -= height;
    }

    fn finish(mut self) -> Vec<Page> {
        if !self.current.lines.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

/// Flows blocks onto pages, wrapping text to the content width. A new page
/// starts when the next line would cross the bottom margin.
pub fn layout(blocks: &[Block]) -> Vec<Page> {
    let mut flow = Flow::new();

    for block in blocks {
        match block {
            Block::MoveDown(size) => flow.advance(size * LINE_SPACING),
            Block::Text { text, style } => {
                let metrics = style.face.metrics();
                let text = text.trim();
                for (i, paragraph) in text.split('\n').enumerate() {
                    let lines = metrics.wrap(paragraph, style.size, CONTENT_WIDTH);
                    if lines.is_empty() && i > 0 {
                        // blank line inside multi-line text
                        flow.advance(style.line_height());
                    }
                    for line in lines {
                        flow.place(line, *style);
                    }
                }
            }
        }
    }

    flow.finish()
}

// ────────────────────────────────────────────────────────────────────────────
// PDF assembly
// ────────────────────────────────────────────────────────────────────────────

/// Renders `record` to PDF bytes, buffered in memory.
pub fn render_pdf(record: &ResumeRecord) -> Result<Vec<u8>, ExportError> {
    let pages = layout(&build_blocks(record));
    debug!("Laid out resume PDF on {} page(s)", pages.len());
    write_document(&pages)
}

fn write_document(pages: &[Page]) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for face in [FontFace::Helvetica, FontFace::HelveticaBold] {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = page_content(page).encode()?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

fn page_content(page: &Page) -> Content {
    let mut operations = Vec::with_capacity(page.lines.len() * 5);
    for line in &page.lines {
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![line.style.face.resource_name().into(), line.style.size.into()],
            ),
            Operation::new("Td", vec![line.x.into(), line.baseline.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    encode_win_ansi(&line.text),
                    StringFormat::Literal,
                )],
            ),
            Operation::new("ET", vec![]),
        ]);

        if line.style.underline {
            let y = line.baseline - line.style.size * 0.15;
            operations.extend([
                Operation::new("w", vec![(line.style.size / 18.0).into()]),
                Operation::new("m", vec![line.x.into(), y.into()]),
                Operation::new("l", vec![(line.x + line.width).into(), y.into()]),
                Operation::new("S", vec![]),
            ]);
        }
    }
    Content { operations }
}

/// Encodes text for the standard fonts' WinAnsiEncoding. Characters with no
/// WinAnsi code point become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\t' => b' ',
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{
        EducationEntry, ExperienceEntry, PersonalInfo, ProjectEntry, SkillEntry,
    };

    fn jane_doe() -> ResumeRecord {
        ResumeRecord {
            personal_info: PersonalInfo {
                full_name: "Jane Doe".to_string(),
                email: "jane@example.com".to_string(),
                ..Default::default()
            },
            summary: "Backend engineer.".to_string(),
            experience: vec![ExperienceEntry {
                company: "Acme".to_string(),
                position: "Engineer".to_string(),
                description: "Built things.".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn texts_with_style(blocks: &[Block], wanted: TextStyle) -> Vec<String> {
        blocks
            .iter()
            .filter_map(|b| match b {
                Block::Text { text, style } if *style == wanted => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn all_lines(pages: &[Page]) -> Vec<String> {
        pages
            .iter()
            .flat_map(|p| p.lines.iter().map(|l| l.text.clone()))
            .collect()
    }

    #[test]
    fn test_jane_doe_scenario() {
        let blocks = build_blocks(&jane_doe());

        assert_eq!(texts_with_style(&blocks, TextStyle::TITLE), vec!["Jane Doe"]);
        assert_eq!(
            texts_with_style(&blocks, TextStyle::HEADING),
            vec!["Summary", "Experience"]
        );
        let numbered: Vec<_> = texts_with_style(&blocks, TextStyle::BODY)
            .into_iter()
            .filter(|t| t.starts_with("1. ") || t.starts_with("2. "))
            .collect();
        assert_eq!(numbered, vec!["1. Engineer at Acme"]);
    }

    #[test]
    fn test_empty_lists_produce_no_headings() {
        let blocks = build_blocks(&ResumeRecord::empty());
        let headings = texts_with_style(&blocks, TextStyle::HEADING);
        assert_eq!(headings, vec!["Summary"]);
        assert_eq!(
            texts_with_style(&blocks, TextStyle::TITLE),
            vec!["Untitled Resume"]
        );
        assert!(texts_with_style(&blocks, TextStyle::BODY)
            .contains(&"No summary provided.".to_string()));
    }

    #[test]
    fn test_blank_contact_lines_are_omitted() {
        let blocks = build_blocks(&jane_doe());
        let body = texts_with_style(&blocks, TextStyle::BODY);
        assert!(body.contains(&"Email: jane@example.com".to_string()));
        assert!(!body.iter().any(|t| t.starts_with("Phone:")));
        assert!(!body.iter().any(|t| t.starts_with("Address:")));
    }

    #[test]
    fn test_all_sections_in_fixed_order() {
        let mut record = jane_doe();
        record.projects = vec![ProjectEntry {
            name: "Resume builder".to_string(),
            ..Default::default()
        }];
        record.skills = vec![SkillEntry {
            category: "Languages".to_string(),
            items: "Go, Rust , C++".to_string(),
        }];
        record.education = vec![EducationEntry {
            degree: "BSc".to_string(),
            institution: "MIT".to_string(),
            ..Default::default()
        }];

        let blocks = build_blocks(&record);
        assert_eq!(
            texts_with_style(&blocks, TextStyle::HEADING),
            vec!["Summary", "Experience", "Education", "Skills", "Projects"]
        );
        let body = texts_with_style(&blocks, TextStyle::BODY);
        assert!(body.contains(&"1. BSc - MIT".to_string()));
        assert!(body.contains(&"- Languages: Go, Rust, C++".to_string()));
        assert!(body.contains(&"1. Resume builder".to_string()));
    }

    #[test]
    fn test_experience_numbering_is_sequential() {
        let mut record = ResumeRecord::empty();
        record.experience = (0..5)
            .map(|i| ExperienceEntry {
                company: format!("Company {}", 5 - i),
                ..Default::default()
            })
            .collect();
        let leads: Vec<_> = texts_with_style(&build_blocks(&record), TextStyle::BODY)
            .into_iter()
            .filter(|t| t.contains(" at Company "))
            .collect();
        for (i, lead) in leads.iter().enumerate() {
            assert!(
                lead.starts_with(&format!("{}. ", i + 1)),
                "entry {i} was {lead}"
            );
            assert!(lead.ends_with(&format!("Company {}", 5 - i)));
        }
        assert_eq!(leads.len(), 5);
    }

    #[test]
    fn test_title_is_centered() {
        let pages = layout(&build_blocks(&jane_doe()));
        let title = &pages[0].lines[0];
        assert_eq!(title.text, "Jane Doe");
        let left_gap = title.x - MARGIN;
        let right_gap = PAGE_WIDTH - MARGIN - (title.x + title.width);
        assert!((left_gap - right_gap).abs() < 0.01);
    }

    #[test]
    fn test_long_resume_flows_onto_more_pages() {
        let mut record = jane_doe();
        record.experience = (0..60)
            .map(|i| ExperienceEntry {
                company: format!("Company {i}"),
                position: "Engineer".to_string(),
                description: "Shipped features, fixed bugs and reviewed code.".to_string(),
                ..Default::default()
            })
            .collect();

        let pages = layout(&build_blocks(&record));
        assert!(pages.len() > 1, "expected multiple pages");
        for page in &pages {
            assert!(!page.lines.is_empty());
            for line in &page.lines {
                assert!(line.baseline >= MARGIN - line.style.size, "{line:?}");
                assert!(line.baseline <= PAGE_HEIGHT - MARGIN);
            }
        }
        let lines = all_lines(&pages);
        assert!(lines.contains(&"60. Engineer at Company 59".to_string()));
    }

    #[test]
    fn test_multiline_description_keeps_line_breaks() {
        let mut record = jane_doe();
        record.experience[0].description = "First line\nSecond line".to_string();
        let lines = all_lines(&layout(&build_blocks(&record)));
        let first = lines.iter().position(|l| l == "First line").unwrap();
        assert_eq!(lines[first + 1], "Second line");
    }

    #[test]
    fn test_render_is_byte_identical_for_same_record() {
        let record = jane_doe();
        let first = render_pdf(&record).unwrap();
        let second = render_pdf(&record).unwrap();
        assert!(first.starts_with(b"%PDF-1.7"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_rendered_pdf_parses_and_contains_title() {
        let bytes = render_pdf(&jane_doe()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);

        let page_id = *pages.get(&1).unwrap();
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let shown: Vec<String> = content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| op.operands.first())
            .filter_map(|o| o.as_str().ok())
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .collect();
        assert_eq!(shown.first().map(String::as_str), Some("Jane Doe"));
        assert!(shown.contains(&"1. Engineer at Acme".to_string()));
        assert!(!shown.contains(&"Education".to_string()));
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("Go"), b"Go".to_vec());
        assert_eq!(encode_win_ansi("Café"), vec![b'C', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("a – b"), vec![b'a', b' ', 0x96, b' ', b'b']);
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
    }
}
