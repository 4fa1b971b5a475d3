//! Format-neutral text content of the list sections.
//!
//! Both exporters walk the same outline so numbering, fallbacks and section
//! order stay identical between PDF and DOCX.

use crate::models::resume::{non_blank, ResumeRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Experience,
    Education,
    Skills,
    Projects,
}

impl SectionKind {
    /// Display order shared by both exporters.
    pub const ORDER: [SectionKind; 4] = [
        SectionKind::Experience,
        SectionKind::Education,
        SectionKind::Skills,
        SectionKind::Projects,
    ];

    pub fn heading(self) -> &'static str {
        match self {
            SectionKind::Experience => "Experience",
            SectionKind::Education => "Education",
            SectionKind::Skills => "Skills",
            SectionKind::Projects => "Projects",
        }
    }

    /// Skills are a compact list; the other sections leave a gap after each entry.
    pub fn spaced_entries(self) -> bool {
        !matches!(self, SectionKind::Skills)
    }
}

/// One entry: a lead line (numbered where the section is numbered) and its body lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub lead: String,
    pub body: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    pub entries: Vec<Entry>,
}

/// Sections in display order: Experience, Education, Skills, Projects.
/// A section whose sequence is empty is omitted. Entries keep input order.
pub fn list_sections(record: &ResumeRecord) -> Vec<Section> {
    SectionKind::ORDER
        .into_iter()
        .map(|kind| Section {
            kind,
            entries: entries(record, kind),
        })
        .filter(|s| !s.entries.is_empty())
        .collect()
}

pub fn entries(record: &ResumeRecord, kind: SectionKind) -> Vec<Entry> {
    match kind {
        SectionKind::Experience => record
            .experience
            .iter()
            .enumerate()
            .map(|(i, exp)| {
                let mut body = Vec::new();
                body.extend(exp.date_range());
                body.extend(non_blank(&exp.description).map(str::to_string));
                Entry {
                    lead: format!(
                        "{}. {} at {}",
                        i + 1,
                        non_blank(&exp.position).unwrap_or("Role"),
                        non_blank(&exp.company).unwrap_or("Company"),
                    ),
                    body,
                }
            })
            .collect(),
        SectionKind::Education => record
            .education
            .iter()
            .enumerate()
            .map(|(i, edu)| Entry {
                lead: format!(
                    "{}. {} - {}",
                    i + 1,
                    non_blank(&edu.degree).unwrap_or("Degree"),
                    non_blank(&edu.institution).unwrap_or("Institution"),
                ),
                body: edu.details().into_iter().collect(),
            })
            .collect(),
        SectionKind::Skills => record
            .skills
            .iter()
            .map(|skill| Entry {
                lead: skill.display_line(),
                body: Vec::new(),
            })
            .collect(),
        SectionKind::Projects => record
            .projects
            .iter()
            .enumerate()
            .map(|(i, project)| {
                let mut body = Vec::new();
                body.extend(non_blank(&project.description).map(str::to_string));
                if let Some(tech) = non_blank(&project.technologies) {
                    body.push(format!("Tech: {tech}"));
                }
                if let Some(link) = non_blank(&project.link) {
                    body.push(format!("Link: {link}"));
                }
                Entry {
                    lead: format!(
                        "{}. {}",
                        i + 1,
                        non_blank(&project.name).unwrap_or("Untitled Project")
                    ),
                    body,
                }
            })
            .collect(),
    }
}
