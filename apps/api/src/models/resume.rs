use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Record shape (wire format is camelCase, matching the wizard's form state)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub linkedin: String,
    pub website: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    pub company: String,
    pub position: String,
    pub start_date: String,
    pub end_date: String,
    pub current: bool,
    pub description: String,
}

impl ExperienceEntry {
    /// `"{start} - {end}"`, with `Present` standing in for the end of a current role.
    /// `None` when neither end of the range is known.
    pub fn date_range(&self) -> Option<String> {
        let end = if self.current {
            "Present"
        } else {
            self.end_date.trim()
        };
        date_range(self.start_date.trim(), end)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub institution: String,
    pub degree: String,
    pub field: String,
    pub start_date: String,
    pub end_date: String,
    pub gpa: String,
}

impl EducationEntry {
    /// Secondary line under the degree: field of study, dates and GPA, whichever are set.
    pub fn details(&self) -> Option<String> {
        let mut parts = Vec::new();
        if !self.field.trim().is_empty() {
            parts.push(self.field.trim().to_string());
        }
        if let Some(range) = date_range(self.start_date.trim(), self.end_date.trim()) {
            parts.push(range);
        }
        if !self.gpa.trim().is_empty() {
            parts.push(format!("GPA: {}", self.gpa.trim()));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" | "))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillEntry {
    pub category: String,
    /// Comma-separated list as typed by the user.
    pub items: String,
}

impl SkillEntry {
    /// Splits `items` on commas, trimming each tag and dropping empty ones.
    pub fn tags(&self) -> Vec<&str> {
        self.items
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// `"- {category}: {tag, tag, ...}"`
    pub fn display_line(&self) -> String {
        format!("- {}: {}", self.category.trim(), self.tags().join(", "))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectEntry {
    pub name: String,
    pub description: String,
    pub technologies: String,
    pub link: String,
}

/// The stored resume data for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeRecord {
    pub personal_info: PersonalInfo,
    pub summary: String,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub skills: Vec<SkillEntry>,
    pub projects: Vec<ProjectEntry>,
}

impl ResumeRecord {
    /// The canonical all-empty record returned to users who have never saved.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Title shown at the top of every export.
    pub fn display_name(&self) -> &str {
        non_blank(&self.personal_info.full_name).unwrap_or("Untitled Resume")
    }

    /// Shallow field assignment: every field present in `update` replaces the
    /// stored field wholesale, absent fields are left untouched.
    pub fn apply(&mut self, update: ResumeUpdate) {
        let ResumeUpdate {
            personal_info,
            summary,
            experience,
            education,
            skills,
            projects,
        } = update;
        if let Some(v) = personal_info {
            self.personal_info = v;
        }
        if let Some(v) = summary {
            self.summary = v;
        }
        if let Some(v) = experience {
            self.experience = v;
        }
        if let Some(v) = education {
            self.education = v;
        }
        if let Some(v) = skills {
            self.skills = v;
        }
        if let Some(v) = projects {
            self.projects = v;
        }
    }
}

/// Body of a save request. Only the fields the client sends are assigned.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeUpdate {
    pub personal_info: Option<PersonalInfo>,
    pub summary: Option<String>,
    pub experience: Option<Vec<ExperienceEntry>>,
    pub education: Option<Vec<EducationEntry>>,
    pub skills: Option<Vec<SkillEntry>>,
    pub projects: Option<Vec<ProjectEntry>>,
}

impl ResumeUpdate {
    pub fn into_record(self) -> ResumeRecord {
        let mut record = ResumeRecord::empty();
        record.apply(self);
        record
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Persistence
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: String,
    pub record: sqlx::types::Json<ResumeRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A saved record as returned over HTTP: the record fields plus ownership metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResume {
    pub id: Uuid,
    pub user_id: String,
    #[serde(flatten)]
    pub record: ResumeRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ResumeRow> for StoredResume {
    fn from(row: ResumeRow) -> Self {
        StoredResume {
            id: row.id,
            user_id: row.user_id,
            record: row.record.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub(crate) fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn date_range(start: &str, end: &str) -> Option<String> {
    match (start.is_empty(), end.is_empty()) {
        (true, true) => None,
        (false, true) => Some(start.to_string()),
        (true, false) => Some(end.to_string()),
        (false, false) => Some(format!("{start} - {end}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_skill_tags_are_split_and_trimmed() {
        let skill = SkillEntry {
            category: "Languages".to_string(),
            items: "Go, Rust , C++".to_string(),
        };
        assert_eq!(skill.tags(), vec!["Go", "Rust", "C++"]);
        assert_eq!(skill.display_line(), "- Languages: Go, Rust, C++");
    }

    #[test]
    fn test_skill_tags_drop_empty_pieces() {
        let skill = SkillEntry {
            category: "Tools".to_string(),
            items: " , Docker,, ".to_string(),
        };
        assert_eq!(skill.tags(), vec!["Docker"]);
    }

    #[test]
    fn test_empty_record_serializes_to_canonical_shape() {
        let value = serde_json::to_value(ResumeRecord::empty()).unwrap();
        assert_eq!(
            value,
            json!({
                "personalInfo": {
                    "fullName": "",
                    "email": "",
                    "phone": "",
                    "address": "",
                    "linkedin": "",
                    "website": ""
                },
                "summary": "",
                "experience": [],
                "education": [],
                "skills": [],
                "projects": []
            })
        );
    }

    #[test]
    fn test_display_name_falls_back_when_blank() {
        let mut record = ResumeRecord::empty();
        assert_eq!(record.display_name(), "Untitled Resume");
        record.personal_info.full_name = "   ".to_string();
        assert_eq!(record.display_name(), "Untitled Resume");
        record.personal_info.full_name = "Jane Doe".to_string();
        assert_eq!(record.display_name(), "Jane Doe");
    }

    #[test]
    fn test_apply_keeps_fields_absent_from_update() {
        let mut record = ResumeRecord::empty();
        record.summary = "Original summary".to_string();
        record.skills = vec![SkillEntry {
            category: "Languages".to_string(),
            items: "Rust".to_string(),
        }];

        let update: ResumeUpdate = serde_json::from_value(json!({
            "personalInfo": { "fullName": "Jane Doe" },
            "experience": [{ "company": "Acme", "position": "Engineer" }]
        }))
        .unwrap();
        record.apply(update);

        assert_eq!(record.summary, "Original summary");
        assert_eq!(record.skills.len(), 1);
        assert_eq!(record.personal_info.full_name, "Jane Doe");
        assert_eq!(record.personal_info.email, "");
        assert_eq!(record.experience[0].company, "Acme");
        assert!(!record.experience[0].current);
    }

    #[test]
    fn test_apply_replaces_sequences_wholesale() {
        let mut record = ResumeRecord::empty();
        record.projects = vec![ProjectEntry::default(), ProjectEntry::default()];
        record.apply(ResumeUpdate {
            projects: Some(vec![]),
            ..Default::default()
        });
        assert!(record.projects.is_empty());
    }

    #[test]
    fn test_experience_date_range() {
        let mut exp = ExperienceEntry {
            start_date: "2020-01".to_string(),
            end_date: "2022-06".to_string(),
            ..Default::default()
        };
        assert_eq!(exp.date_range().as_deref(), Some("2020-01 - 2022-06"));
        exp.current = true;
        assert_eq!(exp.date_range().as_deref(), Some("2020-01 - Present"));
        assert_eq!(ExperienceEntry::default().date_range(), None);
    }

    #[test]
    fn test_education_details_join_known_parts() {
        let edu = EducationEntry {
            field: "Computer Science".to_string(),
            start_date: "2014".to_string(),
            end_date: "2018".to_string(),
            gpa: "3.8".to_string(),
            ..Default::default()
        };
        assert_eq!(
            edu.details().as_deref(),
            Some("Computer Science | 2014 - 2018 | GPA: 3.8")
        );
        assert_eq!(EducationEntry::default().details(), None);
    }

    #[test]
    fn test_stored_resume_flattens_record_fields() {
        let stored = StoredResume {
            id: Uuid::nil(),
            user_id: "65a1f0c2e4b0a1b2c3d4e5f6".to_string(),
            record: ResumeRecord::empty(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&stored).unwrap();
        assert!(value.get("personalInfo").is_some());
        assert!(value.get("userId").is_some());
        assert!(value.get("record").is_none());
    }
}
