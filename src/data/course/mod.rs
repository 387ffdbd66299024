use bson::{doc, Document, Uuid};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::role::Role;

pub mod db;

pub static COURSE_COLLECTION_NAME: &str = "courses";

/// One of the three ordered file lists a course carries.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Syllabus,
    Notes,
    Assignments,
}

impl Section {
    /// Parses a path segment; anything other than the three known section
    /// names is rejected by the routes with an invalid-input problem.
    pub fn parse(s: &str) -> Option<Section> {
        match s {
            "syllabus" => Some(Section::Syllabus),
            "notes" => Some(Section::Notes),
            "assignments" => Some(Section::Assignments),
            _ => None,
        }
    }

    pub fn field_name(self) -> &'static str {
        match self {
            Section::Syllabus => "syllabus",
            Section::Notes => "notes",
            Section::Assignments => "assignments",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Tag carried by every file entry: `question` for mentor-authored
/// assignment uploads, `answer` for student-authored ones, `file` for
/// everything in syllabus/notes.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Question,
    Answer,
    File,
}

/// Reference to whoever uploaded a file entry.
///
/// The uploader may live in either the `mentors` or the `students`
/// collection; `role` is the tag deciding which one to resolve against, and
/// is kept on the entry for display even if the account is later deleted.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UploaderRef {
    pub role: Role,
    #[schema(value_type = String)]
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileEntry {
    pub title: String,
    /// Slash-normalized path relative to the upload root.
    pub file_url: String,
    pub uploaded_by: UploaderRef,
    #[serde(rename = "type")]
    pub kind: FileKind,
    #[serde(default = "Utc::now")]
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Course {
    #[serde(default = "Uuid::new", rename = "_id")]
    #[schema(value_type = String)]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Owning mentor. Set at creation, never reassigned.
    #[schema(value_type = String)]
    pub created_by: Uuid,
    pub mentor_name: String,
    pub color: String,
    pub color_name: String,

    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub students_enrolled: Vec<Uuid>,

    #[serde(default)]
    pub syllabus: Vec<FileEntry>,
    #[serde(default)]
    pub notes: Vec<FileEntry>,
    #[serde(default)]
    pub assignments: Vec<FileEntry>,
}

impl Course {
    pub fn section(&self, section: Section) -> &[FileEntry] {
        match section {
            Section::Syllabus => &self.syllabus,
            Section::Notes => &self.notes,
            Section::Assignments => &self.assignments,
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut Vec<FileEntry> {
        match section {
            Section::Syllabus => &mut self.syllabus,
            Section::Notes => &mut self.notes,
            Section::Assignments => &mut self.assignments,
        }
    }

    pub fn is_enrolled(&self, student: Uuid) -> bool {
        self.students_enrolled.contains(&student)
    }

    /// Enrolls a student unless they already appear; returns whether the
    /// enrollment set changed. Joining twice is a no-op, not an error.
    pub fn enroll(&mut self, student: Uuid) -> bool {
        if self.is_enrolled(student) {
            return false;
        }
        self.students_enrolled.push(student);
        true
    }
}

pub mod filter {
    use super::*;

    #[inline]
    pub fn by_id(id: Uuid) -> Document {
        doc! { "_id": id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str) -> FileEntry {
        FileEntry {
            title: title.to_string(),
            file_url: format!("uploads/notes/{}", title),
            uploaded_by: UploaderRef {
                role: Role::Mentor,
                id: Uuid::new(),
            },
            kind: FileKind::File,
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn section_parse_accepts_known_names_only() {
        assert_eq!(Section::parse("syllabus"), Some(Section::Syllabus));
        assert_eq!(Section::parse("notes"), Some(Section::Notes));
        assert_eq!(Section::parse("assignments"), Some(Section::Assignments));
        assert_eq!(Section::parse("Syllabus"), None);
        assert_eq!(Section::parse("description"), None);
        assert_eq!(Section::parse(""), None);
    }

    #[test]
    fn kind_serializes_under_type_key() {
        let json = serde_json::to_value(entry("a")).unwrap();
        assert_eq!(json["type"], "file");
        assert!(json.get("kind").is_none());
    }

    fn course() -> Course {
        Course {
            id: Uuid::new(),
            title: "Algebra".to_string(),
            description: String::new(),
            created_by: Uuid::new(),
            mentor_name: "M".to_string(),
            color: "#fff".to_string(),
            color_name: "white".to_string(),
            students_enrolled: vec![],
            syllabus: vec![],
            notes: vec![],
            assignments: vec![],
        }
    }

    #[test]
    fn joining_twice_enrolls_once() {
        let mut course = course();
        let student = Uuid::new();

        assert!(!course.is_enrolled(student));
        assert!(course.enroll(student));
        assert!(course.is_enrolled(student));

        assert!(!course.enroll(student));
        let copies = course
            .students_enrolled
            .iter()
            .filter(|s| **s == student)
            .count();
        assert_eq!(copies, 1);
    }

    #[test]
    fn removing_an_entry_shifts_later_indices() {
        let mut course = course();
        course.notes = vec![entry("a"), entry("b"), entry("c")];

        course.section_mut(Section::Notes).remove(1);

        let titles: Vec<&str> = course
            .section(Section::Notes)
            .iter()
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(titles, vec!["a", "c"]);
    }
}
