use bson::{doc, Uuid};
use chrono::{DateTime, Utc};
use mongodb::options::FindOptions;
use mongodb::Database;
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::data::user::db::UserDbExt;
use crate::resp::problem::Problem;

use super::{filter, Course, FileEntry, FileKind, UploaderRef, COURSE_COLLECTION_NAME};

pub mod problem {
    use crate::resp::problem::Problem;
    use rocket::http::Status;

    #[inline]
    pub fn course_not_found() -> Problem {
        Problem::new_untyped(Status::NotFound, "Course not found.")
    }

    #[inline]
    pub fn access_denied(detail: impl ToString) -> Problem {
        Problem::new_untyped(Status::Forbidden, "Access denied.")
            .detail(detail)
            .clone()
    }

    #[inline]
    pub fn invalid_section(name: impl ToString) -> Problem {
        Problem::new_untyped(
            Status::BadRequest,
            "Invalid section. Must be syllabus, notes, or assignments.",
        )
        .insert_str("section", name)
        .clone()
    }

    #[inline]
    pub fn invalid_index(index: usize, len: usize) -> Problem {
        Problem::new_untyped(Status::BadRequest, "File index out of range.")
            .insert("index", index)
            .insert("length", len)
            .clone()
    }

    #[inline]
    pub fn invalid_index_segment(raw: impl ToString) -> Problem {
        Problem::new_untyped(
            Status::BadRequest,
            "File index must be a non-negative integer.",
        )
        .insert_str("index", raw)
        .clone()
    }

    #[inline]
    pub fn missing_file() -> Problem {
        Problem::new_untyped(Status::BadRequest, "No file uploaded.")
    }

    #[inline]
    pub fn missing_fields() -> Problem {
        Problem::new_untyped(Status::BadRequest, "Missing required fields.")
    }

    #[inline]
    pub fn description_required() -> Problem {
        Problem::new_untyped(Status::BadRequest, "Description is required.")
    }
}

/// File entry enriched with the uploader's display name, resolved at read
/// time against whichever collection the uploader reference tags.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FileEntryResponse {
    pub title: String,
    pub file_url: String,
    pub uploaded_by: UploaderRef,
    /// Absent when the uploader account no longer exists; `uploaded_by.role`
    /// still identifies what kind of account it was.
    pub uploader_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub uploaded_at: DateTime<Utc>,
}

impl FileEntryResponse {
    fn new(entry: FileEntry, uploader_name: Option<String>) -> Self {
        FileEntryResponse {
            title: entry.title,
            file_url: entry.file_url,
            uploaded_by: entry.uploaded_by,
            uploader_name,
            kind: entry.kind,
            uploaded_at: entry.uploaded_at,
        }
    }
}

/// Full course projection returned by the detail and mutation routes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseDetailResponse {
    #[schema(value_type = String)]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[schema(value_type = String)]
    pub created_by: Uuid,
    pub mentor_name: String,
    pub color: String,
    pub color_name: String,
    #[schema(value_type = Vec<String>)]
    pub students_enrolled: Vec<Uuid>,
    pub syllabus: Vec<FileEntryResponse>,
    pub notes: Vec<FileEntryResponse>,
    pub assignments: Vec<FileEntryResponse>,
}

/// Fixed projection used by the course directory listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseSummary {
    #[serde(rename = "_id")]
    #[schema(value_type = String)]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub mentor_name: String,
    pub color: String,
    pub color_name: String,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub students_enrolled: Vec<Uuid>,
    #[schema(value_type = String)]
    pub created_by: Uuid,
}

pub trait CourseDbExt {
    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, Problem>;
    async fn insert_course(&self, course: &Course) -> Result<(), Problem>;

    /// Persists the whole document. Mutations are read-modify-write with no
    /// concurrency token; concurrent writers are last-writer-wins.
    async fn save_course(&self, course: &Course) -> Result<(), Problem>;

    async fn list_courses(&self) -> Result<Vec<CourseSummary>, Problem>;

    /// Resolves uploader display names for every file entry in all three
    /// sections of an already-loaded course.
    async fn populate(&self, course: Course) -> Result<CourseDetailResponse, Problem>;

    /// Loads a course and populates it in one step.
    async fn get_course_detail(&self, id: Uuid) -> Result<Option<CourseDetailResponse>, Problem>;
}

impl CourseDbExt for Database {
    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, Problem> {
        self.collection(COURSE_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn insert_course(&self, course: &Course) -> Result<(), Problem> {
        self.collection::<Course>(COURSE_COLLECTION_NAME)
            .insert_one(course, None)
            .await
            .map_err(Problem::from)?;
        Ok(())
    }

    async fn save_course(&self, course: &Course) -> Result<(), Problem> {
        self.collection::<Course>(COURSE_COLLECTION_NAME)
            .replace_one(filter::by_id(course.id), course, None)
            .await
            .map_err(Problem::from)?;
        Ok(())
    }

    async fn list_courses(&self) -> Result<Vec<CourseSummary>, Problem> {
        let options = FindOptions::builder()
            .projection(doc! {
                "title": 1,
                "description": 1,
                "mentor_name": 1,
                "color": 1,
                "color_name": 1,
                "students_enrolled": 1,
                "created_by": 1,
            })
            .build();

        let cursor = self
            .collection::<CourseSummary>(COURSE_COLLECTION_NAME)
            .find(None, options)
            .await
            .map_err(Problem::from)?;

        cursor.try_collect().await.map_err(Problem::from)
    }

    async fn populate(&self, course: Course) -> Result<CourseDetailResponse, Problem> {
        let refs: Vec<UploaderRef> = course
            .syllabus
            .iter()
            .chain(course.notes.iter())
            .chain(course.assignments.iter())
            .map(|e| e.uploaded_by)
            .collect();
        let names = self.display_names(&refs).await?;

        let resolve = |entries: Vec<FileEntry>| -> Vec<FileEntryResponse> {
            entries
                .into_iter()
                .map(|e| {
                    let name = names.get(&e.uploaded_by.id).cloned();
                    FileEntryResponse::new(e, name)
                })
                .collect()
        };

        Ok(CourseDetailResponse {
            id: course.id,
            title: course.title,
            description: course.description,
            created_by: course.created_by,
            mentor_name: course.mentor_name,
            color: course.color,
            color_name: course.color_name,
            students_enrolled: course.students_enrolled,
            syllabus: resolve(course.syllabus),
            notes: resolve(course.notes),
            assignments: resolve(course.assignments),
        })
    }

    async fn get_course_detail(&self, id: Uuid) -> Result<Option<CourseDetailResponse>, Problem> {
        match self.get_course(id).await? {
            Some(course) => Ok(Some(self.populate(course).await?)),
            None => Ok(None),
        }
    }
}
