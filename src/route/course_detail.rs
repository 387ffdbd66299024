//! Content section lifecycle: fetch, upload, delete, description edit.
//!
//! Every operation loads the course fresh, runs validation and the access
//! policy before any mutation, then read-modify-writes the single course
//! document. File entries are addressed by index; deleting one shifts the
//! indices of everything after it, so clients re-fetch after each mutation.

use bson::Uuid;
use chrono::Utc;
use mongodb::Database;
use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::config::Config;
use crate::data::course::db::{problem, CourseDbExt, CourseDetailResponse};
use crate::data::course::{Course, FileEntry, Section, UploaderRef};
use crate::policy;
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::Problem;
use crate::storage;

#[derive(FromForm)]
pub struct UploadForm<'r> {
    /// Optional at the form layer so an absent file part still reaches the
    /// handler and gets the invalid-input problem body instead of Rocket's
    /// default form-error catcher.
    pub file: Option<TempFile<'r>>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DescriptionUpdate {
    pub description: String,
}

fn parse_section(section: &str) -> Result<Section, Problem> {
    Section::parse(section).ok_or_else(|| problem::invalid_section(section))
}

/// Index path segments parse here rather than through Rocket's `usize`
/// guard, so `-1` or garbage yields an invalid-input problem instead of a
/// forward to the 404 catcher.
fn parse_index(raw: &str) -> Result<usize, Problem> {
    raw.parse().map_err(|_| problem::invalid_index_segment(raw))
}

fn require_file<'a, 'r>(
    file: &'a mut Option<TempFile<'r>>,
) -> Result<&'a mut TempFile<'r>, Problem> {
    match file {
        Some(f) if f.len() > 0 => Ok(f),
        _ => Err(problem::missing_file()),
    }
}

fn entry_at(entries: &[FileEntry], index: usize) -> Result<&FileEntry, Problem> {
    entries
        .get(index)
        .ok_or_else(|| problem::invalid_index(index, entries.len()))
}

async fn load_course(db: &Database, id: uuid::Uuid) -> Result<Course, Problem> {
    db.get_course(Uuid::from_uuid_1(id))
        .await?
        .ok_or_else(problem::course_not_found)
}

/// Refreshed, fully populated projection returned after every mutation.
async fn refreshed(db: &Database, id: uuid::Uuid) -> Result<CourseDetailResponse, Problem> {
    db.get_course_detail(Uuid::from_uuid_1(id))
        .await?
        .ok_or_else(problem::course_not_found)
}

/// Best original filename Rocket lets us reconstruct: sanitized stem plus
/// the extension implied by the payload's content type.
fn original_filename(file: &TempFile<'_>) -> String {
    let stem = file
        .raw_name()
        .and_then(|n| n.as_str())
        .unwrap_or("file");
    match file.content_type().and_then(|ct| ct.extension()) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem.to_string(),
    }
}

/// Get course details with uploader names resolved.
#[utoipa::path(
    responses(
        (status = 200, description = "Course projection", body = CourseDetailResponse),
        (status = 403, description = "Neither owner nor enrolled", body = Problem),
        (status = 404, description = "Course doesn't exist", body = Problem),
    ),
    security(("jwt" = []))
)]
#[get("/courseDetail/<id>")]
#[tracing::instrument(skip(db))]
pub async fn course_get(
    id: uuid::Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<CourseDetailResponse>, Problem> {
    let course = load_course(db, id).await?;

    if !policy::can_view(auth.actor(), &course) {
        return Err(problem::access_denied(
            "You are neither the course mentor nor an enrolled student.",
        ));
    }

    Ok(Json(db.populate(course).await?))
}

/// Upload a file into a course section.
#[utoipa::path(
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated course", body = CourseDetailResponse),
        (status = 400, description = "Bad section or missing file", body = Problem),
        (status = 403, description = "Upload rule failed for the section", body = Problem),
        (status = 404, description = "Course doesn't exist", body = Problem),
    ),
    security(("jwt" = []))
)]
#[post("/courseDetail/<id>/<section>", data = "<form>")]
#[tracing::instrument(skip(db, config, form))]
pub async fn course_file_upload(
    id: uuid::Uuid,
    section: &str,
    mut form: Form<UploadForm<'_>>,
    auth: UserRoleToken,
    db: &State<Database>,
    config: &State<Config>,
) -> Result<Json<CourseDetailResponse>, Problem> {
    let section = parse_section(section)?;
    let mut course = load_course(db, id).await?;
    let actor = auth.actor();

    if !policy::can_upload(actor, &course, section) {
        return Err(match section {
            Section::Assignments => problem::access_denied(
                "Only enrolled students or the mentor can upload assignments.",
            ),
            _ => problem::access_denied("Only the course mentor can upload syllabus or notes."),
        });
    }

    let file = require_file(&mut form.file)?;
    let original_name = original_filename(file);

    // Disk write happens first; the entry must never reference a file that
    // was not persisted.
    let file_url = storage::store(
        &config.upload_dir,
        section,
        actor.role,
        file,
        &original_name,
    )
    .await?;

    let title = form
        .title
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or(original_name);

    let entry = FileEntry {
        title,
        file_url,
        uploaded_by: UploaderRef {
            role: actor.role,
            id: actor.id,
        },
        kind: policy::upload_kind(actor, &course, section),
        uploaded_at: Utc::now(),
    };
    course.section_mut(section).push(entry);

    db.save_course(&course).await?;

    Ok(Json(refreshed(db, id).await?))
}

/// Update the course description. Owning mentor only.
#[utoipa::path(
    request_body = DescriptionUpdate,
    responses(
        (status = 200, description = "Updated course", body = CourseDetailResponse),
        (status = 400, description = "Empty description", body = Problem),
        (status = 403, description = "Caller doesn't own the course", body = Problem),
        (status = 404, description = "Course doesn't exist", body = Problem),
    ),
    security(("jwt" = []))
)]
#[put("/courseDetail/<id>/description", format = "application/json", data = "<update>")]
#[tracing::instrument(skip(db))]
pub async fn course_description_update(
    id: uuid::Uuid,
    update: Json<DescriptionUpdate>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<CourseDetailResponse>, Problem> {
    let update = update.into_inner();
    if update.description.is_empty() {
        return Err(problem::description_required());
    }

    let mut course = load_course(db, id).await?;

    if !policy::can_edit_description(auth.actor(), &course) {
        return Err(problem::access_denied(
            "Only the course mentor can update the description.",
        ));
    }

    course.description = update.description;
    db.save_course(&course).await?;

    Ok(Json(db.populate(course).await?))
}

/// Delete the file entry at `index` within a section.
#[utoipa::path(
    responses(
        (status = 200, description = "Updated course", body = CourseDetailResponse),
        (status = 400, description = "Bad section or out-of-range index", body = Problem),
        (status = 403, description = "Delete rule failed for the entry", body = Problem),
        (status = 404, description = "Course doesn't exist", body = Problem),
    ),
    security(("jwt" = []))
)]
#[delete("/courseDetail/<id>/<section>/<index>")]
#[tracing::instrument(skip(db, config))]
pub async fn course_file_delete(
    id: uuid::Uuid,
    section: &str,
    index: &str,
    auth: UserRoleToken,
    db: &State<Database>,
    config: &State<Config>,
) -> Result<Json<CourseDetailResponse>, Problem> {
    let section = parse_section(section)?;
    let index = parse_index(index)?;
    let mut course = load_course(db, id).await?;

    let entry = entry_at(course.section(section), index)?;
    if !policy::can_delete_entry(auth.actor(), &course, section, entry) {
        return Err(problem::access_denied(
            "Only the course mentor or the entry's uploader can delete this file.",
        ));
    }

    // Disk removal is best effort; the database entry goes away regardless.
    storage::remove(&config.upload_dir, &entry.file_url).await;

    course.section_mut(section).remove(index);
    db.save_course(&course).await?;

    Ok(Json(refreshed(db, id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::course::FileKind;
    use crate::role::Role;
    use rocket::http::Status;

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
    fn missing_file_part_is_invalid_input() {
        let mut file: Option<TempFile<'static>> = None;
        let problem = require_file(&mut file).unwrap_err();
        assert_eq!(problem.status, Status::BadRequest);
    }

    #[test]
    fn index_segment_must_be_a_natural_number() {
        assert_eq!(parse_index("0").unwrap(), 0);
        assert_eq!(parse_index("17").unwrap(), 17);

        for raw in ["-1", "abc", "", "1.5"] {
            let problem = parse_index(raw).unwrap_err();
            assert_eq!(problem.status, Status::BadRequest, "segment {:?}", raw);
        }
    }

    #[test]
    fn out_of_range_index_is_rejected_without_mutation() {
        let entries = vec![entry("a")];

        let problem = entry_at(&entries, 1).unwrap_err();
        assert_eq!(problem.status, Status::BadRequest);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn index_freed_by_a_delete_is_rejected() {
        let mut entries = vec![entry("only")];
        assert_eq!(entry_at(&entries, 0).unwrap().title, "only");

        entries.remove(0);
        let problem = entry_at(&entries, 0).unwrap_err();
        assert_eq!(problem.status, Status::BadRequest);
    }
}
