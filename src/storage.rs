//! Disk persistence for uploaded course files.
//!
//! Files land under the configured upload root, partitioned by section.
//! Assignment uploads are further split into `questions`/`answers` by the
//! uploader's role; that split organizes storage only and carries no meaning
//! beyond it. The stored `file_url` always uses forward slashes and is the
//! path the `/uploads` file server resolves.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::tokio::fs;

use crate::data::course::Section;
use crate::resp::problem::Problem;
use crate::role::Role;

pub static URL_PREFIX: &str = "uploads";

#[inline]
pub fn storage_problem() -> Problem {
    Problem::new_untyped(
        Status::InternalServerError,
        "Unable to store uploaded file.",
    )
}

/// Subdirectory (relative to the upload root) a new file belongs in.
pub fn destination(section: Section, uploader: Role) -> &'static str {
    match section {
        Section::Syllabus => "syllabus",
        Section::Notes => "notes",
        Section::Assignments => match uploader {
            Role::Mentor => "assignments/questions",
            Role::Student => "assignments/answers",
        },
    }
}

/// Builds the stored filename: upload timestamp plus the original name with
/// whitespace runs collapsed to `-`.
pub fn stored_filename(original: &str) -> String {
    let safe = original.split_whitespace().collect::<Vec<_>>().join("-");
    let safe = if safe.is_empty() {
        "file".to_string()
    } else {
        safe
    };
    format!("{}-{}", Utc::now().timestamp_millis(), safe)
}

/// Maps a stored `file_url` back to its on-disk path.
pub fn disk_path(upload_root: &Path, file_url: &str) -> PathBuf {
    let relative = file_url.strip_prefix(URL_PREFIX).unwrap_or(file_url);
    let relative = relative.trim_start_matches('/');
    upload_root.join(relative)
}

/// Persists an uploaded file and returns its slash-normalized `file_url`.
/// Runs before the database write; a failure here surfaces as a server
/// error so no entry ends up referencing a missing file.
pub async fn store(
    upload_root: &Path,
    section: Section,
    uploader: Role,
    file: &mut TempFile<'_>,
    original_name: &str,
) -> Result<String, Problem> {
    let subdir = destination(section, uploader);
    let dir = upload_root.join(subdir);
    fs::create_dir_all(&dir).await.map_err(|e| {
        tracing::error!("unable to create upload directory '{}': {}", dir.display(), e);
        storage_problem()
    })?;

    let filename = stored_filename(original_name);
    let path = dir.join(&filename);

    file.persist_to(&path).await.map_err(|e| {
        tracing::error!("unable to persist upload to '{}': {}", path.display(), e);
        storage_problem()
    })?;

    Ok(format!("{}/{}/{}", URL_PREFIX, subdir, filename))
}

/// Best-effort removal of a stored file. A failure is logged and swallowed;
/// the caller removes the database entry regardless.
pub async fn remove(upload_root: &Path, file_url: &str) {
    let path = disk_path(upload_root, file_url);
    if let Err(e) = fs::remove_file(&path).await {
        tracing::warn!("unable to remove stored file '{}': {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_splits_assignments_by_role() {
        assert_eq!(destination(Section::Syllabus, Role::Mentor), "syllabus");
        assert_eq!(destination(Section::Syllabus, Role::Student), "syllabus");
        assert_eq!(destination(Section::Notes, Role::Mentor), "notes");
        assert_eq!(
            destination(Section::Assignments, Role::Mentor),
            "assignments/questions"
        );
        assert_eq!(
            destination(Section::Assignments, Role::Student),
            "assignments/answers"
        );
    }

    #[test]
    fn stored_filename_collapses_whitespace() {
        let name = stored_filename("week 1  syllabus.pdf");
        let (_stamp, rest) = name.split_once('-').expect("timestamp prefix");
        assert_eq!(rest, "week-1-syllabus.pdf");
    }

    #[test]
    fn stored_filename_never_empty() {
        let name = stored_filename("   ");
        assert!(name.ends_with("-file"));
    }

    #[test]
    fn disk_path_strips_url_prefix() {
        let root = Path::new("/srv/uploads");
        assert_eq!(
            disk_path(root, "uploads/notes/1-a.pdf"),
            PathBuf::from("/srv/uploads/notes/1-a.pdf")
        );
        // Already-relative urls pass through unchanged.
        assert_eq!(
            disk_path(root, "notes/1-a.pdf"),
            PathBuf::from("/srv/uploads/notes/1-a.pdf")
        );
    }
}
