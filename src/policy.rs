//! Pure access decisions for course content.
//!
//! Every route consults these before touching the database. The rules are a
//! function of the actor's role and identity plus the course's ownership and
//! enrollment state; nothing in here performs IO.

use bson::Uuid;

use crate::data::course::{Course, FileEntry, FileKind, Section};
use crate::role::Role;

/// Authenticated identity attached to a request by the JWT guard.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

pub fn is_mentor_owner(actor: Actor, course: &Course) -> bool {
    actor.role.is_mentor() && actor.id == course.created_by
}

pub fn is_enrolled_student(actor: Actor, course: &Course) -> bool {
    actor.role.is_student() && course.is_enrolled(actor.id)
}

/// Whole-course view: owner or enrolled student only.
pub fn can_view(actor: Actor, course: &Course) -> bool {
    is_mentor_owner(actor, course) || is_enrolled_student(actor, course)
}

pub fn can_upload(actor: Actor, course: &Course, section: Section) -> bool {
    match section {
        Section::Syllabus | Section::Notes => is_mentor_owner(actor, course),
        Section::Assignments => {
            is_mentor_owner(actor, course) || is_enrolled_student(actor, course)
        }
    }
}

/// Deletion follows upload rights, except that in `assignments` an enrolled
/// student may only remove the entries they uploaded themselves.
pub fn can_delete_entry(
    actor: Actor,
    course: &Course,
    section: Section,
    entry: &FileEntry,
) -> bool {
    match section {
        Section::Syllabus | Section::Notes => is_mentor_owner(actor, course),
        Section::Assignments => {
            is_mentor_owner(actor, course)
                || (is_enrolled_student(actor, course) && entry.uploaded_by.id == actor.id)
        }
    }
}

pub fn can_edit_description(actor: Actor, course: &Course) -> bool {
    is_mentor_owner(actor, course)
}

/// Tag for a new upload: actor/section derived, independent of where the
/// raw file lands on disk.
pub fn upload_kind(actor: Actor, course: &Course, section: Section) -> FileKind {
    if section != Section::Assignments {
        FileKind::File
    } else if is_mentor_owner(actor, course) {
        FileKind::Question
    } else {
        FileKind::Answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::course::UploaderRef;
    use chrono::Utc;

    fn course(owner: Uuid, enrolled: Vec<Uuid>) -> Course {
        Course {
            id: Uuid::new(),
            title: "Algebra".to_string(),
            description: String::new(),
            created_by: owner,
            mentor_name: "M".to_string(),
            color: "#1abc9c".to_string(),
            color_name: "teal".to_string(),
            students_enrolled: enrolled,
            syllabus: vec![],
            notes: vec![],
            assignments: vec![],
        }
    }

    fn entry_by(uploader: Actor) -> FileEntry {
        FileEntry {
            title: "hw1.pdf".to_string(),
            file_url: "uploads/assignments/answers/1-hw1.pdf".to_string(),
            uploaded_by: UploaderRef {
                role: uploader.role,
                id: uploader.id,
            },
            kind: FileKind::Answer,
            uploaded_at: Utc::now(),
        }
    }

    fn mentor() -> Actor {
        Actor {
            id: Uuid::new(),
            role: Role::Mentor,
        }
    }

    fn student() -> Actor {
        Actor {
            id: Uuid::new(),
            role: Role::Student,
        }
    }

    #[test]
    fn view_requires_ownership_or_enrollment() {
        let owner = mentor();
        let enrolled = student();
        let c = course(owner.id, vec![enrolled.id]);

        assert!(can_view(owner, &c));
        assert!(can_view(enrolled, &c));
        assert!(!can_view(mentor(), &c), "foreign mentor");
        assert!(!can_view(student(), &c), "unenrolled student");
    }

    #[test]
    fn owner_id_with_student_role_is_not_owner() {
        let owner = mentor();
        let c = course(owner.id, vec![]);
        let impostor = Actor {
            id: owner.id,
            role: Role::Student,
        };
        assert!(!is_mentor_owner(impostor, &c));
        assert!(!can_view(impostor, &c));
    }

    #[test]
    fn syllabus_and_notes_are_mentor_owner_only() {
        let owner = mentor();
        let enrolled = student();
        let c = course(owner.id, vec![enrolled.id]);

        for section in [Section::Syllabus, Section::Notes] {
            assert!(can_upload(owner, &c, section));
            assert!(!can_upload(enrolled, &c, section));
            assert!(!can_upload(mentor(), &c, section));

            let e = entry_by(owner);
            assert!(can_delete_entry(owner, &c, section, &e));
            assert!(!can_delete_entry(enrolled, &c, section, &e));
        }
    }

    #[test]
    fn assignments_allow_enrolled_students() {
        let owner = mentor();
        let enrolled = student();
        let c = course(owner.id, vec![enrolled.id]);

        assert!(can_upload(owner, &c, Section::Assignments));
        assert!(can_upload(enrolled, &c, Section::Assignments));
        assert!(!can_upload(student(), &c, Section::Assignments));
    }

    #[test]
    fn assignment_delete_limited_to_own_entries() {
        let owner = mentor();
        let uploader = student();
        let other = student();
        let c = course(owner.id, vec![uploader.id, other.id]);
        let e = entry_by(uploader);

        assert!(can_delete_entry(owner, &c, Section::Assignments, &e));
        assert!(can_delete_entry(uploader, &c, Section::Assignments, &e));
        assert!(
            !can_delete_entry(other, &c, Section::Assignments, &e),
            "enrolled student who is not the uploader"
        );
    }

    #[test]
    fn description_edit_is_owner_only() {
        let owner = mentor();
        let enrolled = student();
        let c = course(owner.id, vec![enrolled.id]);

        assert!(can_edit_description(owner, &c));
        assert!(!can_edit_description(enrolled, &c));
        assert!(!can_edit_description(mentor(), &c));
    }

    #[test]
    fn upload_kind_derivation() {
        let owner = mentor();
        let enrolled = student();
        let c = course(owner.id, vec![enrolled.id]);

        assert_eq!(
            upload_kind(owner, &c, Section::Assignments),
            FileKind::Question
        );
        assert_eq!(
            upload_kind(enrolled, &c, Section::Assignments),
            FileKind::Answer
        );
        assert_eq!(upload_kind(owner, &c, Section::Syllabus), FileKind::File);
        assert_eq!(upload_kind(enrolled, &c, Section::Notes), FileKind::File);
    }
}
