use std::collections::HashMap;

use bson::{doc, Uuid};
use mongodb::options::FindOptions;
use mongodb::Database;
use rocket::futures::TryStreamExt;

use crate::data::course::UploaderRef;
use crate::resp::problem::Problem;
use crate::role::Role;

use super::{filter, Mentor, Student, StudentBrief};
use super::{MENTOR_COLLECTION_NAME, STUDENT_COLLECTION_NAME};

pub mod problem {
    use crate::resp::problem::Problem;
    use rocket::http::Status;

    #[inline]
    pub fn mentor_not_found() -> Problem {
        Problem::new_untyped(Status::NotFound, "Mentor not found.")
    }
}

#[derive(Debug, Deserialize)]
struct NameDoc {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
}

pub trait UserDbExt {
    async fn get_mentor(&self, id: Uuid) -> Result<Option<Mentor>, Problem>;

    /// Appends a course id to a mentor's `created_courses` back-references.
    /// Not atomic with the course insert itself.
    async fn push_created_course(&self, mentor: Uuid, course: Uuid) -> Result<(), Problem>;
    async fn push_joined_course(&self, student: Uuid, course: Uuid) -> Result<(), Problem>;

    /// Resolves display names for a batch of uploader references, querying
    /// the mentor and student collections separately per variant. Dangling
    /// references simply stay unresolved.
    async fn display_names(&self, refs: &[UploaderRef]) -> Result<HashMap<Uuid, String>, Problem>;

    async fn students_brief(&self, ids: &[Uuid]) -> Result<Vec<StudentBrief>, Problem>;
}

impl UserDbExt for Database {
    async fn get_mentor(&self, id: Uuid) -> Result<Option<Mentor>, Problem> {
        self.collection(MENTOR_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn push_created_course(&self, mentor: Uuid, course: Uuid) -> Result<(), Problem> {
        self.collection::<Mentor>(MENTOR_COLLECTION_NAME)
            .update_one(
                filter::by_id(mentor),
                doc! { "$push": { "created_courses": course } },
                None,
            )
            .await
            .map_err(Problem::from)?;
        Ok(())
    }

    async fn push_joined_course(&self, student: Uuid, course: Uuid) -> Result<(), Problem> {
        self.collection::<Student>(STUDENT_COLLECTION_NAME)
            .update_one(
                filter::by_id(student),
                doc! { "$push": { "joined_courses": course } },
                None,
            )
            .await
            .map_err(Problem::from)?;
        Ok(())
    }

    async fn display_names(&self, refs: &[UploaderRef]) -> Result<HashMap<Uuid, String>, Problem> {
        let mut mentor_ids: Vec<Uuid> = vec![];
        let mut student_ids: Vec<Uuid> = vec![];
        for r in refs {
            let bucket = match r.role {
                Role::Mentor => &mut mentor_ids,
                Role::Student => &mut student_ids,
            };
            if !bucket.contains(&r.id) {
                bucket.push(r.id);
            }
        }

        let mut names = HashMap::new();
        let name_only = FindOptions::builder()
            .projection(doc! { "name": 1 })
            .build();

        for (collection, ids) in [
            (MENTOR_COLLECTION_NAME, mentor_ids),
            (STUDENT_COLLECTION_NAME, student_ids),
        ] {
            if ids.is_empty() {
                continue;
            }
            let mut cursor = self
                .collection::<NameDoc>(collection)
                .find(filter::by_ids(&ids), name_only.clone())
                .await
                .map_err(Problem::from)?;
            while let Some(doc) = cursor.try_next().await.map_err(Problem::from)? {
                names.insert(doc.id, doc.name);
            }
        }

        Ok(names)
    }

    async fn students_brief(&self, ids: &[Uuid]) -> Result<Vec<StudentBrief>, Problem> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let options = FindOptions::builder()
            .projection(doc! { "name": 1, "email": 1 })
            .build();

        let cursor = self
            .collection::<StudentBrief>(STUDENT_COLLECTION_NAME)
            .find(filter::by_ids(ids), options)
            .await
            .map_err(Problem::from)?;

        cursor.try_collect().await.map_err(Problem::from)
    }
}
