use bson::{doc, Document, Uuid};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod db;

pub static MENTOR_COLLECTION_NAME: &str = "mentors";
pub static STUDENT_COLLECTION_NAME: &str = "students";

/// Mentor account. Credentials are handled by the auth service; this layer
/// only reads identity and maintains the `created_courses` back-references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mentor {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub created_courses: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub joined_courses: Vec<Uuid>,
}

/// Projection returned by the enrolled-students listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentBrief {
    #[serde(rename = "_id")]
    #[schema(value_type = String)]
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

pub mod filter {
    use super::*;

    #[inline]
    pub fn by_id(id: Uuid) -> Document {
        doc! { "_id": id }
    }

    #[inline]
    pub fn by_ids(ids: &[Uuid]) -> Document {
        doc! { "_id": { "$in": ids.to_vec() } }
    }
}
