//! Course directory: creation, joining, listing, enrolled-student listing.

use bson::Uuid;
use mongodb::Database;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::data::course::db::{problem as course_problem, CourseDbExt, CourseSummary};
use crate::data::course::Course;
use crate::data::user::db::{problem as user_problem, UserDbExt};
use crate::data::user::StudentBrief;
use crate::policy;
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::Problem;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseCreateData {
    pub title: String,
    pub description: String,
    pub color: String,
    pub color_name: String,
}

impl CourseCreateData {
    fn validate(&self) -> Result<(), Problem> {
        if self.title.is_empty()
            || self.description.is_empty()
            || self.color.is_empty()
            || self.color_name.is_empty()
        {
            return Err(course_problem::missing_fields());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JoinResponse {
    pub msg: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentsResponse {
    pub students: Vec<StudentBrief>,
}

/// Create a course. Mentor accounts only; the mentor's display name is
/// denormalized onto the course at creation time.
#[utoipa::path(
    request_body = CourseCreateData,
    responses(
        (status = 201, description = "Created course", body = Course),
        (status = 400, description = "Missing required fields", body = Problem),
        (status = 403, description = "Caller is not a mentor", body = Problem),
        (status = 404, description = "Mentor record missing", body = Problem),
    ),
    security(("jwt" = []))
)]
#[post("/courses/create", format = "application/json", data = "<create>")]
#[tracing::instrument(skip(db))]
pub async fn course_create(
    create: Json<CourseCreateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<(Status, Json<Course>), Problem> {
    if !auth.role.is_mentor() {
        return Err(course_problem::access_denied(
            "Only mentors can create courses.",
        ));
    }

    let create = create.into_inner();
    create.validate()?;

    let actor = auth.actor();
    let mentor = db
        .get_mentor(actor.id)
        .await?
        .ok_or_else(user_problem::mentor_not_found)?;

    let course = Course {
        id: Uuid::new(),
        title: create.title,
        description: create.description,
        created_by: actor.id,
        mentor_name: mentor.name,
        color: create.color,
        color_name: create.color_name,
        students_enrolled: vec![],
        syllabus: vec![],
        notes: vec![],
        assignments: vec![],
    };

    db.insert_course(&course).await?;
    // Back-reference write is a second, non-atomic step.
    db.push_created_course(actor.id, course.id).await?;

    Ok((Status::Created, Json(course)))
}

/// Join a course as a student. Joining twice is a no-op, not an error.
#[utoipa::path(
    responses(
        (status = 200, description = "Joined (or already enrolled)", body = JoinResponse),
        (status = 403, description = "Caller is not a student", body = Problem),
        (status = 404, description = "Course doesn't exist", body = Problem),
    ),
    security(("jwt" = []))
)]
#[post("/courses/join/<id>")]
#[tracing::instrument(skip(db))]
pub async fn course_join(
    id: uuid::Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<JoinResponse>, Problem> {
    if !auth.role.is_student() {
        return Err(course_problem::access_denied(
            "Only students can join courses.",
        ));
    }

    let actor = auth.actor();
    let mut course = db
        .get_course(Uuid::from_uuid_1(id))
        .await?
        .ok_or_else(course_problem::course_not_found)?;

    if course.enroll(actor.id) {
        db.save_course(&course).await?;
        db.push_joined_course(actor.id, course.id).await?;
    }

    Ok(Json(JoinResponse {
        msg: "Joined course successfully",
    }))
}

/// List every course with the directory projection. Open endpoint.
#[utoipa::path(
    responses(
        (status = 200, description = "All courses", body = Vec<CourseSummary>),
    )
)]
#[get("/courses")]
#[tracing::instrument(skip(db))]
pub async fn course_list(db: &State<Database>) -> Result<Json<Vec<CourseSummary>>, Problem> {
    Ok(Json(db.list_courses().await?))
}

/// List enrolled students with name and email. Owning mentor only.
#[utoipa::path(
    responses(
        (status = 200, description = "Enrolled students", body = StudentsResponse),
        (status = 403, description = "Caller doesn't own the course", body = Problem),
        (status = 404, description = "Course doesn't exist", body = Problem),
    ),
    security(("jwt" = []))
)]
#[get("/courses/<id>/students")]
#[tracing::instrument(skip(db))]
pub async fn course_students(
    id: uuid::Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<StudentsResponse>, Problem> {
    if !auth.role.is_mentor() {
        return Err(course_problem::access_denied(
            "Only mentors can view enrolled students.",
        ));
    }

    let course = db
        .get_course(Uuid::from_uuid_1(id))
        .await?
        .ok_or_else(course_problem::course_not_found)?;

    if !policy::is_mentor_owner(auth.actor(), &course) {
        return Err(course_problem::access_denied(
            "You are not authorized to view this course's students.",
        ));
    }

    let students = db.students_brief(&course.students_enrolled).await?;
    Ok(Json(StudentsResponse { students }))
}
