use std::collections::BTreeMap;

use rocket::fs::FileServer;
use rocket::{Build, Rocket, Route};

pub mod course_detail;
pub mod courses;

use course_detail::*;
use courses::*;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::Config,
    data::course::{
        db::{CourseDetailResponse, CourseSummary, FileEntryResponse},
        Course, FileEntry, FileKind, Section, UploaderRef,
    },
    data::user::StudentBrief,
    resp::{jwt::doc::JWTAuth, problem::Problem},
    role::Role,
};

#[get("/")]
pub fn health() -> &'static str {
    "API is running..."
}

#[derive(OpenApi)]
#[openapi(
    paths(
        course_create,
        course_join,
        course_list,
        course_students,
        course_get,
        course_file_upload,
        course_description_update,
        course_file_delete
    ),
    components(schemas(
        Role,
        Section,
        FileKind,
        UploaderRef,
        FileEntry,
        Course,
        CourseSummary,
        CourseDetailResponse,
        FileEntryResponse,
        StudentBrief,
        CourseCreateData,
        DescriptionUpdate,
        JoinResponse,
        StudentsResponse,
        Problem
    )),
    modifiers(&JWTAuth, &API_PREFIX)
)]
pub struct ApiDoc;

pub struct PathPrefix(pub &'static str);
static API_PREFIX: PathPrefix = PathPrefix("/api");

impl utoipa::Modify for PathPrefix {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut new_paths = BTreeMap::new();

        for (path, item) in std::mem::take(&mut openapi.paths.paths) {
            new_paths.insert(self.0.to_string() + path.as_ref(), item);
        }

        openapi.paths.paths = new_paths;
    }
}

pub fn api() -> Vec<Route> {
    routes![
        course_create,
        course_join,
        course_list,
        course_students,
        course_get,
        course_file_upload,
        course_description_update,
        course_file_delete
    ]
}

pub fn mount_api(rocket: Rocket<Build>, config: &Config) -> Rocket<Build> {
    rocket
        .mount("/api", api())
        .mount("/uploads", FileServer::from(&config.upload_dir))
        .mount(
            "/",
            SwaggerUi::new("/swagger/<_..>").url("/api/openapi.json", ApiDoc::openapi()),
        )
        .mount("/", routes![health])
}
