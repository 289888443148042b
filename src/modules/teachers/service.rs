use tracing::instrument;

use tutorlink_core::{ApiError, PageQuery, Paginated};
use tutorlink_models::TeacherId;
use tutorlink_models::teachers::{Teacher, TeacherFilterParams, UpdateTeacherProfileDto};

use crate::api::ApiClient;
use crate::audit_event;
use crate::validator::validated;

pub const TEACHERS_PATH: &str = "/teachers/";
pub const MY_PROFILE_PATH: &str = "/teachers/me/";

pub struct TeacherService;

impl TeacherService {
    #[instrument(skip(api))]
    pub async fn list(
        api: &ApiClient,
        filters: &TeacherFilterParams,
        page: PageQuery,
    ) -> Result<Paginated<Teacher>, ApiError> {
        api.get_page(TEACHERS_PATH, filters, page).await
    }

    #[instrument(skip(api))]
    pub async fn get(api: &ApiClient, id: TeacherId) -> Result<Teacher, ApiError> {
        api.get(&format!("{TEACHERS_PATH}{id}/")).await
    }

    /// Profile of the signed-in teacher.
    #[instrument(skip(api))]
    pub async fn my_profile(api: &ApiClient) -> Result<Teacher, ApiError> {
        api.get(MY_PROFILE_PATH).await
    }

    /// Partially updates the signed-in teacher's profile; absent fields are
    /// left untouched.
    #[instrument(skip(api, dto))]
    pub async fn update_profile(
        api: &ApiClient,
        dto: &UpdateTeacherProfileDto,
    ) -> Result<Teacher, ApiError> {
        validated(dto)?;
        let teacher: Teacher = api.patch(MY_PROFILE_PATH, dto).await?;
        audit_event!("update_profile", "teacher", teacher.id = %teacher.id);
        Ok(teacher)
    }
}
