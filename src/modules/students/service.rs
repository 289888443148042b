use tracing::instrument;

use tutorlink_core::{ApiError, PageQuery, Paginated};
use tutorlink_models::students::{
    AssignTeacherDto, Student, StudentFilterParams, UpdateStudentDto,
};
use tutorlink_models::{StudentId, TeacherId};

use crate::api::ApiClient;
use crate::audit_event;
use crate::validator::validated;

pub const STUDENTS_PATH: &str = "/students/";

pub struct StudentService;

impl StudentService {
    #[instrument(skip(api))]
    pub async fn list(
        api: &ApiClient,
        filters: &StudentFilterParams,
        page: PageQuery,
    ) -> Result<Paginated<Student>, ApiError> {
        api.get_page(STUDENTS_PATH, filters, page).await
    }

    #[instrument(skip(api))]
    pub async fn get(api: &ApiClient, id: StudentId) -> Result<Student, ApiError> {
        api.get(&format!("{STUDENTS_PATH}{id}/")).await
    }

    #[instrument(skip(api, dto))]
    pub async fn update(
        api: &ApiClient,
        id: StudentId,
        dto: &UpdateStudentDto,
    ) -> Result<Student, ApiError> {
        validated(dto)?;
        let student: Student = api.patch(&format!("{STUDENTS_PATH}{id}/"), dto).await?;
        audit_event!("update", "student", student.id = %id);
        Ok(student)
    }

    #[instrument(skip(api))]
    pub async fn assign_teacher(
        api: &ApiClient,
        id: StudentId,
        teacher_id: TeacherId,
    ) -> Result<Student, ApiError> {
        let student: Student = api
            .post(
                &format!("{STUDENTS_PATH}{id}/assign-teacher/"),
                &AssignTeacherDto { teacher_id },
            )
            .await?;
        audit_event!("assign_teacher", "student", student.id = %id, teacher.id = %teacher_id);
        Ok(student)
    }
}
