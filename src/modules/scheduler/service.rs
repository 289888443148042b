use tracing::instrument;

use tutorlink_core::{ApiError, PageQuery, Paginated};
use tutorlink_models::scheduler::{
    AvailabilitySlot, CancelClassDto, ClassFilterParams, ClassSession, CreateClassDto,
    RescheduleClassDto,
};
use tutorlink_models::{ClassId, TeacherId};

use crate::api::ApiClient;
use crate::audit_event;
use crate::validator::validated;

pub const CLASSES_PATH: &str = "/scheduler/classes/";

pub struct SchedulerService;

impl SchedulerService {
    #[instrument(skip(api))]
    pub async fn list_classes(
        api: &ApiClient,
        filters: &ClassFilterParams,
        page: PageQuery,
    ) -> Result<Paginated<ClassSession>, ApiError> {
        api.get_page(CLASSES_PATH, filters, page).await
    }

    #[instrument(skip(api, dto), fields(teacher.id = %dto.teacher_id))]
    pub async fn create_class(api: &ApiClient, dto: CreateClassDto) -> Result<ClassSession, ApiError> {
        dto.validate_all()?;
        let class: ClassSession = api.post(CLASSES_PATH, &dto).await?;
        audit_event!("create", "class", class.id = %class.id);
        Ok(class)
    }

    #[instrument(skip(api, dto))]
    pub async fn reschedule_class(
        api: &ApiClient,
        id: ClassId,
        dto: &RescheduleClassDto,
    ) -> Result<ClassSession, ApiError> {
        dto.validate_all()?;
        let class: ClassSession = api
            .post(&format!("{CLASSES_PATH}{id}/reschedule/"), dto)
            .await?;
        audit_event!("reschedule", "class", class.id = %id);
        Ok(class)
    }

    #[instrument(skip(api, dto))]
    pub async fn cancel_class(
        api: &ApiClient,
        id: ClassId,
        dto: &CancelClassDto,
    ) -> Result<ClassSession, ApiError> {
        validated(dto)?;
        let class: ClassSession = api
            .post(&format!("{CLASSES_PATH}{id}/cancel/"), dto)
            .await?;
        audit_event!("cancel", "class", class.id = %id);
        Ok(class)
    }

    #[instrument(skip(api))]
    pub async fn teacher_availability(
        api: &ApiClient,
        teacher_id: TeacherId,
    ) -> Result<Vec<AvailabilitySlot>, ApiError> {
        api.get(&format!("/scheduler/teachers/{teacher_id}/availability/"))
            .await
    }
}
