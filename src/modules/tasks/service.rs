use serde_json::json;
use tracing::instrument;

use tutorlink_core::{ApiError, PageQuery, Paginated};
use tutorlink_models::TaskId;
use tutorlink_models::tasks::{CreateTaskDto, Task, TaskFilterParams, UpdateTaskDto};

use crate::api::ApiClient;
use crate::validator::validated;

pub const TASKS_PATH: &str = "/tasks/";

fn task_path(id: TaskId) -> String {
    format!("{TASKS_PATH}{id}/")
}

pub struct TaskService;

impl TaskService {
    #[instrument(skip(api))]
    pub async fn list(
        api: &ApiClient,
        filters: &TaskFilterParams,
        page: PageQuery,
    ) -> Result<Paginated<Task>, ApiError> {
        api.get_page(TASKS_PATH, filters, page).await
    }

    #[instrument(skip(api, dto))]
    pub async fn create(api: &ApiClient, dto: CreateTaskDto) -> Result<Task, ApiError> {
        validated(&dto)?;
        api.post(TASKS_PATH, &dto).await
    }

    #[instrument(skip(api, dto))]
    pub async fn update(api: &ApiClient, id: TaskId, dto: &UpdateTaskDto) -> Result<Task, ApiError> {
        validated(dto)?;
        api.patch(&task_path(id), dto).await
    }

    #[instrument(skip(api))]
    pub async fn complete(api: &ApiClient, id: TaskId) -> Result<Task, ApiError> {
        api.post(&format!("{TASKS_PATH}{id}/complete/"), &json!({})).await
    }

    #[instrument(skip(api))]
    pub async fn delete(api: &ApiClient, id: TaskId) -> Result<(), ApiError> {
        api.delete(&task_path(id)).await
    }
}
