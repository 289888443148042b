use tutorlink_models::students::{Student, StudentFilterParams};
use tutorlink_models::{StudentId, TeacherId};

use super::service::StudentService;
use crate::api::ApiClient;
use crate::utils::list_state::ListState;

/// Student directory with search and teacher assignment.
#[derive(Default)]
pub struct StudentsState {
    list: ListState<Student, StudentFilterParams>,
}

impl StudentsState {
    pub fn new(page_size: u32) -> Self {
        Self {
            list: ListState::new(page_size),
        }
    }

    pub fn list(&self) -> &ListState<Student, StudentFilterParams> {
        &self.list
    }

    pub fn students(&self) -> &[Student] {
        self.list.items()
    }

    pub fn error(&self) -> Option<&str> {
        self.list.error()
    }

    /// Sets the search term (blank clears it) and reloads from page 1.
    pub async fn search(&mut self, api: &ApiClient, term: &str) -> bool {
        let term = term.trim();
        let mut filters = self.list.filters().clone();
        filters.search = (!term.is_empty()).then(|| term.to_string());
        self.list.set_filters(filters);
        self.refresh(api).await
    }

    pub async fn refresh(&mut self, api: &ApiClient) -> bool {
        self.list
            .refresh(|filters, page| async move { StudentService::list(api, &filters, page).await })
            .await
    }

    pub async fn load_more(&mut self, api: &ApiClient) -> bool {
        self.list
            .load_more(|filters, page| async move { StudentService::list(api, &filters, page).await })
            .await
    }

    /// Assigns a teacher and replaces the loaded row with the server's copy.
    pub async fn assign_teacher(
        &mut self,
        api: &ApiClient,
        id: StudentId,
        teacher_id: TeacherId,
    ) -> bool {
        match StudentService::assign_teacher(api, id, teacher_id).await {
            Ok(updated) => {
                self.list
                    .update_where(|s| s.id == id, |s| *s = updated.clone());
                true
            }
            Err(e) => {
                self.list.set_error(&e);
                false
            }
        }
    }
}
