use tutorlink_models::teachers::{Teacher, TeacherFilterParams};

use super::service::TeacherService;
use crate::api::ApiClient;
use crate::utils::list_state::ListState;

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Default)]
pub struct TeachersState {
    list: ListState<Teacher, TeacherFilterParams>,
}

impl TeachersState {
    pub fn new(page_size: u32) -> Self {
        Self {
            list: ListState::new(page_size),
        }
    }

    pub fn list(&self) -> &ListState<Teacher, TeacherFilterParams> {
        &self.list
    }

    pub fn teachers(&self) -> &[Teacher] {
        self.list.items()
    }

    pub fn error(&self) -> Option<&str> {
        self.list.error()
    }

    pub async fn search(&mut self, api: &ApiClient, term: &str) -> bool {
        let mut filters = self.list.filters().clone();
        filters.search = non_blank(term);
        self.list.set_filters(filters);
        self.refresh(api).await
    }

    /// Restricts the directory to one subject; `None` shows everyone.
    pub async fn filter_subject(&mut self, api: &ApiClient, subject: Option<&str>) -> bool {
        let mut filters = self.list.filters().clone();
        filters.subject = subject.and_then(non_blank);
        self.list.set_filters(filters);
        self.refresh(api).await
    }

    pub async fn refresh(&mut self, api: &ApiClient) -> bool {
        self.list
            .refresh(|filters, page| async move { TeacherService::list(api, &filters, page).await })
            .await
    }

    pub async fn load_more(&mut self, api: &ApiClient) -> bool {
        self.list
            .load_more(|filters, page| async move { TeacherService::list(api, &filters, page).await })
            .await
    }
}
