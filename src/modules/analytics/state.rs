use tracing::warn;

use tutorlink_models::StudentId;
use tutorlink_models::analytics::{AnalyticsPeriod, DashboardSummary, StudentProgress};

use super::service::AnalyticsService;
use crate::api::ApiClient;

/// Analytics screen: the summary for the selected period and, optionally,
/// one student's progress over the same period.
#[derive(Debug, Default)]
pub struct AnalyticsState {
    period: AnalyticsPeriod,
    summary: Option<DashboardSummary>,
    progress: Option<StudentProgress>,
    loading: bool,
    error: Option<String>,
}

impl AnalyticsState {
    pub fn period(&self) -> AnalyticsPeriod {
        self.period
    }

    pub fn summary(&self) -> Option<&DashboardSummary> {
        self.summary.as_ref()
    }

    pub fn progress(&self) -> Option<&StudentProgress> {
        self.progress.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Switches the period and reloads everything shown for it.
    pub async fn set_period(&mut self, api: &ApiClient, period: AnalyticsPeriod) -> bool {
        if period == self.period && self.summary.is_some() {
            return true;
        }
        self.period = period;
        let mut ok = self.refresh(api).await;
        if let Some(student_id) = self.progress.as_ref().map(|p| p.student_id) {
            ok &= self.load_student(api, student_id).await;
        }
        ok
    }

    pub async fn refresh(&mut self, api: &ApiClient) -> bool {
        self.loading = true;
        let result = AnalyticsService::dashboard_summary(api, self.period).await;
        self.loading = false;
        match result {
            Ok(summary) => {
                self.summary = Some(summary);
                self.error = None;
                true
            }
            Err(e) => {
                warn!(period = %self.period, error = %e, "Analytics summary failed");
                self.error = Some(e.user_message());
                false
            }
        }
    }

    pub async fn load_student(&mut self, api: &ApiClient, student_id: StudentId) -> bool {
        self.loading = true;
        let result = AnalyticsService::student_progress(api, student_id, self.period).await;
        self.loading = false;
        match result {
            Ok(progress) => {
                self.progress = Some(progress);
                self.error = None;
                true
            }
            Err(e) => {
                warn!(student.id = %student_id, error = %e, "Student progress failed");
                self.error = Some(e.user_message());
                false
            }
        }
    }

    pub fn clear_student(&mut self) {
        self.progress = None;
    }
}
