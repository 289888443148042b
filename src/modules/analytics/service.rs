use serde::Serialize;
use tracing::instrument;

use tutorlink_core::ApiError;
use tutorlink_models::StudentId;
use tutorlink_models::analytics::{AnalyticsPeriod, DashboardSummary, StudentProgress};

use crate::api::ApiClient;

pub const DASHBOARD_PATH: &str = "/analytics/dashboard/";

#[derive(Serialize)]
struct PeriodQuery {
    period: AnalyticsPeriod,
}

pub struct AnalyticsService;

impl AnalyticsService {
    #[instrument(skip(api))]
    pub async fn dashboard_summary(
        api: &ApiClient,
        period: AnalyticsPeriod,
    ) -> Result<DashboardSummary, ApiError> {
        api.get_query(DASHBOARD_PATH, &PeriodQuery { period }).await
    }

    #[instrument(skip(api))]
    pub async fn student_progress(
        api: &ApiClient,
        student_id: StudentId,
        period: AnalyticsPeriod,
    ) -> Result<StudentProgress, ApiError> {
        api.get_query(
            &format!("/analytics/students/{student_id}/progress/"),
            &PeriodQuery { period },
        )
        .await
    }
}
