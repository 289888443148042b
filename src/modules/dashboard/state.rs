//! Home dashboard.
//!
//! The analytics summary, the next classes and the unread badge are fetched
//! concurrently. Each section keeps its own error, so one failing endpoint
//! leaves the other two on screen.

use chrono::{DateTime, Duration, Utc};
use tracing::{instrument, warn};

use tutorlink_core::{ApiError, PageQuery};
use tutorlink_models::analytics::{AnalyticsPeriod, DashboardSummary};
use tutorlink_models::scheduler::{ClassFilterParams, ClassSession, ClassStatus};

use crate::api::ApiClient;
use crate::modules::analytics::AnalyticsService;
use crate::modules::notifications::NotificationService;
use crate::modules::scheduler::SchedulerService;

pub const UPCOMING_DAYS: i64 = 7;
pub const UPCOMING_LIMIT: usize = 5;
/// Page requested from the scheduler. The date filter is day-granular, so
/// classes that already started today come back too and are dropped here.
pub const UPCOMING_FETCH_SIZE: u32 = 50;

/// One independently loaded part of a screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<T> {
    data: Option<T>,
    error: Option<String>,
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
        }
    }
}

impl<T> Section<T> {
    /// Last successfully loaded value. Kept when a later load fails.
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn settle(&mut self, section: &'static str, result: Result<T, ApiError>) -> bool {
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
                true
            }
            Err(e) => {
                warn!(section, error = %e, "Dashboard section failed");
                self.error = Some(e.user_message());
                false
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct DashboardState {
    period: AnalyticsPeriod,
    summary: Section<DashboardSummary>,
    upcoming: Section<Vec<ClassSession>>,
    unread: Section<u64>,
    loading: bool,
}

impl DashboardState {
    pub fn with_period(period: AnalyticsPeriod) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }

    pub fn period(&self) -> AnalyticsPeriod {
        self.period
    }

    pub fn summary(&self) -> &Section<DashboardSummary> {
        &self.summary
    }

    pub fn upcoming(&self) -> &Section<Vec<ClassSession>> {
        &self.upcoming
    }

    pub fn unread(&self) -> &Section<u64> {
        &self.unread
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_errors(&self) -> bool {
        self.summary.error.is_some() || self.upcoming.error.is_some() || self.unread.error.is_some()
    }

    pub async fn refresh(&mut self, api: &ApiClient) -> bool {
        self.refresh_at(api, Utc::now()).await
    }

    /// Reloads all sections. Returns true only if every section loaded.
    #[instrument(skip(self, api))]
    pub async fn refresh_at(&mut self, api: &ApiClient, now: DateTime<Utc>) -> bool {
        self.loading = true;
        let (summary, upcoming, unread) = tokio::join!(
            AnalyticsService::dashboard_summary(api, self.period),
            upcoming_classes(api, now),
            NotificationService::unread_count(api),
        );
        self.loading = false;

        let summary_ok = self.summary.settle("summary", summary);
        let upcoming_ok = self.upcoming.settle("upcoming_classes", upcoming);
        let unread_ok = self.unread.settle("unread_count", unread);
        summary_ok && upcoming_ok && unread_ok
    }
}

/// Scheduled classes starting within the next week, soonest first, at most
/// [`UPCOMING_LIMIT`].
async fn upcoming_classes(
    api: &ApiClient,
    now: DateTime<Utc>,
) -> Result<Vec<ClassSession>, ApiError> {
    let filters = ClassFilterParams {
        start_date: Some(now.date_naive()),
        end_date: Some((now + Duration::days(UPCOMING_DAYS)).date_naive()),
        status: Some(ClassStatus::Scheduled),
        ..Default::default()
    };
    let page =
        SchedulerService::list_classes(api, &filters, PageQuery::first(UPCOMING_FETCH_SIZE))
            .await?;

    let mut classes: Vec<ClassSession> = page
        .results
        .into_iter()
        .filter(|class| class.is_upcoming_at(now))
        .collect();
    classes.sort_by_key(|class| class.start_time);
    classes.truncate(UPCOMING_LIMIT);
    Ok(classes)
}
