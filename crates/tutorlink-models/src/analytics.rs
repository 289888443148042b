//! Dashboard analytics models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tutorlink_core::serde::deserialize_decimal_string;

use crate::ids::StudentId;

/// Reporting window for analytics queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsPeriod {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl AnalyticsPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for AnalyticsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub period: AnalyticsPeriod,
    #[serde(default)]
    pub total_students: u64,
    #[serde(default)]
    pub active_teachers: u64,
    #[serde(default)]
    pub classes_completed: u64,
    #[serde(default)]
    pub classes_upcoming: u64,
    #[serde(deserialize_with = "deserialize_decimal_string")]
    pub revenue: String,
    /// Percentage in [0, 100]
    #[serde(default)]
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressPoint {
    pub date: NaiveDate,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProgress {
    pub student_id: StudentId,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub average_score: Option<f64>,
    #[serde(default)]
    pub classes_attended: u64,
    #[serde(default)]
    pub points: Vec<ProgressPoint>,
}

impl StudentProgress {
    /// Score change from first to last recorded point.
    pub fn trend(&self) -> Option<f64> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        Some(last.score - first.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AnalyticsPeriod::Quarter).unwrap(),
            r#""quarter""#
        );
        assert_eq!(AnalyticsPeriod::default(), AnalyticsPeriod::Month);
    }

    #[test]
    fn test_progress_trend() {
        let json = r#"{"student_id":3,"points":[
            {"date":"2024-01-01","score":60.0},
            {"date":"2024-02-01","score":72.5}
        ]}"#;
        let progress: StudentProgress = serde_json::from_str(json).unwrap();
        assert_eq!(progress.trend(), Some(12.5));

        let empty = StudentProgress {
            points: vec![],
            ..progress
        };
        assert_eq!(empty.trend(), None);
    }
}
