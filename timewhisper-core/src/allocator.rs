//! Project allocator: spread a project's hours evenly over the days left before its deadline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::request::ProjectRequest;

/// Result of one allocation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectPlan {
    pub project_name: String,
    pub deadline: NaiveDate,
    pub total_hours: u32,
    /// Deadline day counts as a working day, so a deadline of today gives 1.
    pub days_remaining: i64,
    pub hours_per_day: f64,
    pub summary_text: String,
}

/// Allocate `request.total_hours` across the days from `today` through the deadline.
///
/// When the window is empty (deadline already passed) the full amount is
/// reported per day instead of dividing by a non-positive count.
pub fn allocate(request: &ProjectRequest, today: NaiveDate) -> ProjectPlan {
    let days_remaining = (request.deadline - today).num_days() + 1;

    let divided = days_remaining > 0;
    let hours_per_day = if divided {
        round_2dp(f64::from(request.total_hours) / days_remaining as f64)
    } else {
        f64::from(request.total_hours)
    };

    let summary_text = format!(
        "Project: {}\nDeadline: {}\nDistribute ~{} hrs/day over {} days.",
        request.project_name,
        request.deadline.format("%Y-%m-%d"),
        hours_label(hours_per_day, divided),
        days_remaining
    );

    ProjectPlan {
        project_name: request.project_name.clone(),
        deadline: request.deadline,
        total_hours: request.total_hours,
        days_remaining,
        hours_per_day,
        summary_text,
    }
}

/// A divided share always shows a decimal (`1.0`, `3.33`); the undivided total
/// prints as the whole number it is (`10`).
fn hours_label(hours: f64, divided: bool) -> String {
    if divided && hours.fract() == 0.0 {
        format!("{hours:.1}")
    } else {
        format!("{hours}")
    }
}

/// Round half away from zero to two decimals (half-up for the positive values used here).
fn round_2dp(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
