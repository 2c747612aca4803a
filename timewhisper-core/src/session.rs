//! Per-session history of generated schedules and project plans.
//!
//! Owned by exactly one session and passed by `&mut` into the handlers; it is
//! never shared across sessions.

use crate::allocator::ProjectPlan;

/// Append-only record of one session. Only [`SessionHistory::reset`] removes entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionHistory {
    schedules: Vec<String>,
    projects: Vec<ProjectPlan>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_schedule(&mut self, schedule: impl Into<String>) {
        self.schedules.push(schedule.into());
    }

    pub fn append_project(&mut self, plan: ProjectPlan) {
        self.projects.push(plan);
    }

    /// Most recently appended schedule, if any.
    pub fn latest_schedule(&self) -> Option<&str> {
        self.schedules.last().map(String::as_str)
    }

    /// Every schedule in insertion order.
    pub fn schedules(&self) -> &[String] {
        &self.schedules
    }

    /// Every project plan in insertion order.
    pub fn all_projects(&self) -> &[ProjectPlan] {
        &self.projects
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty() && self.projects.is_empty()
    }

    /// Clear both sequences.
    pub fn reset(&mut self) {
        self.schedules.clear();
        self.projects.clear();
    }
}
