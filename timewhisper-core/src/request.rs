//! Form submissions: the daily schedule request and the project allocation request.

use chrono::NaiveDate;
use std::ops::RangeInclusive;

use crate::error::ValidationError;
use crate::preferences::{BreakCadence, EnergyPeak, ProductivityMode};

/// Hours of work the user may ask the day to hold.
pub const DURATION_HOURS: RangeInclusive<u32> = 2..=14;
pub const DEFAULT_DURATION_HOURS: u32 = 8;

/// Total effort a single project may declare.
pub const PROJECT_HOURS: RangeInclusive<u32> = 1..=40;
pub const DEFAULT_PROJECT_HOURS: u32 = 7;

/// Substituted when the user leaves recurring tasks blank.
pub const NO_RECURRING_TASKS: &str = "None";

/// One submission of the daily-plan form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    /// Free-text goals for today. Must be non-blank.
    pub tasks: String,
    /// Optional free text; blank means "None".
    pub recurring_tasks: String,
    pub duration_pref: u32,
    pub energy: EnergyPeak,
    pub mode: ProductivityMode,
    pub rest: BreakCadence,
}

impl ScheduleRequest {
    pub fn new(tasks: impl Into<String>) -> Self {
        Self {
            tasks: tasks.into(),
            recurring_tasks: String::new(),
            duration_pref: DEFAULT_DURATION_HOURS,
            energy: EnergyPeak::default(),
            mode: ProductivityMode::default(),
            rest: BreakCadence::default(),
        }
    }

    pub fn with_recurring(mut self, recurring: impl Into<String>) -> Self {
        self.recurring_tasks = recurring.into();
        self
    }

    pub fn with_duration(mut self, hours: u32) -> Self {
        self.duration_pref = hours;
        self
    }

    pub fn with_energy(mut self, energy: EnergyPeak) -> Self {
        self.energy = energy;
        self
    }

    pub fn with_mode(mut self, mode: ProductivityMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_rest(mut self, rest: BreakCadence) -> Self {
        self.rest = rest;
        self
    }

    /// Recurring tasks as they go into the prompt.
    pub fn recurring_or_none(&self) -> &str {
        if self.recurring_tasks.trim().is_empty() {
            NO_RECURRING_TASKS
        } else {
            &self.recurring_tasks
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tasks.trim().is_empty() {
            return Err(ValidationError::EmptyTasks);
        }
        if !DURATION_HOURS.contains(&self.duration_pref) {
            return Err(ValidationError::DurationOutOfRange {
                got: self.duration_pref,
                min: *DURATION_HOURS.start(),
                max: *DURATION_HOURS.end(),
            });
        }
        Ok(())
    }
}

/// One submission of the project-allocator form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRequest {
    /// Any non-empty text, whitespace included.
    pub project_name: String,
    pub total_hours: u32,
    pub deadline: NaiveDate,
}

impl ProjectRequest {
    pub fn new(project_name: impl Into<String>, total_hours: u32, deadline: NaiveDate) -> Self {
        Self {
            project_name: project_name.into(),
            total_hours,
            deadline,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.project_name.is_empty() {
            return Err(ValidationError::EmptyProjectName);
        }
        if !PROJECT_HOURS.contains(&self.total_hours) {
            return Err(ValidationError::HoursOutOfRange {
                got: self.total_hours,
                min: *PROJECT_HOURS.start(),
                max: *PROJECT_HOURS.end(),
            });
        }
        Ok(())
    }
}
