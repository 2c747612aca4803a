//! Request handlers for the two form paths and the reset action.
//!
//! Each handler receives the session's history by `&mut`. The schedule handler
//! keeps that borrow across the completion await, so nothing else can append
//! while a request is in flight.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::allocator::{allocate, ProjectPlan};
use crate::completion::CompletionClient;
use crate::error::{CompletionError, SubmitError, ValidationError};
use crate::prompt::format_prompt;
use crate::request::{ProjectRequest, ScheduleRequest};
use crate::session::SessionHistory;

/// Validate, build the prompt, ask the model, then record the answer.
///
/// Returns the schedule that is now the session's latest. On any error the
/// history is left exactly as it was.
pub async fn submit_schedule<C>(
    history: &mut SessionHistory,
    client: &C,
    request: &ScheduleRequest,
) -> Result<String, SubmitError>
where
    C: CompletionClient + ?Sized,
{
    if let Err(e) = request.validate() {
        warn!(error = %e, "submit_schedule: rejected");
        return Err(e.into());
    }

    let prompt = format_prompt(request);
    debug!(prompt_len = prompt.len(), "submit_schedule: prompt formatted");

    let response = client.complete(&prompt).await.inspect_err(|e| {
        warn!(error = %e, "submit_schedule: completion failed");
    })?;

    let response = response.trim();
    if response.is_empty() {
        warn!("submit_schedule: completion was empty");
        return Err(CompletionError::InvalidResponse("empty completion".to_string()).into());
    }

    history.append_schedule(response);
    info!(
        schedules = history.schedules().len(),
        "submit_schedule: schedule recorded"
    );
    Ok(response.to_string())
}

/// Validate and allocate a project, then record the plan.
pub fn submit_project(
    history: &mut SessionHistory,
    request: &ProjectRequest,
    today: NaiveDate,
) -> Result<ProjectPlan, ValidationError> {
    if let Err(e) = request.validate() {
        warn!(error = %e, "submit_project: rejected");
        return Err(e);
    }

    let plan = allocate(request, today);
    debug!(
        project = %plan.project_name,
        days_remaining = plan.days_remaining,
        hours_per_day = plan.hours_per_day,
        "submit_project: allocated"
    );

    history.append_project(plan.clone());
    Ok(plan)
}

/// "Start fresh": drop every schedule and project plan of this session.
pub fn start_fresh(history: &mut SessionHistory) {
    info!(
        schedules = history.schedules().len(),
        projects = history.all_projects().len(),
        "start_fresh: clearing session history"
    );
    history.reset();
}
