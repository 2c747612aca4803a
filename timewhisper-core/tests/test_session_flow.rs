use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::sync::Mutex;
use timewhisper_core::{
    render_session, start_fresh, submit_project, submit_schedule, BreakCadence, CompletionClient,
    CompletionError, EnergyPeak, ProductivityMode, ProjectRequest, RenderFormat, ScheduleRequest,
    SessionHistory, SubmitError, ValidationError,
};

/// Echoes back a numbered schedule, or fails when told to.
struct ScriptedModel {
    fail_next: Mutex<bool>,
    calls: Mutex<usize>,
}

impl ScriptedModel {
    fn new() -> Self {
        Self {
            fail_next: Mutex::new(false),
            calls: Mutex::new(0),
        }
    }

    fn fail_once(&self) {
        *self.fail_next.lock().unwrap() = true;
    }
}

#[async_trait]
impl CompletionClient for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        let mut fail = self.fail_next.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(CompletionError::Api {
                status: 500,
                message: "upstream exploded".to_string(),
            });
        }
        let goals = prompt
            .lines()
            .find_map(|l| l.strip_prefix("Daily Goals: "))
            .unwrap_or("?");
        Ok(format!("Schedule #{}\n9:00 AM – {}\nFocus Score: 8/10", *calls, goals))
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn request(tasks: &str) -> ScheduleRequest {
    ScheduleRequest::new(tasks)
        .with_duration(10)
        .with_energy(EnergyPeak::Evening)
        .with_mode(ProductivityMode::Pomodoro)
        .with_rest(BreakCadence::OnlyLunchBreak)
}

/// A whole session: two schedules, one failure, two projects, a warning, then reset.
#[tokio::test]
async fn test_full_session_flow() {
    let model = ScriptedModel::new();
    let mut history = SessionHistory::new();

    submit_schedule(&mut history, &model, &request("Draft essay"))
        .await
        .unwrap();
    let second = submit_schedule(&mut history, &model, &request("Ship release"))
        .await
        .unwrap();
    assert!(second.contains("Ship release"));
    assert_eq!(history.latest_schedule(), Some(second.as_str()));

    // Failed completion: no new entry, latest unchanged, session still usable.
    model.fail_once();
    let err = submit_schedule(&mut history, &model, &request("Never recorded"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Completion(CompletionError::Api { status: 500, .. })));
    assert_eq!(history.schedules().len(), 2);
    assert_eq!(history.latest_schedule(), Some(second.as_str()));

    // Blank tasks: warning only.
    let err = submit_schedule(&mut history, &model, &request(" \t"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Validation(ValidationError::EmptyTasks)));
    assert_eq!(history.schedules().len(), 2);

    submit_project(
        &mut history,
        &ProjectRequest::new("Report", 7, today() + Duration::days(6)),
        today(),
    )
    .unwrap();
    submit_project(
        &mut history,
        &ProjectRequest::new("Overdue", 10, today() - Duration::days(1)),
        today(),
    )
    .unwrap();

    let page = render_session(&history, RenderFormat::Html);
    assert!(page.contains("Ship release"));
    assert!(!page.contains("Draft essay"));
    assert!(page.contains("Distribute ~1.0 hrs/day over 7 days."));
    assert!(page.contains("Distribute ~10 hrs/day over 0 days."));
    assert!(page.find("Project: Report").unwrap() < page.find("Project: Overdue").unwrap());

    start_fresh(&mut history);
    assert!(history.schedules().is_empty());
    assert!(history.all_projects().is_empty());
    assert_eq!(render_session(&history, RenderFormat::Text), "");

    // Usable again after reset.
    submit_schedule(&mut history, &model, &request("Fresh start"))
        .await
        .unwrap();
    assert!(history.latest_schedule().unwrap().contains("Fresh start"));
}

/// Project submissions without a name are warnings, and leave earlier plans alone.
#[test]
fn test_project_warning_keeps_history() {
    let mut history = SessionHistory::new();
    submit_project(&mut history, &ProjectRequest::new("Kept", 3, today()), today()).unwrap();

    let err = submit_project(&mut history, &ProjectRequest::new("", 3, today()), today()).unwrap_err();
    assert_eq!(err, ValidationError::EmptyProjectName);
    assert_eq!(history.all_projects().len(), 1);
    assert_eq!(history.all_projects()[0].project_name, "Kept");
}
