//! Prompt formatter: turns a schedule request into the coaching instruction text.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::request::ScheduleRequest;

/// Instruction text sent to the completion model. `{name}` markers are filled
/// from the request in a single pass.
pub const SCHEDULE_TEMPLATE: &str = "\
You are TimeWhisper, an expert productivity coach and focus mentor.

User has shared daily goals, optional recurring tasks, and natural language routines. \
Build a time-blocked daily schedule that balances deep work, breaks, and realism.

Format:
- 7:00 AM – Morning routine
- 8:00 AM – Task 1

Rules:
- Fit work within {duration_pref} hours.
- Honor user's energy peaks: {energy}
- Follow break preference: {rest}
- Prioritize recurring tasks: {recurring_tasks}
- Convert natural language routines into structured time blocks.
- Detect and reduce low-focus tasks like gaming, doomscrolling, etc.
- Adjust flow based on selected productivity mode: {mode}

After the schedule, give:
1. Why this flow is optimal
2. Advice to improve time use
3. A Focus Score out of 10
4. Micro-coaching tips to maintain discipline

Daily Goals: {tasks}
";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"));

/// Build the prompt for a validated request.
///
/// Substituted values are never rescanned, so braces inside user text come
/// through verbatim.
pub fn format_prompt(request: &ScheduleRequest) -> String {
    fill(SCHEDULE_TEMPLATE, request)
}

fn fill(template: &str, request: &ScheduleRequest) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "tasks" => request.tasks.clone(),
            "recurring_tasks" => request.recurring_or_none().to_string(),
            "duration_pref" => request.duration_pref.to_string(),
            "energy" => request.energy.to_string(),
            "rest" => request.rest.to_string(),
            "mode" => request.mode.to_string(),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

/// Placeholder names in `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .map(|c| c[1].to_string())
        .collect()
}
