//! Rendering of session history for display, as terminal text or page markup.

use crate::session::SessionHistory;

pub const SCHEDULE_HEADING: &str = "Your Optimized Daily Schedule";
pub const PROJECTS_HEADING: &str = "Project Breakdown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderFormat {
    #[default]
    Text,
    Html,
}

/// Escape markup characters, then turn newlines into visible line breaks.
pub fn to_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\n' => out.push_str("<br>"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

fn boxed(text: &str, format: RenderFormat) -> String {
    match format {
        RenderFormat::Text => format!("{}\n", text.trim_end()),
        RenderFormat::Html => format!("<div class='box'>{}</div>\n", to_markup(text)),
    }
}

fn heading(title: &str, format: RenderFormat) -> String {
    match format {
        RenderFormat::Text => format!("## {title}\n\n"),
        RenderFormat::Html => format!("<h3>{}</h3>\n", to_markup(title)),
    }
}

/// Latest schedule under its heading, or nothing if no schedule exists yet.
pub fn render_latest_schedule(history: &SessionHistory, format: RenderFormat) -> String {
    match history.latest_schedule() {
        Some(schedule) => {
            let mut out = heading(SCHEDULE_HEADING, format);
            out.push_str(&boxed(schedule, format));
            out
        }
        None => String::new(),
    }
}

/// Every project plan in submission order, or nothing if there are none.
pub fn render_projects(history: &SessionHistory, format: RenderFormat) -> String {
    let plans = history.all_projects();
    if plans.is_empty() {
        return String::new();
    }

    let mut out = heading(PROJECTS_HEADING, format);
    for (i, plan) in plans.iter().enumerate() {
        if i > 0 && format == RenderFormat::Text {
            out.push('\n');
        }
        out.push_str(&boxed(&plan.summary_text, format));
    }
    out
}

/// Whole page: latest schedule first, then project plans.
pub fn render_session(history: &SessionHistory, format: RenderFormat) -> String {
    let schedule = render_latest_schedule(history, format);
    let projects = render_projects(history, format);
    match (schedule.is_empty(), projects.is_empty()) {
        (false, false) => format!("{schedule}\n{projects}"),
        (false, true) => schedule,
        _ => projects,
    }
}
