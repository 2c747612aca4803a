//! Interactive session: one process run, one in-memory history.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use std::io::{BufRead, Write};

use timewhisper_core::{
    render_latest_schedule, render_projects, render_session, start_fresh, submit_project,
    submit_schedule, today_in, CompletionClient, ProjectPlan, ProjectRequest, RenderFormat,
    ScheduleRequest, SessionHistory, SubmitError,
};

use crate::form::Prompter;

const HELP: &str = "Commands:\n\
- plan     build today's schedule\n\
- project  spread a project's hours until its deadline\n\
- show     show the latest schedule and all project plans\n\
- reset    start fresh (clears this session)\n\
- help\n\
- quit";

pub struct SessionOptions {
    pub format: RenderFormat,
    pub tz: Tz,
    /// Completion text is already echoed while it streams.
    pub streamed: bool,
}

impl SessionOptions {
    fn today(&self) -> NaiveDate {
        today_in(self.tz, Utc::now())
    }
}

/// Submit one schedule and report the outcome; `true` when it was recorded.
pub async fn plan_once<C, W>(
    history: &mut SessionHistory,
    client: &C,
    request: &ScheduleRequest,
    opts: &SessionOptions,
    out: &mut W,
) -> Result<bool>
where
    C: CompletionClient + ?Sized,
    W: Write,
{
    if opts.streamed {
        writeln!(out, "\nWhispering with time...\n")?;
    }
    match submit_schedule(history, client, request).await {
        Ok(_) => {
            if opts.streamed && opts.format == RenderFormat::Text {
                writeln!(out)?;
            } else {
                write!(out, "\n{}", render_latest_schedule(history, opts.format))?;
            }
            Ok(true)
        }
        Err(SubmitError::Validation(e)) => {
            writeln!(out, "Warning: {e}")?;
            Ok(false)
        }
        Err(SubmitError::Completion(e)) => {
            writeln!(out, "Failed to generate schedule: {e}")?;
            Ok(false)
        }
    }
}

pub fn project_once<W: Write>(
    history: &mut SessionHistory,
    request: &ProjectRequest,
    today: NaiveDate,
    format: RenderFormat,
    out: &mut W,
) -> Result<Option<ProjectPlan>> {
    match submit_project(history, request, today) {
        Ok(plan) => {
            write!(out, "\n{}", render_projects(history, format))?;
            Ok(Some(plan))
        }
        Err(e) => {
            writeln!(out, "Warning: {e}")?;
            Ok(None)
        }
    }
}

/// Read commands until `quit` or end of input.
pub async fn run_session<C, R, W>(
    client: &C,
    prompter: &mut Prompter<R, W>,
    opts: &SessionOptions,
) -> Result<SessionHistory>
where
    C: CompletionClient + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut history = SessionHistory::new();
    writeln!(
        prompter.output(),
        "TimeWhisper\nConvert your goals into a peaceful, focused daily schedule.\n\n{HELP}"
    )?;

    loop {
        writeln!(prompter.output())?;
        let Some(cmd) = prompter.line("timewhisper")? else {
            break;
        };
        match cmd.to_lowercase().as_str() {
            "" => {}
            "plan" | "p" => {
                let request = prompter.schedule_form()?;
                plan_once(&mut history, client, &request, opts, prompter.output()).await?;
            }
            "project" | "j" => {
                let today = opts.today();
                let request = prompter.project_form(today)?;
                project_once(&mut history, &request, today, opts.format, prompter.output())?;
            }
            "show" | "s" => {
                let page = render_session(&history, opts.format);
                if page.is_empty() {
                    writeln!(prompter.output(), "Nothing yet. Try: plan or project")?;
                } else {
                    write!(prompter.output(), "{page}")?;
                }
            }
            "reset" | "r" => {
                start_fresh(&mut history);
                writeln!(prompter.output(), "Started fresh.")?;
            }
            "help" | "?" => writeln!(prompter.output(), "{HELP}")?,
            "quit" | "q" | "exit" => break,
            other => writeln!(prompter.output(), "Unknown command '{other}'. Try: help")?,
        }
    }

    Ok(history)
}
