//! Line-based form collector for the schedule and project forms.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use std::fmt::Display;
use std::io::{BufRead, Write};
use std::ops::RangeInclusive;
use std::str::FromStr;

use timewhisper_core::{
    parse_deadline, BreakCadence, EnergyPeak, ProductivityMode, ProjectRequest, ScheduleRequest,
    DEFAULT_DURATION_HOURS, DEFAULT_PROJECT_HOURS, DURATION_HOURS, PROJECT_HOURS,
};

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// One trimmed line, or `None` at end of input.
    pub fn line(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{}: ", label)?;
        self.output.flush().ok();
        let mut s = String::new();
        if self.input.read_line(&mut s)? == 0 {
            return Ok(None);
        }
        Ok(Some(s.trim().to_string()))
    }

    fn required_line(&mut self, label: &str) -> Result<String> {
        match self.line(label)? {
            Some(s) => Ok(s),
            None => bail!("input closed"),
        }
    }

    fn number(&mut self, label: &str, range: RangeInclusive<u32>, default: u32) -> Result<u32> {
        loop {
            let raw = self.required_line(&format!(
                "{} [{}-{}, default {}]",
                label,
                range.start(),
                range.end(),
                default
            ))?;
            if raw.is_empty() {
                return Ok(default);
            }
            match raw.parse::<u32>() {
                Ok(n) if range.contains(&n) => return Ok(n),
                _ => writeln!(
                    self.output,
                    "Please enter a whole number from {} to {}.",
                    range.start(),
                    range.end()
                )?,
            }
        }
    }

    /// Numbered menu; accepts the number, the label, or blank for the default.
    fn choice<T>(&mut self, label: &str, all: &[T], default: T) -> Result<T>
    where
        T: Copy + PartialEq + Display + FromStr,
        T::Err: Display,
    {
        writeln!(self.output, "{label}")?;
        for (i, c) in all.iter().enumerate() {
            let marker = if *c == default { " (default)" } else { "" };
            writeln!(self.output, "  {}) {}{}", i + 1, c, marker)?;
        }
        loop {
            let raw = self.required_line(">")?;
            if raw.is_empty() {
                return Ok(default);
            }
            if let Ok(n) = raw.parse::<usize>() {
                if let Some(c) = n.checked_sub(1).and_then(|i| all.get(i)) {
                    return Ok(*c);
                }
            }
            match raw.parse::<T>() {
                Ok(c) => return Ok(c),
                Err(e) => writeln!(self.output, "{e}")?,
            }
        }
    }

    fn date(&mut self, label: &str, default: NaiveDate) -> Result<NaiveDate> {
        loop {
            let raw = self.required_line(&format!("{} [YYYY-MM-DD, default {}]", label, default))?;
            if raw.is_empty() {
                return Ok(default);
            }
            match parse_deadline(&raw) {
                Ok(d) => return Ok(d),
                Err(e) => writeln!(self.output, "{e}")?,
            }
        }
    }

    /// Daily plan form. Blank goals are returned as-is; the handler rejects them.
    pub fn schedule_form(&mut self) -> Result<ScheduleRequest> {
        writeln!(self.output, "\nDaily Plan")?;
        let tasks = self.required_line("What tasks/goals do you want to complete today?")?;
        let recurring = self.required_line("Recurring daily/weekly tasks (optional)")?;
        let hours = self.number(
            "Total hours you want to work today",
            DURATION_HOURS,
            DEFAULT_DURATION_HOURS,
        )?;
        let energy = self.choice(
            "When are you most productive?",
            &EnergyPeak::ALL,
            EnergyPeak::default(),
        )?;
        let mode = self.choice(
            "Productivity style",
            &ProductivityMode::ALL,
            ProductivityMode::default(),
        )?;
        let rest = self.choice(
            "How often do you want breaks?",
            &BreakCadence::ALL,
            BreakCadence::default(),
        )?;

        Ok(ScheduleRequest::new(tasks)
            .with_recurring(recurring)
            .with_duration(hours)
            .with_energy(energy)
            .with_mode(mode)
            .with_rest(rest))
    }

    /// Project allocator form. The deadline defaults to `today`.
    pub fn project_form(&mut self, today: NaiveDate) -> Result<ProjectRequest> {
        writeln!(self.output, "\nProject Time Allocator")?;
        let name = self.required_line("Project name")?;
        let hours = self.number(
            "Total work required (in hours)",
            PROJECT_HOURS,
            DEFAULT_PROJECT_HOURS,
        )?;
        let deadline = self.date("Deadline", today)?;
        Ok(ProjectRequest::new(name, hours, deadline))
    }
}
