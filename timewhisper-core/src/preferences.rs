//! Categorical schedule preferences: energy peak, productivity mode, break cadence.
//!
//! Each choice displays as the label the user picked on the form; that label is
//! what ends up in the prompt.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// When the user does their best work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EnergyPeak {
    #[default]
    #[serde(rename = "morning")]
    Morning,
    #[serde(rename = "afternoon")]
    Afternoon,
    #[serde(rename = "evening")]
    Evening,
    #[serde(rename = "night-owl")]
    NightOwl,
}

impl EnergyPeak {
    pub const ALL: [EnergyPeak; 4] = [
        EnergyPeak::Morning,
        EnergyPeak::Afternoon,
        EnergyPeak::Evening,
        EnergyPeak::NightOwl,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EnergyPeak::Morning => "Morning",
            EnergyPeak::Afternoon => "Afternoon",
            EnergyPeak::Evening => "Evening",
            EnergyPeak::NightOwl => "Night Owl",
        }
    }
}

/// How the day's work should flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProductivityMode {
    #[default]
    #[serde(rename = "balanced")]
    Balanced,
    #[serde(rename = "deep-work")]
    DeepWork,
    #[serde(rename = "pomodoro")]
    Pomodoro,
}

impl ProductivityMode {
    pub const ALL: [ProductivityMode; 3] = [
        ProductivityMode::Balanced,
        ProductivityMode::DeepWork,
        ProductivityMode::Pomodoro,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProductivityMode::Balanced => "Balanced",
            ProductivityMode::DeepWork => "Deep Work",
            ProductivityMode::Pomodoro => "Pomodoro",
        }
    }
}

/// How often to rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BreakCadence {
    #[default]
    #[serde(rename = "every-2-hours")]
    Every2Hours,
    #[serde(rename = "after-each-task")]
    AfterEachTask,
    #[serde(rename = "only-lunch-break")]
    OnlyLunchBreak,
}

impl BreakCadence {
    pub const ALL: [BreakCadence; 3] = [
        BreakCadence::Every2Hours,
        BreakCadence::AfterEachTask,
        BreakCadence::OnlyLunchBreak,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BreakCadence::Every2Hours => "Every 2 hours",
            BreakCadence::AfterEachTask => "After each task",
            BreakCadence::OnlyLunchBreak => "Only lunch break",
        }
    }
}

/// "Night Owl", "night owl", "night-owl" and "night_owl" all normalize to "night-owl".
fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn parse_choice<T: Copy>(
    field: &'static str,
    input: &str,
    all: &[T],
    label: impl Fn(&T) -> &'static str,
) -> Result<T, ValidationError> {
    let wanted = normalize(input);
    all.iter()
        .copied()
        .find(|choice| normalize(label(choice)) == wanted)
        .ok_or_else(|| ValidationError::UnknownChoice {
            field,
            value: input.trim().to_string(),
            expected: all.iter().map(&label).collect::<Vec<_>>().join(", "),
        })
}

macro_rules! label_impls {
    ($ty:ty, $field:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_choice($field, s, &<$ty>::ALL, |c: &$ty| c.label())
            }
        }
    };
}

label_impls!(EnergyPeak, "energy peak");
label_impls!(ProductivityMode, "productivity mode");
label_impls!(BreakCadence, "break preference");
