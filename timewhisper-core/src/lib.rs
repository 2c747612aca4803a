//! timewhisper-core: prompt building, project allocation and session history for TimeWhisper

pub mod allocator;
pub mod completion;
pub mod error;
pub mod handlers;
pub mod preferences;
pub mod prompt;
pub mod render;
pub mod request;
pub mod session;
pub mod time;

pub use allocator::{allocate, ProjectPlan};
pub use completion::CompletionClient;
pub use error::{CompletionError, SubmitError, ValidationError};
pub use handlers::{start_fresh, submit_project, submit_schedule};
pub use preferences::{BreakCadence, EnergyPeak, ProductivityMode};
pub use prompt::{format_prompt, SCHEDULE_TEMPLATE};
pub use render::{render_latest_schedule, render_projects, render_session, RenderFormat};
pub use request::{
    ProjectRequest, ScheduleRequest, DEFAULT_DURATION_HOURS, DEFAULT_PROJECT_HOURS,
    DURATION_HOURS, PROJECT_HOURS,
};
pub use session::SessionHistory;
pub use time::{parse_deadline, parse_timezone, today_in};
