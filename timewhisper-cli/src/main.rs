use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timewhisper_core::{
    today_in, BreakCadence, EnergyPeak, ProductivityMode, ProjectRequest, RenderFormat,
    ScheduleRequest, SessionHistory, DEFAULT_DURATION_HOURS, DEFAULT_PROJECT_HOURS,
};

mod auth;
mod config;
mod form;
mod llm;
mod session;
mod state;

use config::Config;
use form::Prompter;
use llm::OpenAiCompatibleClient;
use session::SessionOptions;

#[derive(Parser, Debug)]
#[command(
    name = "timewhisper",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TIMEWHISPER_BUILD_SHA"), ")"),
    about = "Convert your goals into a peaceful, focused daily schedule"
)]
struct Cli {
    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive session: plan, project, show, reset
    Session {
        /// Render output as page markup instead of terminal text
        #[arg(long)]
        html: bool,
    },

    /// Generate one daily schedule and print it
    Plan {
        /// Tasks/goals for today
        #[arg(long)]
        tasks: String,

        /// Recurring daily/weekly tasks (blank means None)
        #[arg(long, default_value = "")]
        recurring: String,

        /// Total hours to work today (2-14)
        #[arg(long, default_value_t = DEFAULT_DURATION_HOURS)]
        hours: u32,

        /// Morning, Afternoon, Evening or Night Owl
        #[arg(long, default_value_t = EnergyPeak::default())]
        energy: EnergyPeak,

        /// Balanced, Deep Work or Pomodoro
        #[arg(long, default_value_t = ProductivityMode::default())]
        mode: ProductivityMode,

        /// Every 2 hours, After each task or Only lunch break
        #[arg(long, default_value_t = BreakCadence::default())]
        rest: BreakCadence,

        #[arg(long)]
        html: bool,
    },

    /// Spread a project's hours evenly until its deadline
    Project {
        #[arg(long)]
        name: String,

        /// Total work required in hours (1-40)
        #[arg(long, default_value_t = DEFAULT_PROJECT_HOURS)]
        hours: u32,

        /// YYYY-MM-DD (default: today)
        #[arg(long)]
        deadline: Option<NaiveDate>,

        #[arg(long)]
        html: bool,
    },

    /// Manage ~/.timewhisper/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Store API credentials
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Paste an API key into ~/.timewhisper/auth.json
    PasteKey {
        /// groq or openai (default: provider from config)
        #[arg(long)]
        provider: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "timewhisper=debug" } else { "timewhisper=warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn render_format(html: bool) -> RenderFormat {
    if html {
        RenderFormat::Html
    } else {
        RenderFormat::Text
    }
}

/// Credentials are resolved once here and handed to the client.
fn build_client(cfg: &Config) -> Result<OpenAiCompatibleClient> {
    let key = auth::resolve_api_key(&cfg.llm.provider)?;
    let client = OpenAiCompatibleClient::from_config(&cfg.llm, key)
        .context("building completion client")?;
    if cfg.llm.stream {
        return Ok(client.with_delta_sink(Box::new(|t: &str| {
            print!("{t}");
            io::stdout().flush().ok();
        })));
    }
    Ok(client)
}

fn session_options(cfg: &Config, html: bool) -> Result<SessionOptions> {
    Ok(SessionOptions {
        format: render_format(html),
        tz: cfg.timezone()?,
        streamed: cfg.llm.stream,
    })
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Session { html } => {
            let cfg = config::load_config()?;
            let opts = session_options(&cfg, html)?;
            let client = build_client(&cfg)?;
            let stdin = io::stdin();
            let mut prompter = Prompter::new(stdin.lock(), io::stdout());
            session::run_session(&client, &mut prompter, &opts).await?;
        }

        Command::Plan {
            tasks,
            recurring,
            hours,
            energy,
            mode,
            rest,
            html,
        } => {
            let cfg = config::load_config()?;
            let opts = session_options(&cfg, html)?;
            let client = build_client(&cfg)?;
            let request = ScheduleRequest::new(tasks)
                .with_recurring(recurring)
                .with_duration(hours)
                .with_energy(energy)
                .with_mode(mode)
                .with_rest(rest);

            let mut history = SessionHistory::new();
            let ok = session::plan_once(&mut history, &client, &request, &opts, &mut io::stdout())
                .await?;
            if !ok {
                return Ok(ExitCode::FAILURE);
            }
        }

        Command::Project {
            name,
            hours,
            deadline,
            html,
        } => {
            let cfg = config::load_config()?;
            let today = today_in(cfg.timezone()?, Utc::now());
            let request = ProjectRequest::new(name, hours, deadline.unwrap_or(today));

            let mut history = SessionHistory::new();
            let plan = session::project_once(
                &mut history,
                &request,
                today,
                render_format(html),
                &mut io::stdout(),
            )?;
            if plan.is_none() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },

        Command::Auth { command } => match command {
            AuthCommand::PasteKey { provider } => {
                let provider = match provider {
                    Some(p) => p,
                    None => config::load_config()?.llm.provider,
                };
                auth::paste_key(&provider)?;
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}
