use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_timewhisper_home;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmSection,
    pub session: SessionSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// "groq" or "openai"; both speak the chat-completions wire format.
    pub provider: String,
    pub model: String,
    pub base_url: String,
    /// Left to the provider's default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Stream tokens to the terminal while the schedule is generated.
    pub stream: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// IANA timezone used to decide what "today" is for project deadlines.
    pub timezone: String,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: "llama3-8b-8192".to_string(),
            base_url: "https://api.groq.com/openai".to_string(),
            temperature: None,
            timeout_secs: 60,
            max_retries: 2,
            stream: false,
        }
    }
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
        }
    }
}

impl Config {
    pub fn timezone(&self) -> Result<Tz> {
        timewhisper_core::parse_timezone(&self.session.timezone).map_err(anyhow::Error::msg)
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_timewhisper_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(p: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&p, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let p = config_path()?;
    let cfg = load_config_from(&p)?;
    let source = if p.exists() { "file" } else { "defaults" };
    println!("# {} ({})\n", p.display(), source);
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}

/// Normalize model names.
/// - Accept `groq/llama3-8b-8192` and return `llama3-8b-8192` for the API.
pub fn normalize_model(model: &str) -> String {
    model
        .split_once('/')
        .filter(|(prefix, _)| matches!(*prefix, "groq" | "openai"))
        .map(|(_, name)| name)
        .unwrap_or(model)
        .to_string()
}
