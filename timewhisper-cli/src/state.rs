use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$TIMEWHISPER_HOME`, or `~/.timewhisper`.
pub fn timewhisper_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("TIMEWHISPER_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".timewhisper"))
}

pub fn ensure_timewhisper_home() -> Result<PathBuf> {
    let dir = timewhisper_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
