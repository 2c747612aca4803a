use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::state::ensure_timewhisper_home;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AuthState {
    pub groq_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

impl AuthState {
    fn key_for(&self, provider: &str) -> Option<&str> {
        match provider {
            "groq" => self.groq_api_key.as_deref(),
            "openai" => self.openai_api_key.as_deref(),
            _ => None,
        }
    }
}

fn auth_path() -> Result<PathBuf> {
    Ok(ensure_timewhisper_home()?.join("auth.json"))
}

pub fn load_auth_from(p: &Path) -> Result<AuthState> {
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_auth_to(p: &Path, auth: &AuthState) -> Result<()> {
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Environment variable that overrides the stored key for `provider`.
pub fn env_var_for(provider: &str) -> Option<&'static str> {
    match provider {
        "groq" => Some("GROQ_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        _ => None,
    }
}

/// Key for `provider`: environment first, then ~/.timewhisper/auth.json.
pub fn resolve_api_key(provider: &str) -> Result<Option<String>> {
    if let Some(var) = env_var_for(provider) {
        if let Ok(key) = std::env::var(var) {
            if !key.trim().is_empty() {
                return Ok(Some(key.trim().to_string()));
            }
        }
    }
    let auth = load_auth_from(&auth_path()?)?;
    Ok(auth.key_for(provider).map(str::to_string))
}

fn expected_prefix(provider: &str) -> Result<&'static str> {
    match provider {
        "groq" => Ok("gsk_"),
        "openai" => Ok("sk-"),
        other => bail!("unknown provider '{other}' (expected groq or openai)"),
    }
}

pub fn store_key(auth: &mut AuthState, provider: &str, key: &str) -> Result<()> {
    let prefix = expected_prefix(provider)?;
    let key = key.trim();
    if !key.starts_with(prefix) {
        bail!("key didn't look like a {provider} API key (expected prefix {prefix})");
    }
    match provider {
        "groq" => auth.groq_api_key = Some(key.to_string()),
        _ => auth.openai_api_key = Some(key.to_string()),
    }
    Ok(())
}

fn prompt_secret(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

pub fn paste_key(provider: &str) -> Result<()> {
    let p = auth_path()?;
    let mut auth = load_auth_from(&p)?;
    let prefix = expected_prefix(provider)?;
    let key = prompt_secret(&format!("Paste {provider} API key (starts with {prefix})"))?;
    store_key(&mut auth, provider, &key)?;
    save_auth_to(&p, &auth)?;
    println!("Saved {provider} API key to {}", p.display());
    Ok(())
}
