//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Site credentials are referenced by env-var name in the config and
//! resolved at request time via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    pub site: SiteConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Explicit Chrome/Chromium binary; auto-detected when absent.
    #[serde(default)]
    pub chrome_path: Option<String>,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
    #[serde(default)]
    pub chrome_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            chrome_path: None,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            chrome_args: Vec::new(),
        }
    }
}

fn default_headless() -> bool {
    true
}

fn default_viewport_width() -> u32 {
    1366
}

fn default_viewport_height() -> u32 {
    900
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    pub username_env: String,
    pub password_env: String,
    /// Birthdate typed into the age gate (dd/mm/yyyy).
    pub birthdate_env: String,
}

/// Every fixed settle delay and bounded wait used while driving the page.
///
/// Settle delays are unconditional pauses; waits are upper bounds on
/// waiting for a condition.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TimingConfig {
    /// Pause after a mode switch for the category controls to render.
    #[serde(default = "default_mode_settle_ms")]
    pub mode_settle_ms: u64,
    /// Pause after submitting the wager slip.
    #[serde(default = "default_submit_settle_ms")]
    pub submit_settle_ms: u64,
    /// Pause after every wager attempt, successful or not.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    /// Pause after submitting the login form.
    #[serde(default = "default_login_settle_ms")]
    pub login_settle_ms: u64,
    /// Bound on short UI waits (icons, inputs, optional modals).
    #[serde(default = "default_short_wait_ms")]
    pub short_wait_ms: u64,
    /// Bound on element-appearance waits (balance, confirmation, login).
    #[serde(default = "default_element_wait_ms")]
    pub element_wait_ms: u64,
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            mode_settle_ms: default_mode_settle_ms(),
            submit_settle_ms: default_submit_settle_ms(),
            pacing_ms: default_pacing_ms(),
            login_settle_ms: default_login_settle_ms(),
            short_wait_ms: default_short_wait_ms(),
            element_wait_ms: default_element_wait_ms(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
        }
    }
}

fn default_mode_settle_ms() -> u64 {
    500
}

fn default_submit_settle_ms() -> u64 {
    1_000
}

fn default_pacing_ms() -> u64 {
    3_000
}

fn default_login_settle_ms() -> u64 {
    2_000
}

fn default_short_wait_ms() -> u64 {
    5_000
}

fn default_element_wait_ms() -> u64 {
    10_000
}

fn default_navigation_timeout_ms() -> u64 {
    60_000
}

impl TimingConfig {
    /// All delays and waits collapsed to zero. For tests and dry runs.
    pub fn immediate() -> Self {
        Self {
            mode_settle_ms: 0,
            submit_settle_ms: 0,
            pacing_ms: 0,
            login_settle_ms: 0,
            short_wait_ms: 0,
            element_wait_ms: 0,
            navigation_timeout_ms: 0,
        }
    }

    pub fn mode_settle(&self) -> Duration {
        Duration::from_millis(self.mode_settle_ms)
    }

    pub fn submit_settle(&self) -> Duration {
        Duration::from_millis(self.submit_settle_ms)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn login_settle(&self) -> Duration {
        Duration::from_millis(self.login_settle_ms)
    }

    pub fn short_wait(&self) -> Duration {
        Duration::from_millis(self.short_wait_ms)
    }

    pub fn element_wait(&self) -> Duration {
        Duration::from_millis(self.element_wait_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
