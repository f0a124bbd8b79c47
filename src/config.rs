use std::{env, path::PathBuf, time::Duration};

use anyhow::{Context, Result};

use crate::interaction::reveal::RevealOptions;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const AUTO_SUBMIT_DELAY_MS: u64 = 1000;
const NOTIFICATION_TTL_MS: u64 = 5000;

/// Timings and thresholds used by the page controller.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionConfig {
    /// Pause between an accepted selection and the native form submission,
    /// long enough for the preview to show.
    pub auto_submit_delay: Duration,
    pub notification_ttl: Duration,
    pub reveal: RevealOptions,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            auto_submit_delay: Duration::from_millis(AUTO_SUBMIT_DELAY_MS),
            notification_ttl: Duration::from_millis(NOTIFICATION_TTL_MS),
            reveal: RevealOptions::default(),
        }
    }
}

/// Settings for the host web service, read from the environment.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub upload_dir: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got `{raw}`"))?,
            Err(_) => DEFAULT_PORT,
        };

        let upload_dir = env::var("UPLOAD_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR));

        Ok(Self { port, upload_dir })
    }
}
