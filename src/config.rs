use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::{AppError, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://api.myquran.com/v2/sholat";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub api_base_url: String,
    pub state_path: Option<PathBuf>,
    pub media_dir: PathBuf,
    pub settings: ReminderSettings,
}

/// User-facing reminder settings. Any change restarts the scheduler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    pub enabled: bool,
    pub sound_enabled: bool,
    pub pre_reminder_enabled: bool,
    pub location_id: String,
    pub location_label: String,
    pub region_label: String,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sound_enabled: true,
            pre_reminder_enabled: true,
            location_id: "1301".to_string(),
            location_label: "KOTA JAKARTA".to_string(),
            region_label: "DKI JAKARTA".to_string(),
        }
    }
}

impl ReminderSettings {
    pub fn has_location(&self) -> bool {
        !self.location_id.trim().is_empty()
    }
}

/// Partial update of the boolean toggles, as sent by the settings surface.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SettingsUpdate {
    pub enabled: Option<bool>,
    pub sound_enabled: Option<bool>,
    pub pre_reminder_enabled: Option<bool>,
}

impl SettingsUpdate {
    pub fn apply(&self, settings: &mut ReminderSettings) {
        if let Some(enabled) = self.enabled {
            settings.enabled = enabled;
        }
        if let Some(sound) = self.sound_enabled {
            settings.sound_enabled = sound;
        }
        if let Some(pre) = self.pre_reminder_enabled {
            settings.pre_reminder_enabled = pre;
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server configuration with defaults
        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = var("PORT").unwrap_or_else(|| "3000".to_string());
        let port = port.parse::<u16>().map_err(|e| AppError::ConfigError(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host).map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let api_base_url = var("API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let state_path = var("STATE_PATH")
            .map(PathBuf::from)
            .or_else(|| dirs::data_dir().map(|dir| dir.join("prayer-reminder").join("state.json")));

        let media_dir = PathBuf::from(var("MEDIA_DIR").unwrap_or_else(|| "media".to_string()));

        let defaults = ReminderSettings::default();
        let settings = ReminderSettings {
            enabled: flag(&var, "REMINDER_ENABLED", defaults.enabled)?,
            sound_enabled: flag(&var, "SOUND_ENABLED", defaults.sound_enabled)?,
            pre_reminder_enabled: flag(&var, "PRE_REMINDER_ENABLED", defaults.pre_reminder_enabled)?,
            location_id: var("LOCATION_ID").unwrap_or(defaults.location_id),
            location_label: var("LOCATION_LABEL").unwrap_or(defaults.location_label),
            region_label: var("REGION_LABEL").unwrap_or(defaults.region_label),
        };

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            api_base_url,
            state_path,
            media_dir,
            settings,
        })
    }
}

fn flag<F>(var: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(AppError::ConfigError(format!("Invalid value for {}: {}", key, other))),
        },
    }
}
