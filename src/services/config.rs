// src/services/config.rs
use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{error, info};
use serde::{Serialize, Deserialize};

use crate::models::{Reservation, StayType};

const DEFAULT_CONFIG_PATH: &str = "data/config.json";
pub const MIN_SCHEDULE_HOURS: f64 = 0.5;

fn default_schedule_hours() -> f64 {
    3.0
}

fn default_ha_service() -> String {
    "notify".to_string()
}

/// Operator configuration, persisted as one JSON document and edited through
/// the config API. The checker only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub hotels: Vec<Reservation>,
    /// Opaque session-cookie blob pasted from the operator's browser,
    /// forwarded verbatim on rate queries. Never validated here; a stale
    /// blob just means fewer rates come back.
    pub browser_cookies: String,
    pub ha_url: String,
    pub ha_token: String,
    #[serde(default = "default_ha_service")]
    pub ha_service: String,
    #[serde(default = "default_schedule_hours")]
    pub schedule_hours: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            hotels: Vec::new(),
            browser_cookies: String::new(),
            ha_url: String::new(),
            ha_token: String::new(),
            ha_service: default_ha_service(),
            schedule_hours: default_schedule_hours(),
        }
    }
}

/// Loads and saves the JSON config file. Loading is lenient: a missing or
/// unreadable file yields the defaults so the service still comes up.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ConfigStore { path: path.into() }
    }

    /// Path from `CONFIG_PATH`, falling back to `data/config.json`.
    pub fn from_env() -> Self {
        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        ConfigStore::new(path)
    }

    pub fn load(&self) -> AppConfig {
        match fs::read_to_string(&self.path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    error!("Failed to parse config {}: {}", self.path.display(), e);
                    AppConfig::default()
                }
            },
            Err(_) => AppConfig::default(),
        }
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let text = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, text)
            .with_context(|| format!("writing {}", self.path.display()))?;
        info!("Config saved to {}", self.path.display());
        Ok(())
    }
}

/// Validate an incoming config before persisting it. Dates are already
/// type-checked by serde; this covers the cross-field rules.
pub fn validate(config: &AppConfig) -> Result<(), String> {
    if config.schedule_hours < MIN_SCHEDULE_HOURS {
        return Err(format!(
            "schedule_hours must be at least {}",
            MIN_SCHEDULE_HOURS
        ));
    }
    for hotel in &config.hotels {
        let name = hotel.display_name();
        if hotel.property_code.trim().is_empty() {
            return Err(format!("{}: property_code is required", name));
        }
        if hotel.check_out <= hotel.check_in {
            return Err(format!("{}: check_out must be after check_in", name));
        }
        match hotel.stay_type {
            StayType::Cash => {
                if hotel.original_rate_per_night.unwrap_or(0.0) <= 0.0 {
                    return Err(format!(
                        "{}: original_rate_per_night must be positive for cash stays",
                        name
                    ));
                }
            }
            StayType::Award => {
                if hotel.original_points_per_night.unwrap_or(0) <= 0 {
                    return Err(format!(
                        "{}: original_points_per_night must be positive for award stays",
                        name
                    ));
                }
            }
        }
    }
    Ok(())
}
