use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::HeightBounds;
use thiserror::Error;

pub const DEFAULT_SETTINGS_FILE: &str = "teleop.toml";
const ENV_PREFIX: &str = "TELEOP__";

#[derive(Debug, Clone, PartialEq)]
pub struct TeleopSettings {
    pub robot_name: String,
    pub poll_interval_ms: u64,
    pub pixels_to_mm: f64,
    pub deadband_mm: f64,
    pub max_step_mm: f64,
    pub height_min_mm: f64,
    pub height_max_mm: f64,
    pub breaker_threshold: u32,
    pub breaker_cooldown_ms: u64,
}

impl Default for TeleopSettings {
    fn default() -> Self {
        Self {
            robot_name: "Fanuc ARC Mate 100iD".into(),
            poll_interval_ms: 150,
            pixels_to_mm: 2.0,
            deadband_mm: 1.0,
            max_step_mm: 10.0,
            height_min_mm: 0.0,
            height_max_mm: 1000.0,
            breaker_threshold: 5,
            breaker_cooldown_ms: 2000,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("invalid value '{value}' for {key}")]
    Unparsable { key: String, value: String },
    #[error("{key} must be positive, got {value}")]
    NotPositive { key: &'static str, value: f64 },
    #[error("height range is empty: min {min} > max {max}")]
    EmptyHeightRange { min: f64, max: f64 },
    #[error("deadband {deadband} must not exceed max step {max_step}")]
    DeadbandAboveStep { deadband: f64, max_step: f64 },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    robot_name: Option<String>,
    poll_interval_ms: Option<u64>,
    pixels_to_mm: Option<f64>,
    deadband_mm: Option<f64>,
    max_step_mm: Option<f64>,
    height_min_mm: Option<f64>,
    height_max_mm: Option<f64>,
    breaker_threshold: Option<u32>,
    breaker_cooldown_ms: Option<u64>,
}

impl TeleopSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn breaker_cooldown(&self) -> Duration {
        Duration::from_millis(self.breaker_cooldown_ms)
    }

    pub fn height_bounds(&self) -> HeightBounds {
        HeightBounds::new(self.height_min_mm, self.height_max_mm)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = [
            ("poll_interval_ms", self.poll_interval_ms as f64),
            ("pixels_to_mm", self.pixels_to_mm),
            ("max_step_mm", self.max_step_mm),
            ("breaker_threshold", f64::from(self.breaker_threshold)),
        ];
        for (key, value) in positive {
            if !(value > 0.0) {
                return Err(SettingsError::NotPositive { key, value });
            }
        }
        if self.deadband_mm < 0.0 || self.deadband_mm.is_nan() {
            return Err(SettingsError::NotPositive {
                key: "deadband_mm",
                value: self.deadband_mm,
            });
        }
        if self.deadband_mm > self.max_step_mm {
            return Err(SettingsError::DeadbandAboveStep {
                deadband: self.deadband_mm,
                max_step: self.max_step_mm,
            });
        }
        if !(self.height_min_mm <= self.height_max_mm) {
            return Err(SettingsError::EmptyHeightRange {
                min: self.height_min_mm,
                max: self.height_max_mm,
            });
        }
        Ok(())
    }

    fn merge_file(&mut self, file: SettingsFile) {
        if let Some(v) = file.robot_name {
            self.robot_name = v;
        }
        if let Some(v) = file.poll_interval_ms {
            self.poll_interval_ms = v;
        }
        if let Some(v) = file.pixels_to_mm {
            self.pixels_to_mm = v;
        }
        if let Some(v) = file.deadband_mm {
            self.deadband_mm = v;
        }
        if let Some(v) = file.max_step_mm {
            self.max_step_mm = v;
        }
        if let Some(v) = file.height_min_mm {
            self.height_min_mm = v;
        }
        if let Some(v) = file.height_max_mm {
            self.height_max_mm = v;
        }
        if let Some(v) = file.breaker_threshold {
            self.breaker_threshold = v;
        }
        if let Some(v) = file.breaker_cooldown_ms {
            self.breaker_cooldown_ms = v;
        }
    }

    /// Applies `TELEOP__<FIELD>` overrides. Unknown keys are ignored.
    pub fn apply_env_overrides<I, K, V>(&mut self, vars: I) -> Result<(), SettingsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(field) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref().trim();
            match field.to_ascii_lowercase().as_str() {
                "robot_name" => self.robot_name = value.to_string(),
                "poll_interval_ms" => self.poll_interval_ms = parse_env(field, value)?,
                "pixels_to_mm" => self.pixels_to_mm = parse_env(field, value)?,
                "deadband_mm" => self.deadband_mm = parse_env(field, value)?,
                "max_step_mm" => self.max_step_mm = parse_env(field, value)?,
                "height_min_mm" => self.height_min_mm = parse_env(field, value)?,
                "height_max_mm" => self.height_max_mm = parse_env(field, value)?,
                "breaker_threshold" => self.breaker_threshold = parse_env(field, value)?,
                "breaker_cooldown_ms" => self.breaker_cooldown_ms = parse_env(field, value)?,
                _ => {}
            }
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, SettingsError> {
    value.parse::<T>().map_err(|_| SettingsError::Unparsable {
        key: format!("{ENV_PREFIX}{key}"),
        value: value.to_string(),
    })
}

pub fn parse_settings(raw: &str) -> anyhow::Result<TeleopSettings> {
    let file: SettingsFile = toml::from_str(raw).context("failed to parse teleop settings")?;
    let mut settings = TeleopSettings::default();
    settings.merge_file(file);
    Ok(settings)
}

/// Resolves settings from defaults, then the settings file, then the
/// environment. An explicit `path` must exist; the default file is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<TeleopSettings> {
    let (path, required): (PathBuf, bool) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };

    let mut settings = match fs::read_to_string(&path) {
        Ok(raw) => parse_settings(&raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?,
        Err(err) if required => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()));
        }
        Err(_) => TeleopSettings::default(),
    };

    settings.apply_env_overrides(std::env::vars())?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
