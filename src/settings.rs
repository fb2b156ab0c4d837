use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::aggregator::UnitPolicy;
use crate::error::{PriceMatchError, Result};
use crate::fuzzy::ScorerKind;
use crate::matcher::DEFAULT_THRESHOLD;
use crate::writer::DEFAULT_OUTPUT_FILE;

/// Overrides the settings directory (default: ~/.config/pricematch).
pub const CONFIG_DIR_ENV: &str = "PRICEMATCH_CONFIG_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub scorer: ScorerKind,
    #[serde(default)]
    pub unit_policy: UnitPolicy,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    #[serde(default = "default_output_file")]
    pub output_file: String,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_preview_rows() -> usize {
    5
}

fn default_output_file() -> String {
    DEFAULT_OUTPUT_FILE.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            scorer: ScorerKind::default(),
            unit_policy: UnitPolicy::default(),
            preview_rows: default_preview_rows(),
            output_file: default_output_file(),
        }
    }
}

pub const KEYS: &[&str] = &["threshold", "scorer", "unit_policy", "preview_rows", "output_file"];

pub fn parse_threshold(value: &str) -> Result<f64> {
    let invalid = |reason: &str| PriceMatchError::InvalidSetting {
        key: "threshold".to_string(),
        reason: reason.to_string(),
    };
    let t: f64 = value.trim().parse().map_err(|_| invalid("expected a number"))?;
    if !(0.0..=100.0).contains(&t) {
        return Err(invalid("must be between 0 and 100"));
    }
    Ok(t)
}

impl Settings {
    /// Update one setting from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "threshold" => self.threshold = parse_threshold(value)?,
            "scorer" => self.scorer = ScorerKind::from_key(value)?,
            "unit_policy" => self.unit_policy = UnitPolicy::from_key(value)?,
            "preview_rows" => {
                self.preview_rows = value.trim().parse().map_err(|_| PriceMatchError::InvalidSetting {
                    key: key.to_string(),
                    reason: "expected a non-negative integer".to_string(),
                })?
            }
            "output_file" => {
                if value.trim().is_empty() {
                    return Err(PriceMatchError::InvalidSetting {
                        key: key.to_string(),
                        reason: "must not be empty".to_string(),
                    });
                }
                self.output_file = value.trim().to_string();
            }
            _ => {
                return Err(PriceMatchError::Settings(format!(
                    "unknown key '{key}' (expected one of: {})",
                    KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("threshold", self.threshold.to_string()),
            ("scorer", self.scorer.key().to_string()),
            ("unit_policy", self.unit_policy.key().to_string()),
            ("preview_rows", self.preview_rows.to_string()),
            ("output_file", self.output_file.clone()),
        ]
    }
}

fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("pricematch")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Out-of-range values from a hand-edited file fall back to their defaults.
fn sanitize(mut settings: Settings) -> Settings {
    if !(0.0..=100.0).contains(&settings.threshold) {
        warn!(
            threshold = settings.threshold,
            default = DEFAULT_THRESHOLD,
            "threshold in settings file must be between 0 and 100, using default"
        );
        settings.threshold = default_threshold();
    }
    if settings.output_file.trim().is_empty() {
        warn!("output_file in settings file is empty, using default");
        settings.output_file = default_output_file();
    }
    settings
}

fn parse_settings(content: &str) -> Settings {
    match serde_json::from_str(content) {
        Ok(settings) => sanitize(settings),
        Err(e) => {
            warn!(error = %e, "settings file is invalid, using defaults");
            Settings::default()
        }
    }
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        parse_settings(&content)
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| PriceMatchError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches(&['/', '\\'][..]));
        }
    }
    PathBuf::from(path)
}
