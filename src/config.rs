use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use crate::exceptions::DEFAULT_MIN_OCCURRENCES;

pub const CONFIG_FILE: &str = "crpm.toml";

pub const DEFAULT_INPUT: &str = "source/source_CRPM_check.xlsx";
pub const DEFAULT_EXCEPTIONS: &str = "source/source_CRPM_exceptions.xlsx";
pub const DEFAULT_OUTPUT: &str = "output";

pub const CITY_TAX_HOTELS: [&str; 14] = [
    "AMS", "AMA", "AMZ", "RTM", "NYT", "NYB", "PGL", "PCG", "POP", "PLD", "GEN", "ZUR", "RIT", "KLB",
];
pub const EXCLUDED_HOTELS: [&str; 3] = ["ITA", "VRS", "VRSM"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Rate-plan workbook or CSV file
    pub input: Option<PathBuf>,

    /// Standards CSV (CSV input only)
    pub standards: Option<PathBuf>,

    /// Exceptions file (TOML, CSV or workbook)
    pub exceptions: Option<PathBuf>,

    /// Base directory for timestamped report folders
    pub output: Option<PathBuf>,

    /// Terminal output format (table, json)
    pub format: Option<String>,

    /// Minimum occurrences before a rule is suggested
    pub min_occurrences: Option<usize>,

    /// Write the HTML dashboard
    pub create_dashboard: Option<bool>,

    /// Open the dashboard after writing it
    pub auto_open_dashboard: Option<bool>,

    /// Exit non-zero when High priority issues remain
    pub fail_on_issues: Option<bool>,

    /// Hotels where city tax applies
    pub city_tax_hotels: Option<Vec<String>>,

    /// Hotels left out of the analysis
    pub excluded_hotels: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: Some(PathBuf::from(DEFAULT_INPUT)),
            standards: None,
            exceptions: Some(PathBuf::from(DEFAULT_EXCEPTIONS)),
            output: Some(PathBuf::from(DEFAULT_OUTPUT)),
            format: Some("table".to_string()),
            min_occurrences: Some(DEFAULT_MIN_OCCURRENCES),
            create_dashboard: Some(true),
            auto_open_dashboard: Some(true),
            fail_on_issues: Some(false),
            city_tax_hotels: Some(CITY_TAX_HOTELS.iter().map(|h| h.to_string()).collect()),
            excluded_hotels: Some(EXCLUDED_HOTELS.iter().map(|h| h.to_string()).collect()),
        }
    }
}

impl Config {
    /// Fill every unset field from the defaults.
    pub fn with_defaults(self) -> Self {
        let defaults = Config::default();
        Self {
            input: self.input.or(defaults.input),
            standards: self.standards.or(defaults.standards),
            exceptions: self.exceptions.or(defaults.exceptions),
            output: self.output.or(defaults.output),
            format: self.format.or(defaults.format),
            min_occurrences: self.min_occurrences.or(defaults.min_occurrences),
            create_dashboard: self.create_dashboard.or(defaults.create_dashboard),
            auto_open_dashboard: self.auto_open_dashboard.or(defaults.auto_open_dashboard),
            fail_on_issues: self.fail_on_issues.or(defaults.fail_on_issues),
            city_tax_hotels: self.city_tax_hotels.or(defaults.city_tax_hotels),
            excluded_hotels: self.excluded_hotels.or(defaults.excluded_hotels),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(format) = self.format.as_deref() {
            if !matches!(format, "table" | "json") {
                bail!("Unknown format '{}': expected 'table' or 'json'", format);
            }
        }
        if self.min_occurrences == Some(0) {
            bail!("min_occurrences must be at least 1");
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

pub fn default_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(CONFIG_FILE)
}

/// Load configuration from `path`, or from `crpm.toml` in the current
/// directory. A missing default file yields the defaults; a missing explicit
/// file is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = match path {
        Some(path) => {
            if !path.exists() {
                bail!("Configuration file not found: {}", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let path = default_config_path();
            if !path.exists() {
                return Ok(Config::default());
            }
            path
        }
    };

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;
    config.validate()
        .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    Ok(config.with_defaults())
}
