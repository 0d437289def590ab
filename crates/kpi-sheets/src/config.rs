//! Run configuration
//!
//! Loaded from a JSON file. Relative paths are resolved against the
//! directory holding the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::period::Period;

fn default_cache_dir() -> PathBuf {
    PathBuf::from("dumps")
}

fn default_recency_days() -> i64 {
    5
}

fn default_trace_dir() -> PathBuf {
    PathBuf::from("logs")
}

/// Worksheet title overrides per period
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorksheetTitles {
    pub day: Option<String>,
    pub week: Option<String>,
    pub month: Option<String>,
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Workbook document the reports are written to
    pub workbook: PathBuf,
    /// Directory holding one CSV export per dataset
    pub exports_dir: PathBuf,
    /// Directory of cached extracts
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Rolling extracts newer than this many days are reused
    #[serde(default = "default_recency_days")]
    pub cache_recency_days: i64,
    /// Directory failure traces are written to
    #[serde(default = "default_trace_dir")]
    pub trace_dir: PathBuf,
    #[serde(default)]
    pub worksheet_titles: WorksheetTitles,
}

impl Config {
    /// Read and validate a config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read config {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_json_str(&text)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate a JSON config
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(text).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check field values serde cannot check
    pub fn validate(&self) -> Result<()> {
        if self.workbook.as_os_str().is_empty() {
            return Err(Error::config("'workbook' must not be empty"));
        }
        if self.exports_dir.as_os_str().is_empty() {
            return Err(Error::config("'exports_dir' must not be empty"));
        }
        if self.cache_recency_days < 0 {
            return Err(Error::config(format!(
                "'cache_recency_days' must not be negative, got {}",
                self.cache_recency_days
            )));
        }
        Ok(())
    }

    /// Make relative paths relative to `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.workbook,
            &mut self.exports_dir,
            &mut self.cache_dir,
            &mut self.trace_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Worksheet title for a period, honouring overrides
    pub fn sheet_title(&self, period: Period) -> &str {
        let custom = match period {
            Period::Day => &self.worksheet_titles.day,
            Period::Week => &self.worksheet_titles.week,
            Period::Month => &self.worksheet_titles.month,
        };
        custom.as_deref().unwrap_or_else(|| period.sheet_title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config =
            Config::from_json_str(r#"{"workbook": "report.json", "exports_dir": "exports"}"#).unwrap();
        assert_eq!(config.cache_dir, PathBuf::from("dumps"));
        assert_eq!(config.cache_recency_days, 5);
        assert_eq!(config.trace_dir, PathBuf::from("logs"));
        assert_eq!(config.sheet_title(Period::Week), "Week Summary");
    }

    #[test]
    fn test_title_override() {
        let config = Config::from_json_str(
            r#"{"workbook": "r.json", "exports_dir": "e", "worksheet_titles": {"day": "Daily"}}"#,
        )
        .unwrap();
        assert_eq!(config.sheet_title(Period::Day), "Daily");
        assert_eq!(config.sheet_title(Period::Month), "Month Summary");
    }

    #[test]
    fn test_missing_field_is_configuration_error() {
        let err = Config::from_json_str(r#"{"workbook": "r.json"}"#).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err = Config::from_json_str(
            r#"{"workbook": "r.json", "exports_dir": "e", "cache_recency_days": -1}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_relative_paths_follow_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kpi.json");
        std::fs::write(&path, r#"{"workbook": "r.json", "exports_dir": "/data/exports"}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.workbook, dir.path().join("r.json"));
        assert_eq!(config.exports_dir, PathBuf::from("/data/exports"));
        assert_eq!(config.cache_dir, dir.path().join("dumps"));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::from_file("/nonexistent/kpi.json"),
            Err(Error::Configuration(_))
        ));
    }
}
