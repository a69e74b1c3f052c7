//! Serializable reconciliation configuration.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Settings for one reconciliation batch.
///
/// Every field has a default, so an empty TOML document is a valid config.
///
/// ```toml
/// cutoff_date = "2015-01-01"
/// as_of = "2024-06-28"
/// parallel = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Ticker changes dated strictly before this are dropped from the index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutoff_date: Option<NaiveDate>,

    /// Date used as "today" for vendor histories with a single event.
    /// Defaults to the local date when the batch runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,

    /// Partition the batch by raw ticker and process partitions with rayon.
    pub parallel: bool,
}

impl ReconcileConfig {
    pub fn with_cutoff(mut self, cutoff: NaiveDate) -> Self {
        self.cutoff_date = Some(cutoff);
        self
    }

    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// The pinned `as_of` date, or the local calendar date.
    pub fn today(&self) -> NaiveDate {
        self.as_of
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn empty_document_is_default() {
        let config = ReconcileConfig::from_toml_str("").unwrap();
        assert_eq!(config, ReconcileConfig::default());
        assert!(!config.parallel);
    }

    #[test]
    fn parses_all_fields() {
        let config = ReconcileConfig::from_toml_str(
            r#"
            cutoff_date = "2015-01-01"
            as_of = "2024-06-28"
            parallel = true
            "#,
        )
        .unwrap();
        assert_eq!(config.cutoff_date, Some(d("2015-01-01")));
        assert_eq!(config.today(), d("2024-06-28"));
        assert!(config.parallel);
    }

    #[test]
    fn toml_roundtrip() {
        let config = ReconcileConfig::default()
            .with_cutoff(d("2010-01-04"))
            .with_parallelism(true);
        let text = config.to_toml().unwrap();
        assert!(!text.contains("as_of"));
        assert_eq!(ReconcileConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn rejects_bad_date() {
        let err = ReconcileConfig::from_toml_str("cutoff_date = \"2015-13-01\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "as_of = \"2023-03-31\"").unwrap();
        let config = ReconcileConfig::load(file.path()).unwrap();
        assert_eq!(config.as_of, Some(d("2023-03-31")));
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = ReconcileConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
