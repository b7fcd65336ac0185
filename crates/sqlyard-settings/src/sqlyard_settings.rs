//! sqlyard Settings
//!
//! Workspace settings persisted as JSON:
//! - Schema cache lifetime
//! - Completion behavior (default schema, keywords)
//! - Commit behavior (per-mutation timeout)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod settings_file;

pub use settings_file::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WorkspaceSettings {
    pub schema_cache: SchemaCacheSettings,
    pub completion: CompletionSettings,
    pub commit: CommitSettings,
}

impl WorkspaceSettings {
    /// Load from the default location, or defaults when no file exists yet
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::settings_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        serde_json::from_str(&content).with_context(|| "Failed to parse settings JSON")
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {:?}", path))?;
        tracing::info!(path = %path.display(), "settings saved");
        Ok(())
    }

    pub fn settings_path() -> Result<PathBuf> {
        settings_file()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaCacheSettings {
    /// Lifetime of a cached table schema in seconds
    pub ttl_secs: u64,
}

impl Default for SchemaCacheSettings {
    fn default() -> Self {
        Self { ttl_secs: 900 }
    }
}

impl SchemaCacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    /// Namespace whose tables are shown unqualified
    pub default_schema: String,
    pub include_keywords: bool,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            default_schema: sqlyard_core::DEFAULT_SCHEMA.to_string(),
            include_keywords: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitSettings {
    /// Upper bound for a single row mutation; unset waits indefinitely
    pub mutation_timeout_ms: Option<u64>,
}

impl CommitSettings {
    pub fn mutation_timeout(&self) -> Option<Duration> {
        self.mutation_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let settings = WorkspaceSettings::default();
        assert_eq!(settings.schema_cache.ttl(), Duration::from_secs(15 * 60));
        assert_eq!(settings.completion.default_schema, "public");
        assert!(settings.completion.include_keywords);
        assert_eq!(settings.commit.mutation_timeout(), None);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = WorkspaceSettings::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, WorkspaceSettings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"commit":{"mutation_timeout_ms":2500}}"#).unwrap();

        let settings = WorkspaceSettings::load_from(&path).unwrap();
        assert_eq!(
            settings.commit.mutation_timeout(),
            Some(Duration::from_millis(2500))
        );
        assert_eq!(settings.schema_cache, SchemaCacheSettings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = WorkspaceSettings::default();
        settings.schema_cache.ttl_secs = 60;
        settings.completion.default_schema = "app".to_string();
        settings.save_to(&path).unwrap();

        assert_eq!(WorkspaceSettings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(WorkspaceSettings::load_from(&path).is_err());
    }
}
