//! Configuration for model storage and report rendering.
//!
//! Load order: `.murcs/config.toml` → environment variables → defaults.

use crate::persistence::file::DEFAULT_EXTENSION;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory under the project root that holds config and default storage.
pub const CONFIG_DIR: &str = ".murcs";

/// Largest indentation a report may use.
pub const MAX_REPORT_INDENT: usize = 16;

/// Top-level murcs configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MurcsConfig {
    pub storage: StorageConfig,
    pub report: ReportConfig,
}

/// Where models are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Model directory. Relative paths are resolved against the project root.
    /// Defaults to `.murcs/models`.
    pub directory: Option<PathBuf>,
    /// File extension for stored models, without the leading dot.
    pub extension: String,
}

/// Report rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Spaces per nesting level.
    pub indent: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: None,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { indent: 4 }
    }
}

impl StorageConfig {
    /// The model directory for a project rooted at `project_root`.
    pub fn resolve_directory(&self, project_root: &Path) -> PathBuf {
        match &self.directory {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => project_root.join(dir),
            None => project_root.join(CONFIG_DIR).join("models"),
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    target: &mut T,
) {
    if let Some(v) = lookup(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl MurcsConfig {
    /// Load config from `.murcs/config.toml` in the project root, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        Self::load_with(project_root, |var| std::env::var(var).ok())
    }

    /// Like [`MurcsConfig::load`], reading overrides through `lookup` instead of
    /// the process environment.
    pub fn load_with(
        project_root: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let config_path = project_root.join(CONFIG_DIR).join("config.toml");

        let mut config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("failed to parse {}", config_path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(&lookup);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("MURCS_STORAGE_DIR").filter(|d| !d.trim().is_empty()) {
            self.storage.directory = Some(PathBuf::from(dir));
        }
        env_override(lookup, "MURCS_MODEL_EXTENSION", &mut self.storage.extension);
        env_override(lookup, "MURCS_REPORT_INDENT", &mut self.report.indent);

        let trimmed = self.storage.extension.trim().trim_start_matches('.');
        if trimmed.len() != self.storage.extension.len() {
            self.storage.extension = trimmed.to_string();
        }
    }

    fn validate(&self) -> Result<()> {
        let ext = &self.storage.extension;
        if ext.is_empty() || ext.contains(['/', '\\', '.']) {
            anyhow::bail!("storage.extension ({:?}) must be a plain non-empty suffix", ext);
        }
        if self.report.indent > MAX_REPORT_INDENT {
            anyhow::bail!(
                "report.indent ({}) must be at most {}",
                self.report.indent,
                MAX_REPORT_INDENT,
            );
        }
        Ok(())
    }
}
