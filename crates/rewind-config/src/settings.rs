/// History settings: load, save, validate, and turn into engine config.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rewind_history::{exclude_filter, include_filter, ActionFilter, ActionKind, HistoryConfig};
use serde::{Deserialize, Serialize};

/// File name of the settings file.
const SETTINGS_FILE: &str = "rewind.json";

/// Environment variable overriding the settings path.
const SETTINGS_ENV: &str = "REWIND_CONFIG";

/// Kind-based admission lists. At most one of them may be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Only these kinds are admitted.
    pub include: Option<Vec<ActionKind>>,
    /// These kinds are declined.
    pub exclude: Option<Vec<ActionKind>>,
}

/// User-facing history settings, stored as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Bound on `len(past) + len(future)`. Absent means unbounded.
    pub limit: Option<i64>,
    /// Trace every action.
    pub debug: bool,
    pub filter: FilterSettings,
    /// Fields observed on their own timelines. Absent observes the whole
    /// state on one shared timeline.
    pub fields: Option<Vec<String>>,
}

impl HistorySettings {
    /// Returns the settings file path.
    ///
    /// Resolution order:
    /// 1. `REWIND_CONFIG` environment variable
    /// 2. `<config dir>/rewind/rewind.json`
    /// 3. `rewind.json` in the working directory
    pub fn settings_path() -> PathBuf {
        if let Ok(path) = std::env::var(SETTINGS_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .map(|dir| dir.join("rewind").join(SETTINGS_FILE))
            .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE))
    }

    /// Parses and validates settings from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON, unknown action kinds, or any
    /// value rejected by [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json).context("Failed to parse history settings")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or holds invalid settings.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings at {}", path.display()))?;
        Self::from_json(&contents).with_context(|| format!("Invalid settings at {}", path.display()))
    }

    /// Loads settings from `path`, writing the defaults there first if the
    /// file does not exist.
    ///
    /// A broken existing file is reported, never overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file is invalid.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        let settings = Self::default();
        if let Err(e) = settings.save(path) {
            tracing::warn!("Failed to create default settings at {}: {e}", path.display());
        }
        Ok(settings)
    }

    /// Saves settings to `path` as pretty-printed JSON, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write settings to {}", path.display()))
    }

    /// Rejects values the engine cannot honour.
    ///
    /// # Errors
    ///
    /// Returns an error for a negative limit, both filter lists set, or an
    /// empty or duplicated field list.
    pub fn validate(&self) -> Result<()> {
        if let Some(limit) = self.limit {
            if limit < 0 {
                bail!("limit must be non-negative, got {limit}");
            }
        }
        if self.filter.include.is_some() && self.filter.exclude.is_some() {
            bail!("filter.include and filter.exclude cannot both be set");
        }
        if let Some(fields) = &self.fields {
            if fields.is_empty() {
                bail!("fields must name at least one field; omit it to observe everything");
            }
            let mut seen = HashSet::new();
            for field in fields {
                if !seen.insert(field.as_str()) {
                    bail!("field {field:?} is listed more than once");
                }
            }
        }
        Ok(())
    }

    /// The retention limit as the engine expects it.
    pub fn limit(&self) -> Option<usize> {
        self.limit.and_then(|limit| usize::try_from(limit).ok())
    }

    /// The kind-based filter these settings describe.
    pub fn filter<S>(&self) -> ActionFilter<S> {
        match (&self.filter.include, &self.filter.exclude) {
            (Some(include), _) => include_filter(include.iter().copied()),
            (None, Some(exclude)) => exclude_filter(exclude.iter().copied()),
            (None, None) => ActionFilter::AllowAll,
        }
    }

    /// Engine configuration for timelines holding `S` snapshots.
    pub fn history_config<S>(&self) -> HistoryConfig<S> {
        HistoryConfig {
            limit: self.limit(),
            filter: self.filter(),
            debug: self.debug,
        }
    }
}
