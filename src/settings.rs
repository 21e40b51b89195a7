//! Global settings and the global category catalog.
//!
//! Both live as JSON files in the data directory. Missing files mean defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::db::write_atomic;
use crate::error::StoreError;
use crate::fields::ReimportPolicy;
use crate::legend::{default_templates, LegendTemplate};

pub const SETTINGS_FILE: &str = "settings.json";
pub const TEMPLATES_FILE: &str = "templates.json";

/// User-tunable behavior, stored in `settings.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub reimport_policy: ReimportPolicy,
    pub kerning_repair: bool,
    pub backup_before_import: bool,
    /// Author recorded on comments when none is given.
    pub operator: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            reimport_policy: ReimportPolicy::Append,
            kerning_repair: true,
            backup_before_import: true,
            operator: "Field Op".to_string(),
        }
    }
}

impl Settings {
    pub fn path(dir: &Path) -> PathBuf {
        dir.join(SETTINGS_FILE)
    }

    /// Load settings from the data directory; a missing file yields defaults.
    pub fn load(dir: &Path) -> Result<Self, StoreError> {
        let path = Self::path(dir);
        if !path.exists() {
            return Ok(Settings::default());
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, dir: &Path) -> Result<(), StoreError> {
        write_atomic(&Self::path(dir), &serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// The global catalog new projects start from. Falls back to the built-in catalog.
pub fn load_global_templates(dir: &Path) -> Result<Vec<LegendTemplate>, StoreError> {
    let path = dir.join(TEMPLATES_FILE);
    if !path.exists() {
        return Ok(default_templates());
    }
    let raw = fs::read_to_string(&path)?;
    let templates: Vec<LegendTemplate> = serde_json::from_str(&raw)?;
    if templates.is_empty() {
        Ok(default_templates())
    } else {
        Ok(templates)
    }
}

pub fn save_global_templates(dir: &Path, templates: &[LegendTemplate]) -> Result<(), StoreError> {
    write_atomic(&dir.join(TEMPLATES_FILE), &serde_json::to_string_pretty(templates)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_give_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Settings::load(dir.path()).unwrap(), Settings::default());
        assert_eq!(load_global_templates(dir.path()).unwrap(), default_templates());
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(Settings::path(dir.path()), r#"{"reimport_policy":"skip-existing"}"#).unwrap();
        let s = Settings::load(dir.path()).unwrap();
        assert_eq!(s.reimport_policy, ReimportPolicy::SkipExisting);
        assert!(s.kerning_repair);
        assert_eq!(s.operator, "Field Op");
    }

    #[test]
    fn global_templates_round_trip_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut templates = default_templates();
        templates.reverse();
        save_global_templates(dir.path(), &templates).unwrap();
        assert_eq!(load_global_templates(dir.path()).unwrap(), templates);
    }

    #[test]
    fn empty_global_catalog_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        save_global_templates(dir.path(), &[]).unwrap();
        assert_eq!(load_global_templates(dir.path()).unwrap().len(), default_templates().len());
    }
}
