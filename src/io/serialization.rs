// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Settings file serialization.
//!
//! Settings live in a flat JSON object. Saving merges into whatever the file
//! currently holds and only touches the disk when a value actually changed.

use crate::models::settings::Settings;
use crate::NAME;
use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Environment variable overriding the settings file location.
pub const SETTINGS_ENV: &str = "KIEKSTE_SETTINGS";

/// Location of the settings file.
pub fn settings_path() -> PathBuf {
    if let Some(path) = std::env::var_os(SETTINGS_ENV) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(NAME)
        .join(format!("{NAME}.json"))
}

/// Load settings from `path`. A missing file yields the defaults.
///
/// Each key is read on its own. A value of the wrong type is warned about
/// and replaced by the default, and the key is listed in
/// `Settings::invalid_keys` so a later save leaves the stored value alone.
/// Only a file that is not a JSON object is an error.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let current = read_object(path)?;

    let mut valid = Map::new();
    let mut invalid = BTreeSet::new();
    for (key, value) in current {
        let single = Value::Object(Map::from_iter([(key.clone(), value.clone())]));
        match serde_json::from_value::<Settings>(single) {
            Ok(_) => {
                valid.insert(key, value);
            }
            Err(e) => {
                log::warn!("Ignoring settings key {:?} in {}: {}", key, path.display(), e);
                invalid.insert(key);
            }
        }
    }

    let mut settings: Settings = serde_json::from_value(Value::Object(valid))
        .with_context(|| format!("Invalid settings in {}", path.display()))?;
    settings.invalid_keys = invalid;

    for key in settings.extra.keys() {
        log::warn!("Unknown settings key {:?} in {}", key, path.display());
    }
    if settings.sanitize() {
        log::warn!(
            "Clamped max_rectangles to {} and kept the newest rectangles",
            settings.max_rectangles
        );
    }
    Ok(settings)
}

/// Write `settings` to `path` if anything differs from the file.
///
/// Returns whether the file was written.
pub fn save_settings(settings: &Settings, path: &Path) -> Result<bool> {
    let mut current = match read_object(path) {
        Ok(current) => current,
        Err(e) => {
            log::warn!("Replacing unreadable settings file: {:#}", e);
            Map::new()
        }
    };

    let Value::Object(updated) = serde_json::to_value(settings)? else {
        bail!("Settings did not serialize to a JSON object");
    };

    let defaults = serde_json::to_value(Settings::default())?;

    let mut changed = false;
    for (key, value) in updated {
        // An unreadable stored value is only replaced by a deliberate change.
        if settings.invalid_keys.contains(&key) && defaults.get(&key) == Some(&value) {
            continue;
        }
        if current.get(&key) != Some(&value) {
            current.insert(key, value);
            changed = true;
        }
    }
    if !changed {
        return Ok(false);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let sorted: BTreeMap<String, Value> = current.into_iter().collect();
    let json = serde_json::to_string_pretty(&sorted)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    log::debug!("Saved settings to {}", path.display());
    Ok(true)
}

fn read_object(path: &Path) -> Result<Map<String, Value>> {
    if !path.is_file() {
        return Ok(Map::new());
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match serde_json::from_str(&json)? {
        Value::Object(map) => Ok(map),
        _ => bail!("{} does not hold a JSON object", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("kiekste.json");

        let mut settings = Settings::default();
        settings.remember_rect([10, 20, 300, 400]);
        settings.video_fps = 25;

        assert!(save_settings(&settings, &path).unwrap());
        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_unchanged_settings_are_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kiekste.json");

        let settings = Settings::default();
        assert!(save_settings(&settings, &path).unwrap());
        assert!(!save_settings(&settings, &path).unwrap());
    }

    #[test]
    fn test_output_is_sorted_and_indented() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kiekste.json");
        save_settings(&Settings::default(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"draw_pointer\": true"));
        let draw = text.find("draw_pointer").unwrap();
        let last = text.find("last_rectangles").unwrap();
        let video = text.find("video_quality").unwrap();
        assert!(draw < last && last < video);
    }

    #[test]
    fn test_unknown_keys_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kiekste.json");
        std::fs::write(&path, r#"{"draw_pointer": false, "theme": "dark"}"#).unwrap();

        let mut settings = load_settings(&path).unwrap();
        assert!(!settings.draw_pointer);
        assert_eq!(settings.extra.get("theme"), Some(&Value::from("dark")));

        settings.draw_pointer = true;
        assert!(save_settings(&settings, &path).unwrap());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"theme\": \"dark\""));
        assert!(text.contains("\"draw_pointer\": true"));
    }

    #[test]
    fn test_bad_value_keeps_the_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kiekste.json");
        std::fs::write(
            &path,
            r#"{"video_fps": "fast", "last_save_path": "/home/me/shots", "last_rectangles": [[1, 2, 3, 4]]}"#,
        )
        .unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.video_fps, Settings::default().video_fps);
        assert_eq!(settings.last_save_path, "/home/me/shots");
        assert_eq!(settings.last_rectangles, vec![[1, 2, 3, 4]]);
        assert!(settings.invalid_keys.contains("video_fps"));
        assert!(!settings.extra.contains_key("video_fps"));
    }

    #[test]
    fn test_save_after_bad_value_keeps_user_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kiekste.json");
        std::fs::write(
            &path,
            r#"{"video_fps": "fast", "last_save_path": "/home/me/shots", "last_rectangles": [[1, 2, 3, 4]]}"#,
        )
        .unwrap();

        let mut settings = load_settings(&path).unwrap();
        settings.draw_pointer = false;
        assert!(save_settings(&settings, &path).unwrap());

        let saved: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["last_save_path"], "/home/me/shots");
        assert_eq!(saved["last_rectangles"], serde_json::json!([[1, 2, 3, 4]]));
        assert_eq!(saved["video_fps"], "fast");
        assert_eq!(saved["draw_pointer"], false);
    }

    #[test]
    fn test_changed_value_replaces_a_bad_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kiekste.json");
        std::fs::write(&path, r#"{"video_fps": "fast"}"#).unwrap();

        let mut settings = load_settings(&path).unwrap();
        settings.video_fps = 30;
        assert!(save_settings(&settings, &path).unwrap());

        assert_eq!(load_settings(&path).unwrap().video_fps, 30);
    }

    #[test]
    fn test_loaded_rectangles_are_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kiekste.json");
        std::fs::write(
            &path,
            r#"{"max_rectangles": 0, "last_rectangles": [[1, 1, 1, 1], [2, 2, 2, 2]]}"#,
        )
        .unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.max_rectangles, 1);
        assert_eq!(settings.last_rectangles, vec![[2, 2, 2, 2]]);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kiekste.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(load_settings(&path).is_err());
    }
}
