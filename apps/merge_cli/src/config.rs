use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "category_merge.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub service_url: String,
    pub merge_path: String,
    pub publish_path: String,
    pub api_token: Option<String>,
    pub export_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service_url: "http://127.0.0.1:8787".into(),
            merge_path: "/merge-files".into(),
            publish_path: "/create-outlook-category".into(),
            api_token: None,
            export_dir: PathBuf::from("."),
        }
    }
}

/// Defaults, then the TOML file, then environment variables.
///
/// An explicit `config_path` must exist; the default file is optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match config_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?;
            apply_file_overrides(&mut settings, &raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
        }
        None => {
            if let Ok(raw) = fs::read_to_string(DEFAULT_CONFIG_FILE) {
                apply_file_overrides(&mut settings, &raw)
                    .with_context(|| format!("invalid config file '{DEFAULT_CONFIG_FILE}'"))?;
            }
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, String>>(raw)?;
    if let Some(v) = file_cfg.get("service_url") {
        settings.service_url = v.clone();
    }
    if let Some(v) = file_cfg.get("merge_path") {
        settings.merge_path = v.clone();
    }
    if let Some(v) = file_cfg.get("publish_path") {
        settings.publish_path = v.clone();
    }
    if let Some(v) = file_cfg.get("api_token") {
        settings.api_token = non_empty(v);
    }
    if let Some(v) = file_cfg.get("export_dir") {
        settings.export_dir = PathBuf::from(v);
    }
    Ok(())
}

fn apply_env_overrides(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("MERGE_SERVICE_URL") {
        settings.service_url = v;
    }
    if let Some(v) = var("APP__SERVICE_URL") {
        settings.service_url = v;
    }

    if let Some(v) = var("APP__MERGE_PATH") {
        settings.merge_path = v;
    }
    if let Some(v) = var("APP__PUBLISH_PATH") {
        settings.publish_path = v;
    }

    if let Some(v) = var("MERGE_API_TOKEN") {
        settings.api_token = non_empty(&v);
    }
    if let Some(v) = var("APP__API_TOKEN") {
        settings.api_token = non_empty(&v);
    }

    if let Some(v) = var("APP__EXPORT_DIR") {
        settings.export_dir = PathBuf::from(v);
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
