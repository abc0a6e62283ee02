use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::defaults::default_config;
use super::paths::AppPaths;
use super::settings::Settings;
use super::validation::validate_config;
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    /// Built-in defaults overlaid with the YAML file, validated.
    pub fn load_config(&self) -> Result<Value, ApiError> {
        let user_config = load_yaml_file(&self.paths.config_path)?;

        let mut merged = deep_merge(&default_config(), &user_config);
        // The entity table replaces the built-in one instead of extending it.
        if let (Some(entities), Some(root)) = (user_config.get("entities"), merged.as_object_mut()) {
            root.insert("entities".to_string(), entities.clone());
        }

        validate_config(&merged)?;
        Ok(merged)
    }

    pub fn load_settings(&self) -> Result<Settings, ApiError> {
        let config = self.load_config()?;
        Settings::from_value(config)
    }
}

fn load_yaml_file(path: &Path) -> Result<Value, ApiError> {
    if !path.exists() {
        tracing::debug!("No config file at {}, using defaults", path.display());
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path).map_err(|err| {
        ApiError::Internal(format!("Failed to read config {}: {}", path.display(), err))
    })?;
    match serde_yaml::from_str::<Value>(&contents) {
        Ok(Value::Object(map)) => Ok(Value::Object(map)),
        Ok(Value::Null) => Ok(Value::Object(Map::new())),
        Ok(_) => Err(ApiError::BadRequest(format!(
            "Invalid config at 'root': {} must contain a mapping",
            path.display()
        ))),
        Err(err) => Err(ApiError::BadRequest(format!(
            "Failed to parse config {}: {}",
            path.display(),
            err
        ))),
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}
