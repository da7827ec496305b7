use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::AppConfig;
use super::validation::validate_config;
use crate::core::errors::ApiError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 8] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "supabase_key",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 2] = ["max_tokens", "tokens"];

/// Environment variables that override configuration values, as
/// `(variable, path within the document)`.
const ENV_OVERRIDES: [(&str, &[&str]); 6] = [
    ("PORT", &["server", "port"]),
    ("GEMINI_API_KEY", &["llm", "api_key"]),
    ("LLM_API_KEY", &["llm", "api_key"]),
    ("EMBEDDING_API_KEY", &["embedding", "api_key"]),
    ("SUPABASE_URL", &["audit", "supabase_url"]),
    ("SUPABASE_ANON_KEY", &["audit", "supabase_key"]),
];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("HANDBOOK_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Merged raw document: `config.yml`, then `secrets.yaml`, then env.
    pub fn load_config(&self) -> Result<Value, ApiError> {
        let public_config = load_yaml_file(&self.config_path());
        let secrets_config = load_yaml_file(&self.secrets_path());
        let mut merged = deep_merge(&public_config, &secrets_config);
        apply_env_overrides(&mut merged, |name| env::var(name).ok());
        Ok(merged)
    }

    /// Validated, typed configuration.
    pub fn load_app_config(&self) -> Result<AppConfig, ApiError> {
        let raw = self.load_config()?;
        parse_app_config(&raw)
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

pub fn parse_app_config(raw: &Value) -> Result<AppConfig, ApiError> {
    validate_config(raw)?;
    serde_json::from_value(raw.clone())
        .map_err(|e| ApiError::BadRequest(format!("Invalid configuration: {}", e)))
}

fn load_yaml_file(path: &Path) -> Value {
    if !path.exists() {
        return Value::Object(Map::new());
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Value>(&contents) {
            Ok(value) => match value {
                Value::Object(_) => value,
                _ => Value::Object(Map::new()),
            },
            Err(e) => {
                tracing::warn!("Ignoring unparsable config file {}: {}", path.display(), e);
                Value::Object(Map::new())
            }
        },
        Err(_) => Value::Object(Map::new()),
    }
}

fn apply_env_overrides<F>(config: &mut Value, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for (name, path) in ENV_OVERRIDES {
        let Some(raw) = lookup(name).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let value = match raw.parse::<u64>() {
            Ok(number) if path.last() == Some(&"port") => Value::from(number),
            _ => Value::String(raw),
        };
        set_path(config, path, value);
    }
}

fn set_path(config: &mut Value, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = config;
    for key in parents {
        if !current.get(*key).map(|v| v.is_object()).unwrap_or(false) {
            let Some(map) = current.as_object_mut() else {
                return;
            };
            map.insert((*key).to_string(), Value::Object(Map::new()));
        }
        let Some(next) = current.get_mut(*key) else {
            return;
        };
        current = next;
    }

    if let Some(map) = current.as_object_mut() {
        map.insert((*last).to_string(), value);
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

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_merge_lets_secrets_override_public_values() {
        let public_config = json!({
            "llm": { "model": "gemini-2.0-flash-lite", "api_key": null },
            "retrieval": { "top_k": 3 }
        });
        let secrets = json!({
            "llm": { "api_key": "abc" }
        });

        let merged = deep_merge(&public_config, &secrets);

        assert_eq!(
            merged,
            json!({
                "llm": { "model": "gemini-2.0-flash-lite", "api_key": "abc" },
                "retrieval": { "top_k": 3 }
            })
        );
    }

    #[test]
    fn env_overrides_create_missing_sections() {
        let mut config = json!({ "llm": { "model": "m" } });
        apply_env_overrides(&mut config, |name| match name {
            "PORT" => Some("8080".to_string()),
            "GEMINI_API_KEY" => Some("key".to_string()),
            "SUPABASE_URL" => Some("  ".to_string()),
            _ => None,
        });

        assert_eq!(
            config,
            json!({
                "llm": { "model": "m", "api_key": "key" },
                "server": { "port": 8080 }
            })
        );
    }

    #[test]
    fn redact_sensitive_values_replaces_secrets_only() {
        let input = json!({
            "llm": { "api_key": "secret", "model": "m" },
            "audit": { "supabase_key": "anon", "table": "Services" },
            "history": { "max_turns": 5 }
        });

        let redacted = redact_sensitive_values(&input);

        assert_eq!(
            redacted,
            json!({
                "llm": { "api_key": "****", "model": "m" },
                "audit": { "supabase_key": "****", "table": "Services" },
                "history": { "max_turns": 5 }
            })
        );
    }

    #[test]
    fn load_app_config_reads_yaml_and_secrets() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Arc::new(AppPaths::with_dirs(
            tmp.path().to_path_buf(),
            tmp.path().to_path_buf(),
        ));
        fs::write(
            tmp.path().join("config.yml"),
            "corpus:\n  text_path: handbook.txt\n  max_words: 250\nretrieval:\n  top_k: 4\n",
        )
        .unwrap();
        fs::write(&paths.secrets_path, "llm:\n  api_key: from-secrets\n").unwrap();

        let service = ConfigService::new(paths);
        let config = service.load_app_config().unwrap();

        assert_eq!(config.corpus.text_path.as_deref(), Some("handbook.txt"));
        assert_eq!(config.corpus.max_words, 250);
        assert_eq!(config.retrieval.top_k, 4);
        assert!(config.llm.api_key.is_some());
    }

    #[test]
    fn parse_app_config_rejects_invalid_values() {
        let err = parse_app_config(&json!({ "retrieval": { "top_k": 0 } })).unwrap_err();
        assert!(err.to_string().contains("retrieval.top_k"));
    }
}
