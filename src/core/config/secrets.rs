use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;

const REDACT_PLACEHOLDER: &str = "****";

pub const EMBEDDINGS_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const GENERATION_KEY_VAR: &str = "OPENAI_API_KEY";

/// Provider API key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACT_PLACEHOLDER)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("missing required environment variable {0}")]
pub struct MissingSecret(pub &'static str);

/// Secrets read from the process environment, with a `.env` file as fallback.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub embeddings_key: Option<ApiKey>,
    pub generation_key: Option<ApiKey>,
}

impl Secrets {
    /// Process environment first, then `dotenv_path` for keys it lacks.
    pub fn from_env(dotenv_path: &Path) -> Self {
        Self::layered(dotenv_path, |name| env::var(name).ok())
    }

    fn layered<F>(dotenv_path: &Path, env_lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_vars = read_dotenv(dotenv_path);
        Self::from_lookup(|name| {
            env_lookup(name)
                .filter(|value| !value.trim().is_empty())
                .or_else(|| file_vars.get(name).cloned())
        })
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(ApiKey::new)
        };
        Self {
            embeddings_key: read(EMBEDDINGS_KEY_VAR),
            generation_key: read(GENERATION_KEY_VAR),
        }
    }

    pub fn require_embeddings(&self) -> Result<ApiKey, MissingSecret> {
        self.embeddings_key
            .clone()
            .ok_or(MissingSecret(EMBEDDINGS_KEY_VAR))
    }

    pub fn require_generation(&self) -> Result<ApiKey, MissingSecret> {
        self.generation_key
            .clone()
            .ok_or(MissingSecret(GENERATION_KEY_VAR))
    }
}

fn read_dotenv(path: &Path) -> HashMap<String, String> {
    if !path.is_file() {
        return HashMap::new();
    }

    match dotenvy::from_path_iter(path) {
        Ok(iter) => iter
            .filter_map(|item| match item {
                Ok(pair) => Some(pair),
                Err(err) => {
                    tracing::warn!("Ignoring malformed line in {}: {}", path.display(), err);
                    None
                }
            })
            .collect(),
        Err(err) => {
            tracing::warn!("Failed to read {}: {}", path.display(), err);
            HashMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_count_as_missing() {
        let secrets = Secrets::from_lookup(|name| match name {
            EMBEDDINGS_KEY_VAR => Some("  ".to_string()),
            GENERATION_KEY_VAR => Some("sk-test".to_string()),
            _ => None,
        });

        assert_eq!(
            secrets.require_embeddings().unwrap_err(),
            MissingSecret(EMBEDDINGS_KEY_VAR)
        );
        assert_eq!(secrets.require_generation().unwrap().expose(), "sk-test");
    }

    #[test]
    fn dotenv_file_supplies_keys() {
        let dir = tempfile::tempdir().unwrap();
        let dotenv = dir.path().join(".env");
        std::fs::write(
            &dotenv,
            "# claves locales\nPDOT_TEST_ONLY_KEY=x\nGOOGLE_API_KEY=g-from-file\nOPENAI_API_KEY=\"sk-from-file\"\n",
        )
        .unwrap();

        let vars = read_dotenv(&dotenv);
        assert_eq!(vars.get("GOOGLE_API_KEY").map(String::as_str), Some("g-from-file"));
        assert_eq!(vars.get("OPENAI_API_KEY").map(String::as_str), Some("sk-from-file"));
    }

    #[test]
    fn missing_dotenv_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_dotenv(&dir.path().join(".env")).is_empty());
    }

    #[test]
    fn environment_wins_over_dotenv_file() {
        let dir = tempfile::tempdir().unwrap();
        let dotenv = dir.path().join(".env");
        std::fs::write(&dotenv, "GOOGLE_API_KEY=g-file\nOPENAI_API_KEY=sk-file\n").unwrap();

        let secrets = Secrets::layered(&dotenv, |name| match name {
            GENERATION_KEY_VAR => Some("sk-env".to_string()),
            EMBEDDINGS_KEY_VAR => Some(" ".to_string()),
            _ => None,
        });

        assert_eq!(secrets.require_embeddings().unwrap().expose(), "g-file");
        assert_eq!(secrets.require_generation().unwrap().expose(), "sk-env");
    }

    #[test]
    fn no_env_and_no_file_is_still_missing() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = Secrets::layered(&dir.path().join(".env"), |_| None);
        assert!(secrets.require_embeddings().is_err());
        assert!(secrets.require_generation().is_err());
    }

    #[test]
    fn debug_output_is_redacted() {
        let secrets = Secrets::from_lookup(|_| Some("super-secret".to_string()));
        let printed = format!("{:?}", secrets);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains(REDACT_PLACEHOLDER));
    }
}
