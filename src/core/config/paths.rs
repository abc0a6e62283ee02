use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub log_dir: PathBuf,
    pub config_path: PathBuf,
    /// Optional `.env` file holding the provider keys.
    pub env_file: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        Self::with_root(project_root)
    }

    pub fn with_root(project_root: PathBuf) -> Self {
        let log_dir = project_root.join("logs");
        let config_path = env::var("PDOT_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| project_root.join("config.yml"));
        let env_file = project_root.join(".env");

        AppPaths {
            project_root,
            log_dir,
            config_path,
            env_file,
        }
    }

    /// Relative paths from the config are anchored at the project root.
    pub fn resolve(&self, raw: impl AsRef<Path>) -> PathBuf {
        let candidate = raw.as_ref();
        if candidate.is_absolute() {
            return candidate.to_path_buf();
        }
        self.project_root.join(candidate)
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("PDOT_ROOT") {
        return PathBuf::from(root);
    }

    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
