use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `data_dir` when set and non-empty
pub const DATA_DIR_ENV: &str = "FRAGMENT_INDEX_DATA_DIR";

/// Configuration for the file-backed page index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory holding `environments.json` and the `indexes/` documents
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Environment used when a command does not name one
    #[serde(default = "default_environment")]
    pub default_environment: String,

    /// Environments registered on startup
    #[serde(default)]
    pub environments: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_environment: default_environment(),
            environments: Vec::new(),
        }
    }
}

impl IndexConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Box<dyn Error>> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Apply the data directory override from the process environment
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.is_empty() {
                ::log::debug!("Using data directory {} from {}", dir, DATA_DIR_ENV);
                self.data_dir = PathBuf::from(dir);
            }
        }
        self
    }
}

/// Default value for data_dir
fn default_data_dir() -> PathBuf {
    PathBuf::from("./fragment-index-data")
}

/// Default value for default_environment
fn default_environment() -> String {
    "_default".to_string()
}
