use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "hierarchy.json";
pub const CONFIGS_PATH_ENV: &str = "CONFIGS_PATH";

fn default_size_cutoff() -> f64 {
    16.0
}

fn default_max_headings() -> usize {
    40
}

/// The only tunables of a reconstruction pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// Minimum rank treated as a heading.
    #[serde(default = "default_size_cutoff")]
    pub size_cutoff: f64,
    /// A rank seen more often than this is body-text styling, not a heading level.
    #[serde(default = "default_max_headings")]
    pub max_headings: usize,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            size_cutoff: default_size_cutoff(),
            max_headings: default_max_headings(),
        }
    }
}

impl HierarchyConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {CONFIG_FILE_NAME}: {e}"))?;
        let config: HierarchyConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse {CONFIG_FILE_NAME}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `hierarchy.json` from the directory named by `CONFIGS_PATH`, or
    /// falls back to the defaults when the variable or the file is absent.
    pub fn load_default() -> Result<Self, String> {
        match std::env::var(CONFIGS_PATH_ENV) {
            Ok(dir) => {
                let path = Path::new(&dir).join(CONFIG_FILE_NAME);
                if path.exists() {
                    Self::load_from_file(path)
                } else {
                    tracing::debug!(
                        "[Config] {} not found in {}, using defaults",
                        CONFIG_FILE_NAME,
                        dir
                    );
                    Ok(Self::default())
                }
            }
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.size_cutoff.is_finite() || self.size_cutoff <= 0.0 {
            return Err(format!(
                "size_cutoff must be a positive number, got {}",
                self.size_cutoff
            ));
        }
        if self.max_headings == 0 {
            return Err("max_headings must be at least 1".to_string());
        }
        Ok(())
    }
}
