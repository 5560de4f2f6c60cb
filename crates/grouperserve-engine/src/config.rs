//! Grouper engine configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the system registry and the engine cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrouperConfig {
    /// Root directory holding the systems list and one workspace per version
    #[serde(default = "default_specs_dir")]
    pub specs_dir: PathBuf,

    /// Systems list file name, relative to `specs_dir`
    #[serde(default = "default_systems_file")]
    pub systems_file: String,

    /// Maximum number of loaded engine sets kept in memory
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl GrouperConfig {
    pub fn systems_path(&self) -> PathBuf {
        self.specs_dir.join(&self.systems_file)
    }
}

impl Default for GrouperConfig {
    fn default() -> Self {
        Self {
            specs_dir: default_specs_dir(),
            systems_file: default_systems_file(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_specs_dir() -> PathBuf {
    PathBuf::from("grouperspecs")
}

fn default_systems_file() -> String {
    "systems.json".to_string()
}

fn default_cache_capacity() -> usize {
    8
}
