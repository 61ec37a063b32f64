use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::core::capability::{CapabilityTable, ModelCapability};

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    /// Tutoring mode selected at startup (e.g. "solver", "hint-coach").
    pub default_mode: Option<String>,
    /// API root override; the built-in default targets the hosted
    /// Generative Language endpoint.
    pub base_url: Option<String>,
    /// Extra capability rows appended after the built-in table. Order
    /// matters for the image fallback, so custom rows never preempt the
    /// built-ins.
    #[serde(default)]
    pub custom_models: Vec<ModelCapability>,
}

impl Config {
    pub fn load() -> Result<Config, Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path();
        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(config_path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path();
        self.save_to_path(&config_path)
    }

    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    fn get_config_path() -> PathBuf {
        let proj_dirs = ProjectDirs::from("org", "permacommons", "sugil")
            .expect("Failed to determine config directory");
        proj_dirs.config_dir().join("config.toml")
    }

    /// Built-in capability table with any custom rows appended.
    pub fn capability_table(&self) -> CapabilityTable {
        let mut rows = CapabilityTable::builtin().rows().to_vec();
        rows.extend(self.custom_models.iter().cloned());
        CapabilityTable::new(rows)
    }
}
