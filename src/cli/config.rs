// FILE: src/cli/config.rs

use crate::error::{Result, ValidatorError};
use crate::ValidationProfile;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub profile: Option<ValidationProfile>,
    pub tag_name: Option<String>,
    pub max_bytes: Option<usize>,
    pub check_selectors: Option<bool>,
    pub check_media_queries: Option<bool>,
    pub check_unknown_at_rules: Option<bool>,
    pub extract_urls: Option<bool>,
    /// File extensions picked up when checking directories
    pub extensions: Option<Vec<String>>,
    /// Regular expressions matched against paths to skip
    pub exclude: Option<Vec<String>>,
}

impl ConfigFile {
    pub fn exclude_patterns(&self) -> Result<Vec<Regex>> {
        self.exclude
            .iter()
            .flatten()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    ValidatorError::invalid_format(format!("Invalid exclude pattern '{}': {}", pattern, e))
                })
            })
            .collect()
    }

    pub fn extensions(&self) -> Vec<String> {
        self.extensions.clone().unwrap_or_else(|| vec!["css".to_string()])
    }
}

pub fn load(config_path: &str) -> Result<ConfigFile> {
    let config_content = fs::read_to_string(config_path)
        .map_err(|e| ValidatorError::file_not_found(format!("Config file {}: {}", config_path, e)))?;

    let config = if config_path.ends_with(".json") {
        serde_json::from_str(&config_content)
            .map_err(|e| ValidatorError::invalid_format(format!("Invalid JSON config: {}", e)))?
    } else if config_path.ends_with(".toml") {
        toml::from_str(&config_content)
            .map_err(|e| ValidatorError::invalid_format(format!("Invalid TOML config: {}", e)))?
    } else {
        return Err(ValidatorError::invalid_format(
            "Config file must be .json or .toml format",
        ));
    };

    log::info!("Loaded configuration from {}", config_path);
    Ok(config)
}
