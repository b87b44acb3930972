use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::store::ConnectionDescriptor;

pub const DEFAULT_CONFIG_FILE: &str = "census-sync.json";

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub database_url: String,
    pub data_dir: String,
    pub first_year: i32,
    pub last_year_exclusive: Option<i32>,
    pub state_fips: String,
    pub census_base_url: String,
    pub shape_url: String,
    pub verify_tls: bool,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:///db.sqlite".to_string(),
            data_dir: "data".to_string(),
            first_year: 2012,
            last_year_exclusive: None,
            state_fips: "72".to_string(),
            census_base_url: "https://api.census.gov/data".to_string(),
            shape_url: "https://www2.census.gov/geo/tiger/TIGER2024/COUSUB/tl_2024_72_cousub.zip"
                .to_string(),
            verify_tls: true,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub store: ConnectionDescriptor,
    pub data_dir: Utf8PathBuf,
    pub first_year: i32,
    pub last_year_exclusive: Option<i32>,
    pub state_fips: String,
    pub census_base_url: String,
    pub shape_url: String,
    pub verify_tls: bool,
    pub timeout: Duration,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist; the default file is optional.
    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<SyncConfig, SyncError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| SyncError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content).map_err(|err| SyncError::ConfigParse(err.to_string()))?
        };

        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: ConfigOverrides,
    ) -> Result<SyncConfig, SyncError> {
        let database_url = overrides.database_url.unwrap_or(config.database_url);
        let data_dir = overrides.data_dir.unwrap_or(config.data_dir);

        if let Some(last) = config.last_year_exclusive {
            if last < config.first_year {
                return Err(SyncError::ConfigParse(format!(
                    "last_year_exclusive {last} is before first_year {}",
                    config.first_year
                )));
            }
        }

        Ok(SyncConfig {
            store: database_url.parse()?,
            data_dir: Utf8PathBuf::from(data_dir),
            first_year: config.first_year,
            last_year_exclusive: config.last_year_exclusive,
            state_fips: config.state_fips,
            census_base_url: config.census_base_url,
            shape_url: config.shape_url,
            verify_tls: config.verify_tls,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}
