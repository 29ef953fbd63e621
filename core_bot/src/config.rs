//! Proxy configuration, read from a JSON file. Every field has a default
//! so a partial (or missing) file still yields a usable setup.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::session::element_types;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Port the game client is pointed at.
    pub listen_port: u16,
    /// Directory holding the extracted game data files.
    pub data_dir: PathBuf,
    /// Map ids the farming loop cycles through when the current map has
    /// nothing left to harvest.
    pub tour: Vec<i32>,
    /// Element type ids worth harvesting.
    pub wanted_resources: Vec<i32>,
    /// Actor id the forged requests impersonate.
    pub player_id: i64,
    pub player_name: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        ProxyConfig {
            listen_port: 5555,
            data_dir: PathBuf::from("data"),
            tour: Vec::new(),
            wanted_resources: vec![element_types::ASH, element_types::NETTLE],
            player_id: 69_420,
            player_name: "SneakySneaky".to_owned(),
        }
    }
}

impl ProxyConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<ProxyConfig, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}
