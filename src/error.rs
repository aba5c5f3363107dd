use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChefCtlError {
    #[error("knife not installed. Install the Chef Workstation tools first")]
    KnifeNotInstalled,

    #[error("{name} exited with status {code}")]
    ProcessFailed { name: String, code: i32 },

    #[error("Failed to run {name}: {source}")]
    ProcessSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Config file already exists: {0}. Pass --append to merge into it or --overwrite to replace it"
    )]
    ConfigExists(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Invalid --set value '{0}': expected name=value")]
    InvalidSetFlag(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChefCtlError>;
