use crate::client_rb::{ClientRb, SaveMode};
use crate::error::{ChefCtlError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Configuration handed to a knife invocation.
pub enum ConfigSource<'a> {
    /// In-memory document, persisted to an ephemeral file for the call.
    Document(&'a ClientRb),
    /// Existing config file on disk.
    File(&'a Path),
}

/// Thin wrapper around the knife CLI.
pub struct Knife {
    bin: PathBuf,
}

impl Knife {
    pub fn new() -> Self {
        Knife {
            bin: PathBuf::from("knife"),
        }
    }

    /// Point at a specific knife binary (used by tests with stubs).
    pub fn with_bin(bin: impl Into<PathBuf>) -> Self {
        Knife { bin: bin.into() }
    }

    /// Check if knife is installed
    pub fn is_installed() -> bool {
        which::which("knife").is_ok()
    }

    /// Run `knife node list`, optionally against an explicit config.
    ///
    /// A document source is written to a process-unique temp file that is
    /// removed on every exit path, including knife failures; cleanup
    /// errors are swallowed by the drop. Returns knife's stdout verbatim.
    pub fn node_list(&self, config: Option<ConfigSource<'_>>) -> Result<String> {
        // Keep the guard alive until the process has finished.
        let mut _ephemeral: Option<tempfile::NamedTempFile> = None;

        let config_path: Option<PathBuf> = match config {
            None => None,
            Some(ConfigSource::File(path)) => {
                if !path.exists() {
                    return Err(ChefCtlError::ConfigNotFound(path.to_path_buf()));
                }
                Some(path.to_path_buf())
            }
            Some(ConfigSource::Document(doc)) => {
                let file = tempfile::Builder::new()
                    .prefix("chefctl-client-")
                    .suffix(".rb")
                    .tempfile()?;
                doc.save(file.path(), Some(SaveMode::Overwrite))?;
                let path = file.path().to_path_buf();
                _ephemeral = Some(file);
                Some(path)
            }
        };

        let mut cmd = Command::new(&self.bin);
        cmd.args(["node", "list"]);
        if let Some(ref path) = config_path {
            cmd.arg("-c").arg(path);
        }

        let output = cmd.output().map_err(|e| ChefCtlError::ProcessSpawn {
            name: "knife".to_string(),
            source: e,
        })?;

        if !output.status.success() {
            return Err(ChefCtlError::ProcessFailed {
                name: "knife".to_string(),
                code: output.status.code().unwrap_or(-1),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for Knife {
    fn default() -> Self {
        Self::new()
    }
}
