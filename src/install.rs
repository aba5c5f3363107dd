use crate::error::{ChefCtlError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

pub const SERVICE_NAME: &str = "chef-client";

/// Feature selectors handed to the platform installer. Fixed; the agent
/// service and its scheduled-task companion are always installed.
const INSTALLER_FEATURES: &str = "ADDLOCAL=ChefClientFeature,ChefSchTaskFeature";

/// Everything an install run needs to know up front.
pub struct InstallPlan {
    pub package: PathBuf,
    pub install_dir: PathBuf,
    pub config_path: PathBuf,
    pub log_path: PathBuf,
}

impl InstallPlan {
    pub fn bin_dir(&self) -> PathBuf {
        self.install_dir.join("bin")
    }
}

/// Wrapper over the package installer and the service-control utility.
/// Both are opaque collaborators: argv in, exit status out.
pub struct Installer {
    installer_bin: PathBuf,
    service_bin: PathBuf,
}

impl Installer {
    pub fn new() -> Self {
        Installer {
            installer_bin: PathBuf::from("msiexec"),
            service_bin: PathBuf::from("sc"),
        }
    }

    /// Point at specific binaries (used by tests with stubs).
    pub fn with_bins(installer_bin: impl Into<PathBuf>, service_bin: impl Into<PathBuf>) -> Self {
        Installer {
            installer_bin: installer_bin.into(),
            service_bin: service_bin.into(),
        }
    }

    /// Install the agent package and wire up its service.
    ///
    /// Returns the amended search path so callers can thread it into any
    /// later process invocations; the parent process environment is never
    /// mutated.
    pub fn install(&self, plan: &InstallPlan, search_path: &str) -> Result<String> {
        self.run_installer(plan)?;

        let search_path = amend_search_path(search_path, &plan.bin_dir());
        self.configure_service_recovery(&search_path)?;
        self.configure_service_command(plan, &search_path)?;

        Ok(search_path)
    }

    fn run_installer(&self, plan: &InstallPlan) -> Result<()> {
        let mut cmd = Command::new(&self.installer_bin);
        cmd.arg("/qn")
            .arg("/i")
            .arg(&plan.package)
            .arg(INSTALLER_FEATURES)
            .arg(format!(
                "INSTALLLOCATION={}",
                plan.install_dir.display()
            ));
        run_checked("installer", &mut cmd)
    }

    /// Restart the service a minute after a crash, with a daily reset of
    /// the failure counter.
    fn configure_service_recovery(&self, search_path: &str) -> Result<()> {
        let mut cmd = Command::new(&self.service_bin);
        cmd.args([
            "failure",
            SERVICE_NAME,
            "reset=",
            "86400",
            "actions=",
            "restart/60000",
        ])
        .env("PATH", search_path);
        run_checked("sc failure", &mut cmd)
    }

    /// Rewrite the service start command to point at the new install.
    fn configure_service_command(&self, plan: &InstallPlan, search_path: &str) -> Result<()> {
        let start_cmd = format!(
            "{} -c {} -L {}",
            plan.bin_dir().join(SERVICE_NAME).display(),
            plan.config_path.display(),
            plan.log_path.display()
        );

        let mut cmd = Command::new(&self.service_bin);
        cmd.args(["config", SERVICE_NAME])
            .arg(format!("binPath={}", start_cmd))
            .env("PATH", search_path);
        run_checked("sc config", &mut cmd)
    }
}

impl Default for Installer {
    fn default() -> Self {
        Self::new()
    }
}

fn run_checked(name: &str, cmd: &mut Command) -> Result<()> {
    let status = cmd.status().map_err(|e| ChefCtlError::ProcessSpawn {
        name: name.to_string(),
        source: e,
    })?;

    if !status.success() {
        return Err(ChefCtlError::ProcessFailed {
            name: name.to_string(),
            code: status.code().unwrap_or(-1),
        });
    }

    Ok(())
}

/// Append `bin_dir` to a PATH-style search string iff not already present.
pub fn amend_search_path(current: &str, bin_dir: &Path) -> String {
    if std::env::split_paths(current).any(|p| p == bin_dir) {
        return current.to_string();
    }
    let bin = bin_dir.to_string_lossy();
    if current.is_empty() {
        bin.into_owned()
    } else {
        format!("{}:{}", current, bin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn stub_bin(dir: &TempDir, name: &str, script: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "#!/bin/sh\n{}", script).unwrap();
        let mut perms = file.metadata().unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn plan(dir: &TempDir) -> InstallPlan {
        InstallPlan {
            package: dir.path().join("chef-client.msi"),
            install_dir: dir.path().join("opt/chef"),
            config_path: dir.path().join("etc/client.rb"),
            log_path: dir.path().join("log/chef.log"),
        }
    }

    #[test]
    fn test_amend_search_path_appends_once() {
        let bin = Path::new("/opt/chef/bin");
        let amended = amend_search_path("/usr/bin:/bin", bin);
        assert_eq!(amended, "/usr/bin:/bin:/opt/chef/bin");

        // Idempotent.
        assert_eq!(amend_search_path(&amended, bin), amended);
    }

    #[test]
    fn test_amend_search_path_empty_base() {
        assert_eq!(
            amend_search_path("", Path::new("/opt/chef/bin")),
            "/opt/chef/bin"
        );
    }

    #[test]
    fn test_install_invokes_installer_and_service_config() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("calls.log");
        let script = format!("echo \"$0 $@\" >> {}", log.display());
        let installer_bin = stub_bin(&dir, "msiexec", &script);
        let service_bin = stub_bin(&dir, "sc", &script);

        let installer = Installer::with_bins(&installer_bin, &service_bin);
        let plan = plan(&dir);
        let path = installer.install(&plan, "/usr/bin").unwrap();
        assert_eq!(
            path,
            format!("/usr/bin:{}", plan.bin_dir().display())
        );

        let calls = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<_> = calls.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("/qn /i"));
        assert!(lines[0].contains("ADDLOCAL=ChefClientFeature,ChefSchTaskFeature"));
        assert!(lines[1].contains("failure chef-client reset= 86400 actions= restart/60000"));
        assert!(lines[2].contains("config chef-client binPath="));
        assert!(lines[2].contains("-c"));
        assert!(lines[2].contains("-L"));
    }

    #[test]
    fn test_service_calls_receive_amended_path() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("env.log");
        let installer_bin = stub_bin(&dir, "msiexec", "exit 0");
        let service_bin = stub_bin(
            &dir,
            "sc",
            &format!("echo \"$PATH\" >> {}", log.display()),
        );

        let installer = Installer::with_bins(&installer_bin, &service_bin);
        let plan = plan(&dir);
        installer.install(&plan, "/usr/bin").unwrap();

        let envs = std::fs::read_to_string(&log).unwrap();
        let expected = format!("/usr/bin:{}", plan.bin_dir().display());
        for line in envs.lines() {
            assert_eq!(line, expected);
        }
        assert_eq!(envs.lines().count(), 2);
    }

    #[test]
    fn test_installer_failure_surfaces_exit_code() {
        let dir = TempDir::new().unwrap();
        let installer_bin = stub_bin(&dir, "msiexec", "exit 3");
        let service_bin = stub_bin(&dir, "sc", "exit 0");

        let installer = Installer::with_bins(&installer_bin, &service_bin);
        let err = installer.install(&plan(&dir), "/usr/bin").unwrap_err();
        match err {
            ChefCtlError::ProcessFailed { name, code } => {
                assert_eq!(name, "installer");
                assert_eq!(code, 3);
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
