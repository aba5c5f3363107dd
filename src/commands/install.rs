use crate::cli::InstallCmd;
use crate::error::Result;
use crate::install::{InstallPlan, Installer};

pub fn execute(cmd: &InstallCmd) -> Result<()> {
    let plan = InstallPlan {
        package: cmd.msi.clone(),
        install_dir: cmd.install_dir.clone(),
        config_path: cmd.config.clone(),
        log_path: cmd.log.clone(),
    };

    println!("Installing agent from {}", plan.package.display());
    println!("Install location: {}", plan.install_dir.display());

    let search_path = std::env::var("PATH").unwrap_or_default();
    let search_path = Installer::new().install(&plan, &search_path)?;

    println!("Service configured: start command and failure recovery set.");
    println!("Search path for agent tools: {}", search_path);
    Ok(())
}
