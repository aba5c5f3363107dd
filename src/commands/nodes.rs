use crate::cli::NodesCmd;
use crate::error::{ChefCtlError, Result};
use crate::knife::{ConfigSource, Knife};

pub fn execute(cmd: &NodesCmd) -> Result<()> {
    if !Knife::is_installed() {
        return Err(ChefCtlError::KnifeNotInstalled);
    }

    let knife = Knife::new();
    let output = match &cmd.config {
        Some(path) => knife.node_list(Some(ConfigSource::File(path)))?,
        None => knife.node_list(None)?,
    };

    print!("{}", output);
    Ok(())
}
