use crate::cli::ConfigCommands;
use crate::client_rb::{ClientRb, SaveMode};
use crate::error::{ChefCtlError, Result};
use std::path::Path;

pub fn execute(command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show { file } => show(file.as_deref()),
        ConfigCommands::Write {
            file,
            from,
            set,
            append,
            overwrite,
        } => write(file, from.as_deref(), set, *append, *overwrite),
    }
}

fn show(file: Option<&Path>) -> Result<()> {
    let doc = ClientRb::load(file)?;

    match file {
        Some(path) if path.exists() => println!("Configuration from {}:\n", path.display()),
        Some(path) => println!(
            "Configuration (defaults; {} does not exist):\n",
            path.display()
        ),
        None => println!("Configuration (defaults):\n"),
    }

    for (name, value) in doc.fields() {
        if value.is_empty() {
            println!("  {}: (unset)", name);
        } else {
            println!("  {}: {}", name, value);
        }
    }
    Ok(())
}

fn write(
    file: &Path,
    from: Option<&Path>,
    set: &[String],
    append: bool,
    overwrite: bool,
) -> Result<()> {
    let mut doc = ClientRb::load(from)?;
    for pair in set {
        let (name, value) = pair
            .split_once('=')
            .filter(|(name, _)| !name.is_empty())
            .ok_or_else(|| ChefCtlError::InvalidSetFlag(pair.clone()))?;
        doc.set_additional(name, value);
    }

    let mode = if overwrite {
        Some(SaveMode::Overwrite)
    } else if append {
        Some(SaveMode::Append)
    } else {
        None
    };

    doc.save(file, mode)?;
    println!("Wrote {}", file.display());
    Ok(())
}
