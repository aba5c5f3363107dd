use crate::cli::HintsCmd;
use crate::error::Result;
use crate::hints::{export_hints, CommandSource};

pub fn execute(cmd: &HintsCmd) -> Result<()> {
    let source = CommandSource::new(&cmd.metadata_bin);
    let path = export_hints(&source, &cmd.output_dir)?;
    println!("Wrote hints to {}", path.display());
    Ok(())
}
