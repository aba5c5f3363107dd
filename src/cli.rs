use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chefctl")]
#[command(about = "Install and manage a Chef client agent on this host", long_about = None)]
#[command(version = env!("CHEFCTL_VERSION"))]
#[command(after_help = "\
EXAMPLES:
  chefctl install --msi ./chef-client.msi
  chefctl config show /etc/chef/client.rb
  chefctl config write /etc/chef/client.rb --set node_name=web01 --append
  chefctl nodes -c /etc/chef/client.rb
  chefctl hints --output-dir /etc/chef/ohai/hints

For details about a specific command, use:
  chefctl <command> --help")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the agent package and configure its service
    Install(InstallCmd),

    /// Inspect and rewrite the agent's client.rb
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// List the nodes registered with the Chef server
    Nodes(NodesCmd),

    /// Write the azure.json Ohai hints file for the agent's plugins
    Hints(HintsCmd),
}

#[derive(Parser, Debug)]
pub struct InstallCmd {
    /// Path to the agent installer package
    #[arg(long)]
    pub msi: PathBuf,

    /// Directory to install the agent into
    #[arg(long, default_value = "/opt/chef")]
    pub install_dir: PathBuf,

    /// Config file the service will run with
    #[arg(long, default_value = "/etc/chef/client.rb")]
    pub config: PathBuf,

    /// Log file the service will write to
    #[arg(long, default_value = "/var/log/chef/client.log")]
    pub log: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration, defaults included
    Show {
        /// Config file to load (defaults alone if omitted or missing)
        file: Option<PathBuf>,
    },

    /// Write a configuration file, merging or replacing as requested
    Write {
        /// Destination config file
        file: PathBuf,

        /// Base document to load before applying --set values
        #[arg(long)]
        from: Option<PathBuf>,

        /// Field override as name=value; may be repeated
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// Merge into the existing file, keeping unrecognized lines
        #[arg(long, conflicts_with = "overwrite")]
        append: bool,

        /// Replace the existing file entirely
        #[arg(long)]
        overwrite: bool,
    },
}

#[derive(Parser, Debug)]
pub struct NodesCmd {
    /// Config file to pass to knife via -c
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct HintsCmd {
    /// Directory to write azure.json into
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Helper binary that prints role-instance metadata as JSON
    #[arg(long, default_value = "azure-metadata", env = "CHEFCTL_METADATA_BIN")]
    pub metadata_bin: PathBuf,
}
