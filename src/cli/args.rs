//! CLI argument definitions using clap derive

use crate::config::MemorySourceOverride;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Level Zero accelerator discovery tool
///
/// Runs one discovery pass over the Level Zero runtime and prints the
/// accelerator nodes it would graft into a system topology tree.
#[derive(Parser, Debug)]
#[command(name = "zetopo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover accelerator devices and print the resulting nodes
    Discover(DiscoverArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the discover command
#[derive(Parser, Debug)]
pub struct DiscoverArgs {
    /// Memory inventory source (basic, detailed, basic-ddr; default automatic)
    #[arg(long, env = "ZETOPO_MEMORY_SOURCE")]
    pub memory_source: Option<MemorySourceOverride>,
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable tree
    #[default]
    Text,
    /// JSON for machine parsing
    Json,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
