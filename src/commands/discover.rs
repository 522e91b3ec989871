//! Discover command implementation
//!
//! Runs one discovery pass against the real Level Zero loader and prints
//! the nodes that would be grafted into a host topology.

use crate::cli::args::{DiscoverArgs, OutputFormat};
use crate::cli::output::print_topology;
use crate::config::DiscoveryConfig;
use crate::discovery;
use crate::error::{Result, ZeError};
use crate::session::DiscoverySession;
use crate::topology::SystemTopology;
use crate::ze::ZeLoader;

/// Execute the discover command
pub fn run_discover(args: &DiscoverArgs, format: OutputFormat) -> Result<()> {
    let mut config = DiscoveryConfig::from_env();
    if let Some(source) = args.memory_source {
        config.memory_source = source;
    }

    let mut topology = SystemTopology::new();
    let mut session = DiscoverySession::new(config);

    match ZeLoader::new() {
        Ok(platform) => discovery::discover(&platform, &mut topology, &mut session),
        // No loader installed means no accelerators, same as a runtime
        // that fails to initialize.
        Err(ZeError::LibraryNotFound) => {
            log::warn!("{}", ZeError::LibraryNotFound);
        }
        Err(e) => return Err(e.into()),
    }

    print_topology(&topology, format)
}
