//! Output formatting for CLI results

use crate::cli::args::OutputFormat;
use crate::error::Result;
use crate::topology::{DeviceNode, SystemTopology};
use serde::Serialize;

/// One discovered root device, for serialization.
#[derive(Serialize)]
struct DiscoveredDevice<'a> {
    /// Bus address of the matched parent peripheral, when resolved
    attached_to: Option<String>,
    /// The device node with its subdevice children
    node: &'a DeviceNode,
}

/// Print every discovered accelerator in the requested format.
pub fn print_topology(topology: &SystemTopology, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let devices: Vec<DiscoveredDevice<'_>> = topology
                .accelerators()
                .map(|attachment| DiscoveredDevice {
                    attached_to: attachment.bus.map(|addr| addr.to_string()),
                    node: attachment.node,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&devices)?);
        }
        OutputFormat::Text => {
            let mut any = false;
            for attachment in topology.accelerators() {
                any = true;
                match attachment.bus {
                    Some(addr) => println!("{} @ {}", attachment.node.name, addr),
                    None => println!("{}", attachment.node.name),
                }
                print_node(attachment.node, 1);
            }
            if !any {
                println!("No accelerator devices found.");
            }
        }
    }
    Ok(())
}

fn print_node(node: &DeviceNode, depth: usize) {
    let pad = "  ".repeat(depth);
    for (key, value) in node.attrs() {
        println!("{pad}{key} = {value}");
    }
    for child in &node.children {
        println!("{pad}{}", child.name);
        print_node(child, depth + 1);
    }
}
