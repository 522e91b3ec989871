//! Attachment resolver
//!
//! Correlates a discovered device with the bus-peripheral node an earlier
//! bus scan placed in the host topology, falling back to the topology root.

use crate::topology::{HostTopology, NodeId};
use crate::ze::AccelDevice;

/// Resolve the parent node for a device.
///
/// A matched bus peripheral also receives the derived link speed when the
/// runtime reports a bandwidth.
pub fn resolve<D: AccelDevice, T: HostTopology>(device: &D, topology: &mut T) -> NodeId {
    if let Ok(bus) = device.bus_properties() {
        if let Some(parent) = topology.find_bus_peripheral(&bus.address) {
            if let Some(gbps) = bus.link_speed_gbps() {
                topology.set_link_speed(parent, gbps);
            }
            return parent;
        }
        log::debug!("no topology node at bus address {}", bus.address);
    }
    topology.root()
}
