//! Discovery controller
//!
//! Drives the whole scan: drivers, devices, subdevices, then the collectors
//! per device, then attachment into the host tree. The controller never
//! fails; every vendor-API problem degrades to fewer nodes or fewer
//! attributes.

pub mod attach;
pub mod memory;
pub mod properties;
pub mod queues;

use crate::config::{self, SysmanHint};
use crate::session::DiscoverySession;
use crate::topology::{DeviceNode, HostTopology, NodeKind};
use crate::ze::{AccelDevice, AccelPlatform};

/// Run one discovery pass, grafting accelerator nodes into `topology`.
///
/// Returns immediately, with zero vendor-API calls, when the host filters
/// accelerator nodes out entirely. A runtime that fails to initialize
/// yields zero devices; absence of accelerator support is not an error.
pub fn discover<P, T>(platform: &P, topology: &mut T, session: &mut DiscoverySession)
where
    P: AccelPlatform,
    T: HostTopology,
{
    if !topology.keeps_accelerator_nodes() {
        return;
    }

    // Ask the runtime to create management devices. Must happen before the
    // runtime initializes; callers that set the switch themselves are left
    // alone.
    if session.config().sysman_hint == SysmanHint::EnabledLate {
        std::env::set_var(config::ENV_ENABLE_SYSMAN, "1");
    }

    if let Err(e) = platform.init() {
        log::warn!("failed to initialize Level Zero runtime: {e}");
        return;
    }

    let driver_count = match platform.driver_count() {
        Ok(count) => count,
        Err(e) => {
            log::debug!("driver enumeration failed: {e}");
            return;
        }
    };

    for driver_index in 0..driver_count {
        let devices = match platform.devices(driver_index) {
            Ok(devices) => devices,
            Err(e) => {
                log::debug!("device enumeration failed for driver {driver_index}: {e}");
                continue;
            }
        };
        // A driver with zero devices is skipped, not an error.
        for (device_index, device) in devices.iter().enumerate() {
            discover_device(
                device,
                driver_index,
                device_index as u32,
                topology,
                session,
            );
        }
    }
}

/// Build and attach the node hierarchy for one root device.
fn discover_device<D, T>(
    device: &D,
    driver_index: u32,
    device_index: u32,
    topology: &mut T,
    session: &mut DiscoverySession,
) where
    D: AccelDevice,
    T: HostTopology,
{
    let seq = session.next_sequence();
    let mut root = DeviceNode::new(format!("accel{seq}"), NodeKind::Root);
    root.add_attr("Backend", "LevelZero");
    root.add_attr("LevelZeroDriverIndex", driver_index.to_string());
    root.add_attr("LevelZeroDriverDeviceIndex", device_index.to_string());

    let is_integrated = properties::collect(device, &mut root, session, true).unwrap_or(false);
    queues::collect(device, &mut root);

    let subdevices = match device.subdevices() {
        Ok(subdevices) => subdevices,
        Err(e) => {
            // Degrade to "no subdevices" for this device only.
            log::debug!("subdevice enumeration failed on {}: {e}", root.name);
            Vec::new()
        }
    };

    let mut sub_nodes = Vec::with_capacity(subdevices.len());
    if !subdevices.is_empty() {
        root.add_attr("LevelZeroSubdevices", subdevices.len().to_string());
        for (k, sub) in subdevices.iter().enumerate() {
            let mut sub_node = DeviceNode::new(format!("accel{seq}.{k}"), NodeKind::Sub);
            sub_node.add_attr("Backend", "LevelZero");
            sub_node.add_attr("LevelZeroSubdeviceID", k.to_string());
            // The integration flag is irrelevant below root level.
            properties::collect(sub, &mut sub_node, session, false);
            queues::collect(sub, &mut sub_node);
            sub_nodes.push(sub_node);
        }
    }

    // All memory info at once, for the device together with its subdevices.
    memory::collect(
        device,
        &mut root,
        is_integrated,
        &subdevices,
        &mut sub_nodes,
        session,
    );

    let parent = attach::resolve(device, topology);
    root.children = sub_nodes;
    topology.insert(parent, root);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiscoveryConfig;
    use crate::domain::{
        BusAddress, BusProperties, DeviceFlags, DeviceProperties, MemoryKind, MemoryModule,
    };
    use crate::error::ZeError;
    use crate::mock::{MockAccel, MockPlatform};
    use crate::topology::SystemTopology;

    fn session() -> DiscoverySession {
        DiscoverySession::new(DiscoveryConfig::default())
    }

    fn gpu() -> MockAccel {
        MockAccel::new().with_properties(DeviceProperties {
            kind_raw: 1,
            flags: DeviceFlags(0),
            num_slices: 1,
            num_subslices_per_slice: 1,
            num_eus_per_subslice: 8,
            num_threads_per_eu: 7,
        })
    }

    #[test]
    fn test_zero_drivers_zero_nodes() {
        let platform = MockPlatform::new();
        let mut topo = SystemTopology::new();
        discover(&platform, &mut topo, &mut session());
        assert_eq!(topo.accelerators().count(), 0);
    }

    #[test]
    fn test_filtered_topology_makes_no_vendor_calls() {
        let platform = MockPlatform::new().with_driver(vec![gpu()]);
        let mut topo = SystemTopology::new().with_accelerator_filter(false);
        discover(&platform, &mut topo, &mut session());
        assert_eq!(topo.accelerators().count(), 0);
        assert_eq!(platform.init_calls(), 0);
    }

    #[test]
    fn test_init_failure_is_soft() {
        let platform = MockPlatform::new()
            .with_driver(vec![gpu()])
            .with_init_error(ZeError::InitializationFailed("no hardware".into()));
        let mut topo = SystemTopology::new();
        discover(&platform, &mut topo, &mut session());
        assert_eq!(topo.accelerators().count(), 0);
    }

    #[test]
    fn test_single_device_node_shape() {
        let platform = MockPlatform::new().with_driver(vec![gpu()]);
        let mut topo = SystemTopology::new();
        discover(&platform, &mut topo, &mut session());

        let nodes: Vec<_> = topo.accelerators().collect();
        assert_eq!(nodes.len(), 1);
        let node = nodes[0].node;
        assert_eq!(node.name, "accel0");
        assert_eq!(node.attr("Backend"), Some("LevelZero"));
        assert_eq!(node.attr("LevelZeroDriverIndex"), Some("0"));
        assert_eq!(node.attr("LevelZeroDriverDeviceIndex"), Some("0"));
        assert_eq!(node.attr("LevelZeroDeviceType"), Some("GPU"));
        assert_eq!(node.attr("LevelZeroSubdevices"), None);
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_sequence_spans_drivers() {
        let platform = MockPlatform::new()
            .with_driver(vec![gpu(), gpu()])
            .with_driver(vec![])
            .with_driver(vec![gpu()]);
        let mut topo = SystemTopology::new();
        discover(&platform, &mut topo, &mut session());

        let names: Vec<_> = topo.accelerators().map(|a| a.node.name.clone()).collect();
        assert_eq!(names, vec!["accel0", "accel1", "accel2"]);
        let drivers: Vec<_> = topo
            .accelerators()
            .map(|a| a.node.attr("LevelZeroDriverIndex").unwrap().to_string())
            .collect();
        assert_eq!(drivers, vec!["0", "0", "2"]);
    }

    #[test]
    fn test_subdevice_nodes_match_enumeration() {
        let device = gpu().with_subdevices(vec![gpu(), gpu(), gpu()]);
        let platform = MockPlatform::new().with_driver(vec![device]);
        let mut topo = SystemTopology::new();
        discover(&platform, &mut topo, &mut session());

        let nodes: Vec<_> = topo.accelerators().collect();
        let root = nodes[0].node;
        assert_eq!(root.attr("LevelZeroSubdevices"), Some("3"));
        assert_eq!(root.children.len(), 3);
        for (k, child) in root.children.iter().enumerate() {
            assert_eq!(child.name, format!("accel0.{k}"));
            assert_eq!(child.attr("LevelZeroSubdeviceID"), Some(k.to_string().as_str()));
            assert_eq!(child.attr("Backend"), Some("LevelZero"));
        }
    }

    #[test]
    fn test_subdevice_enumeration_failure_degrades_to_none() {
        let broken = gpu().with_subdevices_error(ZeError::Unknown("bad".into()));
        let fine = gpu().with_subdevices(vec![gpu()]);
        let platform = MockPlatform::new().with_driver(vec![broken, fine]);
        let mut topo = SystemTopology::new();
        discover(&platform, &mut topo, &mut session());

        let nodes: Vec<_> = topo.accelerators().collect();
        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].node.children.is_empty());
        assert_eq!(nodes[1].node.children.len(), 1);
    }

    #[test]
    fn test_memory_collected_once_per_device() {
        let device = gpu()
            .with_subdevices(vec![gpu(), gpu()])
            .with_memory_modules(vec![MemoryModule {
                kind: MemoryKind::Hbm,
                physical_size: 17179869184,
                on_subdevice: false,
                subdevice_id: 0,
            }]);
        let platform = MockPlatform::new().with_driver(vec![device.clone()]);
        let mut topo = SystemTopology::new();
        discover(&platform, &mut topo, &mut session());

        assert_eq!(device.memory_module_calls(), 1);
        let nodes: Vec<_> = topo.accelerators().collect();
        assert_eq!(nodes[0].node.attr("LevelZeroHBMSize"), Some("16777216"));
        for child in &nodes[0].node.children {
            assert_eq!(child.attr("LevelZeroHBMSize"), None);
        }
    }

    #[test]
    fn test_attachment_to_bus_peripheral() {
        let addr = BusAddress {
            domain: 0,
            bus: 0x4d,
            device: 0,
            function: 0,
        };
        let device = gpu().with_bus_properties(BusProperties {
            address: addr,
            max_bandwidth: 31_500_000_000,
        });
        let platform = MockPlatform::new().with_driver(vec![device]);
        let mut topo = SystemTopology::new();
        let pci = topo.add_bus_peripheral(addr);
        discover(&platform, &mut topo, &mut session());

        let nodes: Vec<_> = topo.accelerators().collect();
        assert_eq!(nodes[0].bus, Some(&addr));
        assert!(topo.link_speed(pci).is_some());
    }

    #[test]
    fn test_unresolved_device_attaches_to_root() {
        let platform = MockPlatform::new().with_driver(vec![gpu()]);
        let mut topo = SystemTopology::new();
        discover(&platform, &mut topo, &mut session());

        let nodes: Vec<_> = topo.accelerators().collect();
        assert_eq!(nodes[0].bus, None);
    }

    #[test]
    fn test_management_failure_warned_once_for_two_devices() {
        let broken = || {
            gpu().with_management_error(ZeError::ManagementUnavailable("sysman off".into()))
        };
        let platform = MockPlatform::new().with_driver(vec![broken(), broken()]);
        let mut topo = SystemTopology::new();
        let mut session = session();
        discover(&platform, &mut topo, &mut session);

        assert!(session.management_warned());
        assert_eq!(session.management_failure_count(), 2);
    }

    #[test]
    fn test_memory_probe_happens_once_across_devices() {
        let broken_memory =
            || gpu().with_memory_modules_error(ZeError::ManagementUnavailable("off".into()));
        let devices = vec![broken_memory(), broken_memory(), broken_memory()];
        let platform = MockPlatform::new().with_driver(devices.clone());
        let mut topo = SystemTopology::new();
        discover(&platform, &mut topo, &mut session());

        let probes: u32 = devices.iter().map(|d| d.memory_module_calls()).sum();
        assert_eq!(probes, 1);
    }
}
