//! Property collector
//!
//! Records descriptive attributes for one device or subdevice: the basic
//! core-API properties, then the extended management properties. Extended
//! queries on a subdevice return the same data as the root device, so they
//! are always skipped there.

use crate::domain::ManagementProperties;
use crate::session::DiscoverySession;
use crate::topology::DeviceNode;
use crate::ze::AccelDevice;

/// Collect descriptive attributes onto `node`.
///
/// Returns the integration-class flag (integrated vs. discrete silicon)
/// only when `wants_integration_flag` is set; the flag is meaningless on
/// subdevice nodes.
pub fn collect<D: AccelDevice>(
    device: &D,
    node: &mut DeviceNode,
    session: &mut DiscoverySession,
    wants_integration_flag: bool,
) -> Option<bool> {
    let mut is_subdevice = false;
    let mut is_integrated = false;

    match device.properties() {
        Ok(props) => {
            let kind_label = match props.kind() {
                Some(kind) => kind.label(),
                None => {
                    session.warn_unknown_kind(props.kind_raw);
                    "Unknown"
                }
            };
            node.add_attr("LevelZeroDeviceType", kind_label);
            node.add_attr("LevelZeroNumSlices", props.num_slices.to_string());
            node.add_attr(
                "LevelZeroNumSubslicesPerSlice",
                props.num_subslices_per_slice.to_string(),
            );
            node.add_attr(
                "LevelZeroNumEUsPerSubslice",
                props.num_eus_per_subslice.to_string(),
            );
            node.add_attr(
                "LevelZeroNumThreadsPerEU",
                props.num_threads_per_eu.to_string(),
            );
            is_subdevice = props.flags.is_subdevice();
            is_integrated = props.flags.is_integrated();
        }
        Err(e) => log::debug!("device property query failed on {}: {e}", node.name),
    }

    if !is_subdevice {
        match device.management_properties() {
            Ok(mgmt) => {
                if let Some(v) = ManagementProperties::meaningful(&mgmt.vendor_name) {
                    node.add_attr("LevelZeroVendor", v);
                }
                if let Some(v) = ManagementProperties::meaningful(&mgmt.model_name) {
                    node.add_attr("LevelZeroModel", v);
                }
                if let Some(v) = ManagementProperties::meaningful(&mgmt.brand_name) {
                    node.add_attr("LevelZeroBrand", v);
                }
                if let Some(v) = ManagementProperties::meaningful(&mgmt.serial_number) {
                    node.add_attr("LevelZeroSerialNumber", v);
                }
                if let Some(v) = ManagementProperties::meaningful(&mgmt.board_number) {
                    node.add_attr("LevelZeroBoardNumber", v);
                }
            }
            // Degraded mode: the node just misses the extended attributes.
            Err(_) => session.warn_management_failure(),
        }
    }

    wants_integration_flag.then_some(is_integrated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiscoveryConfig;
    use crate::domain::{DeviceFlags, DeviceProperties};
    use crate::error::ZeError;
    use crate::mock::MockAccel;
    use crate::topology::NodeKind;

    fn session() -> DiscoverySession {
        DiscoverySession::new(DiscoveryConfig::default())
    }

    fn gpu_props() -> DeviceProperties {
        DeviceProperties {
            kind_raw: 1,
            flags: DeviceFlags(0),
            num_slices: 2,
            num_subslices_per_slice: 4,
            num_eus_per_subslice: 8,
            num_threads_per_eu: 7,
        }
    }

    #[test]
    fn test_basic_properties_recorded() {
        let device = MockAccel::new().with_properties(gpu_props());
        let mut node = DeviceNode::new("accel0", NodeKind::Root);
        let integrated = collect(&device, &mut node, &mut session(), true);

        assert_eq!(node.attr("LevelZeroDeviceType"), Some("GPU"));
        assert_eq!(node.attr("LevelZeroNumSlices"), Some("2"));
        assert_eq!(node.attr("LevelZeroNumSubslicesPerSlice"), Some("4"));
        assert_eq!(node.attr("LevelZeroNumEUsPerSubslice"), Some("8"));
        assert_eq!(node.attr("LevelZeroNumThreadsPerEU"), Some("7"));
        assert_eq!(integrated, Some(false));
    }

    #[test]
    fn test_integration_flag_only_when_requested() {
        let mut props = gpu_props();
        props.flags = DeviceFlags(DeviceFlags::INTEGRATED);
        let device = MockAccel::new().with_properties(props);

        let mut node = DeviceNode::new("accel0", NodeKind::Root);
        assert_eq!(collect(&device, &mut node, &mut session(), true), Some(true));

        let mut node = DeviceNode::new("accel1", NodeKind::Root);
        assert_eq!(collect(&device, &mut node, &mut session(), false), None);
    }

    #[test]
    fn test_unknown_kind_records_sentinel() {
        let mut props = gpu_props();
        props.kind_raw = 77;
        let device = MockAccel::new().with_properties(props);
        let mut node = DeviceNode::new("accel0", NodeKind::Root);
        collect(&device, &mut node, &mut session(), false);
        assert_eq!(node.attr("LevelZeroDeviceType"), Some("Unknown"));
    }

    #[test]
    fn test_subdevice_skips_management_query() {
        let mut props = gpu_props();
        props.flags = DeviceFlags(DeviceFlags::SUBDEVICE);
        let device = MockAccel::new()
            .with_properties(props)
            .with_management_error(ZeError::ManagementUnavailable("sysman off".into()));

        let mut node = DeviceNode::new("accel0.0", NodeKind::Sub);
        let mut session = session();
        collect(&device, &mut node, &mut session, false);

        // The failing management query was never issued, so no warning.
        assert!(!session.management_warned());
        assert_eq!(device.management_calls(), 0);
    }

    #[test]
    fn test_management_attributes_filter_unknown() {
        let mgmt = crate::domain::ManagementProperties {
            vendor_name: "Intel(R) Corporation".to_string(),
            model_name: "unknown".to_string(),
            brand_name: "Unknown".to_string(),
            serial_number: "S123".to_string(),
            board_number: String::new(),
        };
        let device = MockAccel::new()
            .with_properties(gpu_props())
            .with_management(mgmt);

        let mut node = DeviceNode::new("accel0", NodeKind::Root);
        collect(&device, &mut node, &mut session(), false);

        assert_eq!(node.attr("LevelZeroVendor"), Some("Intel(R) Corporation"));
        assert_eq!(node.attr("LevelZeroModel"), None);
        assert_eq!(node.attr("LevelZeroBrand"), None);
        assert_eq!(node.attr("LevelZeroSerialNumber"), Some("S123"));
        assert_eq!(node.attr("LevelZeroBoardNumber"), None);
    }

    #[test]
    fn test_management_failure_warns_once_across_devices() {
        let device = MockAccel::new()
            .with_properties(gpu_props())
            .with_management_error(ZeError::ManagementUnavailable("sysman off".into()));
        let mut session = session();

        let mut node_a = DeviceNode::new("accel0", NodeKind::Root);
        collect(&device, &mut node_a, &mut session, false);
        let mut node_b = DeviceNode::new("accel1", NodeKind::Root);
        collect(&device, &mut node_b, &mut session, false);

        assert!(session.management_warned());
        assert_eq!(session.management_failure_count(), 2);
        assert_eq!(node_a.attr("LevelZeroVendor"), None);
    }
}
