//! Command queue group collector

use crate::topology::DeviceNode;
use crate::ze::AccelDevice;

/// Record queue-group capability attributes onto `node`.
///
/// Zero groups or a failed query is a silent no-op.
pub fn collect<D: AccelDevice>(device: &D, node: &mut DeviceNode) {
    let groups = match device.command_queue_groups() {
        Ok(groups) => groups,
        Err(_) => return,
    };
    if groups.is_empty() {
        return;
    }

    node.add_attr("LevelZeroCQGroups", groups.len().to_string());
    for (k, group) in groups.iter().enumerate() {
        node.add_attr(format!("LevelZeroCQGroup{k}"), group.to_string());
    }
}
