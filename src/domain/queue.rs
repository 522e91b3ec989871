//! Command queue group domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// One command queue group descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueGroup {
    /// Number of physical queues in this group
    pub num_queues: u32,
    /// Capability flag bitmask (`ze_command_queue_group_property_flags_t`)
    pub flags: u32,
}

impl fmt::Display for QueueGroup {
    /// Renders the attribute value format: `<count>*0x<flags-hex>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*{:#x}", self.num_queues, self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_group_render() {
        let group = QueueGroup {
            num_queues: 4,
            flags: 0x1d,
        };
        assert_eq!(group.to_string(), "4*0x1d");
    }

    #[test]
    fn test_queue_group_render_zero_flags() {
        let group = QueueGroup {
            num_queues: 1,
            flags: 0,
        };
        assert_eq!(group.to_string(), "1*0x0");
    }
}
