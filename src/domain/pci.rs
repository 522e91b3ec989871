//! Bus address domain types
//!
//! A bus address is the domain/bus/device/function tuple used to correlate
//! a discovered accelerator with the peripheral node an earlier bus scan
//! already placed in the host topology.

use serde::{Deserialize, Serialize};
use std::fmt;

/// PCI-style bus address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusAddress {
    /// PCI domain
    pub domain: u32,
    /// Bus number
    pub bus: u32,
    /// Device number on the bus
    pub device: u32,
    /// Function number
    pub function: u32,
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:02x}:{:02x}.{:x}",
            self.domain, self.bus, self.device, self.function
        )
    }
}

/// Bus properties reported by the management API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusProperties {
    /// Attachment point of the device
    pub address: BusAddress,
    /// Maximum link bandwidth in bytes per second; non-positive when the
    /// runtime cannot tell
    pub max_bandwidth: i64,
}

impl BusProperties {
    /// Derived link speed in GB/s, when the runtime reported a bandwidth.
    pub fn link_speed_gbps(&self) -> Option<f32> {
        if self.max_bandwidth > 0 {
            Some(self.max_bandwidth as f32 / 1000.0 / 1000.0 / 1000.0)
        } else {
            None
        }
    }
}
