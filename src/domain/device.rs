//! Device property domain types
//!
//! Typed views over `ze_device_properties_t` and `zes_device_properties_t`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Device kind taxonomy as reported by the core API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceKind {
    /// Graphics processing unit
    Gpu,
    /// Central processing unit exposed through the accelerator runtime
    Cpu,
    /// Field-programmable gate array
    Fpga,
    /// Memory copy accelerator
    Mca,
    /// Vision processing unit
    Vpu,
}

impl DeviceKind {
    /// Map a raw `ze_device_type_t` value.
    ///
    /// Returns `None` for values this crate does not know about; the caller
    /// renders those with the literal "Unknown" label.
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::Gpu),
            2 => Some(Self::Cpu),
            3 => Some(Self::Fpga),
            4 => Some(Self::Mca),
            5 => Some(Self::Vpu),
            _ => None,
        }
    }

    /// Attribute label for this kind.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gpu => "GPU",
            Self::Cpu => "CPU",
            Self::Fpga => "FPGA",
            Self::Mca => "MCA",
            Self::Vpu => "VPU",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Device capability flag bitfield (`ze_device_property_flags_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceFlags(pub u32);

impl DeviceFlags {
    /// Device shares memory and power domain with the host (vs. discrete)
    pub const INTEGRATED: u32 = 1 << 0;
    /// Handle refers to a subdevice partition of a root device
    pub const SUBDEVICE: u32 = 1 << 1;

    /// Whether the integrated bit is set
    pub fn is_integrated(&self) -> bool {
        self.0 & Self::INTEGRATED != 0
    }

    /// Whether the subdevice bit is set
    pub fn is_subdevice(&self) -> bool {
        self.0 & Self::SUBDEVICE != 0
    }
}

/// Basic descriptive properties from the core API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceProperties {
    /// Raw `ze_device_type_t` value; see [`DeviceKind::from_raw`]
    pub kind_raw: u32,
    /// Capability flags
    pub flags: DeviceFlags,
    /// Number of slices
    pub num_slices: u32,
    /// Number of subslices per slice
    pub num_subslices_per_slice: u32,
    /// Number of execution units per subslice
    pub num_eus_per_subslice: u32,
    /// Number of hardware threads per execution unit
    pub num_threads_per_eu: u32,
}

impl DeviceProperties {
    /// Typed device kind, when recognized
    pub fn kind(&self) -> Option<DeviceKind> {
        DeviceKind::from_raw(self.kind_raw)
    }
}

/// Extended descriptive properties from the management (sysman) API.
///
/// Old runtimes fill unavailable fields with "Unknown", recent ones with
/// "unknown"; [`ManagementProperties::meaningful`] filters both.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManagementProperties {
    /// Vendor name
    pub vendor_name: String,
    /// Model name
    pub model_name: String,
    /// Brand name
    pub brand_name: String,
    /// Serial number
    pub serial_number: String,
    /// Board number
    pub board_number: String,
}

impl ManagementProperties {
    /// Return the field only if it carries real information.
    pub fn meaningful(value: &str) -> Option<&str> {
        if value.is_empty() || value.eq_ignore_ascii_case("unknown") {
            None
        } else {
            Some(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_kind_from_raw() {
        assert_eq!(DeviceKind::from_raw(1), Some(DeviceKind::Gpu));
        assert_eq!(DeviceKind::from_raw(2), Some(DeviceKind::Cpu));
        assert_eq!(DeviceKind::from_raw(3), Some(DeviceKind::Fpga));
        assert_eq!(DeviceKind::from_raw(4), Some(DeviceKind::Mca));
        assert_eq!(DeviceKind::from_raw(5), Some(DeviceKind::Vpu));
        assert_eq!(DeviceKind::from_raw(99), None);
    }

    #[test]
    fn test_device_kind_label() {
        assert_eq!(DeviceKind::Gpu.label(), "GPU");
        assert_eq!(format!("{}", DeviceKind::Vpu), "VPU");
    }

    #[test]
    fn test_device_flags() {
        let flags = DeviceFlags(DeviceFlags::INTEGRATED);
        assert!(flags.is_integrated());
        assert!(!flags.is_subdevice());

        let flags = DeviceFlags(DeviceFlags::SUBDEVICE | DeviceFlags::INTEGRATED);
        assert!(flags.is_integrated());
        assert!(flags.is_subdevice());

        assert!(!DeviceFlags::default().is_integrated());
    }

    #[test]
    fn test_meaningful_filters_unknown_sentinel() {
        assert_eq!(ManagementProperties::meaningful("Intel"), Some("Intel"));
        assert_eq!(ManagementProperties::meaningful("Unknown"), None);
        assert_eq!(ManagementProperties::meaningful("unknown"), None);
        assert_eq!(ManagementProperties::meaningful("UNKNOWN"), None);
        assert_eq!(ManagementProperties::meaningful(""), None);
    }
}
