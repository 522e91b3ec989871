//! Memory inventory domain types
//!
//! Two shapes exist: per-module records from the management API (the
//! detailed source) and per-domain records from the core API (the basic
//! source). The collector decides which one is in use.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized physical memory kind.
///
/// The vendor distinguishes many DDR sub-variants; they all collapse to the
/// single "DDR" attribute label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryKind {
    /// High-bandwidth memory
    Hbm,
    /// Any DDR family variant (DDR, DDR3-5, LPDDR, LPDDR3-5)
    Ddr,
    /// Anything else (SRAM, caches, unrecognized values)
    Other,
}

impl MemoryKind {
    /// Map a raw `zes_mem_type_t` value.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Hbm,
            // DDR, DDR3, DDR4, DDR5, LPDDR, LPDDR3, LPDDR4, LPDDR5
            1..=8 => Self::Ddr,
            _ => Self::Other,
        }
    }

    /// Attribute label for this kind.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hbm => "HBM",
            Self::Ddr => "DDR",
            Self::Other => "Memory",
        }
    }
}

impl fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One memory module from the detailed (management) source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryModule {
    /// Normalized kind
    pub kind: MemoryKind,
    /// Physical size in bytes; zero means the runtime did not report it
    /// and the dynamic state query should be tried instead
    pub physical_size: u64,
    /// Whether the module belongs to a specific subdevice
    pub on_subdevice: bool,
    /// Subdevice index, meaningful only when `on_subdevice` is set
    pub subdevice_id: u32,
}

/// One named memory domain from the basic (core API) source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryDomain {
    /// Domain name as reported ("HBM", "DDR", or empty when unknown)
    pub name: String,
    /// Total size in bytes
    pub total_size: u64,
}

impl MemoryDomain {
    /// Attribute label: the reported name, or a generic fallback when the
    /// runtime left it empty.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            "Memory"
        } else {
            &self.name
        }
    }
}

/// Bytes to the kilobyte figure used in size attributes.
pub fn bytes_to_kb(bytes: u64) -> u64 {
    bytes >> 10
}
