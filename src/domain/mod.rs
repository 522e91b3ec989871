//! Domain models for accelerator discovery
//!
//! Typed views over the raw vendor structures, with the enum-to-label
//! mappings used when rendering node attributes.

pub mod device;
pub mod memory;
pub mod pci;
pub mod queue;

pub use device::{DeviceFlags, DeviceKind, DeviceProperties, ManagementProperties};
pub use memory::{bytes_to_kb, MemoryDomain, MemoryKind, MemoryModule};
pub use pci::{BusAddress, BusProperties};
pub use queue::QueueGroup;
