//! Trait definitions for accelerator platform operations
//!
//! These traits abstract over the Level Zero loader to enable testing with
//! mocks. Discovery is single-threaded by contract, so implementations may
//! use interior mutability without synchronization.

use crate::domain::{
    BusProperties, DeviceProperties, ManagementProperties, MemoryDomain, MemoryModule, QueueGroup,
};
use crate::error::ZeError;

/// Trait for the accelerator runtime as a whole
///
/// Mirrors the driver-enumeration surface of the vendor API: initialize
/// once, then walk drivers and the devices each driver exposes.
pub trait AccelPlatform {
    /// The device type returned by this platform
    type Device: AccelDevice;

    /// Initialize the vendor runtime
    ///
    /// Failure means no accelerator support is present; callers treat it
    /// as "zero devices", not as an error.
    fn init(&self) -> Result<(), ZeError>;

    /// Number of installed drivers
    fn driver_count(&self) -> Result<u32, ZeError>;

    /// Devices exposed by the driver at `driver_index`, in enumeration order
    fn devices(&self, driver_index: u32) -> Result<Vec<Self::Device>, ZeError>;
}

/// Trait for one device (root or subdevice) handle
///
/// Management-API methods (`management_properties`, `memory_modules`,
/// `memory_module_state_size`, `bus_properties`) fail whenever the sysman
/// subsystem was not activated; that failure must never be treated as
/// device absence.
pub trait AccelDevice: Sized {
    /// Basic descriptive properties from the core API
    fn properties(&self) -> Result<DeviceProperties, ZeError>;

    /// Extended descriptive properties from the management API
    fn management_properties(&self) -> Result<ManagementProperties, ZeError>;

    /// Command queue group descriptors, in enumeration order
    fn command_queue_groups(&self) -> Result<Vec<QueueGroup>, ZeError>;

    /// Subdevice partitions of this device, in vendor-reported order
    ///
    /// The vendor API reports "no subdevices" as an invalid-argument error;
    /// implementations translate that into an empty vector.
    fn subdevices(&self) -> Result<Vec<Self>, ZeError>;

    /// Memory modules from the detailed (management) source
    fn memory_modules(&self) -> Result<Vec<MemoryModule>, ZeError>;

    /// Dynamic-state size query for the module at `module_index`
    ///
    /// Fallback for modules whose static properties report a zero
    /// physical size.
    fn memory_module_state_size(&self, module_index: u32) -> Result<u64, ZeError>;

    /// Named memory domains from the basic (core API) source
    fn memory_domains(&self) -> Result<Vec<MemoryDomain>, ZeError>;

    /// Bus attachment point and link speed from the management API
    fn bus_properties(&self) -> Result<BusProperties, ZeError>;
}
