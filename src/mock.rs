//! Mock implementations for testing
//!
//! Provides a mock platform and device for unit testing without a Level
//! Zero runtime. Clones share their call counters, so a test can keep a
//! handle on a device it gave to the platform and still observe calls.

use crate::domain::{
    BusProperties, DeviceProperties, ManagementProperties, MemoryDomain, MemoryModule, QueueGroup,
};
use crate::error::ZeError;
use crate::ze::{AccelDevice, AccelPlatform};

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// Mock accelerator device for testing
#[derive(Debug, Clone)]
pub struct MockAccel {
    properties: Result<DeviceProperties, ZeError>,
    management: Result<ManagementProperties, ZeError>,
    queue_groups: Result<Vec<QueueGroup>, ZeError>,
    subdevices: Result<Vec<MockAccel>, ZeError>,
    memory_modules: Result<Vec<MemoryModule>, ZeError>,
    state_sizes: HashMap<u32, u64>,
    memory_domains: Result<Vec<MemoryDomain>, ZeError>,
    bus: Result<BusProperties, ZeError>,
    memory_module_calls: Rc<Cell<u32>>,
    management_calls: Rc<Cell<u32>>,
}

impl MockAccel {
    /// Create a mock device that answers every query with empty data and
    /// has no bus attachment.
    pub fn new() -> Self {
        Self {
            properties: Ok(DeviceProperties::default()),
            management: Ok(ManagementProperties::default()),
            queue_groups: Ok(Vec::new()),
            subdevices: Ok(Vec::new()),
            memory_modules: Ok(Vec::new()),
            state_sizes: HashMap::new(),
            memory_domains: Ok(Vec::new()),
            bus: Err(ZeError::ManagementUnavailable("mock: no bus".to_string())),
            memory_module_calls: Rc::new(Cell::new(0)),
            management_calls: Rc::new(Cell::new(0)),
        }
    }

    /// Builder: set basic properties
    pub fn with_properties(mut self, props: DeviceProperties) -> Self {
        self.properties = Ok(props);
        self
    }

    /// Builder: set management properties
    pub fn with_management(mut self, props: ManagementProperties) -> Self {
        self.management = Ok(props);
        self
    }

    /// Builder: make the management query fail
    pub fn with_management_error(mut self, err: ZeError) -> Self {
        self.management = Err(err);
        self
    }

    /// Builder: set queue groups
    pub fn with_queue_groups(mut self, groups: Vec<QueueGroup>) -> Self {
        self.queue_groups = Ok(groups);
        self
    }

    /// Builder: make the queue-group query fail
    pub fn with_queue_groups_error(mut self, err: ZeError) -> Self {
        self.queue_groups = Err(err);
        self
    }

    /// Builder: set subdevices
    pub fn with_subdevices(mut self, subdevices: Vec<MockAccel>) -> Self {
        self.subdevices = Ok(subdevices);
        self
    }

    /// Builder: make subdevice enumeration fail
    pub fn with_subdevices_error(mut self, err: ZeError) -> Self {
        self.subdevices = Err(err);
        self
    }

    /// Builder: set detailed-source memory modules
    pub fn with_memory_modules(mut self, modules: Vec<MemoryModule>) -> Self {
        self.memory_modules = Ok(modules);
        self
    }

    /// Builder: make the detailed source fail (sysman unavailable)
    pub fn with_memory_modules_error(mut self, err: ZeError) -> Self {
        self.memory_modules = Err(err);
        self
    }

    /// Builder: set the dynamic-state size for one module index
    pub fn with_memory_state_size(mut self, module_index: u32, size: u64) -> Self {
        self.state_sizes.insert(module_index, size);
        self
    }

    /// Builder: set basic-source memory domains
    pub fn with_memory_domains(mut self, domains: Vec<MemoryDomain>) -> Self {
        self.memory_domains = Ok(domains);
        self
    }

    /// Builder: set bus properties
    pub fn with_bus_properties(mut self, bus: BusProperties) -> Self {
        self.bus = Ok(bus);
        self
    }

    /// Number of `memory_modules` calls made across all clones
    pub fn memory_module_calls(&self) -> u32 {
        self.memory_module_calls.get()
    }

    /// Number of `management_properties` calls made across all clones
    pub fn management_calls(&self) -> u32 {
        self.management_calls.get()
    }
}

impl Default for MockAccel {
    fn default() -> Self {
        Self::new()
    }
}

impl AccelDevice for MockAccel {
    fn properties(&self) -> Result<DeviceProperties, ZeError> {
        self.properties.clone()
    }

    fn management_properties(&self) -> Result<ManagementProperties, ZeError> {
        self.management_calls.set(self.management_calls.get() + 1);
        self.management.clone()
    }

    fn command_queue_groups(&self) -> Result<Vec<QueueGroup>, ZeError> {
        self.queue_groups.clone()
    }

    fn subdevices(&self) -> Result<Vec<MockAccel>, ZeError> {
        self.subdevices.clone()
    }

    fn memory_modules(&self) -> Result<Vec<MemoryModule>, ZeError> {
        self.memory_module_calls
            .set(self.memory_module_calls.get() + 1);
        self.memory_modules.clone()
    }

    fn memory_module_state_size(&self, module_index: u32) -> Result<u64, ZeError> {
        self.state_sizes
            .get(&module_index)
            .copied()
            .ok_or_else(|| ZeError::InvalidArgument(format!("mock module {module_index}")))
    }

    fn memory_domains(&self) -> Result<Vec<MemoryDomain>, ZeError> {
        self.memory_domains.clone()
    }

    fn bus_properties(&self) -> Result<BusProperties, ZeError> {
        self.bus.clone()
    }
}

/// Mock platform holding a fixed driver/device layout
#[derive(Debug, Clone)]
pub struct MockPlatform {
    drivers: Vec<Vec<MockAccel>>,
    init_error: Option<ZeError>,
    init_calls: Rc<Cell<u32>>,
}

impl MockPlatform {
    /// Create a platform with zero drivers
    pub fn new() -> Self {
        Self {
            drivers: Vec::new(),
            init_error: None,
            init_calls: Rc::new(Cell::new(0)),
        }
    }

    /// Builder: append a driver exposing `devices`
    pub fn with_driver(mut self, devices: Vec<MockAccel>) -> Self {
        self.drivers.push(devices);
        self
    }

    /// Builder: make runtime initialization fail
    pub fn with_init_error(mut self, err: ZeError) -> Self {
        self.init_error = Some(err);
        self
    }

    /// Number of `init` calls made
    pub fn init_calls(&self) -> u32 {
        self.init_calls.get()
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl AccelPlatform for MockPlatform {
    type Device = MockAccel;

    fn init(&self) -> Result<(), ZeError> {
        self.init_calls.set(self.init_calls.get() + 1);
        match &self.init_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn driver_count(&self) -> Result<u32, ZeError> {
        Ok(self.drivers.len() as u32)
    }

    fn devices(&self, driver_index: u32) -> Result<Vec<MockAccel>, ZeError> {
        self.drivers
            .get(driver_index as usize)
            .cloned()
            .ok_or_else(|| ZeError::InvalidArgument(format!("mock driver {driver_index}")))
    }
}
