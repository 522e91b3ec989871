//! Runtime binding to the Level Zero loader library
//!
//! Symbols are resolved lazily through libloading, so the crate builds and
//! runs on machines without a Level Zero runtime installed; discovery then
//! simply finds nothing.

use crate::domain::{
    BusAddress, BusProperties, DeviceFlags, DeviceProperties, ManagementProperties, MemoryDomain,
    MemoryKind, MemoryModule, QueueGroup,
};
use crate::error::ZeError;
use crate::ze::sys;
use crate::ze::traits::{AccelDevice, AccelPlatform};

use libloading::{Library, Symbol};
use std::cell::RefCell;
use std::rc::Rc;

#[cfg(not(windows))]
const LIBRARY_CANDIDATES: &[&str] = &["libze_loader.so.1", "libze_loader.so"];
#[cfg(windows)]
const LIBRARY_CANDIDATES: &[&str] = &["ze_loader.dll"];

/// Map a non-success vendor result code onto [`ZeError`].
fn ze_err(code: sys::ze_result_t, what: &'static str) -> ZeError {
    match code {
        sys::ZE_RESULT_ERROR_DEVICE_LOST => ZeError::DeviceLost,
        sys::ZE_RESULT_ERROR_UNINITIALIZED => {
            ZeError::ManagementUnavailable(format!("{what}: runtime uninitialized"))
        }
        sys::ZE_RESULT_ERROR_UNSUPPORTED_FEATURE => ZeError::NotSupported(what.to_string()),
        sys::ZE_RESULT_ERROR_INVALID_ARGUMENT => ZeError::InvalidArgument(what.to_string()),
        other => ZeError::Unknown(format!("{what} returned {other:#x}")),
    }
}

/// The opened loader library. Shared by the platform and every device
/// handle so the library outlives all of them.
struct ZeLib {
    lib: Library,
}

impl ZeLib {
    fn open() -> Result<Self, ZeError> {
        for name in LIBRARY_CANDIDATES {
            // SAFETY: loading the vendor loader library runs its
            // initializers, same as linking against it would.
            if let Ok(lib) = unsafe { Library::new(name) } {
                return Ok(Self { lib });
            }
        }
        Err(ZeError::LibraryNotFound)
    }

    fn sym<T>(&self, name: &'static str) -> Result<Symbol<'_, T>, ZeError> {
        // SAFETY: the symbol types in `sys` match the loader's C ABI.
        unsafe { self.lib.get(name.as_bytes()) }.map_err(|_| ZeError::MissingSymbol(name))
    }

    fn init(&self) -> Result<(), ZeError> {
        let f: Symbol<'_, sys::zeInit_t> = self.sym("zeInit")?;
        match unsafe { f(0) } {
            sys::ZE_RESULT_SUCCESS => Ok(()),
            code => Err(ZeError::InitializationFailed(format!("zeInit returned {code:#x}"))),
        }
    }

    fn drivers(&self) -> Result<Vec<sys::ze_driver_handle_t>, ZeError> {
        let f: Symbol<'_, sys::zeDriverGet_t> = self.sym("zeDriverGet")?;
        let mut count = 0u32;
        let code = unsafe { f(&mut count, std::ptr::null_mut()) };
        if code != sys::ZE_RESULT_SUCCESS {
            return Err(ze_err(code, "zeDriverGet"));
        }
        let mut handles = vec![std::ptr::null_mut(); count as usize];
        if count > 0 {
            let code = unsafe { f(&mut count, handles.as_mut_ptr()) };
            if code != sys::ZE_RESULT_SUCCESS {
                return Err(ze_err(code, "zeDriverGet"));
            }
            handles.truncate(count as usize);
        }
        Ok(handles)
    }

    fn driver_devices(
        &self,
        driver: sys::ze_driver_handle_t,
    ) -> Result<Vec<sys::ze_device_handle_t>, ZeError> {
        let f: Symbol<'_, sys::zeDeviceGet_t> = self.sym("zeDeviceGet")?;
        let mut count = 0u32;
        let code = unsafe { f(driver, &mut count, std::ptr::null_mut()) };
        if code != sys::ZE_RESULT_SUCCESS {
            return Err(ze_err(code, "zeDeviceGet"));
        }
        let mut handles = vec![std::ptr::null_mut(); count as usize];
        if count > 0 {
            let code = unsafe { f(driver, &mut count, handles.as_mut_ptr()) };
            if code != sys::ZE_RESULT_SUCCESS {
                return Err(ze_err(code, "zeDeviceGet"));
            }
            handles.truncate(count as usize);
        }
        Ok(handles)
    }

    fn mem_handles(
        &self,
        device: sys::zes_device_handle_t,
    ) -> Result<Vec<sys::zes_mem_handle_t>, ZeError> {
        let f: Symbol<'_, sys::zesDeviceEnumMemoryModules_t> =
            self.sym("zesDeviceEnumMemoryModules")?;
        let mut count = 0u32;
        let code = unsafe { f(device, &mut count, std::ptr::null_mut()) };
        if code != sys::ZE_RESULT_SUCCESS {
            return Err(ze_err(code, "zesDeviceEnumMemoryModules"));
        }
        let mut handles = vec![std::ptr::null_mut(); count as usize];
        if count > 0 {
            let code = unsafe { f(device, &mut count, handles.as_mut_ptr()) };
            if code != sys::ZE_RESULT_SUCCESS {
                return Err(ze_err(code, "zesDeviceEnumMemoryModules"));
            }
            handles.truncate(count as usize);
        }
        Ok(handles)
    }
}

/// Real platform implementation over the Level Zero loader.
pub struct ZeLoader {
    lib: Rc<ZeLib>,
    drivers: RefCell<Vec<sys::ze_driver_handle_t>>,
}

impl ZeLoader {
    /// Open the loader library. Fails only when no loader is installed.
    pub fn new() -> Result<Self, ZeError> {
        Ok(Self {
            lib: Rc::new(ZeLib::open()?),
            drivers: RefCell::new(Vec::new()),
        })
    }
}

impl AccelPlatform for ZeLoader {
    type Device = ZeDevice;

    fn init(&self) -> Result<(), ZeError> {
        self.lib.init()?;
        *self.drivers.borrow_mut() = self.lib.drivers()?;
        Ok(())
    }

    fn driver_count(&self) -> Result<u32, ZeError> {
        Ok(self.drivers.borrow().len() as u32)
    }

    fn devices(&self, driver_index: u32) -> Result<Vec<ZeDevice>, ZeError> {
        let driver = *self
            .drivers
            .borrow()
            .get(driver_index as usize)
            .ok_or_else(|| ZeError::InvalidArgument(format!("driver index {driver_index}")))?;
        let handles = self.lib.driver_devices(driver)?;
        Ok(handles
            .into_iter()
            .map(|handle| ZeDevice {
                lib: Rc::clone(&self.lib),
                handle,
            })
            .collect())
    }
}

/// One device (or subdevice) handle bound to the loader library.
///
/// The same handle doubles as the management (sysman) handle when the
/// runtime created sysman devices; management calls fail otherwise.
pub struct ZeDevice {
    lib: Rc<ZeLib>,
    handle: sys::ze_device_handle_t,
}

impl AccelDevice for ZeDevice {
    fn properties(&self) -> Result<DeviceProperties, ZeError> {
        let f: Symbol<'_, sys::zeDeviceGetProperties_t> = self.lib.sym("zeDeviceGetProperties")?;
        // SAFETY: zero-initialized out-structs are what pre-1.x runtimes expect.
        let mut props: sys::ze_device_properties_t = unsafe { std::mem::zeroed() };
        let code = unsafe { f(self.handle, &mut props) };
        if code != sys::ZE_RESULT_SUCCESS {
            return Err(ze_err(code, "zeDeviceGetProperties"));
        }
        Ok(DeviceProperties {
            kind_raw: props.r#type,
            flags: DeviceFlags(props.flags),
            num_slices: props.num_slices,
            num_subslices_per_slice: props.num_subslices_per_slice,
            num_eus_per_subslice: props.num_eus_per_subslice,
            num_threads_per_eu: props.num_threads_per_eu,
        })
    }

    fn management_properties(&self) -> Result<ManagementProperties, ZeError> {
        let f: Symbol<'_, sys::zesDeviceGetProperties_t> =
            self.lib.sym("zesDeviceGetProperties")?;
        let mut props: sys::zes_device_properties_t = unsafe { std::mem::zeroed() };
        let code = unsafe { f(self.handle, &mut props) };
        if code != sys::ZE_RESULT_SUCCESS {
            return Err(ze_err(code, "zesDeviceGetProperties"));
        }
        Ok(ManagementProperties {
            vendor_name: sys::c_str_to_string(&props.vendor_name),
            model_name: sys::c_str_to_string(&props.model_name),
            brand_name: sys::c_str_to_string(&props.brand_name),
            serial_number: sys::c_str_to_string(&props.serial_number),
            board_number: sys::c_str_to_string(&props.board_number),
        })
    }

    fn command_queue_groups(&self) -> Result<Vec<QueueGroup>, ZeError> {
        let f: Symbol<'_, sys::zeDeviceGetCommandQueueGroupProperties_t> =
            self.lib.sym("zeDeviceGetCommandQueueGroupProperties")?;
        let mut count = 0u32;
        let code = unsafe { f(self.handle, &mut count, std::ptr::null_mut()) };
        if code != sys::ZE_RESULT_SUCCESS {
            return Err(ze_err(code, "zeDeviceGetCommandQueueGroupProperties"));
        }
        let mut props: Vec<sys::ze_command_queue_group_properties_t> =
            vec![unsafe { std::mem::zeroed() }; count as usize];
        if count > 0 {
            let code = unsafe { f(self.handle, &mut count, props.as_mut_ptr()) };
            if code != sys::ZE_RESULT_SUCCESS {
                return Err(ze_err(code, "zeDeviceGetCommandQueueGroupProperties"));
            }
            props.truncate(count as usize);
        }
        Ok(props
            .iter()
            .map(|p| QueueGroup {
                num_queues: p.num_queues,
                flags: p.flags,
            })
            .collect())
    }

    fn subdevices(&self) -> Result<Vec<ZeDevice>, ZeError> {
        let f: Symbol<'_, sys::zeDeviceGetSubDevices_t> = self.lib.sym("zeDeviceGetSubDevices")?;
        let mut count = 0u32;
        let code = unsafe { f(self.handle, &mut count, std::ptr::null_mut()) };
        // The runtime reports "no subdevices" as an invalid-argument error.
        if code == sys::ZE_RESULT_ERROR_INVALID_ARGUMENT {
            return Ok(Vec::new());
        }
        if code != sys::ZE_RESULT_SUCCESS {
            return Err(ze_err(code, "zeDeviceGetSubDevices"));
        }
        let mut handles = vec![std::ptr::null_mut(); count as usize];
        if count > 0 {
            let code = unsafe { f(self.handle, &mut count, handles.as_mut_ptr()) };
            if code != sys::ZE_RESULT_SUCCESS {
                return Err(ze_err(code, "zeDeviceGetSubDevices"));
            }
            handles.truncate(count as usize);
        }
        Ok(handles
            .into_iter()
            .map(|handle| ZeDevice {
                lib: Rc::clone(&self.lib),
                handle,
            })
            .collect())
    }

    fn memory_modules(&self) -> Result<Vec<MemoryModule>, ZeError> {
        let handles = self.lib.mem_handles(self.handle)?;
        let f: Symbol<'_, sys::zesMemoryGetProperties_t> = self.lib.sym("zesMemoryGetProperties")?;
        let mut modules = Vec::with_capacity(handles.len());
        for handle in handles {
            let mut props: sys::zes_mem_properties_t = unsafe { std::mem::zeroed() };
            let code = unsafe { f(handle, &mut props) };
            if code != sys::ZE_RESULT_SUCCESS {
                log::debug!("zesMemoryGetProperties failed with {code:#x}, skipping module");
                continue;
            }
            modules.push(MemoryModule {
                kind: MemoryKind::from_raw(props.r#type),
                physical_size: props.physical_size,
                on_subdevice: props.on_subdevice != 0,
                subdevice_id: props.subdevice_id,
            });
        }
        Ok(modules)
    }

    fn memory_module_state_size(&self, module_index: u32) -> Result<u64, ZeError> {
        let handles = self.lib.mem_handles(self.handle)?;
        let handle = *handles
            .get(module_index as usize)
            .ok_or_else(|| ZeError::InvalidArgument(format!("memory module {module_index}")))?;
        let f: Symbol<'_, sys::zesMemoryGetState_t> = self.lib.sym("zesMemoryGetState")?;
        let mut state: sys::zes_mem_state_t = unsafe { std::mem::zeroed() };
        let code = unsafe { f(handle, &mut state) };
        if code != sys::ZE_RESULT_SUCCESS {
            return Err(ze_err(code, "zesMemoryGetState"));
        }
        Ok(state.size)
    }

    fn memory_domains(&self) -> Result<Vec<MemoryDomain>, ZeError> {
        let f: Symbol<'_, sys::zeDeviceGetMemoryProperties_t> =
            self.lib.sym("zeDeviceGetMemoryProperties")?;
        let mut count = 0u32;
        let code = unsafe { f(self.handle, &mut count, std::ptr::null_mut()) };
        if code != sys::ZE_RESULT_SUCCESS {
            return Err(ze_err(code, "zeDeviceGetMemoryProperties"));
        }
        let mut props: Vec<sys::ze_device_memory_properties_t> =
            vec![unsafe { std::mem::zeroed() }; count as usize];
        if count > 0 {
            let code = unsafe { f(self.handle, &mut count, props.as_mut_ptr()) };
            if code != sys::ZE_RESULT_SUCCESS {
                return Err(ze_err(code, "zeDeviceGetMemoryProperties"));
            }
            props.truncate(count as usize);
        }
        Ok(props
            .iter()
            .map(|p| MemoryDomain {
                name: sys::c_str_to_string(&p.name),
                total_size: p.total_size,
            })
            .collect())
    }

    fn bus_properties(&self) -> Result<BusProperties, ZeError> {
        let f: Symbol<'_, sys::zesDevicePciGetProperties_t> =
            self.lib.sym("zesDevicePciGetProperties")?;
        let mut props: sys::zes_pci_properties_t = unsafe { std::mem::zeroed() };
        let code = unsafe { f(self.handle, &mut props) };
        if code != sys::ZE_RESULT_SUCCESS {
            return Err(ze_err(code, "zesDevicePciGetProperties"));
        }
        Ok(BusProperties {
            address: BusAddress {
                domain: props.address.domain,
                bus: props.address.bus,
                device: props.address.device,
                function: props.address.function,
            },
            max_bandwidth: props.max_speed.max_bandwidth,
        })
    }
}
