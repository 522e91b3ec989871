//! Raw FFI definitions for the Level Zero loader library
//!
//! Only the subset of `ze_api.h` / `zes_api.h` that discovery touches.
//! Structures are zero-initialized before each call rather than tagged
//! with structure-type constants, which is what older runtimes expect.

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_void};

/// `ze_result_t`
pub type ze_result_t = u32;

pub const ZE_RESULT_SUCCESS: ze_result_t = 0;
pub const ZE_RESULT_ERROR_DEVICE_LOST: ze_result_t = 0x7000_0001;
pub const ZE_RESULT_ERROR_UNINITIALIZED: ze_result_t = 0x7800_0001;
pub const ZE_RESULT_ERROR_UNSUPPORTED_FEATURE: ze_result_t = 0x7800_0003;
pub const ZE_RESULT_ERROR_INVALID_ARGUMENT: ze_result_t = 0x7800_0004;

/// `ZE_MAX_DEVICE_NAME`
pub const ZE_MAX_DEVICE_NAME: usize = 256;
/// `ZES_STRING_PROPERTY_SIZE`
pub const ZES_STRING_PROPERTY_SIZE: usize = 64;
/// `ZE_MAX_DEVICE_UUID_SIZE`
pub const ZE_MAX_DEVICE_UUID_SIZE: usize = 16;

pub type ze_driver_handle_t = *mut c_void;
pub type ze_device_handle_t = *mut c_void;
/// Management handles alias the core device handle when sysman is active.
pub type zes_device_handle_t = *mut c_void;
pub type zes_mem_handle_t = *mut c_void;
pub type ze_bool_t = u8;

/// `ze_device_properties_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ze_device_properties_t {
    pub stype: u32,
    pub p_next: *mut c_void,
    pub r#type: u32,
    pub vendor_id: u32,
    pub device_id: u32,
    pub flags: u32,
    pub subdevice_id: u32,
    pub core_clock_rate: u32,
    pub max_mem_alloc_size: u64,
    pub max_hardware_contexts: u32,
    pub max_command_queue_priority: u32,
    pub num_threads_per_eu: u32,
    pub physical_eu_simd_width: u32,
    pub num_eus_per_subslice: u32,
    pub num_subslices_per_slice: u32,
    pub num_slices: u32,
    pub timer_resolution: u64,
    pub timestamp_valid_bits: u32,
    pub kernel_timestamp_valid_bits: u32,
    pub uuid: [u8; ZE_MAX_DEVICE_UUID_SIZE],
    pub name: [c_char; ZE_MAX_DEVICE_NAME],
}

/// `zes_device_properties_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct zes_device_properties_t {
    pub stype: u32,
    pub p_next: *mut c_void,
    pub core: ze_device_properties_t,
    pub num_subdevices: u32,
    pub serial_number: [c_char; ZES_STRING_PROPERTY_SIZE],
    pub board_number: [c_char; ZES_STRING_PROPERTY_SIZE],
    pub brand_name: [c_char; ZES_STRING_PROPERTY_SIZE],
    pub model_name: [c_char; ZES_STRING_PROPERTY_SIZE],
    pub vendor_name: [c_char; ZES_STRING_PROPERTY_SIZE],
    pub driver_version: [c_char; ZES_STRING_PROPERTY_SIZE],
}

/// `ze_command_queue_group_properties_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ze_command_queue_group_properties_t {
    pub stype: u32,
    pub p_next: *mut c_void,
    pub flags: u32,
    pub max_memory_fill_pattern_size: usize,
    pub num_queues: u32,
}

/// `ze_device_memory_properties_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ze_device_memory_properties_t {
    pub stype: u32,
    pub p_next: *mut c_void,
    pub flags: u32,
    pub max_clock_rate: u32,
    pub max_bus_width: u32,
    pub total_size: u64,
    pub name: [c_char; ZE_MAX_DEVICE_NAME],
}

/// `zes_mem_properties_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct zes_mem_properties_t {
    pub stype: u32,
    pub p_next: *mut c_void,
    pub r#type: u32,
    pub on_subdevice: ze_bool_t,
    pub subdevice_id: u32,
    pub location: u32,
    pub physical_size: u64,
    pub bus_width: i32,
    pub num_channels: i32,
}

/// `zes_mem_state_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct zes_mem_state_t {
    pub stype: u32,
    pub p_next: *mut c_void,
    pub health: u32,
    pub free: u64,
    pub size: u64,
}

/// `zes_pci_address_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct zes_pci_address_t {
    pub domain: u32,
    pub bus: u32,
    pub device: u32,
    pub function: u32,
}

/// `zes_pci_speed_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct zes_pci_speed_t {
    pub gen: i32,
    pub width: i32,
    pub max_bandwidth: i64,
}

/// `zes_pci_properties_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct zes_pci_properties_t {
    pub stype: u32,
    pub p_next: *mut c_void,
    pub address: zes_pci_address_t,
    pub max_speed: zes_pci_speed_t,
    pub have_bandwidth_counters: ze_bool_t,
    pub have_packet_counters: ze_bool_t,
    pub have_replay_counters: ze_bool_t,
}

pub type zeInit_t = unsafe extern "C" fn(flags: u32) -> ze_result_t;
pub type zeDriverGet_t =
    unsafe extern "C" fn(count: *mut u32, drivers: *mut ze_driver_handle_t) -> ze_result_t;
pub type zeDeviceGet_t = unsafe extern "C" fn(
    driver: ze_driver_handle_t,
    count: *mut u32,
    devices: *mut ze_device_handle_t,
) -> ze_result_t;
pub type zeDeviceGetProperties_t = unsafe extern "C" fn(
    device: ze_device_handle_t,
    props: *mut ze_device_properties_t,
) -> ze_result_t;
pub type zeDeviceGetCommandQueueGroupProperties_t = unsafe extern "C" fn(
    device: ze_device_handle_t,
    count: *mut u32,
    props: *mut ze_command_queue_group_properties_t,
) -> ze_result_t;
pub type zeDeviceGetSubDevices_t = unsafe extern "C" fn(
    device: ze_device_handle_t,
    count: *mut u32,
    subdevices: *mut ze_device_handle_t,
) -> ze_result_t;
pub type zeDeviceGetMemoryProperties_t = unsafe extern "C" fn(
    device: ze_device_handle_t,
    count: *mut u32,
    props: *mut ze_device_memory_properties_t,
) -> ze_result_t;
pub type zesDeviceGetProperties_t = unsafe extern "C" fn(
    device: zes_device_handle_t,
    props: *mut zes_device_properties_t,
) -> ze_result_t;
pub type zesDeviceEnumMemoryModules_t = unsafe extern "C" fn(
    device: zes_device_handle_t,
    count: *mut u32,
    modules: *mut zes_mem_handle_t,
) -> ze_result_t;
pub type zesMemoryGetProperties_t =
    unsafe extern "C" fn(module: zes_mem_handle_t, props: *mut zes_mem_properties_t) -> ze_result_t;
pub type zesMemoryGetState_t =
    unsafe extern "C" fn(module: zes_mem_handle_t, state: *mut zes_mem_state_t) -> ze_result_t;
pub type zesDevicePciGetProperties_t = unsafe extern "C" fn(
    device: zes_device_handle_t,
    props: *mut zes_pci_properties_t,
) -> ze_result_t;

/// Copy a NUL-terminated C string field into an owned Rust string.
pub fn c_str_to_string(field: &[c_char]) -> String {
    let bytes: Vec<u8> = field
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_str_to_string() {
        let mut field = [0 as c_char; 8];
        for (i, b) in b"Intel".iter().enumerate() {
            field[i] = *b as c_char;
        }
        assert_eq!(c_str_to_string(&field), "Intel");
    }

    #[test]
    fn test_c_str_to_string_unterminated() {
        let field = [b'x' as c_char; 4];
        assert_eq!(c_str_to_string(&field), "xxxx");
    }
}
