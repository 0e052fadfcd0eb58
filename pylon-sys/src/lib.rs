// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! # pylon-sys: Raw FFI table for the pylon C runtime
//!
//! This crate exposes the subset of the Basler pylon C API (`libpylonc`) used by
//! the [`pylon`] wrapper crate. The library is resolved at runtime through
//! `libloading`, so neither building nor testing requires the pylon SDK to be
//! installed: a missing runtime simply means no native devices.
//!
//! ## Usage
//!
//! **Most users should NOT use this crate directly.** Use the safe [`pylon`]
//! wrapper crate instead, which provides RAII device handles, `Result` based
//! error handling and a typed view of the GenICam node map.
//!
//! ## Safety
//!
//! All functions in this crate are `unsafe` and require the caller to uphold
//! pylon's invariants:
//! - `PylonInitialize` must be called before any other function
//! - Handles must not be used after they were destroyed or closed
//! - String buffers must be at least as large as the length passed in
//!
//! [`pylon`]: https://docs.rs/pylon

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(clippy::missing_safety_doc)]

use std::ffi::OsStr;
use std::os::raw::{c_char, c_int, c_void};

/// HRESULT-like status returned by every pylon C function.
pub type GENAPIC_RESULT = i32;

pub const GENAPI_E_OK: GENAPIC_RESULT = 0;

pub type PYLON_DEVICE_INFO_HANDLE = *mut c_void;
pub type PYLON_DEVICE_HANDLE = *mut c_void;
pub type PYLON_STREAMGRABBER_HANDLE = *mut c_void;
pub type PYLON_STREAMBUFFER_HANDLE = *mut c_void;
pub type PYLON_WAITOBJECT_HANDLE = *mut c_void;
pub type NODEMAP_HANDLE = *mut c_void;
pub type NODE_HANDLE = *mut c_void;

pub type EGenApiNodeType = c_int;
pub const _UndefinedNodeType: EGenApiNodeType = -1;
pub const Value: EGenApiNodeType = 0;
pub const Base: EGenApiNodeType = 1;
pub const Integer: EGenApiNodeType = 2;
pub const Boolean: EGenApiNodeType = 3;
pub const Command: EGenApiNodeType = 4;
pub const Float: EGenApiNodeType = 5;
pub const String: EGenApiNodeType = 6;
pub const Register: EGenApiNodeType = 7;
pub const Category: EGenApiNodeType = 8;
pub const Enumeration: EGenApiNodeType = 9;
pub const EnumEntry: EGenApiNodeType = 10;
pub const Port: EGenApiNodeType = 11;

pub type EGenApiAccessMode = c_int;
pub const NI: EGenApiAccessMode = 0;
pub const NA: EGenApiAccessMode = 1;
pub const WO: EGenApiAccessMode = 2;
pub const RO: EGenApiAccessMode = 3;
pub const RW: EGenApiAccessMode = 4;
pub const _UndefinedAccesMode: EGenApiAccessMode = 5;

pub type EPylonGrabStatus = c_int;
pub const UndefinedGrabStatus: EPylonGrabStatus = -1;
pub const Idle: EPylonGrabStatus = 0;
pub const Queued: EPylonGrabStatus = 1;
pub const Grabbed: EPylonGrabStatus = 2;
pub const Canceled: EPylonGrabStatus = 3;
pub const Failed: EPylonGrabStatus = 4;

pub type EPylonPayloadType = c_int;
pub type EPylonPixelType = c_int;

pub const PYLONC_ACCESS_MODE_MONITOR: c_int = 0x0;
pub const PYLONC_ACCESS_MODE_CONTROL: c_int = 0x1;
pub const PYLONC_ACCESS_MODE_STREAM: c_int = 0x2;
pub const PYLONC_ACCESS_MODE_EVENT: c_int = 0x4;
pub const PYLONC_ACCESS_MODE_EXCLUSIVE: c_int = 0x8;

/// Result of a single buffer retrieval from a stream grabber.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PylonGrabResult_t {
    pub Context: *const c_void,
    pub hBuffer: PYLON_STREAMBUFFER_HANDLE,
    pub pBuffer: *const c_void,
    pub Status: EPylonGrabStatus,
    pub PayloadType: EPylonPayloadType,
    pub PixelType: EPylonPixelType,
    pub TimeStamp: u64,
    pub SizeX: i32,
    pub SizeY: i32,
    pub OffsetX: i32,
    pub OffsetY: i32,
    pub PaddingX: i32,
    pub PaddingY: i32,
    pub PayloadSize: u64,
    pub ErrorCode: u32,
    pub BlockID: u64,
}

impl Default for PylonGrabResult_t {
    fn default() -> Self {
        Self {
            Context: std::ptr::null(),
            hBuffer: std::ptr::null_mut(),
            pBuffer: std::ptr::null(),
            Status: UndefinedGrabStatus,
            PayloadType: 0,
            PixelType: 0,
            TimeStamp: 0,
            SizeX: 0,
            SizeY: 0,
            OffsetX: 0,
            OffsetY: 0,
            PaddingX: 0,
            PaddingY: 0,
            PayloadSize: 0,
            ErrorCode: 0,
            BlockID: 0,
        }
    }
}

/// Declares the runtime-loaded function table.
///
/// Every symbol is resolved when the library is loaded; a missing symbol fails
/// the whole load so callers never see a half-usable table.
macro_rules! pylonc_api {
    ($(fn $name:ident = $symbol:literal ($($arg:ident: $ty:ty),* $(,)?) -> $ret:ty;)*) => {
        /// Resolved entry points of `libpylonc`.
        pub struct LibPylonC {
            __library: libloading::Library,
            $($name: unsafe extern "C" fn($($ty),*) -> $ret,)*
        }

        impl LibPylonC {
            /// Loads `libpylonc` from `path` and resolves every entry point.
            pub unsafe fn new<P: AsRef<OsStr>>(path: P) -> Result<Self, libloading::Error> {
                let library = unsafe { libloading::Library::new(path) }?;
                unsafe { Self::from_library(library) }
            }

            /// Resolves every entry point from an already opened library.
            pub unsafe fn from_library(library: libloading::Library) -> Result<Self, libloading::Error> {
                $(
                    let $name = unsafe {
                        *library.get::<unsafe extern "C" fn($($ty),*) -> $ret>(
                            concat!($symbol, "\0").as_bytes(),
                        )?
                    };
                )*
                Ok(Self {
                    __library: library,
                    $($name,)*
                })
            }

            $(
                #[doc = concat!("Calls `", $symbol, "`.")]
                pub unsafe fn $name(&self, $($arg: $ty),*) -> $ret {
                    unsafe { (self.$name)($($arg),*) }
                }
            )*
        }
    };
}

pylonc_api! {
    fn initialize = "PylonInitialize"() -> GENAPIC_RESULT;
    fn terminate = "PylonTerminate"() -> GENAPIC_RESULT;
    fn enumerate_devices = "PylonEnumerateDevices"(num_devices: *mut usize) -> GENAPIC_RESULT;
    fn get_device_info_handle = "PylonGetDeviceInfoHandle"(
        index: usize,
        info: *mut PYLON_DEVICE_INFO_HANDLE,
    ) -> GENAPIC_RESULT;
    fn device_info_get_property_value_by_name = "PylonDeviceInfoGetPropertyValueByName"(
        info: PYLON_DEVICE_INFO_HANDLE,
        name: *const c_char,
        buf: *mut c_char,
        buf_len: *mut usize,
    ) -> GENAPIC_RESULT;
    fn create_device_by_index = "PylonCreateDeviceByIndex"(
        index: usize,
        device: *mut PYLON_DEVICE_HANDLE,
    ) -> GENAPIC_RESULT;
    fn destroy_device = "PylonDestroyDevice"(device: PYLON_DEVICE_HANDLE) -> GENAPIC_RESULT;
    fn device_open = "PylonDeviceOpen"(device: PYLON_DEVICE_HANDLE, access_mode: c_int) -> GENAPIC_RESULT;
    fn device_close = "PylonDeviceClose"(device: PYLON_DEVICE_HANDLE) -> GENAPIC_RESULT;
    fn device_get_node_map = "PylonDeviceGetNodeMap"(
        device: PYLON_DEVICE_HANDLE,
        node_map: *mut NODEMAP_HANDLE,
    ) -> GENAPIC_RESULT;
    fn device_get_num_stream_grabber_channels = "PylonDeviceGetNumStreamGrabberChannels"(
        device: PYLON_DEVICE_HANDLE,
        num_channels: *mut usize,
    ) -> GENAPIC_RESULT;
    fn device_get_stream_grabber = "PylonDeviceGetStreamGrabber"(
        device: PYLON_DEVICE_HANDLE,
        index: usize,
        grabber: *mut PYLON_STREAMGRABBER_HANDLE,
    ) -> GENAPIC_RESULT;
    fn device_execute_command_feature = "PylonDeviceExecuteCommandFeature"(
        device: PYLON_DEVICE_HANDLE,
        name: *const c_char,
    ) -> GENAPIC_RESULT;
    fn stream_grabber_open = "PylonStreamGrabberOpen"(grabber: PYLON_STREAMGRABBER_HANDLE) -> GENAPIC_RESULT;
    fn stream_grabber_close = "PylonStreamGrabberClose"(grabber: PYLON_STREAMGRABBER_HANDLE) -> GENAPIC_RESULT;
    fn stream_grabber_get_wait_object = "PylonStreamGrabberGetWaitObject"(
        grabber: PYLON_STREAMGRABBER_HANDLE,
        wait_object: *mut PYLON_WAITOBJECT_HANDLE,
    ) -> GENAPIC_RESULT;
    fn stream_grabber_set_max_num_buffer = "PylonStreamGrabberSetMaxNumBuffer"(
        grabber: PYLON_STREAMGRABBER_HANDLE,
        num_buffers: usize,
    ) -> GENAPIC_RESULT;
    fn stream_grabber_set_max_buffer_size = "PylonStreamGrabberSetMaxBufferSize"(
        grabber: PYLON_STREAMGRABBER_HANDLE,
        max_size: usize,
    ) -> GENAPIC_RESULT;
    fn stream_grabber_prepare_grab = "PylonStreamGrabberPrepareGrab"(grabber: PYLON_STREAMGRABBER_HANDLE) -> GENAPIC_RESULT;
    fn stream_grabber_register_buffer = "PylonStreamGrabberRegisterBuffer"(
        grabber: PYLON_STREAMGRABBER_HANDLE,
        buffer: *mut c_void,
        buffer_size: usize,
        handle: *mut PYLON_STREAMBUFFER_HANDLE,
    ) -> GENAPIC_RESULT;
    fn stream_grabber_deregister_buffer = "PylonStreamGrabberDeregisterBuffer"(
        grabber: PYLON_STREAMGRABBER_HANDLE,
        handle: PYLON_STREAMBUFFER_HANDLE,
    ) -> GENAPIC_RESULT;
    fn stream_grabber_queue_buffer = "PylonStreamGrabberQueueBuffer"(
        grabber: PYLON_STREAMGRABBER_HANDLE,
        handle: PYLON_STREAMBUFFER_HANDLE,
        context: *const c_void,
    ) -> GENAPIC_RESULT;
    fn stream_grabber_retrieve_result = "PylonStreamGrabberRetrieveResult"(
        grabber: PYLON_STREAMGRABBER_HANDLE,
        result: *mut PylonGrabResult_t,
        ready: *mut bool,
    ) -> GENAPIC_RESULT;
    fn stream_grabber_cancel_grab = "PylonStreamGrabberCancelGrab"(grabber: PYLON_STREAMGRABBER_HANDLE) -> GENAPIC_RESULT;
    fn stream_grabber_finish_grab = "PylonStreamGrabberFinishGrab"(grabber: PYLON_STREAMGRABBER_HANDLE) -> GENAPIC_RESULT;
    fn stream_grabber_start_streaming_if_mandatory = "PylonStreamGrabberStartStreamingIfMandatory"(
        grabber: PYLON_STREAMGRABBER_HANDLE,
    ) -> GENAPIC_RESULT;
    fn stream_grabber_stop_streaming_if_mandatory = "PylonStreamGrabberStopStreamingIfMandatory"(
        grabber: PYLON_STREAMGRABBER_HANDLE,
    ) -> GENAPIC_RESULT;
    fn wait_object_wait = "PylonWaitObjectWait"(
        wait_object: PYLON_WAITOBJECT_HANDLE,
        timeout_ms: u32,
        result: *mut bool,
    ) -> GENAPIC_RESULT;
    fn node_map_get_num_nodes = "GenApiNodeMapGetNumNodes"(
        node_map: NODEMAP_HANDLE,
        num_nodes: *mut usize,
    ) -> GENAPIC_RESULT;
    fn node_map_get_node_by_index = "GenApiNodeMapGetNodeByIndex"(
        node_map: NODEMAP_HANDLE,
        index: usize,
        node: *mut NODE_HANDLE,
    ) -> GENAPIC_RESULT;
    fn node_map_get_node = "GenApiNodeMapGetNode"(
        node_map: NODEMAP_HANDLE,
        name: *const c_char,
        node: *mut NODE_HANDLE,
    ) -> GENAPIC_RESULT;
    fn node_get_type = "GenApiNodeGetType"(node: NODE_HANDLE, node_type: *mut EGenApiNodeType) -> GENAPIC_RESULT;
    fn node_get_name = "GenApiNodeGetName"(node: NODE_HANDLE, buf: *mut c_char, buf_len: *mut usize) -> GENAPIC_RESULT;
    fn node_get_display_name = "GenApiNodeGetDisplayName"(
        node: NODE_HANDLE,
        buf: *mut c_char,
        buf_len: *mut usize,
    ) -> GENAPIC_RESULT;
    fn node_get_tool_tip = "GenApiNodeGetToolTip"(node: NODE_HANDLE, buf: *mut c_char, buf_len: *mut usize) -> GENAPIC_RESULT;
    fn node_get_access_mode = "GenApiNodeGetAccessMode"(
        node: NODE_HANDLE,
        access_mode: *mut EGenApiAccessMode,
    ) -> GENAPIC_RESULT;
    fn node_is_readable = "GenApiNodeIsReadable"(node: NODE_HANDLE, result: *mut bool) -> GENAPIC_RESULT;
    fn node_is_writable = "GenApiNodeIsWritable"(node: NODE_HANDLE, result: *mut bool) -> GENAPIC_RESULT;
    fn node_is_available = "GenApiNodeIsAvailable"(node: NODE_HANDLE, result: *mut bool) -> GENAPIC_RESULT;
    fn node_get_num_selecting_features = "GenApiNodeGetNumSelectingFeatures"(
        node: NODE_HANDLE,
        num_features: *mut usize,
    ) -> GENAPIC_RESULT;
    fn node_get_selecting_feature_by_index = "GenApiNodeGetSelectingFeatureByIndex"(
        node: NODE_HANDLE,
        index: usize,
        feature: *mut NODE_HANDLE,
    ) -> GENAPIC_RESULT;
    fn node_get_num_selected_features = "GenApiNodeGetNumSelectedFeatures"(
        node: NODE_HANDLE,
        num_features: *mut usize,
    ) -> GENAPIC_RESULT;
    fn node_get_selected_feature_by_index = "GenApiNodeGetSelectedFeatureByIndex"(
        node: NODE_HANDLE,
        index: usize,
        feature: *mut NODE_HANDLE,
    ) -> GENAPIC_RESULT;
    fn node_to_string = "GenApiNodeToString"(node: NODE_HANDLE, buf: *mut c_char, buf_len: *mut usize) -> GENAPIC_RESULT;
    fn node_from_string = "GenApiNodeFromString"(node: NODE_HANDLE, value: *const c_char) -> GENAPIC_RESULT;
    fn integer_get_value = "GenApiIntegerGetValue"(node: NODE_HANDLE, value: *mut i64) -> GENAPIC_RESULT;
    fn integer_set_value = "GenApiIntegerSetValue"(node: NODE_HANDLE, value: i64) -> GENAPIC_RESULT;
    fn integer_get_min = "GenApiIntegerGetMin"(node: NODE_HANDLE, value: *mut i64) -> GENAPIC_RESULT;
    fn integer_get_max = "GenApiIntegerGetMax"(node: NODE_HANDLE, value: *mut i64) -> GENAPIC_RESULT;
    fn integer_get_inc = "GenApiIntegerGetInc"(node: NODE_HANDLE, value: *mut i64) -> GENAPIC_RESULT;
    fn float_get_value = "GenApiFloatGetValue"(node: NODE_HANDLE, value: *mut f64) -> GENAPIC_RESULT;
    fn float_set_value = "GenApiFloatSetValue"(node: NODE_HANDLE, value: f64) -> GENAPIC_RESULT;
    fn float_get_min = "GenApiFloatGetMin"(node: NODE_HANDLE, value: *mut f64) -> GENAPIC_RESULT;
    fn float_get_max = "GenApiFloatGetMax"(node: NODE_HANDLE, value: *mut f64) -> GENAPIC_RESULT;
    fn boolean_get_value = "GenApiBooleanGetValue"(node: NODE_HANDLE, value: *mut bool) -> GENAPIC_RESULT;
    fn boolean_set_value = "GenApiBooleanSetValue"(node: NODE_HANDLE, value: bool) -> GENAPIC_RESULT;
    fn enumeration_get_num_entries = "GenApiEnumerationGetNumEntries"(
        node: NODE_HANDLE,
        num_entries: *mut usize,
    ) -> GENAPIC_RESULT;
    fn enumeration_get_entry_by_index = "GenApiEnumerationGetEntryByIndex"(
        node: NODE_HANDLE,
        index: usize,
        entry: *mut NODE_HANDLE,
    ) -> GENAPIC_RESULT;
    fn enumeration_entry_get_value = "GenApiEnumerationEntryGetValue"(node: NODE_HANDLE, value: *mut i64) -> GENAPIC_RESULT;
    fn enumeration_entry_get_symbolic = "GenApiEnumerationEntryGetSymbolic"(
        node: NODE_HANDLE,
        buf: *mut c_char,
        buf_len: *mut usize,
    ) -> GENAPIC_RESULT;
    fn command_execute = "GenApiCommandExecute"(node: NODE_HANDLE) -> GENAPIC_RESULT;
    fn command_is_done = "GenApiCommandIsDone"(node: NODE_HANDLE, done: *mut bool) -> GENAPIC_RESULT;
    fn get_last_error_message = "GenApiGetLastErrorMessage"(buf: *mut c_char, buf_len: *mut usize) -> GENAPIC_RESULT;
    fn get_last_error_detail = "GenApiGetLastErrorDetail"(buf: *mut c_char, buf_len: *mut usize) -> GENAPIC_RESULT;
}
