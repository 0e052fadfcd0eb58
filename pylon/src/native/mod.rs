// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Devices served by the pylon runtime.

mod grabber;
mod nodemap;

use std::{ffi::CString, time::Duration};

use pylon_sys::PYLON_DEVICE_HANDLE;

use crate::{
    DeviceBackend, DeviceInfo, Error, GrabResult, NodeMap, PylonApiHandle, Result,
    api::read_string, device::Device,
};
use grabber::StreamGrabber;
use nodemap::NativeNodeMap;

/// Reads the identification of transport-layer device `index`.
///
/// Must be called after `PylonEnumerateDevices`.
pub(crate) fn device_info(api: &PylonApiHandle, index: usize) -> Result<DeviceInfo> {
    let mut handle = std::ptr::null_mut();
    api.check(unsafe { api.get_device_info_handle(index, &mut handle) })?;

    let property = |name: &str| -> Result<String> {
        let c_name = CString::new(name)?;
        Ok(read_string(|buf, len| unsafe {
            api.device_info_get_property_value_by_name(handle, c_name.as_ptr(), buf, len)
        })
        .unwrap_or_default())
    };

    Ok(DeviceInfo {
        vendor_name: property("VendorName")?,
        model_name: property("ModelName")?,
        serial_number: property("SerialNumber")?,
        user_defined_name: property("UserDefinedName")?,
        device_class: property("DeviceClass")?,
        full_name: property("FullName")?,
        backend: DeviceBackend::Native { index },
    })
}

/// A device created through the pylon transport layer factory.
pub struct NativeDevice {
    api: PylonApiHandle,
    info: DeviceInfo,
    handle: PYLON_DEVICE_HANDLE,
    node_map: Option<NativeNodeMap>,
    grabber: Option<StreamGrabber>,
}

// Device handles are not bound to a thread; access is serialized by `Camera`.
unsafe impl Send for NativeDevice {}

impl std::fmt::Debug for NativeDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeDevice")
            .field("info", &self.info)
            .field("open", &self.node_map.is_some())
            .field("grabbing", &self.grabber.is_some())
            .finish()
    }
}

impl NativeDevice {
    pub(crate) fn create(api: PylonApiHandle, info: DeviceInfo) -> Result<Self> {
        let DeviceBackend::Native { index } = info.backend else {
            return Err(Error::NoDevice(info.full_name.clone()));
        };
        let mut handle: PYLON_DEVICE_HANDLE = std::ptr::null_mut();
        api.check(unsafe { api.create_device_by_index(index, &mut handle) })?;
        Ok(Self {
            api,
            info,
            handle,
            node_map: None,
            grabber: None,
        })
    }
}

impl Device for NativeDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn open(&mut self) -> Result<()> {
        if self.node_map.is_some() {
            return Ok(());
        }
        let api = &self.api;
        api.check(unsafe {
            api.device_open(
                self.handle,
                pylon_sys::PYLONC_ACCESS_MODE_CONTROL | pylon_sys::PYLONC_ACCESS_MODE_STREAM,
            )
        })?;
        let mut node_map = std::ptr::null_mut();
        api.check(unsafe { api.device_get_node_map(self.handle, &mut node_map) })?;
        self.node_map = Some(NativeNodeMap::new(api.clone(), node_map));
        tracing::debug!("Opened {}", self.info.full_name);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.grabber.is_some() {
            self.stop_grabbing()?;
        }
        if self.node_map.take().is_some() {
            self.api.check(unsafe { self.api.device_close(self.handle) })?;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.node_map.is_some()
    }

    fn node_map(&mut self) -> Result<&mut dyn NodeMap> {
        match self.node_map.as_mut() {
            Some(map) => Ok(map),
            None => Err(Error::NotOpen),
        }
    }

    fn start_grabbing(&mut self) -> Result<()> {
        if self.grabber.is_some() {
            return Ok(());
        }
        let map = self.node_map.as_mut().ok_or(Error::NotOpen)?;
        let payload_size = usize::try_from(map.integer("PayloadSize")?)
            .map_err(|_| Error::Other("Invalid payload size".to_string()))?;
        let pixel_format = map.current_enum_name("PixelFormat")?;

        let grabber = StreamGrabber::open(self.api.clone(), self.handle, payload_size, pixel_format)?;
        if let Err(err) = map.execute("AcquisitionStart") {
            grabber.close()?;
            return Err(err);
        }
        self.grabber = Some(grabber);
        Ok(())
    }

    fn stop_grabbing(&mut self) -> Result<()> {
        let Some(grabber) = self.grabber.take() else {
            return Ok(());
        };
        if let Some(map) = self.node_map.as_mut() {
            map.execute("AcquisitionStop")?;
        }
        grabber.close()
    }

    fn is_grabbing(&self) -> bool {
        self.grabber.is_some()
    }

    fn retrieve_result(&mut self, timeout: Duration) -> Result<GrabResult> {
        self.grabber
            .as_mut()
            .ok_or(Error::NotGrabbing)?
            .retrieve(timeout)
    }
}

impl Drop for NativeDevice {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!("Failed to close {}: {err}", self.info.full_name);
        }
        unsafe { self.api.destroy_device(self.handle) };
    }
}
