// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Devices and shared camera handles.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use crate::{Error, GrabResult, NodeMap, Result};

/// Which implementation serves a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceBackend {
    /// A device enumerated by the pylon runtime, by transport-layer index.
    Native { index: usize },
    /// A device of the built-in emulator.
    Emulated { index: usize },
}

/// Identification of an enumerated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub vendor_name: String,
    pub model_name: String,
    pub serial_number: String,
    pub user_defined_name: String,
    pub device_class: String,
    pub full_name: String,
    pub backend: DeviceBackend,
}

impl DeviceInfo {
    /// Name shown to users: the user defined name when set, the model name
    /// otherwise, followed by the serial number.
    pub fn friendly_name(&self) -> String {
        let name = if self.user_defined_name.is_empty() {
            &self.model_name
        } else {
            &self.user_defined_name
        };
        format!("{} ({})", name, self.serial_number)
    }

    pub fn is_emulated(&self) -> bool {
        matches!(self.backend, DeviceBackend::Emulated { .. })
    }
}

/// A camera device.
///
/// A device is created closed; its node map is only available while open, and
/// frames only while grabbing.
pub trait Device: Send {
    fn info(&self) -> &DeviceInfo;

    fn open(&mut self) -> Result<()>;
    fn close(&mut self) -> Result<()>;
    fn is_open(&self) -> bool;

    /// The device's node map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOpen`] if the device is closed.
    fn node_map(&mut self) -> Result<&mut dyn NodeMap>;

    fn start_grabbing(&mut self) -> Result<()>;
    fn stop_grabbing(&mut self) -> Result<()>;
    fn is_grabbing(&self) -> bool;

    /// Waits up to `timeout` for the next frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if no frame arrived in time and
    /// [`Error::NotGrabbing`] if acquisition is not running.
    fn retrieve_result(&mut self, timeout: Duration) -> Result<GrabResult>;
}

/// Cloneable, thread-safe handle to a device.
///
/// The source element and the feature object bound to it share one `Camera`;
/// every access goes through the same lock.
#[derive(Clone)]
pub struct Camera {
    info: DeviceInfo,
    device: Arc<Mutex<Box<dyn Device>>>,
}

impl std::fmt::Debug for Camera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Camera").field("info", &self.info).finish()
    }
}

impl Camera {
    pub fn new(device: Box<dyn Device>) -> Self {
        Self {
            info: device.info().clone(),
            device: Arc::new(Mutex::new(device)),
        }
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Locks the device for exclusive access.
    pub fn lock(&self) -> Result<MutexGuard<'_, Box<dyn Device>>> {
        self.device
            .lock()
            .map_err(|_| Error::Other("Camera mutex poisoned".to_string()))
    }

    /// Runs `f` with the device's node map.
    pub fn with_node_map<T>(&self, f: impl FnOnce(&mut dyn NodeMap) -> Result<T>) -> Result<T> {
        let mut device = self.lock()?;
        f(device.node_map()?)
    }

    /// Whether both handles refer to the same device.
    pub fn ptr_eq(&self, other: &Camera) -> bool {
        Arc::ptr_eq(&self.device, &other.device)
    }
}
