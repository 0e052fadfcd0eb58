// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Device enumeration and creation.

use crate::{
    DeviceBackend, DeviceInfo, Error, PylonApiHandle, Result, config, device::Device, emulated,
    load_api, native,
};

/// Transport layer factory.
///
/// Combines the devices reported by the pylon runtime, when it is installed,
/// with the configured number of emulated devices.
#[derive(Debug, Clone)]
pub struct TlFactory {
    api: Option<PylonApiHandle>,
    emulated_devices: usize,
}

impl TlFactory {
    /// Creates a factory from the environment.
    ///
    /// A missing pylon runtime is not an error: the factory then only offers
    /// emulated devices.
    pub fn new() -> Self {
        let api = match load_api(config::pylonc_so_path()) {
            Ok(api) => Some(api),
            Err(err) => {
                tracing::debug!("pylon runtime not available: {err}");
                None
            }
        };
        Self::from_parts(api, config::emulated_device_count())
    }

    /// Creates a factory from an already loaded runtime and an explicit
    /// number of emulated devices.
    pub fn from_parts(api: Option<PylonApiHandle>, emulated_devices: usize) -> Self {
        Self {
            api,
            emulated_devices: emulated_devices.min(config::MAX_EMULATED_DEVICES),
        }
    }

    /// Whether the pylon runtime was loaded.
    pub fn has_runtime(&self) -> bool {
        self.api.is_some()
    }

    /// Lists all devices: native devices first, then emulated ones.
    pub fn enumerate(&self) -> Result<Vec<DeviceInfo>> {
        let mut devices = Vec::new();

        if let Some(api) = &self.api {
            let mut count = 0usize;
            api.check(unsafe { api.enumerate_devices(&mut count) })?;
            for index in 0..count {
                let info = native::device_info(api, index)?;
                // The runtime's own emulation layer would duplicate ours.
                if info.device_class != emulated::DEVICE_CLASS {
                    devices.push(info);
                }
            }
        }

        devices.extend((0..self.emulated_devices).map(emulated::device_info));
        tracing::debug!("Found {} devices", devices.len());
        Ok(devices)
    }

    /// Creates a closed device for an enumerated [`DeviceInfo`].
    pub fn create_device(&self, info: &DeviceInfo) -> Result<Box<dyn Device>> {
        match info.backend {
            DeviceBackend::Native { .. } => {
                let api = self
                    .api
                    .clone()
                    .ok_or_else(|| Error::NoDevice(info.full_name.clone()))?;
                Ok(Box::new(native::NativeDevice::create(api, info.clone())?))
            }
            DeviceBackend::Emulated { index } if index < self.emulated_devices => {
                Ok(Box::new(emulated::EmulatedDevice::new(index)))
            }
            DeviceBackend::Emulated { .. } => Err(Error::NoDevice(info.full_name.clone())),
        }
    }
}

impl Default for TlFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerates_emulated_devices() {
        let factory = TlFactory::from_parts(None, 2);
        let devices = factory.enumerate().unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].serial_number, "0815-0000");
        assert_eq!(devices[1].serial_number, "0815-0001");
        assert!(devices.iter().all(DeviceInfo::is_emulated));
    }

    #[test]
    fn creates_closed_devices() {
        let factory = TlFactory::from_parts(None, 1);
        let info = &factory.enumerate().unwrap()[0];
        let device = factory.create_device(info).unwrap();
        assert!(!device.is_open());
        assert_eq!(device.info(), info);
    }

    #[test]
    fn rejects_unknown_devices() {
        let factory = TlFactory::from_parts(None, 1);
        let missing = emulated::device_info(5);
        assert!(matches!(
            factory.create_device(&missing),
            Err(Error::NoDevice(_))
        ));

        let mut native = missing.clone();
        native.backend = DeviceBackend::Native { index: 0 };
        assert!(matches!(
            factory.create_device(&native),
            Err(Error::NoDevice(_))
        ));
    }
}
