// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Built-in camera emulator.
//!
//! Mirrors the pylon camera emulation transport layer: the number of
//! emulated devices comes from the `PYLON_CAMEMU` environment variable, each
//! device exposes a small SFNC feature set and produces paced test images.

mod features;
mod nodemap;
mod pattern;

use std::time::{Duration, Instant};

pub use nodemap::EmulatedNodeMap;

use crate::{
    DeviceBackend, DeviceInfo, Error, GrabResult, GrabStatus, NodeMap, Result, device::Device,
};
use pattern::{FrameSpec, TestImage};

pub(crate) const DEVICE_CLASS: &str = "BaslerCamEmu";

/// Device info of emulated device number `index`.
pub fn device_info(index: usize) -> DeviceInfo {
    let serial_number = features::serial_number(index);
    DeviceInfo {
        vendor_name: "Basler".to_string(),
        model_name: "Emulation".to_string(),
        full_name: format!("Emulation ({serial_number})"),
        serial_number,
        user_defined_name: String::new(),
        device_class: DEVICE_CLASS.to_string(),
        backend: DeviceBackend::Emulated { index },
    }
}

/// An emulated camera.
///
/// The node map outlives open/close cycles, so configuration persists the way
/// it does in a real device's volatile memory.
#[derive(Debug)]
pub struct EmulatedDevice {
    info: DeviceInfo,
    node_map: EmulatedNodeMap,
    open: bool,
    grabbing: bool,
    started_at: Instant,
    next_frame_at: Instant,
    block_id: u64,
}

impl EmulatedDevice {
    pub fn new(index: usize) -> Self {
        let now = Instant::now();
        Self {
            info: device_info(index),
            node_map: features::node_map(index),
            open: false,
            grabbing: false,
            started_at: now,
            next_frame_at: now,
            block_id: 0,
        }
    }

    fn frame_interval(&self) -> Result<Duration> {
        let map = &self.node_map;
        let seconds = if map.boolean("AcquisitionFrameRateEnable")? {
            1.0 / map.float("AcquisitionFrameRate")?
        } else {
            // Free running: bounded by exposure, at most 1000 fps.
            (map.float("ExposureTime")? / 1_000_000.0).max(0.001)
        };
        Ok(Duration::from_secs_f64(seconds))
    }

    fn software_triggered(&mut self) -> Result<bool> {
        let map = &mut self.node_map;
        let selector = map.enum_value("TriggerSelector")?;
        map.set_enum_by_name("TriggerSelector", "FrameStart")?;
        let triggered = map.current_enum_name("TriggerMode")? == "On";
        map.set_enum_value("TriggerSelector", selector)?;
        Ok(triggered)
    }

    fn render(&self) -> Result<GrabResult> {
        let map = &self.node_map;
        let width = map.integer("Width")?;
        let height = map.integer("Height")?;
        let pixel_format = map.current_enum_name("PixelFormat")?;
        let brightness = (map.float("ExposureTime")? / 10000.0)
            * 10f64.powf(map.float("Gain")? / 20.0);
        let spec = FrameSpec {
            width: width as usize,
            height: height as usize,
            pixel_format: &pixel_format,
            image: TestImage::from_selector(&map.current_enum_name("TestImageSelector")?),
            reverse_x: map.boolean("ReverseX")?,
            brightness,
            frame: self.block_id,
        };
        let payload = pattern::render(&spec)
            .ok_or_else(|| Error::Other(format!("Unsupported pixel format {pixel_format}")))?;

        Ok(GrabResult {
            width: width as u32,
            height: height as u32,
            pixel_format,
            block_id: self.block_id,
            timestamp: self.started_at.elapsed().as_nanos() as u64,
            status: GrabStatus::Grabbed,
            error_code: 0,
            error_description: String::new(),
            payload,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open { Ok(()) } else { Err(Error::NotOpen) }
    }
}

impl Device for EmulatedDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn open(&mut self) -> Result<()> {
        self.open = true;
        tracing::debug!("Opened emulated device {}", self.info.serial_number);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.grabbing {
            self.stop_grabbing()?;
        }
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn node_map(&mut self) -> Result<&mut dyn NodeMap> {
        self.ensure_open()?;
        Ok(&mut self.node_map)
    }

    fn start_grabbing(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.grabbing {
            return Ok(());
        }
        self.grabbing = true;
        self.node_map.set_grabbing(true);
        self.next_frame_at = Instant::now();
        self.block_id = 0;
        Ok(())
    }

    fn stop_grabbing(&mut self) -> Result<()> {
        self.grabbing = false;
        self.node_map.set_grabbing(false);
        Ok(())
    }

    fn is_grabbing(&self) -> bool {
        self.grabbing
    }

    fn retrieve_result(&mut self, timeout: Duration) -> Result<GrabResult> {
        if !self.grabbing {
            return Err(Error::NotGrabbing);
        }

        if self.software_triggered()? {
            if !self.node_map.take_trigger() {
                std::thread::sleep(timeout);
                return Err(Error::Timeout);
            }
        } else {
            let now = Instant::now();
            if self.next_frame_at > now {
                let wait = self.next_frame_at - now;
                if wait > timeout {
                    std::thread::sleep(timeout);
                    return Err(Error::Timeout);
                }
                std::thread::sleep(wait);
            }
            self.next_frame_at = self.next_frame_at.max(now) + self.frame_interval()?;
        }

        let result = self.render()?;
        self.block_id += 1;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_device() -> EmulatedDevice {
        let mut device = EmulatedDevice::new(0);
        device.open().unwrap();
        let map = device.node_map().unwrap();
        map.set_integer("Width", 64).unwrap();
        map.set_integer("Height", 48).unwrap();
        device
    }

    #[test]
    fn closed_device_has_no_node_map() {
        let mut device = EmulatedDevice::new(1);
        assert!(matches!(device.node_map(), Err(Error::NotOpen)));
        assert!(matches!(device.start_grabbing(), Err(Error::NotOpen)));
        assert_eq!(device.info().serial_number, "0815-0001");
        assert!(device.info().is_emulated());
    }

    #[test]
    fn grabs_frames_with_current_format() {
        let mut device = open_device();
        device
            .node_map()
            .unwrap()
            .set_enum_by_name("PixelFormat", "RGB8")
            .unwrap();
        device.start_grabbing().unwrap();
        let first = device.retrieve_result(Duration::from_secs(1)).unwrap();
        let second = device.retrieve_result(Duration::from_secs(1)).unwrap();
        assert!(first.succeeded());
        assert_eq!((first.width, first.height), (64, 48));
        assert_eq!(first.pixel_format, "RGB8");
        assert_eq!(first.payload.len(), 64 * 48 * 3);
        assert_eq!(second.block_id, first.block_id + 1);
        assert!(second.timestamp >= first.timestamp);
    }

    #[test]
    fn format_is_locked_while_grabbing() {
        let mut device = open_device();
        device.start_grabbing().unwrap();
        assert!(matches!(
            device.node_map().unwrap().set_integer("Width", 32),
            Err(Error::NotWritable(_))
        ));
        device.stop_grabbing().unwrap();
        device.node_map().unwrap().set_integer("Width", 32).unwrap();
    }

    #[test]
    fn retrieve_requires_grabbing() {
        let mut device = open_device();
        assert!(matches!(
            device.retrieve_result(Duration::from_millis(1)),
            Err(Error::NotGrabbing)
        ));
    }

    #[test]
    fn frame_rate_paces_acquisition() {
        let mut device = open_device();
        let map = device.node_map().unwrap();
        map.set_boolean("AcquisitionFrameRateEnable", true).unwrap();
        map.set_float("AcquisitionFrameRate", 2.0).unwrap();
        device.start_grabbing().unwrap();
        device.retrieve_result(Duration::from_millis(100)).unwrap();
        let err = device
            .retrieve_result(Duration::from_millis(10))
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn software_trigger() {
        let mut device = open_device();
        let map = device.node_map().unwrap();
        map.set_enum_by_name("TriggerMode", "On").unwrap();
        device.start_grabbing().unwrap();
        assert!(
            device
                .retrieve_result(Duration::from_millis(5))
                .unwrap_err()
                .is_timeout()
        );
        device.node_map().unwrap().execute("TriggerSoftware").unwrap();
        assert!(device.retrieve_result(Duration::from_millis(5)).is_ok());
    }
}
