// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! # pylon - Basler pylon cameras
//!
//! Safe, idiomatic Rust access to Basler cameras through the pylon C runtime,
//! plus a built-in camera emulator for development and testing.
//!
//! ## Overview
//!
//! The pylon runtime (`libpylonc`) is loaded at runtime through the raw FFI
//! table in [`pylon_sys`]. When it is not installed only emulated devices are
//! available, so everything in this crate can be used and tested without the
//! SDK.
//!
//! ### Key Concepts
//!
//! - **Factory**: enumerates devices and creates them ([`TlFactory`])
//! - **Device**: an opened camera that can grab frames ([`Device`])
//! - **Camera**: a cloneable, lockable handle to a device ([`Camera`])
//! - **Node map**: the device's GenICam features, discovered at runtime ([`NodeMap`])
//! - **Grab result**: one acquired image ([`GrabResult`])
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐
//! │ TlFactory │ ── enumerate() ──► DeviceInfo
//! └─────┬─────┘
//!       │ create_device()
//!       ▼
//!  Box<dyn Device> ──► NativeDevice   (libpylonc)
//!       │          └─► EmulatedDevice (PYLON_CAMEMU)
//!       ├─► node_map() ──► &mut dyn NodeMap
//!       └─► retrieve_result() ──► GrabResult
//! ```
//!
//! ## Examples
//!
//! ### Grabbing a frame from the first camera
//!
//! ```no_run
//! use pylon::{Camera, TlFactory};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), pylon::Error> {
//! let factory = TlFactory::new();
//! let devices = factory.enumerate()?;
//! let info = devices.first().ok_or(pylon::Error::NoDevice("any".into()))?;
//!
//! let camera = Camera::new(factory.create_device(info)?);
//! let mut device = camera.lock()?;
//! device.open()?;
//! device.node_map()?.set_enum_by_name("PixelFormat", "Mono8")?;
//! device.start_grabbing()?;
//! let frame = device.retrieve_result(Duration::from_secs(1))?;
//! println!("{}x{} {}", frame.width, frame.height, frame.pixel_format);
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! - [`Device`] and [`NodeMap`] are `Send` but not `Sync`
//! - [`Camera`] serializes all access behind a mutex and can be shared freely
//!
//! ## Environment
//!
//! - `PYLON_ROOT`: pylon installation used to locate `libpylonc`
//! - `PYLON_CAMEMU`: number of emulated cameras to offer

mod api;
mod device;
mod emulated;
mod error;
mod factory;
mod grab;
mod native;
mod node;
mod nodemap;

pub mod config;

pub use api::{PylonApi, PylonApiHandle, load_api};
pub use device::{Camera, Device, DeviceBackend, DeviceInfo};
pub use emulated::{EmulatedDevice, EmulatedNodeMap};
pub use error::{Error, Result};
pub use factory::TlFactory;
pub use grab::{GrabResult, GrabStatus};
pub use native::NativeDevice;
pub use node::{AccessMode, EnumEntry, FeatureValue, FloatRange, IntegerRange, NodeInfo, NodeKind};
pub use nodemap::NodeMap;
