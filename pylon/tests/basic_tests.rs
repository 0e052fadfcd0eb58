// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Basic integration tests for the pylon bindings.
//!
//! These tests run against the built-in emulator, so they need neither the
//! pylon SDK nor a connected camera.
//!
//! # Test Coverage
//!
//! - Device enumeration and creation
//! - Node map discovery and typed feature access
//! - Selector handling
//! - Grabbing through a shared [`Camera`] handle

use std::time::Duration;

use pylon::{Camera, Error, FeatureValue, NodeKind, TlFactory};
use tracing::info;

/// Ensures logging is initialized only once across all tests.
static LOG_ONCE: std::sync::Once = std::sync::Once::new();

/// Initializes logging and returns a factory offering `devices` emulated
/// cameras and no native ones.
fn setup_test(devices: usize) -> TlFactory {
    // Initialize logging once (respects RUST_LOG environment variable)
    LOG_ONCE.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::builder()
                    .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .init();
    });

    TlFactory::from_parts(None, devices)
}

/// Opens the first emulated camera.
fn open_camera(factory: &TlFactory) -> Camera {
    let devices = factory.enumerate().unwrap();
    let camera = Camera::new(factory.create_device(&devices[0]).unwrap());
    camera.lock().unwrap().open().unwrap();
    camera
}

/// Lists every feature with its kind and current value.
#[test]
fn node_map_discovery() {
    let factory = setup_test(1);
    let camera = open_camera(&factory);

    camera
        .with_node_map(|map| {
            let names = map.feature_names()?;
            assert!(names.iter().any(|n| n == "ExposureTime"));
            for name in names {
                let info = map.node_info(&name)?;
                if info.kind.has_value() && info.access.is_readable() {
                    info!("{} ({}) = {}", name, info.kind, map.get(&name)?);
                }
            }
            Ok(())
        })
        .unwrap();
}

/// Writes features of every kind through the generic accessors.
#[test]
fn typed_feature_access() {
    let factory = setup_test(1);
    let camera = open_camera(&factory);

    camera
        .with_node_map(|map| {
            map.set("ExposureTime", &FeatureValue::Float(5000.0))?;
            map.set("ReverseX", &FeatureValue::Boolean(true))?;
            map.set("DeviceUserID", &FeatureValue::String("left".into()))?;
            map.set_enum_by_name("PixelFormat", "BayerRG8")?;

            assert_eq!(map.float("ExposureTime")?, 5000.0);
            assert!(map.boolean("ReverseX")?);
            assert_eq!(map.string("DeviceUserID")?, "left");
            assert_eq!(map.current_enum_name("PixelFormat")?, "BayerRG8");
            assert_eq!(map.node_info("PixelFormat")?.kind, NodeKind::Enumeration);
            Ok(())
        })
        .unwrap();
}

/// Selected features keep one value per selector entry.
#[test]
fn selectors() {
    let factory = setup_test(1);
    let camera = open_camera(&factory);

    camera
        .with_node_map(|map| {
            let info = map.node_info("LineSelector")?;
            assert!(info.is_selector());
            assert_eq!(info.selected, vec!["LineInverter".to_string()]);

            map.set_selector("LineSelector", 1)?;
            map.set_boolean("LineInverter", true)?;
            map.set_selector("LineSelector", 2)?;
            assert!(!map.boolean("LineInverter")?);
            map.set_selector("LineSelector", 1)?;
            assert!(map.boolean("LineInverter")?);
            Ok(())
        })
        .unwrap();
}

/// Grabs a few frames and checks their geometry.
#[test]
fn grab_frames() {
    let factory = setup_test(1);
    let camera = open_camera(&factory);

    let mut device = camera.lock().unwrap();
    let map = device.node_map().unwrap();
    map.set_integer("Width", 320).unwrap();
    map.set_integer("Height", 240).unwrap();
    map.set_enum_by_name("PixelFormat", "Mono16").unwrap();
    device.start_grabbing().unwrap();

    for expected in 0..3 {
        let frame = device.retrieve_result(Duration::from_secs(5)).unwrap();
        assert!(frame.succeeded());
        assert_eq!(frame.block_id, expected);
        assert_eq!(frame.payload.len(), 320 * 240 * 2);
    }

    device.stop_grabbing().unwrap();
    device.close().unwrap();
    assert!(matches!(device.node_map(), Err(Error::NotOpen)));
}

/// Handles cloned from one camera share the device.
#[test]
fn shared_camera_handle() {
    let factory = setup_test(2);
    let camera = open_camera(&factory);
    let clone = camera.clone();
    assert!(camera.ptr_eq(&clone));

    clone
        .with_node_map(|map| map.set_float("Gain", 12.0))
        .unwrap();
    let gain = camera.with_node_map(|map| map.float("Gain")).unwrap();
    assert_eq!(gain, 12.0);

    let devices = factory.enumerate().unwrap();
    let other = Camera::new(factory.create_device(&devices[1]).unwrap());
    assert!(!camera.ptr_eq(&other));
    assert_eq!(other.info().serial_number, "0815-0001");
}
