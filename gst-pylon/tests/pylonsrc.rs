// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for pylonsrc.
//!
//! Run against two emulated cameras, so they need neither the pylon SDK nor
//! a connected camera.

use gst::glib;
use gst::prelude::*;
use gstreamer as gst;
use gstreamer_check as gst_check;

fn init() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // Read once by the device factory.
        unsafe { std::env::set_var("PYLON_CAMEMU", "2") };
        gst::init().unwrap();
        gstpylon::plugin_register_static().expect("pylon tests");
    });
}

fn source(properties: &[(&str, glib::Value)]) -> gst::Element {
    let mut builder = gst::ElementFactory::make("pylonsrc");
    for (name, value) in properties {
        builder = builder.property(name, value.clone());
    }
    builder.build().unwrap()
}

fn harness(src: &str, caps: &str) -> gst_check::Harness {
    gst_check::Harness::new_parse(&format!("{src} name=src ! {caps}"))
}

#[test]
fn element_metadata() {
    init();
    let factory = gst::ElementFactory::find("pylonsrc").unwrap();
    assert_eq!(factory.longname(), "Basler/Pylon source element");
    assert_eq!(factory.klass(), "Source/Video/Hardware");

    let templates = factory.static_pad_templates();
    let caps = templates.front().unwrap().caps();
    assert!(caps.iter().any(|s| s.name() == "video/x-bayer"));
}

#[test]
fn produces_gray_frames() {
    init();
    let mut h = harness(
        "pylonsrc device-index=0",
        "video/x-raw,format=GRAY8,width=64,height=48,framerate=50/1",
    );
    h.play();

    for expected in 0..3 {
        let buffer = h.pull().unwrap();
        assert_eq!(buffer.size(), 64 * 48);
        assert_eq!(buffer.offset(), expected);
        assert_eq!(buffer.duration(), Some(gst::ClockTime::from_mseconds(20)));
    }

    let caps = h.sinkpad().unwrap().current_caps().unwrap();
    let s = caps.structure(0).unwrap();
    assert_eq!(s.get::<&str>("format").unwrap(), "GRAY8");
    assert_eq!(s.get::<i32>("width").unwrap(), 64);
}

#[test]
fn pads_rows_to_strides() {
    init();
    let mut h = harness(
        "pylonsrc device-index=0",
        "video/x-raw,format=RGB,width=66,height=16",
    );
    h.play();
    let buffer = h.pull().unwrap();
    // 66 * 3 rounded up to a multiple of 4
    assert_eq!(buffer.size(), 200 * 16);

    let mut h = harness(
        "pylonsrc device-index=1",
        "video/x-bayer,format=rggb,width=66,height=16",
    );
    h.play();
    let buffer = h.pull().unwrap();
    assert_eq!(buffer.size(), 68 * 16);
}

#[test]
fn fixates_to_camera_configuration() {
    init();
    let src = source(&[("device-index", 1i32.to_value())]);
    let cam = src.property::<gst::Object>("cam");
    let camera = gstpylon::pylonobject::bound_camera(&cam).unwrap();
    camera
        .with_node_map(|map| {
            map.set_enum_by_name("PixelFormat", "Mono16")?;
            map.set_integer("Width", 320)?;
            map.set_integer("Height", 240)
        })
        .unwrap();

    let mut h = gst_check::Harness::with_element(&src, None, Some("src"));
    h.play();
    let buffer = h.pull().unwrap();
    assert_eq!(buffer.size(), 320 * 240 * 2);

    let caps = h.sinkpad().unwrap().current_caps().unwrap();
    let s = caps.structure(0).unwrap();
    assert_eq!(s.get::<&str>("format").unwrap(), "GRAY16_LE");
    assert_eq!(s.get::<i32>("height").unwrap(), 240);
}

#[test]
fn cam_child_forwards_features() {
    init();
    let src = source(&[("device-serial-number", "0815-0001".to_value())]);
    let proxy = src.dynamic_cast_ref::<gst::ChildProxy>().unwrap();
    assert_eq!(proxy.children_count(), 1);

    let cam = proxy.child_by_name("cam").unwrap();
    assert!(cam.type_().name().starts_with("GstPylonObject-Basler-Emulation"));
    assert_eq!(cam.property::<String>("DeviceSerialNumber"), "0815-0001");

    proxy.set_child_property("cam::ExposureTime", 2000.0f64);
    assert_eq!(proxy.child_property::<f64>("cam::ExposureTime"), 2000.0);

    proxy.set_child_property("cam::Gain-All", 3.5f64);
    assert_eq!(proxy.child_property::<f64>("cam::Gain-All"), 3.5);

    // The same object is returned until the device selection changes.
    let again = src.property::<gst::Object>("cam");
    assert_eq!(again.upcast_ref::<glib::Object>(), &cam);
}

#[test]
fn cam_usable_after_stop() {
    init();
    let src = source(&[("device-index", 0i32.to_value())]);
    let mut h = gst_check::Harness::with_element(&src, None, Some("src"));
    h.play();
    h.pull().unwrap();
    src.set_state(gst::State::Null).unwrap();

    let proxy = src.dynamic_cast_ref::<gst::ChildProxy>().unwrap();
    proxy.set_child_property("cam::ExposureTime", 4321.0f64);
    assert_eq!(proxy.child_property::<f64>("cam::ExposureTime"), 4321.0);

    let cam = src.property::<gst::Object>("cam");
    let camera = gstpylon::pylonobject::bound_camera(&cam).unwrap();
    assert_eq!(
        camera.with_node_map(|map| map.float("ExposureTime")).unwrap(),
        4321.0
    );
}

#[test]
fn loads_user_set_on_start() {
    init();
    let src = source(&[("device-index", 0i32.to_value()), ("user-set", "UserSet2".to_value())]);
    let cam = src.property::<gst::Object>("cam");
    let camera = gstpylon::pylonobject::bound_camera(&cam).unwrap();
    camera
        .with_node_map(|map| {
            map.set_float("ExposureTime", 1234.0)?;
            map.set_enum_by_name("UserSetSelector", "UserSet2")?;
            map.execute("UserSetSave")?;
            map.set_float("ExposureTime", 5000.0)
        })
        .unwrap();

    src.set_state(gst::State::Paused).unwrap();
    assert_eq!(cam.property::<f64>("ExposureTime"), 1234.0);
    src.set_state(gst::State::Null).unwrap();
}

#[test]
fn multiple_devices_need_selection() {
    init();
    let src = source(&[]);
    assert!(src.set_state(gst::State::Paused).is_err());
    let _ = src.set_state(gst::State::Null);
}

#[test]
fn invalid_device_selection() {
    init();
    let src = source(&[("device-index", 5i32.to_value())]);
    assert!(src.set_state(gst::State::Paused).is_err());
    let _ = src.set_state(gst::State::Null);

    let src = source(&[("device-serial-number", "no-such-camera".to_value())]);
    assert!(src.set_state(gst::State::Paused).is_err());
    let _ = src.set_state(gst::State::Null);
}

#[test]
fn capture_error_property() {
    init();
    let src = source(&[("device-index", 0i32.to_value())]);
    src.set_property_from_str("capture-error", "skip");
    assert_eq!(
        src.property::<gstpylon::pylonsrc::CaptureErrorMode>("capture-error"),
        gstpylon::pylonsrc::CaptureErrorMode::Skip
    );
}
