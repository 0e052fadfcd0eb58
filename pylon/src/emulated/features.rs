// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Feature set of an emulated camera.

use super::nodemap::{EmulatedNode, EmulatedNodeMap};
use crate::{FeatureValue, NodeMap};

/// PFNC pixel format codes supported by the emulator.
pub(crate) const PIXEL_FORMATS: &[(&str, i64)] = &[
    ("Mono8", 0x0108_0001),
    ("Mono16", 0x0110_0007),
    ("RGB8", 0x0218_0014),
    ("BGR8", 0x0218_0015),
    ("YCbCr422_8", 0x0210_003B),
    ("YUV422_8", 0x0210_001F),
    ("BayerRG8", 0x0108_0009),
    ("BayerBG8", 0x0108_000B),
    ("BayerGB8", 0x0108_000A),
    ("BayerGR8", 0x0108_0008),
];

pub(crate) const WIDTH_MAX: i64 = 4096;
pub(crate) const HEIGHT_MAX: i64 = 3072;

fn width_max(map: &EmulatedNodeMap) -> i64 {
    WIDTH_MAX - map.integer("OffsetX").unwrap_or(0)
}

fn height_max(map: &EmulatedNodeMap) -> i64 {
    HEIGHT_MAX - map.integer("OffsetY").unwrap_or(0)
}

fn offset_x_max(map: &EmulatedNodeMap) -> i64 {
    WIDTH_MAX - map.integer("Width").unwrap_or(WIDTH_MAX)
}

fn offset_y_max(map: &EmulatedNodeMap) -> i64 {
    HEIGHT_MAX - map.integer("Height").unwrap_or(HEIGHT_MAX)
}

/// Builds the node map of emulated device number `index`.
pub(crate) fn node_map(index: usize) -> EmulatedNodeMap {
    let serial = serial_number(index);
    EmulatedNodeMap::new(vec![
        EmulatedNode::category("Root"),
        EmulatedNode::category("ImageFormatControl"),
        EmulatedNode::integer("Width", 1024, 16, WIDTH_MAX, 2)
            .dynamic_max(width_max)
            .locked_while_grabbing()
            .tooltip("Width of the image provided by the device (in pixels)."),
        EmulatedNode::integer("Height", 1040, 16, HEIGHT_MAX, 2)
            .dynamic_max(height_max)
            .locked_while_grabbing()
            .tooltip("Height of the image provided by the device (in pixels)."),
        EmulatedNode::integer("OffsetX", 0, 0, WIDTH_MAX, 2)
            .dynamic_max(offset_x_max)
            .locked_while_grabbing()
            .tooltip("Horizontal offset from the origin to the region of interest (in pixels)."),
        EmulatedNode::integer("OffsetY", 0, 0, HEIGHT_MAX, 2)
            .dynamic_max(offset_y_max)
            .locked_while_grabbing()
            .tooltip("Vertical offset from the origin to the region of interest (in pixels)."),
        EmulatedNode::integer("WidthMax", WIDTH_MAX, WIDTH_MAX, WIDTH_MAX, 1).read_only(),
        EmulatedNode::integer("HeightMax", HEIGHT_MAX, HEIGHT_MAX, HEIGHT_MAX, 1).read_only(),
        EmulatedNode::enumeration("PixelFormat", PIXEL_FORMATS)
            .locked_while_grabbing()
            .tooltip("Format of the pixels provided by the device."),
        EmulatedNode::boolean("ReverseX", false)
            .tooltip("Flips the image horizontally."),
        EmulatedNode::enumeration(
            "TestImageSelector",
            &[("Off", 0), ("Testimage1", 1), ("Testimage2", 2), ("Testimage3", 3)],
        )
        .tooltip("Selects the type of test image that is sent by the camera."),
        EmulatedNode::category("AcquisitionControl"),
        EmulatedNode::float("ExposureTime", 10000.0, 10.0, 1_000_000.0)
            .tooltip("Exposure time of the camera in microseconds."),
        EmulatedNode::boolean("AcquisitionFrameRateEnable", false)
            .tooltip("Enables setting the camera's acquisition frame rate to a specified value."),
        EmulatedNode::float("AcquisitionFrameRate", 100.0, 1.0, 1000.0)
            .tooltip("Acquisition frame rate of the camera in frames per second."),
        EmulatedNode::enumeration("TriggerSelector", &[("FrameStart", 0), ("FrameBurstStart", 1)])
            .tooltip("Sets the trigger type to be configured."),
        EmulatedNode::enumeration("TriggerMode", &[("Off", 0), ("On", 1)])
            .selected_by("TriggerSelector")
            .tooltip("Sets the mode for the currently selected trigger."),
        EmulatedNode::enumeration("TriggerSource", &[("Software", 0), ("Line1", 1)])
            .selected_by("TriggerSelector")
            .tooltip("Sets the source signal for the selected trigger."),
        EmulatedNode::command("TriggerSoftware")
            .selected_by("TriggerSelector")
            .tooltip("Generates a software trigger signal."),
        EmulatedNode::category("AnalogControl"),
        EmulatedNode::enumeration("GainSelector", &[("All", 0)])
            .tooltip("Sets the gain channel to be adjusted."),
        EmulatedNode::float("Gain", 0.0, 0.0, 36.0)
            .selected_by("GainSelector")
            .tooltip("Value of the currently selected gain in dB."),
        EmulatedNode::enumeration("BlackLevelSelector", &[("All", 0)])
            .tooltip("Sets which black level channel to adjust."),
        EmulatedNode::float("BlackLevel", 0.0, 0.0, 255.0)
            .selected_by("BlackLevelSelector")
            .tooltip("Black level value to be applied to the currently selected channel."),
        EmulatedNode::category("DigitalIOControl"),
        EmulatedNode::enumeration("LineSelector", &[("Line1", 0), ("Line2", 1), ("Line3", 2)])
            .tooltip("Sets the I/O line to be configured."),
        EmulatedNode::boolean("LineInverter", false)
            .selected_by("LineSelector")
            .tooltip("Enables the signal inverter function for the currently selected line."),
        EmulatedNode::category("SequencerControl"),
        EmulatedNode::integer("SequencerSetSelector", 0, 0, 3, 1)
            .tooltip("Sets which sequencer set to configure."),
        EmulatedNode::integer("SequencerSetNext", 0, 0, 3, 1)
            .selected_by("SequencerSetSelector")
            .tooltip("Sets the next sequencer set after the currently selected one."),
        EmulatedNode::category("LUTControl"),
        EmulatedNode::integer("LUTIndex", 0, 0, 4095, 1)
            .tooltip("Sets the pixel value to be replaced with the LUT value."),
        EmulatedNode::integer("LUTValue", 0, 0, 4095, 1)
            .selected_by("LUTIndex")
            .tooltip("Sets the new pixel value for the current LUT index."),
        EmulatedNode::category("DeviceControl"),
        EmulatedNode::string("DeviceVendorName", "Basler").read_only(),
        EmulatedNode::string("DeviceModelName", "Emulation").read_only(),
        EmulatedNode::string("DeviceSerialNumber", "")
            .with_default(FeatureValue::String(serial))
            .read_only(),
        EmulatedNode::string("DeviceUserID", "")
            .tooltip("User-defined name of the device."),
        EmulatedNode::category("UserSetControl"),
        EmulatedNode::enumeration(
            "UserSetSelector",
            &[("Default", 0), ("UserSet1", 1), ("UserSet2", 2), ("UserSet3", 3)],
        )
        .tooltip("Sets the user set or the factory set to load, save or configure."),
        EmulatedNode::command("UserSetLoad")
            .tooltip("Loads the selected set into the camera's volatile memory."),
        EmulatedNode::command("UserSetSave")
            .tooltip("Saves the current active set as the selected user set."),
    ])
}

pub(crate) fn serial_number(index: usize) -> String {
    format!("0815-{index:04}")
}

/// Bytes per pixel of an emulated pixel format.
pub(crate) fn bytes_per_pixel(format: &str) -> Option<usize> {
    match format {
        "Mono8" | "BayerRG8" | "BayerBG8" | "BayerGB8" | "BayerGR8" => Some(1),
        "Mono16" | "YCbCr422_8" | "YUV422_8" => Some(2),
        "RGB8" | "BGR8" => Some(3),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, NodeKind};

    #[test]
    fn every_pixel_format_has_a_size() {
        for (name, _) in PIXEL_FORMATS {
            assert!(bytes_per_pixel(name).is_some(), "{name}");
        }
    }

    #[test]
    fn roi_bounds_follow_offsets() {
        let mut map = node_map(0);
        map.set_integer("Width", 1024).unwrap();
        map.set_integer("OffsetX", 3072).unwrap();
        assert_eq!(map.integer_range("Width").unwrap().max, 1024);
        assert!(matches!(
            map.set_integer("Width", 1026),
            Err(Error::OutOfRange { .. })
        ));
        map.set_integer("OffsetX", 0).unwrap();
        map.set_integer("Width", 4096).unwrap();
        assert_eq!(map.integer_range("OffsetX").unwrap().max, 0);
    }

    #[test]
    fn device_strings() {
        let map = node_map(3);
        assert_eq!(map.string("DeviceSerialNumber").unwrap(), "0815-0003");
        assert_eq!(map.string("DeviceVendorName").unwrap(), "Basler");
        assert_eq!(
            map.node_info("DeviceModelName").unwrap().kind,
            NodeKind::String
        );
    }

    #[test]
    fn user_sets_round_trip() {
        let mut map = node_map(0);
        map.set_float("ExposureTime", 2000.0).unwrap();
        map.set_enum_by_name("UserSetSelector", "UserSet1").unwrap();
        map.execute("UserSetSave").unwrap();

        map.set_enum_by_name("UserSetSelector", "Default").unwrap();
        map.execute("UserSetLoad").unwrap();
        assert_eq!(map.float("ExposureTime").unwrap(), 10000.0);
        assert!(map.execute("UserSetSave").is_err());

        map.set_enum_by_name("UserSetSelector", "UserSet1").unwrap();
        map.execute("UserSetLoad").unwrap();
        assert_eq!(map.float("ExposureTime").unwrap(), 2000.0);
    }

    #[test]
    fn integer_selectors_bank_values() {
        let mut map = node_map(0);
        assert!(map.node_info("SequencerSetSelector").unwrap().is_selector());
        map.set_selector("SequencerSetSelector", 2).unwrap();
        map.set_integer("SequencerSetNext", 3).unwrap();
        map.set_selector("SequencerSetSelector", 1).unwrap();
        assert_eq!(map.integer("SequencerSetNext").unwrap(), 0);
        map.set_selector("SequencerSetSelector", 2).unwrap();
        assert_eq!(map.integer("SequencerSetNext").unwrap(), 3);

        assert_eq!(map.integer_range("LUTIndex").unwrap().len(), 4096);
    }
}
