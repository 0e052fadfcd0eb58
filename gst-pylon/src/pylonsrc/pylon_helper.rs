//! pylon Helper Functions
//!
//! Camera-side helpers for pylonsrc:
//! - Device selection from the element's settings
//! - Mapping between pylon pixel formats and GStreamer caps
//! - Caps reporting, fixation and application on the camera node map
//! - Output frame layout

// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

use std::sync::LazyLock;

use gst::glib;
use gst::glib::value::ToSendValue;
use gstreamer as gst;
use gstreamer_video as gst_video;

use pylon::{Camera, DeviceInfo, NodeMap, TlFactory};

use crate::pylonobject;
use crate::pylonsrc::imp::CAT;
use crate::pylonsrc::state::{FrameLayout, Settings, State};

/// Transport layer factory shared by all pylonsrc instances.
pub(crate) static FACTORY: LazyLock<TlFactory> = LazyLock::new(TlFactory::new);

/// A pylon pixel format and its GStreamer caps.
pub(crate) struct FormatMapping {
    /// pylon names, preferred first
    pub pylon: &'static [&'static str],
    pub media_type: &'static str,
    pub format: &'static str,
}

pub(crate) const RAW_MEDIA_TYPE: &str = "video/x-raw";
pub(crate) const BAYER_MEDIA_TYPE: &str = "video/x-bayer";

pub(crate) const FORMATS: &[FormatMapping] = &[
    FormatMapping {
        pylon: &["Mono8"],
        media_type: RAW_MEDIA_TYPE,
        format: "GRAY8",
    },
    FormatMapping {
        pylon: &["Mono16"],
        media_type: RAW_MEDIA_TYPE,
        format: "GRAY16_LE",
    },
    FormatMapping {
        pylon: &["RGB8", "RGB8Packed"],
        media_type: RAW_MEDIA_TYPE,
        format: "RGB",
    },
    FormatMapping {
        pylon: &["BGR8", "BGR8Packed"],
        media_type: RAW_MEDIA_TYPE,
        format: "BGR",
    },
    FormatMapping {
        pylon: &["YCbCr422_8", "YUV422_YUYV_Packed"],
        media_type: RAW_MEDIA_TYPE,
        format: "YUY2",
    },
    FormatMapping {
        pylon: &["YUV422_8", "YUV422_8_UYVY", "YUV422Packed"],
        media_type: RAW_MEDIA_TYPE,
        format: "UYVY",
    },
    FormatMapping {
        pylon: &["BayerRG8"],
        media_type: BAYER_MEDIA_TYPE,
        format: "rggb",
    },
    FormatMapping {
        pylon: &["BayerBG8"],
        media_type: BAYER_MEDIA_TYPE,
        format: "bggr",
    },
    FormatMapping {
        pylon: &["BayerGB8"],
        media_type: BAYER_MEDIA_TYPE,
        format: "gbrg",
    },
    FormatMapping {
        pylon: &["BayerGR8"],
        media_type: BAYER_MEDIA_TYPE,
        format: "grbg",
    },
];

/// Mapping of a pylon pixel format name.
pub(crate) fn mapping_for_pylon(name: &str) -> Option<&'static FormatMapping> {
    FORMATS.iter().find(|m| m.pylon.contains(&name))
}

/// Mapping of a caps media type and format.
pub(crate) fn mapping_for_caps(media_type: &str, format: &str) -> Option<&'static FormatMapping> {
    FORMATS
        .iter()
        .find(|m| m.media_type == media_type && m.format == format)
}

/// Caps of the src pad template: every format the element can output.
pub(crate) fn template_caps() -> gst::Caps {
    let mut caps = gst::Caps::new_empty();
    {
        let caps = caps.make_mut();
        for media_type in [RAW_MEDIA_TYPE, BAYER_MEDIA_TYPE] {
            let formats: Vec<&str> = FORMATS
                .iter()
                .filter(|m| m.media_type == media_type)
                .map(|m| m.format)
                .collect();
            caps.append_structure(
                gst::Structure::builder(media_type)
                    .field("format", gst::List::new(formats))
                    .field("width", gst::IntRange::new(1, i32::MAX))
                    .field("height", gst::IntRange::new(1, i32::MAX))
                    .field(
                        "framerate",
                        gst::FractionRange::new(
                            gst::Fraction::new(0, 1),
                            gst::Fraction::new(i32::MAX, 1),
                        ),
                    )
                    .build(),
            );
        }
    }
    caps
}

/// Picks the device described by `settings` among `devices`.
///
/// Filters by user name and serial number first; `device-index` then picks
/// among the remaining candidates.
pub(crate) fn select_device(
    devices: Vec<DeviceInfo>,
    settings: &Settings,
) -> Result<DeviceInfo, gst::ErrorMessage> {
    if devices.is_empty() {
        return Err(gst::error_msg!(
            gst::ResourceError::NotFound,
            ["No devices found"]
        ));
    }

    let candidates: Vec<DeviceInfo> = devices
        .into_iter()
        .filter(|d| {
            settings.device_user_name.is_empty() || d.user_defined_name == settings.device_user_name
        })
        .filter(|d| {
            settings.device_serial_number.is_empty()
                || d.serial_number == settings.device_serial_number
        })
        .collect();

    if candidates.is_empty() {
        return Err(gst::error_msg!(
            gst::ResourceError::NotFound,
            [
                "No devices found matching user name \"{}\" and serial number \"{}\"",
                settings.device_user_name,
                settings.device_serial_number
            ]
        ));
    }

    if settings.device_index >= 0 {
        let index = settings.device_index as usize;
        let count = candidates.len();
        return candidates.into_iter().nth(index).ok_or_else(|| {
            gst::error_msg!(
                gst::ResourceError::NotFound,
                [
                    "Device index {} out of range, only {} devices match",
                    index,
                    count
                ]
            )
        });
    }

    if candidates.len() > 1 {
        let names: Vec<String> = candidates.iter().map(DeviceInfo::friendly_name).collect();
        return Err(gst::error_msg!(
            gst::ResourceError::NotFound,
            [
                "At least {} devices match: {}. Please specify device-user-name, \
                 device-serial-number or device-index to select one",
                candidates.len(),
                names.join(", ")
            ]
        ));
    }

    candidates.into_iter().next().ok_or_else(|| {
        gst::error_msg!(gst::ResourceError::NotFound, ["No devices found"])
    })
}

/// Name the feature object type of a device is registered under.
pub(crate) fn device_type_name(info: &DeviceInfo) -> String {
    format!("{}-{}", info.vendor_name, info.model_name)
}

/// Selects, creates and opens the camera described by `settings`.
pub(crate) fn open_camera(settings: &Settings) -> Result<State, gst::ErrorMessage> {
    let devices = FACTORY.enumerate().map_err(|err| {
        gst::error_msg!(
            gst::ResourceError::NotFound,
            ["Failed to enumerate devices: {}", err]
        )
    })?;
    let info = select_device(devices, settings)?;
    gst::info!(CAT, "Selected device {}", info.full_name);

    let device = FACTORY.create_device(&info).map_err(|err| {
        gst::error_msg!(
            gst::ResourceError::OpenRead,
            ["Failed to create device {}: {}", info.full_name, err]
        )
    })?;
    let camera = Camera::new(device);
    ensure_open(&camera)?;

    let cam = pylonobject::new(&camera, &device_type_name(&info)).map_err(|err| {
        gst::error_msg!(
            gst::CoreError::Failed,
            ["Failed to create feature object: {}", err]
        )
    })?;

    Ok(State {
        camera,
        cam,
        layout: None,
        frame_counter: 0,
    })
}

/// Opens `camera` unless it already is.
pub(crate) fn ensure_open(camera: &Camera) -> Result<(), gst::ErrorMessage> {
    let mut device = camera
        .lock()
        .map_err(|err| gst::error_msg!(gst::ResourceError::OpenRead, ["{}", err]))?;
    if device.is_open() {
        return Ok(());
    }
    device.open().map_err(|err| {
        gst::error_msg!(
            gst::ResourceError::OpenRead,
            ["Failed to open {}: {}", camera.info().full_name, err]
        )
    })
}

/// Loads the user set `name` into the camera.
pub(crate) fn load_user_set(node_map: &mut dyn NodeMap, name: &str) -> pylon::Result<()> {
    node_map.set_enum_by_name("UserSetSelector", name)?;
    node_map.execute("UserSetLoad")
}

fn int_field(range: pylon::IntegerRange) -> glib::SendValue {
    let min = range.min.clamp(1, i32::MAX as i64) as i32;
    let max = range.max.clamp(1, i32::MAX as i64) as i32;
    if min >= max {
        return min.to_send_value();
    }
    if range.inc > 1 && (max - min) as i64 % range.inc == 0 {
        gst::IntRange::with_step(min, max, range.inc as i32).to_send_value()
    } else {
        gst::IntRange::new(min, max).to_send_value()
    }
}

/// Closest fraction to a frame rate in Hz.
pub(crate) fn fraction(rate: f64) -> gst::Fraction {
    gst::Fraction::approximate_f64(rate)
        .unwrap_or_else(|| gst::Fraction::new(rate.round() as i32, 1))
}

fn framerate_field(node_map: &dyn NodeMap) -> glib::SendValue {
    match node_map.float_range("AcquisitionFrameRate") {
        Ok(range) if range.min < range.max => {
            gst::FractionRange::new(fraction(range.min), fraction(range.max)).to_send_value()
        }
        Ok(range) => fraction(range.min).to_send_value(),
        Err(_) => gst::FractionRange::new(gst::Fraction::new(0, 1), gst::Fraction::new(i32::MAX, 1))
            .to_send_value(),
    }
}

/// Caps describing what the camera can currently produce.
///
/// The current PixelFormat comes first so it is preferred in negotiation.
pub(crate) fn camera_caps(node_map: &dyn NodeMap) -> pylon::Result<gst::Caps> {
    let current = node_map.current_enum_name("PixelFormat").ok();
    let mut names: Vec<String> = node_map
        .enum_entries("PixelFormat")?
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    if let Some(current) = current {
        if let Some(pos) = names.iter().position(|n| *n == current) {
            let current = names.remove(pos);
            names.insert(0, current);
        }
    }

    let width = int_field(node_map.integer_range("Width")?);
    let height = int_field(node_map.integer_range("Height")?);
    let framerate = framerate_field(node_map);

    let mut caps = gst::Caps::new_empty();
    {
        let caps = caps.make_mut();
        let mut seen = Vec::new();
        for mapping in names.iter().filter_map(|n| mapping_for_pylon(n)) {
            if seen.contains(&mapping.format) {
                continue;
            }
            seen.push(mapping.format);
            let mut structure = gst::Structure::builder(mapping.media_type)
                .field("format", mapping.format)
                .build();
            structure.set_value("width", width.clone());
            structure.set_value("height", height.clone());
            structure.set_value("framerate", framerate.clone());
            caps.append_structure(structure);
        }
    }
    Ok(caps)
}

/// Fixates `caps` towards the camera's current configuration.
pub(crate) fn fixate_caps(node_map: &dyn NodeMap, mut caps: gst::Caps) -> gst::Caps {
    caps.truncate();
    {
        let caps = caps.make_mut();
        if let Some(s) = caps.structure_mut(0) {
            if let Ok(width) = node_map.integer("Width") {
                s.fixate_field_nearest_int("width", width.clamp(1, i32::MAX as i64) as i32);
            }
            if let Ok(height) = node_map.integer("Height") {
                s.fixate_field_nearest_int("height", height.clamp(1, i32::MAX as i64) as i32);
            }
            if let Ok(rate) = node_map.float("AcquisitionFrameRate") {
                s.fixate_field_nearest_fraction("framerate", fraction(rate));
            }
        }
    }
    caps
}

/// Writes the format, size and frame rate of fixed `caps` to the camera.
pub(crate) fn apply_caps(
    node_map: &mut dyn NodeMap,
    caps: &gst::Caps,
) -> Result<FrameLayout, gst::LoggableError> {
    let s = caps
        .structure(0)
        .ok_or_else(|| gst::loggable_error!(CAT, "No structure in caps {}", caps))?;
    let format = s
        .get::<&str>("format")
        .map_err(|e| gst::loggable_error!(CAT, "Failed to get format from caps: {}", e))?;
    let width = s
        .get::<i32>("width")
        .map_err(|e| gst::loggable_error!(CAT, "Failed to get width from caps: {}", e))?;
    let height = s
        .get::<i32>("height")
        .map_err(|e| gst::loggable_error!(CAT, "Failed to get height from caps: {}", e))?;
    let framerate = s
        .get::<gst::Fraction>("framerate")
        .unwrap_or_else(|_| gst::Fraction::new(0, 1));

    let mapping = mapping_for_caps(s.name(), format)
        .ok_or_else(|| gst::loggable_error!(CAT, "Unsupported caps {}", caps))?;
    let entries = node_map
        .enum_entries("PixelFormat")
        .map_err(|e| gst::loggable_error!(CAT, "Failed to read PixelFormat: {}", e))?;
    let pixel_format = mapping
        .pylon
        .iter()
        .find(|name| entries.iter().any(|e| e.name == **name))
        .ok_or_else(|| gst::loggable_error!(CAT, "Camera does not support {}", format))?;

    node_map
        .set_enum_by_name("PixelFormat", pixel_format)
        .map_err(|e| gst::loggable_error!(CAT, "Failed to set PixelFormat: {}", e))?;
    node_map
        .set_integer("Width", width as i64)
        .map_err(|e| gst::loggable_error!(CAT, "Failed to set Width: {}", e))?;
    node_map
        .set_integer("Height", height as i64)
        .map_err(|e| gst::loggable_error!(CAT, "Failed to set Height: {}", e))?;

    if framerate.numer() > 0 && node_map.has_feature("AcquisitionFrameRate") {
        if node_map.has_feature("AcquisitionFrameRateEnable") {
            node_map
                .set_boolean("AcquisitionFrameRateEnable", true)
                .map_err(|e| gst::loggable_error!(CAT, "Failed to enable frame rate: {}", e))?;
        }
        let rate = framerate.numer() as f64 / framerate.denom() as f64;
        node_map
            .set_float("AcquisitionFrameRate", rate)
            .map_err(|e| gst::loggable_error!(CAT, "Failed to set AcquisitionFrameRate: {}", e))?;
    }

    gst::debug!(
        CAT,
        "Configured camera for {} {}x{} @ {}",
        pixel_format,
        width,
        height,
        framerate
    );
    frame_layout(caps)
}

fn round_up_4(value: usize) -> usize {
    (value + 3) & !3
}

/// Layout of the buffers pushed for fixed `caps`.
pub(crate) fn frame_layout(caps: &gst::Caps) -> Result<FrameLayout, gst::LoggableError> {
    let s = caps
        .structure(0)
        .ok_or_else(|| gst::loggable_error!(CAT, "No structure in caps {}", caps))?;
    let framerate = s
        .get::<gst::Fraction>("framerate")
        .unwrap_or_else(|_| gst::Fraction::new(0, 1));

    if s.name() == BAYER_MEDIA_TYPE {
        let width = s
            .get::<i32>("width")
            .map_err(|e| gst::loggable_error!(CAT, "Failed to get width from caps: {}", e))?;
        let height = s
            .get::<i32>("height")
            .map_err(|e| gst::loggable_error!(CAT, "Failed to get height from caps: {}", e))?;
        let (width, height) = (width.max(0) as usize, height.max(0) as usize);
        let stride = round_up_4(width);
        return Ok(FrameLayout {
            width: width as u32,
            height: height as u32,
            row_sizes: vec![width],
            strides: vec![stride],
            offsets: vec![0],
            plane_heights: vec![height],
            size: stride * height,
            framerate,
        });
    }

    let info = gst_video::VideoInfo::from_caps(caps)
        .map_err(|e| gst::loggable_error!(CAT, "Invalid video caps {}: {}", caps, e))?;
    let format_info = info.format_info();
    let width = info.width() as usize;
    let height = info.height() as usize;

    let planes = info.n_planes() as usize;
    let mut row_sizes = Vec::with_capacity(planes);
    let mut plane_heights = Vec::with_capacity(planes);
    for plane in 0..planes {
        let pixel_stride = format_info.pixel_stride()[plane].max(0) as usize;
        let plane_width = format_info.scale_width(plane as u8, width as u32) as usize;
        let plane_height = format_info.scale_height(plane as u8, height as u32) as usize;
        // Packed 4:2:2 formats keep two pixels in one macro pixel.
        let row_size = if format_info.is_yuv() && planes == 1 && pixel_stride == 2 {
            round_up_2(width) * 2
        } else {
            plane_width * pixel_stride
        };
        row_sizes.push(row_size);
        plane_heights.push(plane_height);
    }

    Ok(FrameLayout {
        width: width as u32,
        height: height as u32,
        row_sizes,
        strides: info.stride().iter().map(|s| (*s).max(0) as usize).collect(),
        offsets: info.offset().to_vec(),
        plane_heights,
        size: info.size(),
        framerate,
    })
}

fn round_up_2(value: usize) -> usize {
    (value + 1) & !1
}
