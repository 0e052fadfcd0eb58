//! State Management for pylon Source
//!
//! This module defines the runtime state structures used by pylonsrc:
//! - User settings (device selection, user set, capture error policy)
//! - Runtime state (camera handle, negotiated frame layout, counters)

// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

use gst::glib;
use gstreamer as gst;

use pylon::Camera;

/// Default value for device-user-name/device-serial-number (empty = any)
pub(crate) const DEFAULT_DEVICE_FILTER: &str = "";

/// Default value for device-index (-1 = unset)
pub(crate) const DEFAULT_DEVICE_INDEX: i32 = -1;

/// Default value for user-set (empty = keep the current configuration)
pub(crate) const DEFAULT_USER_SET: &str = "";

/// What to do with frames the camera failed to capture.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Clone, Copy, Default, glib::Enum)]
#[repr(u32)]
#[enum_type(name = "GstPylonCaptureErrorEnum")]
pub enum CaptureErrorMode {
    #[default]
    #[enum_value(name = "Abort: post an error and stop", nick = "abort")]
    Abort = 0,

    #[enum_value(name = "Skip: drop the frame and grab the next one", nick = "skip")]
    Skip = 1,

    #[enum_value(name = "Keep: push the frame as it is", nick = "keep")]
    Keep = 2,
}

/// User-configurable settings for the pylonsrc element.
#[derive(Debug, Clone)]
pub struct Settings {
    /// DeviceUserID of the camera to open
    pub device_user_name: String,

    /// Serial number of the camera to open
    pub device_serial_number: String,

    /// Index among the cameras matching the filters above
    pub device_index: i32,

    /// UserSetSelector entry to load on start
    pub user_set: String,

    pub capture_error: CaptureErrorMode,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            device_user_name: DEFAULT_DEVICE_FILTER.to_owned(),
            device_serial_number: DEFAULT_DEVICE_FILTER.to_owned(),
            device_index: DEFAULT_DEVICE_INDEX,
            user_set: DEFAULT_USER_SET.to_owned(),
            capture_error: CaptureErrorMode::default(),
        }
    }
}

/// Memory layout of the frames pushed downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLayout {
    pub width: u32,
    pub height: u32,

    /// Bytes per row of a packed camera frame, per plane
    pub row_sizes: Vec<usize>,

    /// Bytes per row in the output buffer, per plane
    pub strides: Vec<usize>,

    /// Offsets of the planes in the output buffer
    pub offsets: Vec<usize>,

    /// Rows per plane
    pub plane_heights: Vec<usize>,

    /// Size of the output buffer
    pub size: usize,

    /// Frame rate, 0/1 when unknown
    pub framerate: gst::Fraction,
}

/// Runtime state for the pylonsrc element.
pub struct State {
    /// The opened camera
    pub camera: Camera,

    /// Feature object exposed as the `cam` child
    pub cam: gst::Object,

    /// Layout negotiated in set_caps, None until then
    pub layout: Option<FrameLayout>,

    /// Number of frames pushed so far
    pub frame_counter: u64,
}

/// Context wrapper for the element's mutable state.
///
/// Holds `None` until a camera has been opened.
#[derive(Default)]
pub struct Context {
    pub state: Option<State>,
}
