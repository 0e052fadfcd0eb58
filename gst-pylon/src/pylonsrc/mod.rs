//! pylon Source Element
//!
//! This module implements `pylonsrc`, a GStreamer source element that grabs
//! frames from a Basler camera and pushes them as buffers to downstream
//! elements.
//!
//! ## Responsibilities
//! - Selects and opens a camera (native or emulated)
//! - Negotiates pixel format, size and frame rate with downstream
//! - Grabs frames and copies them into buffers with GStreamer's strides
//! - Exposes the camera's features through the `cam` child object
//!
//! ## Properties (set before PLAYING state)
//! - `device-user-name`: DeviceUserID of the camera to open
//! - `device-serial-number`: serial number of the camera to open
//! - `device-index`: index among the cameras matching the filters above
//! - `user-set`: user set to load when starting
//! - `capture-error`: what to do with frames that failed to capture
//! - `cam`: the camera's feature object (read-only)
//!
//! ## Example Pipeline
//! ```bash
//! gst-launch-1.0 pylonsrc device-serial-number=0815-0000 cam::ExposureTime=5000 ! \
//!     videoconvert ! autovideosink
//! ```
//!
//! ## Architecture
//! - **PushSrc base class**: Implements a source that produces buffers on-demand
//! - **Live source**: Operates in live mode (timestamps based on running time)
//! - **ChildProxy**: Makes `cam::<Feature>` usable from gst-launch

// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

use gst::glib;
use gst::prelude::*;
use gstreamer as gst;
use gstreamer_base as gst_base;

/// Video buffer creation logic (copies grabbed frames into buffers)
mod create_video;

/// Core implementation (properties, state management, GStreamer trait impls)
mod imp;

/// Helper functions for device selection and caps negotiation
mod pylon_helper;

/// State structures (settings, camera, negotiated layout)
mod state;

pub use state::CaptureErrorMode;

/// GLib wrapper type for the PylonSrc element.
///
/// ## Inheritance Chain (GStreamer class hierarchy)
/// - `gst::Object` (base GStreamer object)
/// - `gst::Element` (has pads, state machine)
/// - `gst_base::BaseSrc` (source-specific behavior: scheduling, live mode)
/// - `gst_base::PushSrc` (pushes buffers on-demand via create())
/// - `PylonSrc` (our custom implementation)
glib::wrapper! {
    pub struct PylonSrc(ObjectSubclass<imp::PylonSrc>)
        @extends gst_base::PushSrc, gst_base::BaseSrc, gst::Element, gst::Object,
        @implements gst::ChildProxy;
}

/// Registers the pylonsrc element with GStreamer.
///
/// Called during plugin initialization to make "pylonsrc" available via
/// `gst_element_factory_make("pylonsrc")` or gst-launch.
pub fn register(plugin: &gst::Plugin) -> Result<(), glib::BoolError> {
    gst::Element::register(
        Some(plugin),
        "pylonsrc",
        gst::Rank::NONE,
        PylonSrc::static_type(),
    )
}
