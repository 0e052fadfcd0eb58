//! GStreamer Plugin for Basler pylon cameras
//!
//! This crate implements the GStreamer plugin `pylon`:
//!
//! - **pylonsrc**: A live source element that grabs frames from a Basler
//!   camera (or the pylon camera emulator) and pushes them downstream
//! - **GstPylonObject**: A family of dynamically registered `GstObject`
//!   types, one per camera model, whose properties mirror the camera's
//!   GenICam features. `pylonsrc` exposes one as its `cam` child, so
//!   features can be set with `pylonsrc cam::ExposureTime=2000`.
//!
//! ## Supported Media Formats
//! - **Video**: GRAY8, GRAY16_LE, RGB, BGR, YUY2, UYVY
//! - **Bayer**: rggb, bggr, gbrg, grbg

// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

#![allow(clippy::non_send_fields_in_send_ty, unused_doc_comments)]

use gst::glib;
use gstreamer as gst;

/// Dynamic feature-to-property bridge
pub mod pylonobject;

/// pylon source element (grabs frames from a camera)
pub mod pylonsrc;

/// Registers all elements of the plugin.
fn plugin_init(plugin: &gst::Plugin) -> Result<(), glib::BoolError> {
    pylonsrc::register(plugin)?;

    Ok(())
}

gst::plugin_define!(
    pylon,
    env!("CARGO_PKG_DESCRIPTION"),
    plugin_init,
    concat!(env!("CARGO_PKG_VERSION"), "-", env!("COMMIT_ID")),
    "Apache-2.0",
    env!("CARGO_PKG_NAME"),
    env!("CARGO_PKG_NAME"),
    env!("CARGO_PKG_REPOSITORY"),
    env!("BUILD_REL_DATE")
);
