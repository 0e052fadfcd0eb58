//! Build Script for gst-pylon
//!
//! Generates version information for the GStreamer plugin using
//! `gst_plugin_version_helper`.
//!
//! ## Generated Environment Variables
//! - `COMMIT_ID`: Git commit hash (for version string)
//! - `BUILD_REL_DATE`: Build date (for plugin metadata)

// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

fn main() {
    gst_plugin_version_helper::info()
}
