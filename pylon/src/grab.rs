// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Grab results handed out by a grabbing device.

/// Outcome of one acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabStatus {
    Grabbed,
    Failed,
    Canceled,
}

impl GrabStatus {
    pub(crate) fn from_sys(status: pylon_sys::EPylonGrabStatus) -> Self {
        match status {
            pylon_sys::Grabbed => GrabStatus::Grabbed,
            pylon_sys::Canceled => GrabStatus::Canceled,
            _ => GrabStatus::Failed,
        }
    }
}

/// One acquired image, copied out of the driver's buffer.
///
/// The payload is tightly packed: `height` rows of
/// `width * bytes_per_pixel` bytes, unless the acquisition failed, in which
/// case it may be incomplete.
#[derive(Debug, Clone)]
pub struct GrabResult {
    pub width: u32,
    pub height: u32,
    /// Symbolic pixel format, e.g. `"Mono8"`.
    pub pixel_format: String,
    /// Frame counter maintained by the device.
    pub block_id: u64,
    /// Device timestamp in ticks.
    pub timestamp: u64,
    pub status: GrabStatus,
    pub error_code: u32,
    pub error_description: String,
    pub payload: Vec<u8>,
}

impl GrabResult {
    pub fn succeeded(&self) -> bool {
        self.status == GrabStatus::Grabbed
    }
}
