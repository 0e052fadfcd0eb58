//! Video Buffer Creation for pylon Source
//!
//! This module turns grab results into GStreamer buffers.
//!
//! ## Layout
//! pylon delivers frames without row padding, while GStreamer expects each
//! row to start at the stride negotiated in the caps. Rows are copied one by
//! one into a buffer laid out like the negotiated [`FrameLayout`].
//!
//! ## Timestamps
//! - PTS: running time when the frame was retrieved
//! - Duration: one frame period of the negotiated frame rate
//! - Offset: number of frames pushed before

// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

use glib::subclass::types::ObjectSubclassExt;
use gst::prelude::*;
use gstreamer as gst;

use pylon::GrabResult;
use tracing::trace;

use crate::pylonsrc::imp::{CAT, CreateState, PylonSrc};
use crate::pylonsrc::state::{CaptureErrorMode, FrameLayout};

/// Creates a GStreamer video buffer from a grab result.
///
/// Failed grabs are handled according to `capture_error`.
///
/// # Returns
/// * `Ok(CreateState::DataCreated(buffer))` if a buffer was produced
/// * `Ok(CreateState::NoDataCreated)` if a failed frame was skipped
/// * `Err(FlowError)` if the frame failed in abort mode or caps are missing
pub(crate) fn create_video(
    src: &PylonSrc,
    frame: GrabResult,
    capture_error: CaptureErrorMode,
) -> Result<CreateState, gst::FlowError> {
    if !frame.succeeded() {
        match capture_error {
            CaptureErrorMode::Abort => {
                gst::element_imp_error!(
                    src,
                    gst::ResourceError::Read,
                    ["Failed to capture frame {}: {}", frame.block_id, frame.error_description]
                );
                return Err(gst::FlowError::Error);
            }
            CaptureErrorMode::Skip => {
                gst::warning!(
                    CAT,
                    imp = src,
                    "Skipping frame {}: {}",
                    frame.block_id,
                    frame.error_description
                );
                return Ok(CreateState::NoDataCreated);
            }
            CaptureErrorMode::Keep => {
                gst::warning!(
                    CAT,
                    imp = src,
                    "Keeping failed frame {}: {}",
                    frame.block_id,
                    frame.error_description
                );
            }
        }
    }

    trace!(block_id = frame.block_id, size = frame.payload.len(), "Retrieved frame");
    let running_time = src.obj().current_running_time();

    let mut context = src.context.lock().map_err(|_| gst::FlowError::Error)?;
    let state = context.state.as_mut().ok_or(gst::FlowError::Error)?;
    let layout = state.layout.as_ref().ok_or(gst::FlowError::NotNegotiated)?;

    if frame.width != layout.width || frame.height != layout.height {
        gst::warning!(
            CAT,
            imp = src,
            "Frame {}x{} does not match negotiated {}x{}",
            frame.width,
            frame.height,
            layout.width,
            layout.height
        );
    }

    let mut buffer = gst::Buffer::with_size(layout.size).map_err(|_| gst::FlowError::Error)?;
    {
        let buffer = buffer.get_mut().ok_or(gst::FlowError::Error)?;
        buffer.set_pts(running_time);
        buffer.set_duration(frame_duration(layout));
        buffer.set_offset(state.frame_counter);
        buffer.set_offset_end(state.frame_counter + 1);

        let mut map = buffer.map_writable().map_err(|_| gst::FlowError::Error)?;
        copy_rows(layout, &frame.payload, map.as_mut_slice());
    }

    gst::trace!(
        CAT,
        imp = src,
        "Produced buffer {} for frame {} pts {:?}",
        state.frame_counter,
        frame.block_id,
        buffer.pts()
    );

    state.frame_counter += 1;
    Ok(CreateState::DataCreated(buffer))
}

/// Duration of one frame, unknown for variable frame rates.
fn frame_duration(layout: &FrameLayout) -> Option<gst::ClockTime> {
    let framerate = layout.framerate;
    if framerate.numer() <= 0 {
        return None;
    }
    gst::ClockTime::SECOND.mul_div_floor(framerate.denom() as u64, framerate.numer() as u64)
}

/// Copies a packed frame into `dest` with the strides of `layout`.
///
/// Short payloads leave the remaining rows zeroed.
pub(crate) fn copy_rows(layout: &FrameLayout, payload: &[u8], dest: &mut [u8]) {
    let mut src_offset = 0;
    for plane in 0..layout.strides.len() {
        let row_size = layout.row_sizes[plane].min(layout.strides[plane]);
        for row in 0..layout.plane_heights[plane] {
            let dest_start = layout.offsets[plane] + row * layout.strides[plane];
            let src_end = src_offset + row_size;
            match (payload.get(src_offset..src_end), dest.get_mut(dest_start..dest_start + row_size)) {
                (Some(src_row), Some(dest_row)) => dest_row.copy_from_slice(src_row),
                (None, Some(dest_row)) => dest_row.fill(0),
                _ => {}
            }
            src_offset += layout.row_sizes[plane];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(width: usize, height: usize, stride: usize) -> FrameLayout {
        FrameLayout {
            width: width as u32,
            height: height as u32,
            row_sizes: vec![width],
            strides: vec![stride],
            offsets: vec![0],
            plane_heights: vec![height],
            size: stride * height,
            framerate: gst::Fraction::new(25, 1),
        }
    }

    #[test]
    fn copies_rows_with_stride() {
        let layout = layout(3, 2, 4);
        let payload = [1, 2, 3, 4, 5, 6];
        let mut dest = vec![0xff; layout.size];
        copy_rows(&layout, &payload, &mut dest);
        assert_eq!(dest, vec![1, 2, 3, 0xff, 4, 5, 6, 0xff]);
    }

    #[test]
    fn short_payload_is_zero_filled() {
        let layout = layout(2, 2, 4);
        let mut dest = vec![0xff; layout.size];
        copy_rows(&layout, &[7, 8], &mut dest);
        assert_eq!(dest, vec![7, 8, 0xff, 0xff, 0, 0, 0xff, 0xff]);
    }

    #[test]
    fn frame_durations() {
        let mut layout = layout(2, 2, 4);
        assert_eq!(
            frame_duration(&layout),
            Some(gst::ClockTime::from_mseconds(40))
        );
        layout.framerate = gst::Fraction::new(0, 1);
        assert_eq!(frame_duration(&layout), None);
    }
}
