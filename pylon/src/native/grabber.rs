// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Stream grabber of a native device.

use std::time::Duration;

use pylon_sys::{
    PYLON_DEVICE_HANDLE, PYLON_STREAMBUFFER_HANDLE, PYLON_STREAMGRABBER_HANDLE,
    PYLON_WAITOBJECT_HANDLE, PylonGrabResult_t,
};

use crate::{Error, GrabResult, GrabStatus, PylonApiHandle, Result};

/// Number of buffers queued to the driver.
const NUM_BUFFERS: usize = 10;

/// An open stream grabber with its registered buffers.
///
/// Buffers are boxed slices so their addresses stay fixed while registered.
pub(crate) struct StreamGrabber {
    api: PylonApiHandle,
    handle: PYLON_STREAMGRABBER_HANDLE,
    wait_object: PYLON_WAITOBJECT_HANDLE,
    buffers: Vec<(Box<[u8]>, PYLON_STREAMBUFFER_HANDLE)>,
    pixel_format: String,
}

unsafe impl Send for StreamGrabber {}

impl StreamGrabber {
    /// Opens channel 0 of `device`, registers and queues buffers of
    /// `payload_size` bytes and starts streaming.
    pub(crate) fn open(
        api: PylonApiHandle,
        device: PYLON_DEVICE_HANDLE,
        payload_size: usize,
        pixel_format: String,
    ) -> Result<Self> {
        let mut channels = 0usize;
        api.check(unsafe { api.device_get_num_stream_grabber_channels(device, &mut channels) })?;
        if channels == 0 {
            return Err(Error::Other("Device has no stream grabber".to_string()));
        }

        let mut handle: PYLON_STREAMGRABBER_HANDLE = std::ptr::null_mut();
        api.check(unsafe { api.device_get_stream_grabber(device, 0, &mut handle) })?;
        api.check(unsafe { api.stream_grabber_open(handle) })?;

        let mut grabber = Self {
            api: api.clone(),
            handle,
            wait_object: std::ptr::null_mut(),
            buffers: Vec::with_capacity(NUM_BUFFERS),
            pixel_format,
        };
        grabber.prepare(payload_size)?;
        Ok(grabber)
    }

    fn prepare(&mut self, payload_size: usize) -> Result<()> {
        let api = &self.api;
        unsafe {
            api.check(api.stream_grabber_get_wait_object(self.handle, &mut self.wait_object))?;
            api.check(api.stream_grabber_set_max_num_buffer(self.handle, NUM_BUFFERS))?;
            api.check(api.stream_grabber_set_max_buffer_size(self.handle, payload_size))?;
            api.check(api.stream_grabber_prepare_grab(self.handle))?;
        }

        for _ in 0..NUM_BUFFERS {
            let mut buffer = vec![0u8; payload_size].into_boxed_slice();
            let mut buffer_handle: PYLON_STREAMBUFFER_HANDLE = std::ptr::null_mut();
            api.check(unsafe {
                api.stream_grabber_register_buffer(
                    self.handle,
                    buffer.as_mut_ptr().cast(),
                    payload_size,
                    &mut buffer_handle,
                )
            })?;
            self.buffers.push((buffer, buffer_handle));
        }

        for (_, buffer_handle) in &self.buffers {
            api.check(unsafe {
                api.stream_grabber_queue_buffer(self.handle, *buffer_handle, std::ptr::null())
            })?;
        }

        api.check(unsafe { api.stream_grabber_start_streaming_if_mandatory(self.handle) })
    }

    /// Waits for the next buffer, copies it out and requeues it.
    pub(crate) fn retrieve(&mut self, timeout: Duration) -> Result<GrabResult> {
        let api = &self.api;
        let timeout_ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
        let mut ready = false;
        api.check(unsafe { api.wait_object_wait(self.wait_object, timeout_ms, &mut ready) })?;
        if !ready {
            return Err(Error::Timeout);
        }

        let mut raw = PylonGrabResult_t::default();
        api.check(unsafe { api.stream_grabber_retrieve_result(self.handle, &mut raw, &mut ready) })?;
        if !ready {
            return Err(Error::Timeout);
        }

        let result = self.copy_result(&raw);
        api.check(unsafe {
            api.stream_grabber_queue_buffer(self.handle, raw.hBuffer, raw.Context)
        })?;
        Ok(result)
    }

    fn copy_result(&self, raw: &PylonGrabResult_t) -> GrabResult {
        let status = GrabStatus::from_sys(raw.Status);
        let width = raw.SizeX.max(0) as usize;
        let height = raw.SizeY.max(0) as usize;
        let payload_size = raw.PayloadSize as usize;

        let payload = if status == GrabStatus::Grabbed && !raw.pBuffer.is_null() && height > 0 {
            let data =
                unsafe { std::slice::from_raw_parts(raw.pBuffer.cast::<u8>(), payload_size) };
            let stride = payload_size.saturating_sub(raw.PaddingY.max(0) as usize) / height;
            let row_len = stride - (raw.PaddingX.max(0) as usize).min(stride);
            if row_len == stride {
                data[..stride * height].to_vec()
            } else {
                data.chunks_exact(stride)
                    .take(height)
                    .flat_map(|row| &row[..row_len])
                    .copied()
                    .collect()
            }
        } else {
            Vec::new()
        };

        GrabResult {
            width: width as u32,
            height: height as u32,
            pixel_format: self.pixel_format.clone(),
            block_id: raw.BlockID,
            timestamp: raw.TimeStamp,
            status,
            error_code: raw.ErrorCode,
            error_description: if status == GrabStatus::Grabbed {
                String::new()
            } else {
                format!("Grab failed with error code {:#x}", raw.ErrorCode)
            },
            payload,
        }
    }

    /// Cancels pending buffers and releases the grabber.
    pub(crate) fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.handle.is_null() {
            return Ok(());
        }
        let api = self.api.clone();
        unsafe {
            api.check(api.stream_grabber_stop_streaming_if_mandatory(self.handle))?;
            api.check(api.stream_grabber_cancel_grab(self.handle))?;

            let mut raw = PylonGrabResult_t::default();
            let mut ready = true;
            while ready {
                api.check(api.stream_grabber_retrieve_result(self.handle, &mut raw, &mut ready))?;
            }

            for (_, buffer_handle) in self.buffers.drain(..) {
                api.check(api.stream_grabber_deregister_buffer(self.handle, buffer_handle))?;
            }
            api.check(api.stream_grabber_finish_grab(self.handle))?;
            api.check(api.stream_grabber_close(self.handle))?;
        }
        self.handle = std::ptr::null_mut();
        Ok(())
    }
}

impl Drop for StreamGrabber {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            tracing::warn!("Failed to release stream grabber: {err}");
        }
    }
}
