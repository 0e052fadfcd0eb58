// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Loading and lifetime of the pylon C runtime.

use std::{ffi::OsStr, ops::Deref, os::raw::c_char, sync::Arc};

use crate::{Error, Result};

/// Shared handle to the loaded pylon runtime.
///
/// The runtime is terminated when the last handle is dropped.
pub type PylonApiHandle = Arc<PylonApi>;

/// The loaded `libpylonc` function table, initialized and ready for use.
pub struct PylonApi {
    lib: pylon_sys::LibPylonC,
}

impl std::fmt::Debug for PylonApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PylonApi").finish_non_exhaustive()
    }
}

/// Loads the pylon C runtime from `path` and initializes it.
///
/// # Errors
///
/// Fails if the library cannot be opened, lacks one of the required symbols,
/// or `PylonInitialize` reports an error.
pub fn load_api(path: impl AsRef<OsStr>) -> Result<PylonApiHandle> {
    let lib = unsafe { pylon_sys::LibPylonC::new(path.as_ref()) }?;
    let api = PylonApi { lib };
    Error::from_status(&api, unsafe { api.initialize() })?;
    tracing::debug!("pylon runtime initialized from {:?}", path.as_ref());
    Ok(Arc::new(api))
}

impl Deref for PylonApi {
    type Target = pylon_sys::LibPylonC;

    fn deref(&self) -> &Self::Target {
        &self.lib
    }
}

impl Drop for PylonApi {
    fn drop(&mut self) {
        unsafe { self.lib.terminate() };
    }
}

impl PylonApi {
    /// Returns the message of the last error raised by the runtime on this thread.
    pub fn last_error_message(&self) -> Option<String> {
        read_string(|buf, len| unsafe { self.lib.get_last_error_message(buf, len) }).ok()
    }

    /// Checks a status code, turning failures into [`Error`].
    pub(crate) fn check(&self, status: pylon_sys::GENAPIC_RESULT) -> Result<()> {
        Error::from_status(self, status)
    }
}

/// Calls a pylon string getter, growing the buffer if the first one was too small.
///
/// The getters follow the `(buf, &mut len)` convention: on input `len` is the
/// buffer capacity, on output the length including the terminating NUL. Passing
/// a null buffer queries the required length.
pub(crate) fn read_string(
    mut getter: impl FnMut(*mut c_char, *mut usize) -> pylon_sys::GENAPIC_RESULT,
) -> core::result::Result<String, pylon_sys::GENAPIC_RESULT> {
    const INITIAL_BUFFER_SIZE: usize = 256;

    let mut buffer: Vec<u8> = vec![0; INITIAL_BUFFER_SIZE];
    let mut len = buffer.len();
    let mut status = getter(buffer.as_mut_ptr() as *mut c_char, &mut len);

    if status != pylon_sys::GENAPI_E_OK {
        let mut required = 0usize;
        if getter(std::ptr::null_mut(), &mut required) != pylon_sys::GENAPI_E_OK
            || required <= buffer.len()
        {
            return Err(status);
        }
        buffer = vec![0; required];
        len = required;
        status = getter(buffer.as_mut_ptr() as *mut c_char, &mut len);
        if status != pylon_sys::GENAPI_E_OK {
            return Err(status);
        }
    }

    let end = buffer[..len.min(buffer.len())]
        .iter()
        .position(|b| *b == 0)
        .unwrap_or(len.min(buffer.len()));
    buffer.truncate(end);

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(value: &str, buf: *mut c_char, len: *mut usize) -> pylon_sys::GENAPIC_RESULT {
        let needed = value.len() + 1;
        unsafe {
            if buf.is_null() || *len < needed {
                *len = needed;
                return if buf.is_null() { 0 } else { -1 };
            }
            std::ptr::copy_nonoverlapping(value.as_ptr() as *const c_char, buf, value.len());
            *buf.add(value.len()) = 0;
            *len = needed;
        }
        0
    }

    #[test]
    fn short_strings_fit_the_first_buffer() {
        let value = read_string(|buf, len| fill("ExposureTime", buf, len)).unwrap();
        assert_eq!(value, "ExposureTime");
    }

    #[test]
    fn long_strings_grow_the_buffer() {
        let long = "x".repeat(1000);
        let value = read_string(|buf, len| fill(&long, buf, len)).unwrap();
        assert_eq!(value, long);
    }

    #[test]
    fn failures_are_reported() {
        let status = read_string(|_, _| -5).unwrap_err();
        assert_eq!(status, -5);
    }
}
