// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for pylon operations.
//!
//! This module defines the error type returned by every device and node map
//! operation, whether it is served by the native pylon runtime or by the
//! built-in emulator.

use crate::api::PylonApi;

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur when talking to a camera.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A non-zero status code returned by the pylon C API without a message.
    #[error("Unknown error: {0:#x}")]
    Unknown(pylon_sys::GENAPIC_RESULT),

    /// The pylon runtime reported an error; carries the SDK's last error message.
    #[error("{0}")]
    Sdk(String),

    /// The node map has no feature with this name.
    #[error("Feature \"{0}\" not found")]
    NotFound(String),

    /// The feature exists but cannot be read in the current device state.
    #[error("Feature \"{0}\" is not readable")]
    NotReadable(String),

    /// The feature exists but cannot be written in the current device state.
    #[error("Feature \"{0}\" is not writable")]
    NotWritable(String),

    /// The value lies outside the feature's range or is not one of its entries.
    #[error("Value {value} is out of range for feature \"{feature}\"")]
    OutOfRange { feature: String, value: String },

    /// The feature was accessed as the wrong kind (e.g. a float as an integer).
    #[error("Feature \"{feature}\" is not of type {expected}")]
    InvalidType {
        feature: String,
        expected: &'static str,
    },

    /// A selector node is neither an enumeration nor an integer.
    #[error("Selector \"{0}\" is of invalid type")]
    InvalidSelector(String),

    /// No frame arrived within the requested timeout.
    #[error("Timeout")]
    Timeout,

    /// No device matched the request.
    #[error("No device: {0}")]
    NoDevice(String),

    /// The operation requires an open device.
    #[error("Device is not open")]
    NotOpen,

    /// The operation requires the device to be grabbing.
    #[error("Device is not grabbing")]
    NotGrabbing,

    /// A generic error for Rust-level failures not directly mapped to SDK errors.
    #[error("Other error: {0}")]
    Other(String),

    /// Failed to convert a Rust string to a C-compatible null-terminated string.
    #[error("Null string: {0}")]
    NulString(#[from] std::ffi::NulError),

    /// Failed to load or interact with the pylon dynamic library.
    #[error("Loading library: {0}")]
    LibLoading(#[from] libloading::Error),
}

impl Error {
    /// Converts a pylon C API status code to a Rust [`Result`].
    ///
    /// On failure the SDK's last error message is fetched so the error carries
    /// a human readable description instead of a bare HRESULT.
    pub(crate) fn from_status(api: &PylonApi, status: pylon_sys::GENAPIC_RESULT) -> Result<()> {
        if status == pylon_sys::GENAPI_E_OK {
            return Ok(());
        }

        match api.last_error_message() {
            Some(message) if !message.is_empty() => Err(Error::Sdk(message)),
            _ => Err(Error::Unknown(status)),
        }
    }

    /// Whether the error only means "no frame yet".
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }
}
