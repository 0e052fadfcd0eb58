// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Common utilities shared across examples.

/// Initializes tracing subscriber for examples.
///
/// Logs to stdout at INFO level unless `RUST_LOG` says otherwise.
pub fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
}

/// Picks a device by serial number, or the first one.
pub fn select_device(
    factory: &pylon::TlFactory,
    serial: Option<&str>,
) -> Result<pylon::DeviceInfo, pylon::Error> {
    factory
        .enumerate()?
        .into_iter()
        .find(|info| serial.is_none_or(|serial| info.serial_number == serial))
        .ok_or_else(|| pylon::Error::NoDevice(serial.unwrap_or("any").to_string()))
}
