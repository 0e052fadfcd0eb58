// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Grabs frames from a camera and reports their size.

mod common;

use std::time::Duration;

use clap::Parser;
use pylon::{Camera, TlFactory};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Opts {
    /// Serial number of the camera. Defaults to the first camera found.
    #[arg(long)]
    serial: Option<String>,

    /// Number of frames to grab.
    #[arg(long, default_value_t = 10)]
    count: u32,

    /// Pixel format to configure, e.g. Mono8.
    #[arg(long)]
    pixel_format: Option<String>,
}

fn main() -> Result<(), pylon::Error> {
    common::setup_logging();
    let opts = Opts::parse();

    let factory = TlFactory::new();
    let info = common::select_device(&factory, opts.serial.as_deref())?;
    let camera = Camera::new(factory.create_device(&info)?);

    let mut device = camera.lock()?;
    device.open()?;
    if let Some(format) = &opts.pixel_format {
        device.node_map()?.set_enum_by_name("PixelFormat", format)?;
    }
    device.start_grabbing()?;

    let mut grabbed = 0;
    while grabbed < opts.count {
        match device.retrieve_result(Duration::from_secs(5)) {
            Ok(frame) if frame.succeeded() => {
                info!(
                    "Frame {}: {}x{} {} ({} bytes)",
                    frame.block_id,
                    frame.width,
                    frame.height,
                    frame.pixel_format,
                    frame.payload.len()
                );
                grabbed += 1;
            }
            Ok(frame) => warn!("Frame {} failed: {}", frame.block_id, frame.error_description),
            Err(err) if err.is_timeout() => warn!("Timeout"),
            Err(err) => return Err(err),
        }
    }

    device.stop_grabbing()?;
    device.close()
}
