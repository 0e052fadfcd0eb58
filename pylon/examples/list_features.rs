// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Prints the node map of a camera.
//!
//! ```text
//! PYLON_CAMEMU=1 cargo run --example list_features -- --serial 0815-0000
//! ```

mod common;

use clap::Parser;
use pylon::{Camera, TlFactory};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Opts {
    /// Serial number of the camera. Defaults to the first camera found.
    #[arg(long)]
    serial: Option<String>,

    /// Also print features that are currently not readable.
    #[arg(long, default_value_t = false)]
    all: bool,
}

fn main() -> Result<(), pylon::Error> {
    common::setup_logging();
    let opts = Opts::parse();

    let factory = TlFactory::new();
    let info = common::select_device(&factory, opts.serial.as_deref())?;
    info!("Using {}", info.friendly_name());

    let camera = Camera::new(factory.create_device(&info)?);
    camera.lock()?.open()?;
    camera.with_node_map(|map| {
        for name in map.feature_names()? {
            let node = map.node_info(&name)?;
            if !node.kind.has_value() {
                continue;
            }
            match map.get(&name) {
                Ok(value) => println!("{name:<32} {:<12} {value}", node.kind),
                Err(err) if opts.all => warn!("{name}: {err}"),
                Err(_) => {}
            }
            for selector in &node.selectors {
                println!("{:<32} selected by {selector}", "");
            }
        }
        Ok(())
    })
}
