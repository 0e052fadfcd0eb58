// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Runtime configuration read from the environment.
//!
//! The pylon runtime is located through `PYLON_ROOT`, the variable set by the
//! SDK's setup scripts, and the number of emulated cameras follows pylon's own
//! `PYLON_CAMEMU` convention.

use std::path::PathBuf;

/// Environment variable pointing to the pylon installation.
pub const PYLON_ROOT_ENV: &str = "PYLON_ROOT";

/// Environment variable holding the number of emulated cameras.
pub const PYLON_CAMEMU_ENV: &str = "PYLON_CAMEMU";

/// Upper bound on emulated cameras, matching pylon's emulator.
pub const MAX_EMULATED_DEVICES: usize = 256;

#[cfg(target_os = "windows")]
const PYLONC_LIBRARY: &str = "PylonC_v9.dll";
#[cfg(target_os = "macos")]
const PYLONC_LIBRARY: &str = "libpylonc.dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const PYLONC_LIBRARY: &str = "libpylonc.so";

/// Returns the path to the pylon C runtime library.
///
/// When `PYLON_ROOT` is set the library is looked up in its `lib` directory,
/// otherwise only the library name is returned and the dynamic loader's
/// search path applies.
///
/// # Examples
///
/// ```no_run
/// use pylon::config::pylonc_so_path;
/// use pylon::load_api;
///
/// # fn main() -> Result<(), pylon::Error> {
/// let api = load_api(pylonc_so_path())?;
/// # Ok(())
/// # }
/// ```
pub fn pylonc_so_path() -> PathBuf {
    pylonc_so_path_from(std::env::var_os(PYLON_ROOT_ENV).map(PathBuf::from))
}

fn pylonc_so_path_from(root: Option<PathBuf>) -> PathBuf {
    match root {
        Some(root) if !root.as_os_str().is_empty() => root.join("lib").join(PYLONC_LIBRARY),
        _ => PYLONC_LIBRARY.into(),
    }
}

/// Returns the number of emulated cameras requested through `PYLON_CAMEMU`.
///
/// Unset, empty or unparsable values mean no emulated cameras. Values above
/// [`MAX_EMULATED_DEVICES`] are clamped.
pub fn emulated_device_count() -> usize {
    parse_device_count(std::env::var(PYLON_CAMEMU_ENV).ok().as_deref())
}

fn parse_device_count(value: Option<&str>) -> usize {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return 0;
    };

    match value.parse::<usize>() {
        Ok(count) => count.min(MAX_EMULATED_DEVICES),
        Err(err) => {
            tracing::warn!("Ignoring invalid {PYLON_CAMEMU_ENV}={value:?}: {err}");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_path_without_root_is_bare_name() {
        assert_eq!(pylonc_so_path_from(None), PathBuf::from(PYLONC_LIBRARY));
        assert_eq!(
            pylonc_so_path_from(Some(PathBuf::new())),
            PathBuf::from(PYLONC_LIBRARY)
        );
    }

    #[test]
    fn library_path_uses_root_lib_dir() {
        let path = pylonc_so_path_from(Some(PathBuf::from("/opt/pylon")));
        assert_eq!(path, PathBuf::from("/opt/pylon/lib").join(PYLONC_LIBRARY));
    }

    #[test]
    fn device_count_parsing() {
        assert_eq!(parse_device_count(None), 0);
        assert_eq!(parse_device_count(Some("")), 0);
        assert_eq!(parse_device_count(Some(" 3 ")), 3);
        assert_eq!(parse_device_count(Some("many")), 0);
        assert_eq!(parse_device_count(Some("100000")), MAX_EMULATED_DEVICES);
    }

    #[test]
    #[tracing_test::traced_test]
    fn invalid_device_count_is_logged() {
        assert_eq!(parse_device_count(Some("-1")), 0);
        assert!(logs_contain("Ignoring invalid PYLON_CAMEMU"));
    }
}
