// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Smoke tests for the hand-maintained FFI declarations.

/// The grab result must keep the C layout: pointer fields first, then the
/// 32-bit status block, then the 64-bit timestamp.
#[test]
fn grab_result_layout_matches_c_header() {
    let result = pylon_sys::PylonGrabResult_t::default();
    assert_eq!(result.Status, pylon_sys::UndefinedGrabStatus);

    let base = &result as *const _ as usize;
    let status = &result.Status as *const _ as usize;
    let timestamp = &result.TimeStamp as *const _ as usize;
    assert_eq!(status - base, 3 * std::mem::size_of::<*const u8>());
    assert_eq!(timestamp % std::mem::align_of::<u64>(), 0);
    assert!(timestamp > status);
}

/// Loading a library that does not exist must fail cleanly instead of
/// crashing, so hosts without the pylon runtime keep working.
#[test]
fn missing_runtime_is_an_error() {
    let result = unsafe { pylon_sys::LibPylonC::new("libpylonc-does-not-exist.so") };
    assert!(result.is_err());
}
