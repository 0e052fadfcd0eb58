//! pylon Source Implementation
//!
//! This module contains the core implementation of the pylonsrc GStreamer element.
//! It implements GStreamer's PushSrc trait (a type of BaseSrc), handling:
//! - Element lifecycle (start/stop state transitions)
//! - Property management (device selection, user set, capture errors, cam)
//! - Caps negotiation (camera formats, fixation, applying caps to the camera)
//! - Buffer creation (polling the camera on-demand)
//! - Live mode operation (timestamps based on running time)
//!
//! ## Implementation Structure
//! - `PylonSrc`: The struct holding element state (settings, context, flushing)
//! - `ObjectImpl`: GObject property system integration
//! - `ElementImpl`: GStreamer element metadata and pad templates
//! - `BaseSrcImpl`: Source-specific behavior (start, stop, caps, set_caps)
//! - `PushSrcImpl`: On-demand buffer creation via create()
//! - `ChildProxyImpl`: Access to the `cam` feature object

// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

use gst::glib;
use gst::prelude::*;
use gst::subclass::prelude::*;
use gst_base::prelude::*;
use gst_base::subclass::base_src::CreateSuccess;
use gst_base::subclass::prelude::*;
use gstreamer as gst;
use gstreamer::Buffer;
use gstreamer_base as gst_base;

use std::sync::LazyLock;
use std::sync::Mutex;
use std::time::Duration;

use pylon::Camera;
use tracing::trace;

use crate::pylonsrc;
use crate::pylonsrc::create_video::create_video;
use crate::pylonsrc::pylon_helper;
use crate::pylonsrc::state::{
    CaptureErrorMode, Context, DEFAULT_DEVICE_FILTER, DEFAULT_DEVICE_INDEX, DEFAULT_USER_SET,
    Settings,
};

/// GStreamer debug category for logging pylonsrc-specific messages
pub(crate) static CAT: LazyLock<gst::DebugCategory> = LazyLock::new(|| {
    gst::DebugCategory::new(
        "pylonsrc",
        gst::DebugColorFlags::empty(),
        Some("pylon Source"),
    )
});

/// Longest time create() waits for a frame before checking for flushing
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Name of the feature object child
const CAM_CHILD: &str = "cam";

/// pylon Source element implementation.
pub struct PylonSrc {
    /// User-configurable properties
    pub settings: Mutex<Settings>,

    /// Runtime state (camera, feature object, negotiated layout)
    pub context: Mutex<Context>,

    /// True when flushing (interrupts create)
    flushing: Mutex<bool>,
}

impl Default for PylonSrc {
    fn default() -> Self {
        PylonSrc {
            settings: Mutex::new(Settings::default()),
            context: Mutex::new(Context::default()),
            // Start in flushing state until unlock_stop()
            flushing: Mutex::new(true),
        }
    }
}

/// Result of attempting to create a buffer.
pub enum CreateState {
    /// Buffer was created successfully
    DataCreated(Buffer),

    /// No frame this time (timeout or skipped frame)
    NoDataCreated,
}

/// Registers this type as a GLib object subclass
#[glib::object_subclass]
impl ObjectSubclass for PylonSrc {
    const NAME: &'static str = "GstPylonSrc";
    type Type = pylonsrc::PylonSrc;
    type ParentType = gst_base::PushSrc;
    type Interfaces = (gst::ChildProxy,);
}

/// GObject property system implementation
impl ObjectImpl for PylonSrc {
    fn properties() -> &'static [glib::ParamSpec] {
        static PROPERTIES: LazyLock<Vec<glib::ParamSpec>> = LazyLock::new(|| {
            vec![
                glib::ParamSpecString::builder("device-user-name")
                    .nick("Device user defined name")
                    .blurb("The user-defined name of the device to use")
                    .default_value(DEFAULT_DEVICE_FILTER)
                    .mutable_ready()
                    .build(),
                glib::ParamSpecString::builder("device-serial-number")
                    .nick("Device serial number")
                    .blurb("The serial number of the device to use")
                    .default_value(DEFAULT_DEVICE_FILTER)
                    .mutable_ready()
                    .build(),
                glib::ParamSpecInt::builder("device-index")
                    .nick("Device index")
                    .blurb(
                        "The index of the device to use among the devices matching \
                         device-user-name and device-serial-number, -1 to not filter by index",
                    )
                    .minimum(-1)
                    .maximum(i32::MAX)
                    .default_value(DEFAULT_DEVICE_INDEX)
                    .mutable_ready()
                    .build(),
                glib::ParamSpecString::builder("user-set")
                    .nick("User set")
                    .blurb("The user set to load when starting, empty keeps the current configuration")
                    .default_value(DEFAULT_USER_SET)
                    .mutable_ready()
                    .build(),
                glib::ParamSpecEnum::builder_with_default("capture-error", CaptureErrorMode::Abort)
                    .nick("Capture error strategy")
                    .blurb("The strategy to use in case of a frame capture error")
                    .mutable_playing()
                    .build(),
                glib::ParamSpecObject::builder::<gst::Object>("cam")
                    .nick("Camera")
                    .blurb("The camera's features, for example cam::ExposureTime=1000")
                    .read_only()
                    .build(),
            ]
        });

        PROPERTIES.as_ref()
    }

    /// Configures the source as live (real-time) with time-based format.
    fn constructed(&self) {
        self.parent_constructed();

        // Initialize tracing (debug/diagnostics feature)
        #[cfg(feature = "tracing")]
        {
            use tracing_subscriber::filter::LevelFilter;
            use tracing_subscriber::util::SubscriberInitExt;
            let _ = tracing_subscriber::fmt()
                .compact()
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_target(false)
                .with_max_level(LevelFilter::TRACE)
                .with_ansi(true)
                .finish()
                .try_init();
        }

        let obj = self.obj();
        obj.set_live(true);
        obj.set_format(gst::Format::Time);
    }

    fn set_property(&self, _id: usize, value: &glib::Value, pspec: &glib::ParamSpec) {
        let Ok(mut settings) = self.settings.lock() else {
            gst::error!(CAT, imp = self, "Settings mutex poisoned, property change ignored");
            return;
        };

        let mut reset_camera = false;
        match pspec.name() {
            "device-user-name" => {
                if let Ok(name) = value.get::<Option<String>>() {
                    settings.device_user_name = name.unwrap_or_default();
                    reset_camera = true;
                } else {
                    gst::error!(CAT, imp = self, "Invalid type for device-user-name property");
                }
            }
            "device-serial-number" => {
                if let Ok(serial) = value.get::<Option<String>>() {
                    settings.device_serial_number = serial.unwrap_or_default();
                    reset_camera = true;
                } else {
                    gst::error!(CAT, imp = self, "Invalid type for device-serial-number property");
                }
            }
            "device-index" => {
                if let Ok(index) = value.get::<i32>() {
                    settings.device_index = index;
                    reset_camera = true;
                } else {
                    gst::error!(CAT, imp = self, "Invalid type for device-index property");
                }
            }
            "user-set" => {
                if let Ok(user_set) = value.get::<Option<String>>() {
                    settings.user_set = user_set.unwrap_or_default();
                } else {
                    gst::error!(CAT, imp = self, "Invalid type for user-set property");
                }
            }
            "capture-error" => {
                if let Ok(mode) = value.get::<CaptureErrorMode>() {
                    gst::info!(
                        CAT,
                        imp = self,
                        "Changing capture-error from {:?} to {:?}",
                        settings.capture_error,
                        mode
                    );
                    settings.capture_error = mode;
                } else {
                    gst::error!(CAT, imp = self, "Invalid type for capture-error property");
                }
            }
            other => {
                gst::error!(CAT, imp = self, "Unknown property '{}'", other);
            }
        }
        drop(settings);

        // A different device may be selected now.
        if reset_camera {
            match self.context.lock() {
                Ok(mut context) => *context = Context::default(),
                Err(_) => gst::error!(CAT, imp = self, "Context mutex poisoned"),
            }
        }
    }

    fn property(&self, _id: usize, pspec: &glib::ParamSpec) -> glib::Value {
        if pspec.name() == CAM_CHILD {
            return match self.ensure_camera() {
                Ok((_, cam)) => cam.to_value(),
                Err(err) => {
                    gst::error!(CAT, imp = self, "No camera available: {}", err);
                    None::<gst::Object>.to_value()
                }
            };
        }

        let Ok(settings) = self.settings.lock() else {
            gst::error!(CAT, imp = self, "Settings mutex poisoned");
            return pspec.default_value().clone();
        };
        match pspec.name() {
            "device-user-name" => settings.device_user_name.to_value(),
            "device-serial-number" => settings.device_serial_number.to_value(),
            "device-index" => settings.device_index.to_value(),
            "user-set" => settings.user_set.to_value(),
            "capture-error" => settings.capture_error.to_value(),
            _ => {
                gst::error!(CAT, imp = self, "Unknown property {}", pspec.name());
                pspec.default_value().clone()
            }
        }
    }
}

/// GStreamer object implementation (inherits from GstObject)
impl GstObjectImpl for PylonSrc {}

/// GStreamer element implementation (metadata and pads)
impl ElementImpl for PylonSrc {
    fn metadata() -> Option<&'static gst::subclass::ElementMetadata> {
        static ELEMENT_METADATA: LazyLock<gst::subclass::ElementMetadata> = LazyLock::new(|| {
            gst::subclass::ElementMetadata::new(
                "Basler/Pylon source element",
                "Source/Video/Hardware",
                "Source element for Basler cameras",
                "Contributors to the gst-plugin-pylon project",
            )
        });

        Some(&*ELEMENT_METADATA)
    }

    fn pad_templates() -> &'static [gst::PadTemplate] {
        static PAD_TEMPLATES: LazyLock<Result<Vec<gst::PadTemplate>, glib::BoolError>> =
            LazyLock::new(|| {
                let src_pad_template = gst::PadTemplate::new(
                    "src",
                    gst::PadDirection::Src,
                    gst::PadPresence::Always,
                    &pylon_helper::template_caps(),
                )?;

                Ok(vec![src_pad_template])
            });

        match PAD_TEMPLATES.as_ref() {
            Ok(templates) => templates,
            Err(err) => {
                gst::error!(CAT, "Failed to create src pad template: {:?}", err);
                &[]
            }
        }
    }
}

/// BaseSrc implementation (source-specific behavior)
impl BaseSrcImpl for PylonSrc {
    /// Reports what the open camera can produce, or the template caps
    /// before a camera is opened.
    fn caps(&self, filter: Option<&gst::Caps>) -> Option<gst::Caps> {
        let camera_caps = self
            .camera()
            .and_then(|camera| match camera.with_node_map(|m| pylon_helper::camera_caps(m)) {
                Ok(caps) => Some(caps),
                Err(err) => {
                    gst::warning!(CAT, imp = self, "Failed to query camera caps: {}", err);
                    None
                }
            });
        let caps = camera_caps.unwrap_or_else(|| self.obj().src_pad().pad_template_caps());
        gst::debug!(CAT, imp = self, "Returning caps {}", caps);

        Some(match filter {
            Some(filter) => filter.intersect_with_mode(&caps, gst::CapsIntersectMode::First),
            None => caps,
        })
    }

    fn fixate(&self, caps: gst::Caps) -> gst::Caps {
        let caps = match self.camera() {
            Some(camera) => {
                match camera.lock() {
                    Ok(mut device) => match device.node_map() {
                        Ok(node_map) => pylon_helper::fixate_caps(node_map, caps),
                        Err(_) => caps,
                    },
                    Err(_) => caps,
                }
            }
            None => caps,
        };
        self.parent_fixate(caps)
    }

    /// Writes the negotiated caps to the camera and starts grabbing.
    fn set_caps(&self, caps: &gst::Caps) -> Result<(), gst::LoggableError> {
        gst::info!(CAT, imp = self, "Setting caps {}", caps);
        let camera = self
            .camera()
            .ok_or_else(|| gst::loggable_error!(CAT, "No camera open"))?;

        let layout = {
            let mut device = camera
                .lock()
                .map_err(|e| gst::loggable_error!(CAT, "Failed to lock camera: {}", e))?;
            if device.is_grabbing() {
                device
                    .stop_grabbing()
                    .map_err(|e| gst::loggable_error!(CAT, "Failed to stop grabbing: {}", e))?;
            }
            let node_map = device
                .node_map()
                .map_err(|e| gst::loggable_error!(CAT, "Failed to access camera: {}", e))?;
            let layout = pylon_helper::apply_caps(node_map, caps)?;
            device
                .start_grabbing()
                .map_err(|e| gst::loggable_error!(CAT, "Failed to start grabbing: {}", e))?;
            layout
        };

        let mut context = self
            .context
            .lock()
            .map_err(|e| gst::loggable_error!(CAT, "Failed to lock context mutex {}", e))?;
        let state = context
            .state
            .as_mut()
            .ok_or_else(|| gst::loggable_error!(CAT, "Failed to get state"))?;
        state.layout = Some(layout);
        Ok(())
    }

    /// Called when transitioning to PAUSED state (start the source).
    ///
    /// Opens the camera if needed and loads the configured user set.
    fn start(&self) -> Result<(), gst::ErrorMessage> {
        // Clear flushing flag
        self.unlock_stop()?;

        let (camera, _) = self.ensure_camera()?;

        let user_set = self
            .settings
            .lock()
            .map_err(|e| {
                gst::error_msg!(gst::CoreError::Failed, ["Failed to lock settings: {}", e])
            })?
            .user_set
            .clone();
        if !user_set.is_empty() {
            camera
                .with_node_map(|node_map| pylon_helper::load_user_set(node_map, &user_set))
                .map_err(|err| {
                    gst::error_msg!(
                        gst::ResourceError::Settings,
                        ["Failed to load user set \"{}\": {}", user_set, err]
                    )
                })?;
            gst::info!(CAT, imp = self, "Loaded user set {}", user_set);
        }

        let mut context = self.context.lock().map_err(|e| {
            gst::error_msg!(gst::CoreError::Failed, ["Failed to lock context: {}", e])
        })?;
        if let Some(state) = context.state.as_mut() {
            state.layout = None;
            state.frame_counter = 0;
        }

        gst::info!(CAT, imp = self, "Started {}", camera.info().friendly_name());
        Ok(())
    }

    /// Called when transitioning to READY state (stop the source).
    ///
    /// Stops grabbing and closes the camera. The feature object stays
    /// available for the next start.
    fn stop(&self) -> Result<(), gst::ErrorMessage> {
        self.unlock()?;

        if let Some(camera) = self.camera() {
            let mut device = camera.lock().map_err(|e| {
                gst::error_msg!(gst::CoreError::Failed, ["Failed to lock camera: {}", e])
            })?;
            if device.is_grabbing() {
                device.stop_grabbing().map_err(|e| {
                    gst::error_msg!(gst::ResourceError::Close, ["Failed to stop grabbing: {}", e])
                })?;
            }
            device.close().map_err(|e| {
                gst::error_msg!(gst::ResourceError::Close, ["Failed to close camera: {}", e])
            })?;
        }

        let mut context = self.context.lock().map_err(|e| {
            gst::error_msg!(gst::CoreError::Failed, ["Failed to lock context: {}", e])
        })?;
        if let Some(state) = context.state.as_mut() {
            state.layout = None;
        }

        gst::info!(CAT, imp = self, "Stopped");
        Ok(())
    }

    /// Answers latency queries with one frame duration.
    fn query(&self, query: &mut gst::QueryRef) -> bool {
        use gst::QueryViewMut;

        match query.view_mut() {
            QueryViewMut::Latency(q) => {
                let Ok(context) = self.context.lock() else {
                    return false;
                };
                let framerate = context
                    .state
                    .as_ref()
                    .and_then(|state| state.layout.as_ref())
                    .map(|layout| layout.framerate);

                match framerate {
                    Some(framerate) if framerate.numer() > 0 => {
                        let latency = gst::ClockTime::SECOND
                            .mul_div_floor(framerate.denom() as u64, framerate.numer() as u64)
                            .unwrap_or(gst::ClockTime::ZERO);
                        gst::debug!(CAT, imp = self, "Returning latency {}", latency);
                        q.set(true, latency, gst::ClockTime::NONE);
                        true
                    }
                    _ => false,
                }
            }
            _ => BaseSrcImplExt::parent_query(self, query),
        }
    }

    fn unlock(&self) -> Result<(), gst::ErrorMessage> {
        gst::debug!(CAT, imp = self, "Unlocking");
        let mut flushing = self.flushing.lock().map_err(|e| {
            gst::error_msg!(gst::CoreError::Failed, ["Failed to lock flushing flag: {}", e])
        })?;
        *flushing = true;

        Ok(())
    }

    fn unlock_stop(&self) -> Result<(), gst::ErrorMessage> {
        gst::debug!(CAT, imp = self, "Unlock stop");
        let mut flushing = self.flushing.lock().map_err(|e| {
            gst::error_msg!(gst::CoreError::Failed, ["Failed to lock flushing flag: {}", e])
        })?;
        *flushing = false;

        Ok(())
    }
}

/// PushSrc implementation (on-demand buffer creation)
impl PushSrcImpl for PylonSrc {
    /// Creates a buffer on-demand.
    ///
    /// Polls the camera in short intervals so that unlock() interrupts the
    /// wait, until a frame arrives or the element is flushing.
    fn create(
        &self,
        _buffer: Option<&mut gst::BufferRef>,
    ) -> Result<CreateSuccess, gst::FlowError> {
        loop {
            if self.is_flushing() {
                gst::debug!(CAT, imp = self, "Flushing");
                return Err(gst::FlowError::Flushing);
            }

            match self.try_create()? {
                CreateState::DataCreated(buffer) => {
                    return Ok(CreateSuccess::NewBuffer(buffer));
                }
                CreateState::NoDataCreated => continue,
            }
        }
    }
}

/// ChildProxy implementation (exposes the feature object as `cam`)
impl ChildProxyImpl for PylonSrc {
    fn child_by_index(&self, index: u32) -> Option<glib::Object> {
        if index != 0 {
            return None;
        }
        match self.ensure_camera() {
            Ok((_, cam)) => Some(cam.upcast()),
            Err(err) => {
                gst::error!(CAT, imp = self, "No camera available: {}", err);
                None
            }
        }
    }

    fn children_count(&self) -> u32 {
        1
    }

    fn child_by_name(&self, name: &str) -> Option<glib::Object> {
        if name == CAM_CHILD {
            self.child_by_index(0)
        } else {
            None
        }
    }
}

impl PylonSrc {
    /// Camera of the current state, if one was opened.
    fn camera(&self) -> Option<Camera> {
        let context = self.context.lock().ok()?;
        context.state.as_ref().map(|state| state.camera.clone())
    }

    /// Opens the camera selected by the settings unless already done, and
    /// reopens a device closed by `stop()`.
    ///
    /// Returns the camera and its feature object.
    fn ensure_camera(&self) -> Result<(Camera, gst::Object), gst::ErrorMessage> {
        let settings = self
            .settings
            .lock()
            .map_err(|e| gst::error_msg!(gst::CoreError::Failed, ["Failed to lock settings: {}", e]))?
            .clone();

        let mut context = self.context.lock().map_err(|e| {
            gst::error_msg!(gst::CoreError::Failed, ["Failed to lock context: {}", e])
        })?;
        if context.state.is_none() {
            let state = pylon_helper::open_camera(&settings)?;
            gst::info!(
                CAT,
                imp = self,
                "Opened {}",
                state.camera.info().friendly_name()
            );
            context.state = Some(state);
        }

        let state = context
            .state
            .as_ref()
            .ok_or_else(|| gst::error_msg!(gst::CoreError::Failed, ["No camera"]))?;
        let (camera, cam) = (state.camera.clone(), state.cam.clone());
        drop(context);

        // stop() closes the device but keeps the state.
        pylon_helper::ensure_open(&camera)?;
        Ok((camera, cam))
    }

    fn is_flushing(&self) -> bool {
        self.flushing.lock().map(|f| *f).unwrap_or(true)
    }

    /// Waits up to one poll interval for a frame.
    fn try_create(&self) -> Result<CreateState, gst::FlowError> {
        let capture_error = self
            .settings
            .lock()
            .map_err(|_| gst::FlowError::Error)?
            .capture_error;
        let camera = self.camera().ok_or(gst::FlowError::Error)?;

        let result = {
            let mut device = camera.lock().map_err(|_| gst::FlowError::Error)?;
            device.retrieve_result(POLL_INTERVAL)
        };

        match result {
            Ok(frame) => create_video(self, frame, capture_error),
            Err(err) if err.is_timeout() => {
                trace!("No frame within {:?}", POLL_INTERVAL);
                Ok(CreateState::NoDataCreated)
            }
            Err(err) => {
                gst::element_imp_error!(
                    self,
                    gst::ResourceError::Read,
                    ["Failed to retrieve frame: {}", err]
                );
                Err(gst::FlowError::Error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_error_nicks() {
        gst::init().unwrap();
        let class = glib::EnumClass::with_type(CaptureErrorMode::static_type()).unwrap();
        let nicks: Vec<&str> = class.values().iter().map(|v| v.nick()).collect();
        assert_eq!(nicks, vec!["abort", "skip", "keep"]);
    }
}
