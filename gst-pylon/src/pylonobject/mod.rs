// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Feature objects of pylon cameras
//!
//! A camera's features are only known once it is connected, so the object
//! types exposing them are registered at runtime. Every camera model gets its
//! own `GstObject` subclass, named `GstPylonObject-<vendor>-<model>`, with one
//! property per feature (or per feature and selector value). Property access
//! is forwarded to the camera bound to the instance.

use std::{
    collections::HashMap,
    sync::{Arc, LazyLock, Mutex},
};

use glib::gobject_ffi;
use glib::prelude::*;
use glib::translate::*;
use gstreamer as gst;

use pylon::{Camera, Error as PylonError, NodeMap};

mod featurewalker;
mod paramspec;

pub use featurewalker::{FeatureProperty, FeatureWalker, PropertySpec};
pub use paramspec::sanitize_name;

pub(crate) static CAT: LazyLock<gst::DebugCategory> = LazyLock::new(|| {
    gst::DebugCategory::new(
        "pylonobject",
        gst::DebugColorFlags::empty(),
        Some("pylon feature object"),
    )
});

/// Key of the camera stored on each instance.
const CAMERA_KEY: &str = "pylon-camera";

/// Properties of a registered type, in installation order.
struct TypeData {
    name: String,
    bindings: Vec<(FeatureProperty, glib::ParamSpec)>,
}

static TYPES: LazyLock<Mutex<HashMap<glib::Type, Arc<TypeData>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Serializes registrations. `TYPES` is only held briefly since class
/// initialization reads it.
static REGISTRATION: Mutex<()> = Mutex::new(());

fn type_data(type_: glib::Type) -> Option<Arc<TypeData>> {
    TYPES.lock().ok()?.get(&type_).cloned()
}

/// Name of the object type for cameras called `device_name`.
pub fn type_name(device_name: &str) -> String {
    sanitize_name(&format!("GstPylonObject-{device_name}"))
}

/// Registers the feature object type for `device_name`.
///
/// The properties are taken from `exemplar`. A type registered before under
/// the same name is returned as is.
pub fn register(device_name: &str, exemplar: &mut dyn NodeMap) -> Result<glib::Type, glib::BoolError> {
    let name = type_name(device_name);
    let _registration = REGISTRATION
        .lock()
        .map_err(|_| glib::bool_error!("Type registry poisoned"))?;

    if let Some(existing) = glib::Type::from_name(&name) {
        return if type_data(existing).is_some() {
            Ok(existing)
        } else {
            Err(glib::bool_error!("Type {} is already registered", name))
        };
    }

    let bindings: Vec<_> = FeatureWalker::walk(exemplar)
        .into_iter()
        .filter_map(|property| {
            let pspec = paramspec::build(&name, &property);
            if pspec.is_none() {
                gst::warning!(CAT, "Unable to create property \"{}\"", property.name);
            }
            pspec.map(|pspec| (property, pspec))
        })
        .collect();

    let c_name = std::ffi::CString::new(name.as_str())
        .map_err(|_| glib::bool_error!("Invalid type name {}", name))?;
    let info = gobject_ffi::GTypeInfo {
        class_size: std::mem::size_of::<gst::ffi::GstObjectClass>() as u16,
        base_init: None,
        base_finalize: None,
        class_init: Some(class_init),
        class_finalize: None,
        class_data: std::ptr::null(),
        instance_size: std::mem::size_of::<gst::ffi::GstObject>() as u16,
        n_preallocs: 0,
        instance_init: None,
        value_table: std::ptr::null(),
    };

    let type_: glib::Type = unsafe {
        from_glib(gobject_ffi::g_type_register_static(
            gst::Object::static_type().into_glib(),
            c_name.as_ptr(),
            &info,
            0,
        ))
    };
    if !type_.is_valid() {
        return Err(glib::bool_error!("Failed to register type {}", name));
    }

    gst::info!(
        CAT,
        "Registered {} with {} properties",
        name,
        bindings.len()
    );
    TYPES
        .lock()
        .map_err(|_| glib::bool_error!("Type registry poisoned"))?
        .insert(type_, Arc::new(TypeData { name, bindings }));
    Ok(type_)
}

/// Creates the feature object of `camera`.
///
/// The type is registered from the camera's node map on first use; the
/// camera must be open.
pub fn new(camera: &Camera, device_name: &str) -> Result<gst::Object, glib::BoolError> {
    let type_ = {
        let mut device = camera
            .lock()
            .map_err(|err| glib::bool_error!("{}", err))?;
        let node_map = device
            .node_map()
            .map_err(|err| glib::bool_error!("{}", err))?;
        register(device_name, node_map)?
    };

    let obj = glib::Object::builder_with_type(type_)
        .property("name", type_.name())
        .build();
    unsafe { obj.set_data(CAMERA_KEY, camera.clone()) };

    obj.downcast::<gst::Object>()
        .map_err(|_| glib::bool_error!("{} is not a GstObject", type_.name()))
}

/// Camera bound to a feature object.
pub fn bound_camera(obj: &impl IsA<glib::Object>) -> Option<Camera> {
    unsafe {
        obj.as_ref()
            .data::<Camera>(CAMERA_KEY)
            .map(|camera| camera.as_ref().clone())
    }
}

unsafe extern "C" fn class_init(klass: glib::ffi::gpointer, _klass_data: glib::ffi::gpointer) {
    unsafe {
        let gobject_klass = &mut *(klass as *mut gobject_ffi::GObjectClass);
        gobject_klass.set_property = Some(set_property);
        gobject_klass.get_property = Some(get_property);

        let type_: glib::Type = from_glib((*(klass as *mut gobject_ffi::GTypeClass)).g_type);
        let Some(data) = type_data(type_) else {
            return;
        };

        for (id, (_, pspec)) in data.bindings.iter().enumerate() {
            gobject_ffi::g_object_class_install_property(
                gobject_klass,
                id as u32 + 1,
                pspec.to_glib_none().0,
            );
        }
    }
}

/// Looks up the binding of property `id` on the type owning `pspec`.
unsafe fn binding(pspec: *mut gobject_ffi::GParamSpec, id: u32) -> Option<(Arc<TypeData>, usize)> {
    let data = type_data(unsafe { from_glib((*pspec).owner_type) })?;
    let index = (id as usize).checked_sub(1)?;
    (index < data.bindings.len()).then_some((data, index))
}

unsafe extern "C" fn set_property(
    obj: *mut gobject_ffi::GObject,
    id: u32,
    value: *mut gobject_ffi::GValue,
    pspec: *mut gobject_ffi::GParamSpec,
) {
    let Some((data, index)) = (unsafe { binding(pspec, id) }) else {
        return;
    };
    let obj: Borrowed<glib::Object> = unsafe { from_glib_borrow(obj) };
    let value = unsafe { &*(value as *const glib::Value) };
    let (property, _) = &data.bindings[index];

    let Some(camera) = bound_camera(&*obj) else {
        gst::error!(CAT, obj = &*obj, "No camera bound to {}", data.name);
        return;
    };

    if let Err(err) = set_feature(&camera, property, value) {
        gst::error!(
            CAT,
            obj = &*obj,
            "Unable to set pylon property \"{}\" on \"{}\": {}",
            property.name,
            camera.info().friendly_name(),
            err
        );
    }
}

unsafe extern "C" fn get_property(
    obj: *mut gobject_ffi::GObject,
    id: u32,
    value: *mut gobject_ffi::GValue,
    pspec: *mut gobject_ffi::GParamSpec,
) {
    let Some((data, index)) = (unsafe { binding(pspec, id) }) else {
        return;
    };
    let obj: Borrowed<glib::Object> = unsafe { from_glib_borrow(obj) };
    let (property, spec) = &data.bindings[index];

    let result = match bound_camera(&*obj) {
        Some(camera) => get_feature(&camera, property, spec.value_type()).map_err(|err| {
            format!(
                "Unable to get pylon property \"{}\" on \"{}\": {}",
                property.name,
                camera.info().friendly_name(),
                err
            )
        }),
        None => Err(format!("No camera bound to {}", data.name)),
    };

    match result {
        Ok(current) => unsafe { gobject_ffi::g_value_copy(current.to_glib_none().0, value) },
        Err(message) => {
            gst::error!(CAT, obj = &*obj, "{}", message);
            unsafe { gobject_ffi::g_param_value_set_default(pspec, value) };
        }
    }
}

/// Applies the selector of a selected property.
fn select(node_map: &mut dyn NodeMap, property: &FeatureProperty) -> pylon::Result<()> {
    match &property.selector {
        Some((selector, value)) => node_map.set_selector(selector, *value),
        None => Ok(()),
    }
}

fn type_error(property: &FeatureProperty) -> PylonError {
    PylonError::InvalidType {
        feature: property.feature.clone(),
        expected: "a supported property type",
    }
}

fn set_feature(camera: &Camera, property: &FeatureProperty, value: &glib::Value) -> pylon::Result<()> {
    let feature = property.feature.as_str();
    camera.with_node_map(|node_map| {
        select(node_map, property)?;

        match unsafe { glib::Type::from_glib(gobject_ffi::g_type_fundamental(value.type_().into_glib())) } {
            glib::Type::I64 => {
                let v = value.get::<i64>().map_err(|_| type_error(property))?;
                node_map.set_integer(feature, v)
            }
            glib::Type::BOOL => {
                let v = value.get::<bool>().map_err(|_| type_error(property))?;
                node_map.set_boolean(feature, v)
            }
            glib::Type::F64 => {
                let v = value.get::<f64>().map_err(|_| type_error(property))?;
                node_map.set_float(feature, v)
            }
            glib::Type::STRING => {
                let v = value
                    .get::<Option<String>>()
                    .map_err(|_| type_error(property))?;
                node_map.set_string(feature, v.as_deref().unwrap_or_default())
            }
            glib::Type::ENUM => {
                let v = unsafe { gobject_ffi::g_value_get_enum(value.to_glib_none().0) };
                node_map.set_enum_value(feature, i64::from(v))
            }
            _ => Err(type_error(property)),
        }
    })
}

fn get_feature(
    camera: &Camera,
    property: &FeatureProperty,
    value_type: glib::Type,
) -> pylon::Result<glib::Value> {
    let feature = property.feature.as_str();
    camera.with_node_map(|node_map| {
        select(node_map, property)?;

        let value = match &property.spec {
            PropertySpec::Integer { .. } => node_map.integer(feature)?.to_value(),
            PropertySpec::Float { .. } => node_map.float(feature)?.to_value(),
            PropertySpec::Boolean { .. } => node_map.boolean(feature)?.to_value(),
            PropertySpec::String { .. } => node_map.string(feature)?.to_value(),
            PropertySpec::Enumeration { .. } => {
                let current = node_map.enum_value(feature)?;
                let current = i32::try_from(current).map_err(|_| PylonError::OutOfRange {
                    feature: property.feature.clone(),
                    value: current.to_string(),
                })?;
                let mut value = glib::Value::from_type(value_type);
                unsafe {
                    gobject_ffi::g_value_set_enum(value.to_glib_none_mut().0, current)
                };
                value
            }
        };
        Ok(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pylon::TlFactory;

    fn open_camera(index: usize) -> Camera {
        gst::init().unwrap();
        let factory = TlFactory::from_parts(None, index + 1);
        let info = &factory.enumerate().unwrap()[index];
        let camera = Camera::new(factory.create_device(info).unwrap());
        camera.lock().unwrap().open().unwrap();
        camera
    }

    #[test]
    fn type_names() {
        assert_eq!(
            type_name("Basler-acA1920 40uc"),
            "GstPylonObject-Basler-acA1920_40uc"
        );
    }

    #[test]
    fn forwards_properties() {
        let camera = open_camera(0);
        let obj = new(&camera, "ObjectTest-Forward").unwrap();
        assert_eq!(obj.type_().name(), "GstPylonObject-ObjectTest-Forward");
        assert!(bound_camera(&obj).unwrap().ptr_eq(&camera));

        obj.set_property("ExposureTime", 2500.0f64);
        assert_eq!(obj.property::<f64>("ExposureTime"), 2500.0);
        let exposure = camera.with_node_map(|map| map.float("ExposureTime")).unwrap();
        assert_eq!(exposure, 2500.0);

        obj.set_property("ReverseX", true);
        assert!(obj.property::<bool>("ReverseX"));

        obj.set_property("DeviceUserID", "left");
        assert_eq!(obj.property::<String>("DeviceUserID"), "left");
    }

    #[test]
    fn forwards_selected_properties() {
        let camera = open_camera(0);
        let obj = new(&camera, "ObjectTest-Selected").unwrap();

        obj.set_property("LineInverter-Line2", true);
        assert!(obj.property::<bool>("LineInverter-Line2"));
        assert!(!obj.property::<bool>("LineInverter-Line1"));

        camera
            .with_node_map(|map| {
                map.set_enum_by_name("LineSelector", "Line2")?;
                assert!(map.boolean("LineInverter")?);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn forwards_enumerations() {
        let camera = open_camera(0);
        let obj = new(&camera, "ObjectTest-Enum").unwrap();

        let pspec = obj.find_property("TriggerMode-FrameStart").unwrap();
        let class = glib::EnumClass::with_type(pspec.value_type()).unwrap();
        let on = class.to_value_by_nick("On").unwrap();
        obj.set_property_from_value("TriggerMode-FrameStart", &on);

        let current = obj.property_value("TriggerMode-FrameStart");
        let (_, current) = glib::EnumValue::from_value(&current).unwrap();
        assert_eq!(current.nick(), "On");
        let mode = camera
            .with_node_map(|map| {
                map.set_enum_by_name("TriggerSelector", "FrameStart")?;
                map.current_enum_name("TriggerMode")
            })
            .unwrap();
        assert_eq!(mode, "On");
    }

    #[test]
    fn reuses_registered_types() {
        let first = open_camera(0);
        let second = open_camera(1);
        let a = new(&first, "ObjectTest-Reuse").unwrap();
        let b = new(&second, "ObjectTest-Reuse").unwrap();
        assert_eq!(a.type_(), b.type_());

        a.set_property("Gain-All", 6.0f64);
        assert_eq!(b.property::<f64>("Gain-All"), 0.0);
    }

    #[test]
    fn read_only_features() {
        let camera = open_camera(0);
        let obj = new(&camera, "ObjectTest-ReadOnly").unwrap();
        let pspec = obj.find_property("DeviceSerialNumber").unwrap();
        assert!(!pspec.flags().contains(glib::ParamFlags::WRITABLE));
        assert_eq!(obj.property::<String>("DeviceSerialNumber"), "0815-0000");
    }

    #[test]
    fn failed_access_keeps_value() {
        let camera = open_camera(0);
        let obj = new(&camera, "ObjectTest-Failure").unwrap();
        camera.lock().unwrap().close().unwrap();

        // Errors are logged, never propagated.
        obj.set_property("ExposureTime", 3000.0f64);
        let default = obj
            .find_property("ExposureTime")
            .unwrap()
            .default_value()
            .get::<f64>()
            .unwrap();
        assert_eq!(obj.property::<f64>("ExposureTime"), default);
    }
}
