// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Param specs for camera features
//!
//! Turns the properties found by the feature walker into `GParamSpec`s.
//! Enumeration features get a `GEnum` type registered at runtime, since their
//! entries are only known once a camera is connected.

use std::ffi::CString;

use glib::gobject_ffi;
use glib::prelude::*;
use glib::translate::*;
use gst::prelude::*;
use gstreamer as gst;

use pylon::EnumEntry;

use super::CAT;
use super::featurewalker::{FeatureProperty, PropertySpec};

/// Turns `name` into a valid GType name.
///
/// Every character outside `[A-Za-z0-9_+-]` becomes `_`, and a `_` is
/// prepended when the name does not start with an ASCII letter.
pub fn sanitize_name(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !sanitized.starts_with(|c: char| c.is_ascii_alphabetic()) {
        sanitized.insert(0, '_');
    }
    sanitized
}

/// Property name of `feature`, optionally qualified by a selector value.
///
/// Param spec names are stricter than type names: `+` is not allowed.
pub fn property_name(feature: &str, selector_value: Option<&str>) -> String {
    let name = match selector_value {
        Some(value) => format!("{feature}-{value}"),
        None => feature.to_string(),
    };
    sanitize_name(&name).replace('+', "_")
}

/// Builds the param spec of one feature property.
///
/// `type_name` is the name of the owning object type and prefixes the names
/// of enumeration types.
pub fn build(type_name: &str, property: &FeatureProperty) -> Option<glib::ParamSpec> {
    let name = property.name.as_str();
    let nick = property.nick.as_str();
    let blurb = property.blurb.as_str();

    let pspec = match &property.spec {
        PropertySpec::Integer { range, default } => {
            let builder = glib::ParamSpecInt64::builder(name)
                .nick(nick)
                .blurb(blurb)
                .minimum(range.min)
                .maximum(range.max.max(range.min))
                .default_value((*default).clamp(range.min, range.max.max(range.min)))
                .mutable_playing();
            if property.writable {
                builder.build()
            } else {
                builder.read_only().build()
            }
        }
        PropertySpec::Float { range, default } => {
            let max = range.max.max(range.min);
            let builder = glib::ParamSpecDouble::builder(name)
                .nick(nick)
                .blurb(blurb)
                .minimum(range.min)
                .maximum(max)
                .default_value(default.clamp(range.min, max))
                .mutable_playing();
            if property.writable {
                builder.build()
            } else {
                builder.read_only().build()
            }
        }
        PropertySpec::Boolean { default } => {
            let builder = glib::ParamSpecBoolean::builder(name)
                .nick(nick)
                .blurb(blurb)
                .default_value(*default)
                .mutable_playing();
            if property.writable {
                builder.build()
            } else {
                builder.read_only().build()
            }
        }
        PropertySpec::String { default } => {
            let builder = glib::ParamSpecString::builder(name)
                .nick(nick)
                .blurb(blurb)
                .default_value(Some(default.as_str()))
                .mutable_playing();
            if property.writable {
                builder.build()
            } else {
                builder.read_only().build()
            }
        }
        PropertySpec::Enumeration { entries, default } => {
            // Entries may differ per selector value, so each property gets its own type.
            let enum_type = register_enum(&format!("{type_name}_{name}"), entries)?;
            let class = glib::EnumClass::with_type(enum_type)?;
            let default = match i32::try_from(*default).ok().and_then(|v| class.value(v)) {
                Some(value) => value.value(),
                None => class.values().first()?.value(),
            };
            let mut flags = glib::ParamFlags::READABLE | gst::PARAM_FLAG_MUTABLE_PLAYING;
            if property.writable {
                flags |= glib::ParamFlags::WRITABLE;
            }
            let c_name = CString::new(name).ok()?;
            let c_nick = CString::new(nick).ok()?;
            let c_blurb = CString::new(blurb).ok()?;
            let pspec = unsafe {
                gobject_ffi::g_param_spec_enum(
                    c_name.as_ptr(),
                    c_nick.as_ptr(),
                    c_blurb.as_ptr(),
                    enum_type.into_glib(),
                    default,
                    flags.into_glib(),
                )
            };
            if pspec.is_null() {
                gst::warning!(CAT, "Unable to create param spec for \"{}\"", name);
                return None;
            }
            unsafe { from_glib_none(pspec) }
        }
    };

    Some(pspec)
}

/// Registers (or looks up) a `GEnum` type with the given entries.
///
/// Value names and nicks are the entries' symbolic names. Entries whose
/// value does not fit a `GEnum` are left out. The type and its strings live
/// for the rest of the process.
fn register_enum(name: &str, entries: &[EnumEntry]) -> Option<glib::Type> {
    let type_name = sanitize_name(name);
    if let Some(existing) = glib::Type::from_name(&type_name) {
        return existing.is_a(glib::Type::ENUM).then_some(existing);
    }
    if entries.is_empty() {
        return None;
    }

    let mut values: Vec<gobject_ffi::GEnumValue> = Vec::with_capacity(entries.len() + 1);
    for entry in entries {
        let Ok(value) = i32::try_from(entry.value) else {
            gst::warning!(
                CAT,
                "Skipping entry \"{}\" of \"{}\": value {} out of range",
                entry.name,
                name,
                entry.value
            );
            continue;
        };
        let symbolic = CString::new(entry.name.as_str()).ok()?;
        values.push(gobject_ffi::GEnumValue {
            value,
            value_name: symbolic.clone().into_raw(),
            value_nick: symbolic.into_raw(),
        });
    }
    if values.is_empty() {
        return None;
    }
    values.push(gobject_ffi::GEnumValue {
        value: 0,
        value_name: std::ptr::null(),
        value_nick: std::ptr::null(),
    });

    let c_type_name = CString::new(type_name).ok()?;
    let values = Box::leak(values.into_boxed_slice());
    let type_ = unsafe {
        gobject_ffi::g_enum_register_static(c_type_name.into_raw(), values.as_ptr())
    };
    if type_ == gobject_ffi::G_TYPE_INVALID {
        return None;
    }
    Some(unsafe { from_glib(type_) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pylon::{FloatRange, IntegerRange};

    fn property(name: &str, spec: PropertySpec, writable: bool) -> FeatureProperty {
        FeatureProperty {
            name: name.to_string(),
            feature: name.to_string(),
            nick: name.to_string(),
            blurb: String::new(),
            selector: None,
            spec,
            writable,
        }
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_name("Basler acA1920-40uc"), "Basler_acA1920-40uc");
        assert_eq!(sanitize_name("2nd camera"), "_2nd_camera");
        assert_eq!(sanitize_name("a+b.c"), "a+b_c");
        assert_eq!(sanitize_name(""), "_");
    }

    #[test]
    fn property_names() {
        assert_eq!(property_name("Gain", None), "Gain");
        assert_eq!(property_name("Gain", Some("All")), "Gain-All");
        assert_eq!(property_name("LineInverter", Some("1")), "LineInverter-1");
        assert_eq!(property_name("Feature", Some("A+B")), "Feature-A_B");
    }

    #[test]
    fn numeric_specs() {
        gst::init().unwrap();
        let pspec = build(
            "ParamSpecTest",
            &property(
                "OffsetX",
                PropertySpec::Integer {
                    range: IntegerRange {
                        min: 0,
                        max: 100,
                        inc: 2,
                    },
                    default: 200,
                },
                true,
            ),
        )
        .unwrap();
        let int = pspec.downcast_ref::<glib::ParamSpecInt64>().unwrap();
        assert_eq!(int.maximum(), 100);
        assert_eq!(int.default_value(), 100);
        assert!(pspec.flags().contains(glib::ParamFlags::WRITABLE));
        assert!(pspec.flags().contains(gst::PARAM_FLAG_MUTABLE_PLAYING));

        let pspec = build(
            "ParamSpecTest",
            &property(
                "ExposureTime",
                PropertySpec::Float {
                    range: FloatRange {
                        min: 10.0,
                        max: 1000.0,
                    },
                    default: 20.0,
                },
                false,
            ),
        )
        .unwrap();
        assert_eq!(pspec.value_type(), glib::Type::F64);
        assert!(!pspec.flags().contains(glib::ParamFlags::WRITABLE));
    }

    #[test]
    fn enum_specs() {
        gst::init().unwrap();
        let entries = vec![EnumEntry::new("Off", 0), EnumEntry::new("On", 1)];
        let pspec = build(
            "ParamSpecTest",
            &property(
                "TriggerMode",
                PropertySpec::Enumeration {
                    entries: entries.clone(),
                    default: 1,
                },
                true,
            ),
        )
        .unwrap();
        let enum_type = pspec.value_type();
        assert_eq!(enum_type.name(), "ParamSpecTest_TriggerMode");
        let class = glib::EnumClass::with_type(enum_type).unwrap();
        assert_eq!(class.value_by_nick("On").unwrap().value(), 1);
        assert_eq!(
            pspec
                .downcast_ref::<glib::ParamSpecEnum>()
                .unwrap()
                .default_value_as_i32(),
            1
        );

        // A second registration reuses the type.
        assert_eq!(
            register_enum("ParamSpecTest_TriggerMode", &entries),
            Some(enum_type)
        );
    }

    #[test]
    fn enum_types_per_selector_value() {
        gst::init().unwrap();
        let mut first = property(
            "TriggerSource-FrameStart",
            PropertySpec::Enumeration {
                entries: vec![EnumEntry::new("Software", 0), EnumEntry::new("Line1", 1)],
                default: 0,
            },
            true,
        );
        first.feature = "TriggerSource".to_string();
        let mut second = property(
            "TriggerSource-FrameBurstStart",
            PropertySpec::Enumeration {
                entries: vec![EnumEntry::new("Line2", 2), EnumEntry::new("Line3", 3)],
                default: 3,
            },
            true,
        );
        second.feature = "TriggerSource".to_string();

        let first = build("SelectorTest", &first).unwrap();
        let second = build("SelectorTest", &second).unwrap();
        assert_ne!(first.value_type(), second.value_type());

        let class = glib::EnumClass::with_type(second.value_type()).unwrap();
        assert!(class.value_by_nick("Line3").is_some());
        assert!(class.value_by_nick("Software").is_none());
        assert_eq!(
            second
                .downcast_ref::<glib::ParamSpecEnum>()
                .unwrap()
                .default_value_as_i32(),
            3
        );
    }

    #[test]
    fn wide_enum_entries_are_skipped() {
        gst::init().unwrap();
        let pspec = build(
            "WideEnumTest",
            &property(
                "EventSelector",
                PropertySpec::Enumeration {
                    entries: vec![EnumEntry::new("Small", 1), EnumEntry::new("Huge", 1 << 40)],
                    default: 1 << 40,
                },
                true,
            ),
        )
        .unwrap();
        let class = glib::EnumClass::with_type(pspec.value_type()).unwrap();
        assert!(class.value_by_nick("Huge").is_none());
        assert_eq!(
            pspec
                .downcast_ref::<glib::ParamSpecEnum>()
                .unwrap()
                .default_value_as_i32(),
            1
        );

        let only_wide = property(
            "TimestampSelector",
            PropertySpec::Enumeration {
                entries: vec![EnumEntry::new("Huge", 1 << 40)],
                default: 1 << 40,
            },
            true,
        );
        assert!(build("WideEnumTest", &only_wide).is_none());
    }
}
