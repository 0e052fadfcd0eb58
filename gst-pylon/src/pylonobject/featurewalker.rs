// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Collects the properties of a camera's node map.

use std::collections::HashSet;

use gstreamer as gst;
use pylon::{EnumEntry, FloatRange, IntegerRange, NodeInfo, NodeKind, NodeMap};

use super::CAT;
use super::paramspec::property_name;

/// Features the source negotiates through caps.
const CAPS_FEATURES: &[&str] = &[
    "Width",
    "Height",
    "PixelFormat",
    "AcquisitionFrameRate",
    "AcquisitionFrameRateEnable",
];

/// Largest integer selector that gets expanded into properties.
const MAX_INTEGER_SELECTOR_VALUES: u64 = 64;

/// Value type and default of a feature property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertySpec {
    Integer { range: IntegerRange, default: i64 },
    Float { range: FloatRange, default: f64 },
    Boolean { default: bool },
    String { default: String },
    Enumeration { entries: Vec<EnumEntry>, default: i64 },
}

/// One property of a feature object.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureProperty {
    /// Property name, `<Feature>` or `<Feature>-<SelectorValue>`
    pub name: String,
    /// Feature in the node map
    pub feature: String,
    pub nick: String,
    pub blurb: String,
    /// Selector and selector value to apply before accessing the feature
    pub selector: Option<(String, i64)>,
    pub spec: PropertySpec,
    pub writable: bool,
}

/// Walks a node map and derives the properties of its feature object.
pub struct FeatureWalker;

impl FeatureWalker {
    /// Returns the properties of all value features of `node_map`.
    ///
    /// Selected features are expanded into one property per value of their
    /// first selector. Selectors are left at the values they had before.
    pub fn walk(node_map: &mut dyn NodeMap) -> Vec<FeatureProperty> {
        let names = match node_map.feature_names() {
            Ok(names) => names,
            Err(err) => {
                gst::warning!(CAT, "Unable to list features: {}", err);
                return Vec::new();
            }
        };

        let mut properties = Vec::new();
        let mut seen = HashSet::new();

        for name in names {
            if CAPS_FEATURES.contains(&name.as_str()) {
                continue;
            }
            let Ok(info) = node_map.node_info(&name) else {
                continue;
            };
            if !info.kind.has_value() || info.is_selector() || !info.access.is_readable() {
                continue;
            }

            for property in Self::feature_properties(node_map, &info) {
                if seen.insert(property.name.clone()) {
                    properties.push(property);
                } else {
                    gst::warning!(CAT, "Dropping duplicate property \"{}\"", property.name);
                }
            }
        }

        gst::debug!(CAT, "Found {} feature properties", properties.len());
        properties
    }

    fn feature_properties(node_map: &mut dyn NodeMap, info: &NodeInfo) -> Vec<FeatureProperty> {
        let Some(selector) = info.selectors.first() else {
            return Self::read_property(node_map, info, None)
                .into_iter()
                .collect();
        };

        let Some(values) = Self::selector_values(node_map, selector) else {
            return Self::read_property(node_map, info, None)
                .into_iter()
                .collect();
        };

        let previous = match node_map.selector_value(selector) {
            Ok(previous) => previous,
            Err(err) => {
                gst::debug!(CAT, "Skipping \"{}\": {}", info.name, err);
                return Vec::new();
            }
        };

        let mut properties = Vec::new();
        for (value_name, value) in values {
            if let Err(err) = node_map.set_selector(selector, value) {
                gst::debug!(CAT, "Unable to select {}={}: {}", selector, value_name, err);
                continue;
            }
            // Access may differ per selector value.
            let Ok(selected) = node_map.node_info(&info.name) else {
                continue;
            };
            if !selected.access.is_readable() {
                continue;
            }
            let binding = (selector.clone(), value, value_name);
            properties.extend(Self::read_property(node_map, &selected, Some(binding)));
        }

        if let Err(err) = node_map.set_selector(selector, previous) {
            gst::warning!(CAT, "Unable to restore selector \"{}\": {}", selector, err);
        }
        properties
    }

    /// Values of `selector` as `(name, value)` pairs.
    ///
    /// Returns `None` when the selector can not be expanded.
    fn selector_values(node_map: &dyn NodeMap, selector: &str) -> Option<Vec<(String, i64)>> {
        let info = node_map.node_info(selector).ok()?;
        match info.kind {
            NodeKind::Enumeration => Some(
                node_map
                    .enum_entries(selector)
                    .ok()?
                    .into_iter()
                    .map(|entry| (entry.name, entry.value))
                    .collect(),
            ),
            NodeKind::Integer => {
                let range = node_map.integer_range(selector).ok()?;
                if range.len() > MAX_INTEGER_SELECTOR_VALUES {
                    gst::debug!(
                        CAT,
                        "Selector \"{}\" has too many values, not expanding",
                        selector
                    );
                    return None;
                }
                Some(range.values().map(|v| (v.to_string(), v)).collect())
            }
            _ => None,
        }
    }

    fn read_property(
        node_map: &dyn NodeMap,
        info: &NodeInfo,
        selector: Option<(String, i64, String)>,
    ) -> Option<FeatureProperty> {
        let feature = info.name.as_str();
        let spec = match info.kind {
            NodeKind::Integer => PropertySpec::Integer {
                range: node_map.integer_range(feature).ok()?,
                default: node_map.integer(feature).ok()?,
            },
            NodeKind::Float => PropertySpec::Float {
                range: node_map.float_range(feature).ok()?,
                default: node_map.float(feature).ok()?,
            },
            NodeKind::Boolean => PropertySpec::Boolean {
                default: node_map.boolean(feature).ok()?,
            },
            NodeKind::String => PropertySpec::String {
                default: node_map.string(feature).ok()?,
            },
            NodeKind::Enumeration => PropertySpec::Enumeration {
                entries: node_map.enum_entries(feature).ok()?,
                default: node_map.enum_value(feature).ok()?,
            },
            _ => return None,
        };

        let display_name = if info.display_name.is_empty() {
            info.name.clone()
        } else {
            info.display_name.clone()
        };

        let (name, nick, selector) = match selector {
            Some((selector, value, value_name)) => (
                property_name(feature, Some(&value_name)),
                format!("{display_name} ({value_name})"),
                Some((selector, value)),
            ),
            None => (property_name(feature, None), display_name, None),
        };

        Some(FeatureProperty {
            name,
            feature: feature.to_string(),
            nick,
            blurb: info.tooltip.clone(),
            selector,
            spec,
            writable: info.access.is_writable(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pylon::{Device, EmulatedDevice};

    fn walk_emulator() -> (EmulatedDevice, Vec<FeatureProperty>) {
        gst::init().unwrap();
        let mut device = EmulatedDevice::new(0);
        device.open().unwrap();
        let properties = FeatureWalker::walk(device.node_map().unwrap());
        (device, properties)
    }

    fn find<'a>(properties: &'a [FeatureProperty], name: &str) -> Option<&'a FeatureProperty> {
        properties.iter().find(|p| p.name == name)
    }

    #[test]
    fn skips_caps_features_and_selectors() {
        let (_device, properties) = walk_emulator();
        for name in CAPS_FEATURES {
            assert!(find(&properties, name).is_none(), "{name}");
        }
        assert!(find(&properties, "GainSelector").is_none());
        assert!(find(&properties, "TriggerSoftware").is_none());
        assert!(find(&properties, "ExposureTime").is_some());
    }

    #[test]
    fn expands_selected_features() {
        let (_device, properties) = walk_emulator();

        let gain = find(&properties, "Gain-All").unwrap();
        assert_eq!(gain.feature, "Gain");
        assert_eq!(gain.selector.as_ref().unwrap().0, "GainSelector");
        assert!(matches!(gain.spec, PropertySpec::Float { .. }));

        let trigger = find(&properties, "TriggerMode-FrameStart").unwrap();
        assert!(matches!(trigger.spec, PropertySpec::Enumeration { .. }));
        assert!(find(&properties, "TriggerMode-FrameBurstStart").is_some());
        assert!(find(&properties, "TriggerMode").is_none());

        assert!(find(&properties, "LineInverter-Line1").is_some());
    }

    #[test]
    fn expands_small_integer_selectors() {
        let (_device, properties) = walk_emulator();

        for value in 0..4 {
            let name = format!("SequencerSetNext-{value}");
            let property = find(&properties, &name).unwrap();
            assert_eq!(
                property.selector,
                Some(("SequencerSetSelector".to_string(), value))
            );
            assert!(matches!(property.spec, PropertySpec::Integer { .. }));
        }
        assert!(find(&properties, "SequencerSetNext-4").is_none());
        assert!(find(&properties, "SequencerSetNext").is_none());
        assert!(find(&properties, "SequencerSetSelector").is_none());
    }

    #[test]
    fn large_integer_selectors_stay_plain() {
        let (_device, properties) = walk_emulator();

        let lut = find(&properties, "LUTValue").unwrap();
        assert_eq!(lut.selector, None);
        assert!(find(&properties, "LUTValue-0").is_none());
        assert!(find(&properties, "LUTIndex").is_none());
    }

    #[test]
    fn restores_selectors() {
        gst::init().unwrap();
        let mut device = EmulatedDevice::new(0);
        device.open().unwrap();
        let map = device.node_map().unwrap();
        map.set_enum_by_name("LineSelector", "Line2").unwrap();

        let properties = FeatureWalker::walk(&mut *map);
        assert!(!properties.is_empty());
        assert_eq!(map.current_enum_name("LineSelector").unwrap(), "Line2");
    }

    #[test]
    fn defaults_and_access() {
        let (_device, properties) = walk_emulator();

        let exposure = find(&properties, "ExposureTime").unwrap();
        match &exposure.spec {
            PropertySpec::Float { range, default } => {
                assert_eq!(*default, 10000.0);
                assert!(range.contains(*default));
            }
            other => panic!("unexpected spec {other:?}"),
        }
        assert!(exposure.writable);

        let serial = find(&properties, "DeviceSerialNumber").unwrap();
        assert_eq!(
            serial.spec,
            PropertySpec::String {
                default: "0815-0000".to_string()
            }
        );
        assert!(!serial.writable);
    }

    #[test]
    fn names_are_unique() {
        let (_device, properties) = walk_emulator();
        let names: HashSet<_> = properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.len(), properties.len());
    }
}
