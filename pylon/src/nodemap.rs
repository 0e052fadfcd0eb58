// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Access to a device's GenICam node map.
//!
//! A [`NodeMap`] is discovered at runtime: the set of features, their types,
//! ranges and selectors all depend on the connected device.

use crate::{EnumEntry, Error, FeatureValue, FloatRange, IntegerRange, NodeInfo, NodeKind, Result};

/// Runtime view of a device's features.
///
/// All accessors address features by their GenICam name. Features that depend
/// on a selector are read and written for whichever selector value is
/// currently set.
pub trait NodeMap: Send {
    /// Names of all nodes that carry a feature, in node map order.
    fn feature_names(&self) -> Result<Vec<String>>;

    /// Describes a node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no node with that name.
    fn node_info(&self, name: &str) -> Result<NodeInfo>;

    fn integer(&self, name: &str) -> Result<i64>;
    fn set_integer(&mut self, name: &str, value: i64) -> Result<()>;
    fn integer_range(&self, name: &str) -> Result<IntegerRange>;

    fn float(&self, name: &str) -> Result<f64>;
    fn set_float(&mut self, name: &str, value: f64) -> Result<()>;
    fn float_range(&self, name: &str) -> Result<FloatRange>;

    fn boolean(&self, name: &str) -> Result<bool>;
    fn set_boolean(&mut self, name: &str, value: bool) -> Result<()>;

    fn string(&self, name: &str) -> Result<String>;
    fn set_string(&mut self, name: &str, value: &str) -> Result<()>;

    /// Entries of an enumeration that are currently available.
    fn enum_entries(&self, name: &str) -> Result<Vec<EnumEntry>>;
    /// Integer value of the current entry.
    fn enum_value(&self, name: &str) -> Result<i64>;
    /// Selects the entry with the given integer value.
    fn set_enum_value(&mut self, name: &str, value: i64) -> Result<()>;

    /// Executes a command node.
    fn execute(&mut self, name: &str) -> Result<()>;

    /// Whether a feature with that name exists.
    fn has_feature(&self, name: &str) -> bool {
        self.node_info(name).is_ok()
    }

    /// Reads a feature, dispatching on its kind.
    fn get(&self, name: &str) -> Result<FeatureValue> {
        let info = self.node_info(name)?;
        match info.kind {
            NodeKind::Integer => self.integer(name).map(FeatureValue::Integer),
            NodeKind::Float => self.float(name).map(FeatureValue::Float),
            NodeKind::Boolean => self.boolean(name).map(FeatureValue::Boolean),
            NodeKind::String => self.string(name).map(FeatureValue::String),
            NodeKind::Enumeration => self.enum_value(name).map(FeatureValue::Enumeration),
            _ => Err(Error::InvalidType {
                feature: name.to_string(),
                expected: "a value",
            }),
        }
    }

    /// Writes a feature; the value's kind must match the node's kind.
    fn set(&mut self, name: &str, value: &FeatureValue) -> Result<()> {
        match value {
            FeatureValue::Integer(v) => self.set_integer(name, *v),
            FeatureValue::Float(v) => self.set_float(name, *v),
            FeatureValue::Boolean(v) => self.set_boolean(name, *v),
            FeatureValue::String(v) => self.set_string(name, v),
            FeatureValue::Enumeration(v) => self.set_enum_value(name, *v),
        }
    }

    /// Looks up an enumeration entry by its symbolic name.
    fn enum_entry_by_name(&self, name: &str, entry: &str) -> Result<EnumEntry> {
        self.enum_entries(name)?
            .into_iter()
            .find(|e| e.name == entry)
            .ok_or_else(|| Error::OutOfRange {
                feature: name.to_string(),
                value: entry.to_string(),
            })
    }

    /// Selects an enumeration entry by its symbolic name.
    fn set_enum_by_name(&mut self, name: &str, entry: &str) -> Result<()> {
        let entry = self.enum_entry_by_name(name, entry)?;
        self.set_enum_value(name, entry.value)
    }

    /// Symbolic name of the current enumeration entry.
    fn current_enum_name(&self, name: &str) -> Result<String> {
        let value = self.enum_value(name)?;
        self.enum_entries(name)?
            .into_iter()
            .find(|e| e.value == value)
            .map(|e| e.name)
            .ok_or_else(|| Error::OutOfRange {
                feature: name.to_string(),
                value: value.to_string(),
            })
    }

    /// Writes a selector node, which must be an enumeration or an integer.
    fn set_selector(&mut self, selector: &str, value: i64) -> Result<()> {
        match self.node_info(selector)?.kind {
            NodeKind::Enumeration => self.set_enum_value(selector, value),
            NodeKind::Integer => self.set_integer(selector, value),
            _ => Err(Error::InvalidSelector(selector.to_string())),
        }
    }

    /// Reads a selector node, which must be an enumeration or an integer.
    fn selector_value(&self, selector: &str) -> Result<i64> {
        match self.node_info(selector)?.kind {
            NodeKind::Enumeration => self.enum_value(selector),
            NodeKind::Integer => self.integer(selector),
            _ => Err(Error::InvalidSelector(selector.to_string())),
        }
    }
}
