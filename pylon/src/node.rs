// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Typed description of GenICam nodes.
//!
//! These types describe a node independently of whether it lives in a real
//! device's node map or in the emulator.

use std::fmt;

/// Interface type of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Integer,
    Float,
    Boolean,
    String,
    Enumeration,
    Command,
    Category,
    /// Registers, ports, enum entries and other nodes that carry no feature value.
    Other,
}

impl NodeKind {
    /// Human readable name, used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Integer => "Integer",
            NodeKind::Float => "Float",
            NodeKind::Boolean => "Boolean",
            NodeKind::String => "String",
            NodeKind::Enumeration => "Enumeration",
            NodeKind::Command => "Command",
            NodeKind::Category => "Category",
            NodeKind::Other => "Other",
        }
    }

    /// Whether the node holds a value that can be read back.
    pub fn has_value(&self) -> bool {
        matches!(
            self,
            NodeKind::Integer
                | NodeKind::Float
                | NodeKind::Boolean
                | NodeKind::String
                | NodeKind::Enumeration
        )
    }

    pub(crate) fn from_sys(node_type: pylon_sys::EGenApiNodeType) -> Self {
        match node_type {
            pylon_sys::Integer => NodeKind::Integer,
            pylon_sys::Float => NodeKind::Float,
            pylon_sys::Boolean => NodeKind::Boolean,
            pylon_sys::String => NodeKind::String,
            pylon_sys::Enumeration => NodeKind::Enumeration,
            pylon_sys::Command => NodeKind::Command,
            pylon_sys::Category => NodeKind::Category,
            _ => NodeKind::Other,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GenICam access mode of a node in the current device state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    NotImplemented,
    NotAvailable,
    WriteOnly,
    ReadOnly,
    ReadWrite,
}

impl AccessMode {
    pub fn is_readable(&self) -> bool {
        matches!(self, AccessMode::ReadOnly | AccessMode::ReadWrite)
    }

    pub fn is_writable(&self) -> bool {
        matches!(self, AccessMode::WriteOnly | AccessMode::ReadWrite)
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, AccessMode::NotImplemented | AccessMode::NotAvailable)
    }

    pub(crate) fn from_sys(mode: pylon_sys::EGenApiAccessMode) -> Self {
        match mode {
            pylon_sys::NI => AccessMode::NotImplemented,
            pylon_sys::WO => AccessMode::WriteOnly,
            pylon_sys::RO => AccessMode::ReadOnly,
            pylon_sys::RW => AccessMode::ReadWrite,
            _ => AccessMode::NotAvailable,
        }
    }
}

/// Static description of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub name: String,
    pub kind: NodeKind,
    pub display_name: String,
    pub tooltip: String,
    pub access: AccessMode,
    /// Features whose value selects which instance of this feature is accessed.
    pub selectors: Vec<String>,
    /// Features whose instance is chosen by this node's value.
    pub selected: Vec<String>,
}

impl NodeInfo {
    /// Whether this node selects other features.
    pub fn is_selector(&self) -> bool {
        !self.selected.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerRange {
    pub min: i64,
    pub max: i64,
    pub inc: i64,
}

impl IntegerRange {
    pub fn contains(&self, value: i64) -> bool {
        value >= self.min
            && value <= self.max
            && (self.inc <= 1 || (value as i128 - self.min as i128) % self.inc as i128 == 0)
    }

    /// Number of distinct values in the range, saturating at `u64::MAX`.
    pub fn len(&self) -> u64 {
        if self.max < self.min {
            return 0;
        }
        let inc = self.inc.max(1) as i128;
        u64::try_from((self.max as i128 - self.min as i128) / inc + 1).unwrap_or(u64::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over every valid value, from `min` to `max`.
    pub fn values(&self) -> impl Iterator<Item = i64> + use<> {
        let (min, max, inc) = (self.min as i128, self.max as i128, self.inc.max(1) as i128);
        (0..self.len()).map_while(move |i| {
            let value = min + i as i128 * inc;
            (value <= max).then_some(value as i64)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatRange {
    pub min: f64,
    pub max: f64,
}

impl FloatRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// One entry of an enumeration node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumEntry {
    /// Symbolic name, e.g. `"Mono8"`.
    pub name: String,
    /// Integer value of the entry.
    pub value: i64,
}

impl EnumEntry {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A feature value of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    /// Integer value of the current entry.
    Enumeration(i64),
}

impl FeatureValue {
    pub fn kind(&self) -> NodeKind {
        match self {
            FeatureValue::Integer(_) => NodeKind::Integer,
            FeatureValue::Float(_) => NodeKind::Float,
            FeatureValue::Boolean(_) => NodeKind::Boolean,
            FeatureValue::String(_) => NodeKind::String,
            FeatureValue::Enumeration(_) => NodeKind::Enumeration,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Integer(v) | FeatureValue::Enumeration(v) => write!(f, "{v}"),
            FeatureValue::Float(v) => write!(f, "{v}"),
            FeatureValue::Boolean(v) => write!(f, "{v}"),
            FeatureValue::String(v) => f.write_str(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_range_respects_increment() {
        let range = IntegerRange {
            min: 16,
            max: 64,
            inc: 16,
        };
        assert!(range.contains(32));
        assert!(!range.contains(40));
        assert!(!range.contains(80));
        assert_eq!(range.len(), 4);
        assert_eq!(range.values().collect::<Vec<_>>(), vec![16, 32, 48, 64]);
    }

    #[test]
    fn empty_integer_range() {
        let range = IntegerRange {
            min: 5,
            max: 4,
            inc: 1,
        };
        assert!(range.is_empty());
        assert_eq!(range.values().count(), 0);
    }

    #[test]
    fn full_integer_range() {
        let range = IntegerRange {
            min: i64::MIN,
            max: i64::MAX,
            inc: 1,
        };
        assert!(!range.is_empty());
        assert_eq!(range.len(), u64::MAX);
        assert!(range.contains(0));
        assert_eq!(range.values().take(2).collect::<Vec<_>>(), vec![i64::MIN, i64::MIN + 1]);
    }

    #[test]
    fn access_modes() {
        assert!(AccessMode::ReadWrite.is_readable());
        assert!(AccessMode::ReadWrite.is_writable());
        assert!(!AccessMode::ReadOnly.is_writable());
        assert!(!AccessMode::WriteOnly.is_readable());
        assert!(!AccessMode::NotAvailable.is_available());
    }
}
