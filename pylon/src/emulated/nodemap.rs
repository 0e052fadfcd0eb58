// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! In-memory node map used by the emulator.
//!
//! Each node keeps one value per selector value ("bank"), so selected
//! features such as `Gain` behave like on a real device: changing
//! `GainSelector` changes which gain is read and written.

use std::collections::{BTreeMap, HashMap};

use crate::{
    AccessMode, EnumEntry, Error, FeatureValue, FloatRange, IntegerRange, NodeInfo, NodeKind,
    NodeMap, Result,
};

/// Computes a range bound from the state of other nodes.
pub(crate) type DynamicBound = fn(&EmulatedNodeMap) -> i64;

/// Bank key used by features without a selector.
const UNSELECTED: i64 = 0;

#[derive(Debug, Clone)]
pub(crate) struct EmulatedNode {
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) display_name: String,
    pub(crate) tooltip: String,
    pub(crate) access: AccessMode,
    pub(crate) selector: Option<String>,
    pub(crate) locked_while_grabbing: bool,
    pub(crate) int_range: Option<IntegerRange>,
    pub(crate) dynamic_max: Option<DynamicBound>,
    pub(crate) float_range: Option<FloatRange>,
    pub(crate) entries: Vec<EnumEntry>,
    pub(crate) default: Option<FeatureValue>,
    pub(crate) banks: BTreeMap<i64, FeatureValue>,
}

impl EmulatedNode {
    fn new(name: &str, kind: NodeKind, default: Option<FeatureValue>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            display_name: split_camel_case(name),
            tooltip: String::new(),
            access: AccessMode::ReadWrite,
            selector: None,
            locked_while_grabbing: false,
            int_range: None,
            dynamic_max: None,
            float_range: None,
            entries: Vec::new(),
            default,
            banks: BTreeMap::new(),
        }
    }

    pub(crate) fn integer(name: &str, value: i64, min: i64, max: i64, inc: i64) -> Self {
        let mut node = Self::new(name, NodeKind::Integer, Some(FeatureValue::Integer(value)));
        node.int_range = Some(IntegerRange { min, max, inc });
        node
    }

    pub(crate) fn float(name: &str, value: f64, min: f64, max: f64) -> Self {
        let mut node = Self::new(name, NodeKind::Float, Some(FeatureValue::Float(value)));
        node.float_range = Some(FloatRange { min, max });
        node
    }

    pub(crate) fn boolean(name: &str, value: bool) -> Self {
        Self::new(name, NodeKind::Boolean, Some(FeatureValue::Boolean(value)))
    }

    pub(crate) fn string(name: &str, value: &str) -> Self {
        Self::new(
            name,
            NodeKind::String,
            Some(FeatureValue::String(value.to_string())),
        )
    }

    /// An enumeration whose default is the first entry.
    pub(crate) fn enumeration(name: &str, entries: &[(&str, i64)]) -> Self {
        let entries: Vec<EnumEntry> = entries
            .iter()
            .map(|(name, value)| EnumEntry::new(*name, *value))
            .collect();
        let default = entries.first().map(|e| FeatureValue::Enumeration(e.value));
        let mut node = Self::new(name, NodeKind::Enumeration, default);
        node.entries = entries;
        node
    }

    pub(crate) fn command(name: &str) -> Self {
        let mut node = Self::new(name, NodeKind::Command, None);
        node.access = AccessMode::WriteOnly;
        node
    }

    pub(crate) fn category(name: &str) -> Self {
        let mut node = Self::new(name, NodeKind::Category, None);
        node.access = AccessMode::ReadOnly;
        node
    }

    pub(crate) fn selected_by(mut self, selector: &str) -> Self {
        self.selector = Some(selector.to_string());
        self
    }

    pub(crate) fn read_only(mut self) -> Self {
        self.access = AccessMode::ReadOnly;
        self
    }

    pub(crate) fn locked_while_grabbing(mut self) -> Self {
        self.locked_while_grabbing = true;
        self
    }

    pub(crate) fn dynamic_max(mut self, bound: DynamicBound) -> Self {
        self.dynamic_max = Some(bound);
        self
    }

    pub(crate) fn with_default(mut self, value: FeatureValue) -> Self {
        self.default = Some(value);
        self
    }

    pub(crate) fn tooltip(mut self, tooltip: &str) -> Self {
        self.tooltip = tooltip.to_string();
        self
    }
}

/// Node map of an emulated camera.
#[derive(Debug, Clone)]
pub struct EmulatedNodeMap {
    nodes: Vec<EmulatedNode>,
    index: HashMap<String, usize>,
    grabbing: bool,
    pending_triggers: u64,
    user_sets: HashMap<i64, Vec<(String, BTreeMap<i64, FeatureValue>)>>,
}

impl EmulatedNodeMap {
    pub(crate) fn new(nodes: Vec<EmulatedNode>) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.name.clone(), i))
            .collect();
        Self {
            nodes,
            index,
            grabbing: false,
            pending_triggers: 0,
            user_sets: HashMap::new(),
        }
    }

    pub(crate) fn set_grabbing(&mut self, grabbing: bool) {
        self.grabbing = grabbing;
    }

    /// Consumes one pending software trigger, if any.
    pub(crate) fn take_trigger(&mut self) -> bool {
        if self.pending_triggers > 0 {
            self.pending_triggers -= 1;
            true
        } else {
            false
        }
    }

    fn node(&self, name: &str) -> Result<&EmulatedNode> {
        self.index
            .get(name)
            .map(|i| &self.nodes[*i])
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    fn access(&self, node: &EmulatedNode) -> AccessMode {
        if self.grabbing && node.locked_while_grabbing && node.access == AccessMode::ReadWrite {
            AccessMode::ReadOnly
        } else {
            node.access
        }
    }

    fn bank(&self, node: &EmulatedNode) -> Result<i64> {
        match &node.selector {
            Some(selector) => self.selector_value(selector),
            None => Ok(UNSELECTED),
        }
    }

    fn typed(&self, name: &str, kind: NodeKind) -> Result<&EmulatedNode> {
        let node = self.node(name)?;
        if node.kind != kind {
            return Err(Error::InvalidType {
                feature: name.to_string(),
                expected: kind.as_str(),
            });
        }
        Ok(node)
    }

    fn read(&self, name: &str, kind: NodeKind) -> Result<FeatureValue> {
        let node = self.typed(name, kind)?;
        if !self.access(node).is_readable() {
            return Err(Error::NotReadable(name.to_string()));
        }
        let bank = self.bank(node)?;
        node.banks
            .get(&bank)
            .or(node.default.as_ref())
            .cloned()
            .ok_or_else(|| Error::NotReadable(name.to_string()))
    }

    fn write(&mut self, name: &str, kind: NodeKind, value: FeatureValue) -> Result<()> {
        let node = self.typed(name, kind)?;
        if !self.access(node).is_writable() {
            return Err(Error::NotWritable(name.to_string()));
        }
        let bank = self.bank(node)?;
        let i = self.index[name];
        self.nodes[i].banks.insert(bank, value);
        Ok(())
    }

    fn out_of_range(name: &str, value: impl ToString) -> Error {
        Error::OutOfRange {
            feature: name.to_string(),
            value: value.to_string(),
        }
    }

    fn snapshot(&self) -> Vec<(String, BTreeMap<i64, FeatureValue>)> {
        self.nodes
            .iter()
            .filter(|n| n.kind.has_value() && n.access == AccessMode::ReadWrite)
            .filter(|n| !n.name.starts_with("UserSet"))
            .map(|n| (n.name.clone(), n.banks.clone()))
            .collect()
    }

    fn load_user_set(&mut self) -> Result<()> {
        if self.grabbing {
            return Err(Error::NotWritable("UserSetLoad".to_string()));
        }
        let set = self.enum_value("UserSetSelector")?;
        let saved = self.user_sets.get(&set).cloned();
        for node in self
            .nodes
            .iter_mut()
            .filter(|n| n.kind.has_value() && n.access == AccessMode::ReadWrite)
            .filter(|n| !n.name.starts_with("UserSet"))
        {
            node.banks.clear();
            if let Some((_, banks)) = saved
                .as_ref()
                .and_then(|saved| saved.iter().find(|(name, _)| *name == node.name))
            {
                node.banks = banks.clone();
            }
        }
        tracing::debug!("Loaded user set {set}");
        Ok(())
    }

    fn save_user_set(&mut self) -> Result<()> {
        let set = self.current_enum_name("UserSetSelector")?;
        if set == "Default" {
            return Err(Error::Other("The default user set is read-only".to_string()));
        }
        let value = self.enum_value("UserSetSelector")?;
        let snapshot = self.snapshot();
        self.user_sets.insert(value, snapshot);
        Ok(())
    }
}

impl NodeMap for EmulatedNodeMap {
    fn feature_names(&self) -> Result<Vec<String>> {
        Ok(self.nodes.iter().map(|n| n.name.clone()).collect())
    }

    fn node_info(&self, name: &str) -> Result<NodeInfo> {
        let node = self.node(name)?;
        let selected = self
            .nodes
            .iter()
            .filter(|n| n.selector.as_deref() == Some(name))
            .map(|n| n.name.clone())
            .collect();
        Ok(NodeInfo {
            name: node.name.clone(),
            kind: node.kind,
            display_name: node.display_name.clone(),
            tooltip: node.tooltip.clone(),
            access: self.access(node),
            selectors: node.selector.iter().cloned().collect(),
            selected,
        })
    }

    fn integer(&self, name: &str) -> Result<i64> {
        match self.read(name, NodeKind::Integer)? {
            FeatureValue::Integer(v) => Ok(v),
            _ => unreachable!("integer node holds a non-integer value"),
        }
    }

    fn set_integer(&mut self, name: &str, value: i64) -> Result<()> {
        if !self.integer_range(name)?.contains(value) {
            return Err(Self::out_of_range(name, value));
        }
        self.write(name, NodeKind::Integer, FeatureValue::Integer(value))
    }

    fn integer_range(&self, name: &str) -> Result<IntegerRange> {
        let node = self.typed(name, NodeKind::Integer)?;
        let mut range = node.int_range.unwrap_or(IntegerRange {
            min: i64::MIN,
            max: i64::MAX,
            inc: 1,
        });
        if let Some(bound) = node.dynamic_max {
            range.max = range.max.min(bound(self));
        }
        Ok(range)
    }

    fn float(&self, name: &str) -> Result<f64> {
        match self.read(name, NodeKind::Float)? {
            FeatureValue::Float(v) => Ok(v),
            _ => unreachable!("float node holds a non-float value"),
        }
    }

    fn set_float(&mut self, name: &str, value: f64) -> Result<()> {
        if !value.is_finite() || !self.float_range(name)?.contains(value) {
            return Err(Self::out_of_range(name, value));
        }
        self.write(name, NodeKind::Float, FeatureValue::Float(value))
    }

    fn float_range(&self, name: &str) -> Result<FloatRange> {
        let node = self.typed(name, NodeKind::Float)?;
        Ok(node.float_range.unwrap_or(FloatRange {
            min: f64::MIN,
            max: f64::MAX,
        }))
    }

    fn boolean(&self, name: &str) -> Result<bool> {
        match self.read(name, NodeKind::Boolean)? {
            FeatureValue::Boolean(v) => Ok(v),
            _ => unreachable!("boolean node holds a non-boolean value"),
        }
    }

    fn set_boolean(&mut self, name: &str, value: bool) -> Result<()> {
        self.write(name, NodeKind::Boolean, FeatureValue::Boolean(value))
    }

    fn string(&self, name: &str) -> Result<String> {
        match self.read(name, NodeKind::String)? {
            FeatureValue::String(v) => Ok(v),
            _ => unreachable!("string node holds a non-string value"),
        }
    }

    fn set_string(&mut self, name: &str, value: &str) -> Result<()> {
        self.write(name, NodeKind::String, FeatureValue::String(value.to_string()))
    }

    fn enum_entries(&self, name: &str) -> Result<Vec<EnumEntry>> {
        Ok(self.typed(name, NodeKind::Enumeration)?.entries.clone())
    }

    fn enum_value(&self, name: &str) -> Result<i64> {
        match self.read(name, NodeKind::Enumeration)? {
            FeatureValue::Enumeration(v) => Ok(v),
            _ => unreachable!("enumeration node holds a non-enumeration value"),
        }
    }

    fn set_enum_value(&mut self, name: &str, value: i64) -> Result<()> {
        let node = self.typed(name, NodeKind::Enumeration)?;
        if !node.entries.iter().any(|e| e.value == value) {
            return Err(Self::out_of_range(name, value));
        }
        self.write(name, NodeKind::Enumeration, FeatureValue::Enumeration(value))
    }

    fn execute(&mut self, name: &str) -> Result<()> {
        let node = self.typed(name, NodeKind::Command)?;
        if !self.access(node).is_writable() {
            return Err(Error::NotWritable(name.to_string()));
        }
        match name {
            "TriggerSoftware" => self.pending_triggers += 1,
            "UserSetLoad" => self.load_user_set()?,
            "UserSetSave" => self.save_user_set()?,
            _ => tracing::trace!("Command {name} has no emulated effect"),
        }
        Ok(())
    }
}

/// `ExposureTime` -> `Exposure Time`
fn split_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() && prev_lower {
            out.push(' ');
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> EmulatedNodeMap {
        EmulatedNodeMap::new(vec![
            EmulatedNode::enumeration("GainSelector", &[("All", 0), ("DigitalAll", 1)]),
            EmulatedNode::float("Gain", 0.0, 0.0, 24.0).selected_by("GainSelector"),
            EmulatedNode::integer("Width", 64, 16, 128, 2).locked_while_grabbing(),
            EmulatedNode::string("DeviceModelName", "Emulation").read_only(),
            EmulatedNode::command("TriggerSoftware"),
            EmulatedNode::category("Root"),
        ])
    }

    #[test]
    fn selected_features_are_banked() {
        let mut map = map();
        map.set_float("Gain", 6.0).unwrap();
        map.set_selector("GainSelector", 1).unwrap();
        assert_eq!(map.float("Gain").unwrap(), 0.0);
        map.set_float("Gain", 3.0).unwrap();
        map.set_selector("GainSelector", 0).unwrap();
        assert_eq!(map.float("Gain").unwrap(), 6.0);
    }

    #[test]
    fn selector_relations_are_reported() {
        let map = map();
        let selector = map.node_info("GainSelector").unwrap();
        assert!(selector.is_selector());
        assert_eq!(selector.selected, vec!["Gain".to_string()]);
        let gain = map.node_info("Gain").unwrap();
        assert_eq!(gain.selectors, vec!["GainSelector".to_string()]);
        assert_eq!(gain.display_name, "Gain");
        assert_eq!(
            map.node_info("DeviceModelName").unwrap().display_name,
            "Device Model Name"
        );
    }

    #[test]
    fn ranges_and_types_are_enforced() {
        let mut map = map();
        assert!(matches!(
            map.set_integer("Width", 65),
            Err(Error::OutOfRange { .. })
        ));
        assert!(matches!(
            map.set_float("Gain", 100.0),
            Err(Error::OutOfRange { .. })
        ));
        assert!(matches!(
            map.set_integer("Gain", 1),
            Err(Error::InvalidType { .. })
        ));
        assert!(matches!(
            map.set_enum_value("GainSelector", 7),
            Err(Error::OutOfRange { .. })
        ));
        assert!(matches!(map.integer("Height"), Err(Error::NotFound(_))));
        assert!(matches!(
            map.set_string("DeviceModelName", "x"),
            Err(Error::NotWritable(_))
        ));
    }

    #[test]
    fn grabbing_locks_nodes() {
        let mut map = map();
        map.set_grabbing(true);
        assert_eq!(
            map.node_info("Width").unwrap().access,
            AccessMode::ReadOnly
        );
        assert!(matches!(
            map.set_integer("Width", 32),
            Err(Error::NotWritable(_))
        ));
        assert_eq!(map.integer("Width").unwrap(), 64);
        map.set_grabbing(false);
        map.set_integer("Width", 32).unwrap();
    }

    #[test]
    fn generic_get_and_set() {
        let mut map = map();
        map.set("Gain", &FeatureValue::Float(1.5)).unwrap();
        assert_eq!(map.get("Gain").unwrap(), FeatureValue::Float(1.5));
        assert_eq!(
            map.get("GainSelector").unwrap(),
            FeatureValue::Enumeration(0)
        );
        assert!(map.get("Root").is_err());
        map.set_enum_by_name("GainSelector", "DigitalAll").unwrap();
        assert_eq!(map.current_enum_name("GainSelector").unwrap(), "DigitalAll");
    }

    #[test]
    fn invalid_selector_type() {
        let mut map = map();
        assert!(matches!(
            map.set_selector("Gain", 1),
            Err(Error::InvalidSelector(_))
        ));
    }

    #[test]
    fn software_trigger_is_queued() {
        let mut map = map();
        assert!(!map.take_trigger());
        map.execute("TriggerSoftware").unwrap();
        assert!(map.take_trigger());
        assert!(!map.take_trigger());
    }
}
