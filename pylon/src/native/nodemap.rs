// SPDX-FileCopyrightText: 2025 Contributors to the gst-plugin-pylon project.
// SPDX-License-Identifier: Apache-2.0

//! Node map of a device served by the pylon runtime.

use std::ffi::CString;

use pylon_sys::{NODE_HANDLE, NODEMAP_HANDLE};

use crate::{
    AccessMode, EnumEntry, Error, FloatRange, IntegerRange, NodeInfo, NodeKind, NodeMap,
    PylonApiHandle, Result, api::read_string,
};

pub(crate) struct NativeNodeMap {
    api: PylonApiHandle,
    handle: NODEMAP_HANDLE,
}

// The node map handle is owned by the device, which is only ever used behind
// the camera lock.
unsafe impl Send for NativeNodeMap {}

impl NativeNodeMap {
    pub(crate) fn new(api: PylonApiHandle, handle: NODEMAP_HANDLE) -> Self {
        Self { api, handle }
    }

    fn node(&self, name: &str) -> Result<NODE_HANDLE> {
        let c_name = CString::new(name)?;
        let mut node: NODE_HANDLE = std::ptr::null_mut();
        self.api.check(unsafe {
            self.api
                .node_map_get_node(self.handle, c_name.as_ptr(), &mut node)
        })?;
        if node.is_null() {
            return Err(Error::NotFound(name.to_string()));
        }
        Ok(node)
    }

    fn typed(&self, name: &str, kind: NodeKind) -> Result<NODE_HANDLE> {
        let node = self.node(name)?;
        if self.kind(node)? != kind {
            return Err(Error::InvalidType {
                feature: name.to_string(),
                expected: kind.as_str(),
            });
        }
        Ok(node)
    }

    fn readable(&self, name: &str, kind: NodeKind) -> Result<NODE_HANDLE> {
        let node = self.typed(name, kind)?;
        let mut readable = false;
        self.api
            .check(unsafe { self.api.node_is_readable(node, &mut readable) })?;
        if !readable {
            return Err(Error::NotReadable(name.to_string()));
        }
        Ok(node)
    }

    fn writable(&self, name: &str, kind: NodeKind) -> Result<NODE_HANDLE> {
        let node = self.typed(name, kind)?;
        let mut writable = false;
        self.api
            .check(unsafe { self.api.node_is_writable(node, &mut writable) })?;
        if !writable {
            return Err(Error::NotWritable(name.to_string()));
        }
        Ok(node)
    }

    fn kind(&self, node: NODE_HANDLE) -> Result<NodeKind> {
        let mut node_type = pylon_sys::_UndefinedNodeType;
        self.api
            .check(unsafe { self.api.node_get_type(node, &mut node_type) })?;
        Ok(NodeKind::from_sys(node_type))
    }

    fn string_of(
        &self,
        node: NODE_HANDLE,
        getter: unsafe fn(
            &pylon_sys::LibPylonC,
            NODE_HANDLE,
            *mut std::os::raw::c_char,
            *mut usize,
        ) -> pylon_sys::GENAPIC_RESULT,
    ) -> Result<String> {
        read_string(|buf, len| unsafe { getter(&**self.api, node, buf, len) })
            .map_err(|status| self.status_error(status))
    }

    fn status_error(&self, status: pylon_sys::GENAPIC_RESULT) -> Error {
        match self.api.check(status) {
            Err(err) => err,
            Ok(()) => Error::Unknown(status),
        }
    }

    fn related(
        &self,
        node: NODE_HANDLE,
        count: unsafe fn(&pylon_sys::LibPylonC, NODE_HANDLE, *mut usize) -> pylon_sys::GENAPIC_RESULT,
        by_index: unsafe fn(
            &pylon_sys::LibPylonC,
            NODE_HANDLE,
            usize,
            *mut NODE_HANDLE,
        ) -> pylon_sys::GENAPIC_RESULT,
    ) -> Result<Vec<String>> {
        let mut num = 0usize;
        self.api.check(unsafe { count(&**self.api, node, &mut num) })?;
        let mut names = Vec::with_capacity(num);
        for i in 0..num {
            let mut other: NODE_HANDLE = std::ptr::null_mut();
            self.api
                .check(unsafe { by_index(&**self.api, node, i, &mut other) })?;
            names.push(self.string_of(other, pylon_sys::LibPylonC::node_get_name)?);
        }
        Ok(names)
    }

    fn entries(&self, name: &str) -> Result<Vec<EnumEntry>> {
        let node = self.typed(name, NodeKind::Enumeration)?;
        let mut num = 0usize;
        self.api
            .check(unsafe { self.api.enumeration_get_num_entries(node, &mut num) })?;
        let mut entries = Vec::with_capacity(num);
        for i in 0..num {
            let mut entry: NODE_HANDLE = std::ptr::null_mut();
            self.api
                .check(unsafe { self.api.enumeration_get_entry_by_index(node, i, &mut entry) })?;
            let mut available = false;
            self.api
                .check(unsafe { self.api.node_is_available(entry, &mut available) })?;
            if !available {
                continue;
            }
            let mut value = 0i64;
            self.api
                .check(unsafe { self.api.enumeration_entry_get_value(entry, &mut value) })?;
            let symbolic =
                self.string_of(entry, pylon_sys::LibPylonC::enumeration_entry_get_symbolic)?;
            entries.push(EnumEntry::new(symbolic, value));
        }
        Ok(entries)
    }

    fn out_of_range(name: &str, value: impl ToString) -> Error {
        Error::OutOfRange {
            feature: name.to_string(),
            value: value.to_string(),
        }
    }
}

impl NodeMap for NativeNodeMap {
    fn feature_names(&self) -> Result<Vec<String>> {
        let mut num = 0usize;
        self.api
            .check(unsafe { self.api.node_map_get_num_nodes(self.handle, &mut num) })?;
        let mut names = Vec::with_capacity(num);
        for i in 0..num {
            let mut node: NODE_HANDLE = std::ptr::null_mut();
            self.api
                .check(unsafe { self.api.node_map_get_node_by_index(self.handle, i, &mut node) })?;
            if self.kind(node)? == NodeKind::Other {
                continue;
            }
            names.push(self.string_of(node, pylon_sys::LibPylonC::node_get_name)?);
        }
        Ok(names)
    }

    fn node_info(&self, name: &str) -> Result<NodeInfo> {
        let node = self.node(name)?;
        let mut access = pylon_sys::_UndefinedAccesMode;
        self.api
            .check(unsafe { self.api.node_get_access_mode(node, &mut access) })?;
        Ok(NodeInfo {
            name: name.to_string(),
            kind: self.kind(node)?,
            display_name: self.string_of(node, pylon_sys::LibPylonC::node_get_display_name)?,
            tooltip: self.string_of(node, pylon_sys::LibPylonC::node_get_tool_tip)?,
            access: AccessMode::from_sys(access),
            selectors: self.related(
                node,
                pylon_sys::LibPylonC::node_get_num_selecting_features,
                pylon_sys::LibPylonC::node_get_selecting_feature_by_index,
            )?,
            selected: self.related(
                node,
                pylon_sys::LibPylonC::node_get_num_selected_features,
                pylon_sys::LibPylonC::node_get_selected_feature_by_index,
            )?,
        })
    }

    fn integer(&self, name: &str) -> Result<i64> {
        let node = self.readable(name, NodeKind::Integer)?;
        let mut value = 0i64;
        self.api
            .check(unsafe { self.api.integer_get_value(node, &mut value) })?;
        Ok(value)
    }

    fn set_integer(&mut self, name: &str, value: i64) -> Result<()> {
        let node = self.writable(name, NodeKind::Integer)?;
        if !self.integer_range(name)?.contains(value) {
            return Err(Self::out_of_range(name, value));
        }
        self.api
            .check(unsafe { self.api.integer_set_value(node, value) })
    }

    fn integer_range(&self, name: &str) -> Result<IntegerRange> {
        let node = self.typed(name, NodeKind::Integer)?;
        let (mut min, mut max, mut inc) = (0i64, 0i64, 1i64);
        unsafe {
            self.api.check(self.api.integer_get_min(node, &mut min))?;
            self.api.check(self.api.integer_get_max(node, &mut max))?;
            self.api.check(self.api.integer_get_inc(node, &mut inc))?;
        }
        Ok(IntegerRange { min, max, inc })
    }

    fn float(&self, name: &str) -> Result<f64> {
        let node = self.readable(name, NodeKind::Float)?;
        let mut value = 0f64;
        self.api
            .check(unsafe { self.api.float_get_value(node, &mut value) })?;
        Ok(value)
    }

    fn set_float(&mut self, name: &str, value: f64) -> Result<()> {
        let node = self.writable(name, NodeKind::Float)?;
        if !self.float_range(name)?.contains(value) {
            return Err(Self::out_of_range(name, value));
        }
        self.api
            .check(unsafe { self.api.float_set_value(node, value) })
    }

    fn float_range(&self, name: &str) -> Result<FloatRange> {
        let node = self.typed(name, NodeKind::Float)?;
        let (mut min, mut max) = (0f64, 0f64);
        unsafe {
            self.api.check(self.api.float_get_min(node, &mut min))?;
            self.api.check(self.api.float_get_max(node, &mut max))?;
        }
        Ok(FloatRange { min, max })
    }

    fn boolean(&self, name: &str) -> Result<bool> {
        let node = self.readable(name, NodeKind::Boolean)?;
        let mut value = false;
        self.api
            .check(unsafe { self.api.boolean_get_value(node, &mut value) })?;
        Ok(value)
    }

    fn set_boolean(&mut self, name: &str, value: bool) -> Result<()> {
        let node = self.writable(name, NodeKind::Boolean)?;
        self.api
            .check(unsafe { self.api.boolean_set_value(node, value) })
    }

    fn string(&self, name: &str) -> Result<String> {
        let node = self.readable(name, NodeKind::String)?;
        self.string_of(node, pylon_sys::LibPylonC::node_to_string)
    }

    fn set_string(&mut self, name: &str, value: &str) -> Result<()> {
        let node = self.writable(name, NodeKind::String)?;
        let c_value = CString::new(value)?;
        self.api
            .check(unsafe { self.api.node_from_string(node, c_value.as_ptr()) })
    }

    fn enum_entries(&self, name: &str) -> Result<Vec<EnumEntry>> {
        self.entries(name)
    }

    fn enum_value(&self, name: &str) -> Result<i64> {
        let node = self.readable(name, NodeKind::Enumeration)?;
        let symbolic = self.string_of(node, pylon_sys::LibPylonC::node_to_string)?;
        self.entries(name)?
            .into_iter()
            .find(|e| e.name == symbolic)
            .map(|e| e.value)
            .ok_or_else(|| Self::out_of_range(name, symbolic))
    }

    fn set_enum_value(&mut self, name: &str, value: i64) -> Result<()> {
        let node = self.writable(name, NodeKind::Enumeration)?;
        let entry = self
            .entries(name)?
            .into_iter()
            .find(|e| e.value == value)
            .ok_or_else(|| Self::out_of_range(name, value))?;
        let c_value = CString::new(entry.name)?;
        self.api
            .check(unsafe { self.api.node_from_string(node, c_value.as_ptr()) })
    }

    fn execute(&mut self, name: &str) -> Result<()> {
        let node = self.writable(name, NodeKind::Command)?;
        self.api.check(unsafe { self.api.command_execute(node) })
    }
}
