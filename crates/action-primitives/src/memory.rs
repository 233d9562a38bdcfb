//! In-memory snapshot tree implementing every provider port.
//!
//! Nodes listed under `children` are visible to the tree walker; nodes under
//! `hidden_children` are only reachable through OS window enumeration. The
//! document root plays the desktop, and its walk-visible children are the
//! top-level windows.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uiquery_core_types::{
    ControlType, ParseValueError, PropertyId, PropertyValue, ProviderError, RuntimeId,
    WindowHandle,
};

use crate::ports::{DesktopSource, PropertySource, TreeWalker, WindowDepth, WindowSource};

/// Base of runtime ids assigned to nodes that do not declare one.
const SYNTHETIC_RUNTIME_BASE: i32 = 42;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("unknown property '{0}' in snapshot")]
    UnknownProperty(String),

    #[error(transparent)]
    InvalidValue(#[from] ParseValueError),

    #[error("hidden node '{0}' must declare a window_handle")]
    HiddenWithoutWindow(String),

    #[error("node {0} does not exist")]
    MissingNode(usize),

    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Declarative description of a node and its subtree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSpec {
    pub control_type: Option<ControlType>,
    pub name: Option<String>,
    pub automation_id: Option<String>,
    pub class_name: Option<String>,
    pub runtime_id: Option<RuntimeId>,
    pub window_handle: Option<WindowHandle>,
    /// Any other registered property, by name, in textual form
    pub properties: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hidden_children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(control_type: ControlType) -> Self {
        Self {
            control_type: Some(control_type),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_automation_id(mut self, id: impl Into<String>) -> Self {
        self.automation_id = Some(id.into());
        self
    }

    pub fn with_window(mut self, handle: u64) -> Self {
        self.window_handle = Some(WindowHandle(handle));
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn hidden_child(mut self, child: NodeSpec) -> Self {
        self.hidden_children.push(child);
        self
    }

    fn label(&self) -> String {
        self.automation_id
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| "<unnamed>".to_string())
    }
}

/// Handle to a node inside a [`MemoryTree`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct MemNodeId(pub usize);

#[derive(Debug)]
struct MemNode {
    props: HashMap<PropertyId, PropertyValue>,
    parent: Option<MemNodeId>,
    children: Vec<MemNodeId>,
    hidden_children: Vec<MemNodeId>,
    window: Option<WindowHandle>,
    removed: bool,
}

#[derive(Debug, Default)]
struct Arena {
    nodes: Vec<MemNode>,
}

impl Arena {
    fn get(&self, id: MemNodeId) -> Result<&MemNode, ProviderError> {
        match self.nodes.get(id.0) {
            Some(node) if !node.removed => Ok(node),
            _ => Err(ProviderError::unavailable(format!("node {}", id.0))),
        }
    }

    fn live(&self, ids: &[MemNodeId]) -> Vec<MemNodeId> {
        ids.iter()
            .copied()
            .filter(|id| self.nodes.get(id.0).map_or(false, |n| !n.removed))
            .collect()
    }

    /// Insert a whole subtree, or nothing at all.
    fn insert_subtree(
        &mut self,
        spec: &NodeSpec,
        parent: Option<MemNodeId>,
        hidden: bool,
    ) -> Result<MemNodeId, SnapshotError> {
        let mark = self.nodes.len();
        let inserted = self.insert(spec, parent, hidden);
        if inserted.is_err() {
            self.nodes.truncate(mark);
        }
        inserted
    }

    fn insert(
        &mut self,
        spec: &NodeSpec,
        parent: Option<MemNodeId>,
        hidden: bool,
    ) -> Result<MemNodeId, SnapshotError> {
        if hidden && spec.window_handle.is_none() {
            return Err(SnapshotError::HiddenWithoutWindow(spec.label()));
        }

        let id = MemNodeId(self.nodes.len());
        let mut props = HashMap::new();
        for (name, raw) in &spec.properties {
            let property = PropertyId::lookup(name)
                .ok_or_else(|| SnapshotError::UnknownProperty(name.clone()))?;
            props.insert(property, property.parse_value(raw)?);
        }
        if let Some(ty) = spec.control_type {
            props.insert(PropertyId::ControlType, PropertyValue::ControlType(ty));
        }
        if let Some(name) = &spec.name {
            props.insert(PropertyId::Name, PropertyValue::text(name.clone()));
        }
        if let Some(automation_id) = &spec.automation_id {
            props.insert(
                PropertyId::AutomationId,
                PropertyValue::text(automation_id.clone()),
            );
        }
        if let Some(class_name) = &spec.class_name {
            props.insert(PropertyId::ClassName, PropertyValue::text(class_name.clone()));
        }
        let runtime = spec
            .runtime_id
            .clone()
            .unwrap_or_else(|| RuntimeId(vec![SYNTHETIC_RUNTIME_BASE, id.0 as i32]));
        props.insert(PropertyId::RuntimeId, PropertyValue::IntArray(runtime.0));
        if let Some(handle) = spec.window_handle {
            props.insert(
                PropertyId::NativeWindowHandle,
                PropertyValue::Int(handle.0 as i64),
            );
        }

        self.nodes.push(MemNode {
            props,
            parent,
            children: Vec::new(),
            hidden_children: Vec::new(),
            window: spec.window_handle,
            removed: false,
        });

        for child in &spec.children {
            let child_id = self.insert(child, Some(id), false)?;
            self.nodes[id.0].children.push(child_id);
        }
        for child in &spec.hidden_children {
            let child_id = self.insert(child, Some(id), true)?;
            self.nodes[id.0].hidden_children.push(child_id);
        }

        Ok(id)
    }

    /// Window-carrying nodes below `start`, in pre-order.
    fn windows_below(&self, start: MemNodeId, depth: WindowDepth, out: &mut Vec<WindowHandle>) {
        let Ok(node) = self.get(start) else {
            return;
        };
        let mut branches = self.live(&node.children);
        branches.extend(self.live(&node.hidden_children));
        for child in branches {
            let Ok(child_node) = self.get(child) else {
                continue;
            };
            match child_node.window {
                Some(handle) => {
                    out.push(handle);
                    if depth == WindowDepth::Recursive {
                        self.windows_below(child, depth, out);
                    }
                }
                None => self.windows_below(child, depth, out),
            }
        }
    }
}

/// Mutable snapshot tree shared between a test driver and the engine.
#[derive(Debug)]
pub struct MemoryTree {
    arena: RwLock<Arena>,
    root: MemNodeId,
    pending_failures: AtomicUsize,
    calls: AtomicUsize,
}

impl MemoryTree {
    pub fn from_spec(spec: &NodeSpec) -> Result<Self, SnapshotError> {
        let mut arena = Arena::default();
        let root = arena.insert_subtree(spec, None, false)?;
        Ok(Self {
            arena: RwLock::new(arena),
            root,
            pending_failures: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    /// Parse a YAML (or JSON) snapshot document.
    pub fn from_yaml(source: &str) -> Result<Self, SnapshotError> {
        let spec: NodeSpec = serde_yaml::from_str(source)?;
        Self::from_spec(&spec)
    }

    pub fn root(&self) -> MemNodeId {
        self.root
    }

    /// Append a walk-visible child subtree; returns its top node. A subtree
    /// that fails validation leaves the tree untouched.
    pub fn insert_child(
        &self,
        parent: MemNodeId,
        spec: &NodeSpec,
    ) -> Result<MemNodeId, SnapshotError> {
        let mut arena = self.arena.write();
        if arena.get(parent).is_err() {
            return Err(SnapshotError::MissingNode(parent.0));
        }
        let id = arena.insert_subtree(spec, Some(parent), false)?;
        arena.nodes[parent.0].children.push(id);
        debug!(parent = parent.0, node = id.0, "snapshot node attached");
        Ok(id)
    }

    /// Detach a node and its subtree. Later reads of it fail as unavailable.
    pub fn remove(&self, id: MemNodeId) -> Result<(), SnapshotError> {
        let mut arena = self.arena.write();
        if arena.get(id).is_err() {
            return Err(SnapshotError::MissingNode(id.0));
        }
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let node = &mut arena.nodes[current.0];
            node.removed = true;
            pending.extend(node.children.iter().copied());
            pending.extend(node.hidden_children.iter().copied());
        }
        Ok(())
    }

    pub fn set_property(
        &self,
        id: MemNodeId,
        property: PropertyId,
        value: PropertyValue,
    ) -> Result<(), SnapshotError> {
        let mut arena = self.arena.write();
        match arena.nodes.get_mut(id.0) {
            Some(node) if !node.removed => {
                node.props.insert(property, value);
                Ok(())
            }
            _ => Err(SnapshotError::MissingNode(id.0)),
        }
    }

    /// First live node carrying `automation_id`, in arena order.
    pub fn find_by_automation_id(&self, automation_id: &str) -> Option<MemNodeId> {
        let arena = self.arena.read();
        arena
            .nodes
            .iter()
            .enumerate()
            .find(|(_, node)| {
                !node.removed
                    && node.props.get(&PropertyId::AutomationId)
                        == Some(&PropertyValue::text(automation_id))
            })
            .map(|(index, _)| MemNodeId(index))
    }

    /// Walk-visible children of a node.
    pub fn children_of(&self, id: MemNodeId) -> Vec<MemNodeId> {
        let arena = self.arena.read();
        match arena.get(id) {
            Ok(node) => arena.live(&node.children),
            Err(_) => Vec::new(),
        }
    }

    /// Make the next `count` port calls fail with a transient fault.
    pub fn fail_next_calls(&self, count: usize) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Number of port calls served so far, failed ones included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self, op: &str) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(ProviderError::transient(format!("injected fault in {op}")));
        }
        Ok(())
    }
}

impl TreeWalker for MemoryTree {
    type Node = MemNodeId;

    fn first_child(&self, node: &MemNodeId) -> Result<Option<MemNodeId>, ProviderError> {
        self.enter("first_child")?;
        let arena = self.arena.read();
        let current = arena.get(*node)?;
        Ok(arena.live(&current.children).first().copied())
    }

    fn next_sibling(&self, node: &MemNodeId) -> Result<Option<MemNodeId>, ProviderError> {
        self.enter("next_sibling")?;
        let arena = self.arena.read();
        let current = arena.get(*node)?;
        let Some(parent) = current.parent else {
            return Ok(None);
        };
        let siblings = arena.live(&arena.get(parent)?.children);
        Ok(siblings
            .iter()
            .position(|id| id == node)
            .and_then(|index| siblings.get(index + 1).copied()))
    }
}

impl PropertySource for MemoryTree {
    fn property(
        &self,
        node: &MemNodeId,
        property: PropertyId,
    ) -> Result<Option<PropertyValue>, ProviderError> {
        self.enter("property")?;
        let arena = self.arena.read();
        Ok(arena.get(*node)?.props.get(&property).cloned())
    }
}

impl WindowSource for MemoryTree {
    fn native_window_handle(
        &self,
        node: &MemNodeId,
    ) -> Result<Option<WindowHandle>, ProviderError> {
        self.enter("native_window_handle")?;
        let arena = self.arena.read();
        Ok(arena.get(*node)?.window)
    }

    fn child_windows(
        &self,
        parent: Option<WindowHandle>,
        depth: WindowDepth,
    ) -> Result<Vec<WindowHandle>, ProviderError> {
        self.enter("child_windows")?;
        let arena = self.arena.read();
        let start = match parent {
            Some(handle) => {
                let found = arena
                    .nodes
                    .iter()
                    .position(|node| !node.removed && node.window == Some(handle));
                match found {
                    Some(index) => MemNodeId(index),
                    None => return Ok(Vec::new()),
                }
            }
            None => self.root,
        };
        let mut out = Vec::new();
        arena.windows_below(start, depth, &mut out);
        Ok(out)
    }

    fn element_from_handle(
        &self,
        handle: WindowHandle,
    ) -> Result<Option<MemNodeId>, ProviderError> {
        self.enter("element_from_handle")?;
        let arena = self.arena.read();
        Ok(arena
            .nodes
            .iter()
            .position(|node| !node.removed && node.window == Some(handle))
            .map(MemNodeId))
    }
}

impl DesktopSource for MemoryTree {
    fn top_level_windows(&self) -> Result<Vec<MemNodeId>, ProviderError> {
        self.enter("top_level_windows")?;
        let arena = self.arena.read();
        let root = arena.get(self.root)?;
        Ok(arena.live(&root.children))
    }
}
