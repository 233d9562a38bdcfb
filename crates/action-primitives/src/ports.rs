//! Collaborator interfaces required from the host environment.
//!
//! The engine calls these but implements none of them. Every call is
//! fallible; failures are transient from the engine's point of view.

use std::fmt;

use uiquery_core_types::{
    IdentityKey, PropertyId, PropertyValue, ProviderError, RuntimeId, WindowHandle,
};

/// How far OS window enumeration descends below the parent window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowDepth {
    Immediate,
    Recursive,
}

/// First-child / next-sibling navigation over the live tree.
pub trait TreeWalker: Send + Sync {
    /// Opaque handle to a provider element.
    type Node: Clone + fmt::Debug + Send + Sync;

    fn first_child(&self, node: &Self::Node) -> Result<Option<Self::Node>, ProviderError>;

    fn next_sibling(&self, node: &Self::Node) -> Result<Option<Self::Node>, ProviderError>;
}

/// Property reads on a node.
pub trait PropertySource: TreeWalker {
    fn property(
        &self,
        node: &Self::Node,
        property: PropertyId,
    ) -> Result<Option<PropertyValue>, ProviderError>;

    fn runtime_id(&self, node: &Self::Node) -> Result<Option<RuntimeId>, ProviderError> {
        Ok(match self.property(node, PropertyId::RuntimeId)? {
            Some(PropertyValue::IntArray(parts)) if !parts.is_empty() => Some(RuntimeId(parts)),
            _ => None,
        })
    }

    fn automation_id(&self, node: &Self::Node) -> Result<Option<String>, ProviderError> {
        Ok(self
            .property(node, PropertyId::AutomationId)?
            .and_then(|value| value.as_str().map(str::to_string)))
    }

    /// Identity used for de-duplication: runtime id, else non-empty automation id.
    fn identity(&self, node: &Self::Node) -> Result<Option<IdentityKey>, ProviderError> {
        let runtime = self.runtime_id(node)?;
        if runtime.is_some() {
            return Ok(IdentityKey::from_parts(runtime, None));
        }
        let automation = self.automation_id(node)?;
        Ok(IdentityKey::from_parts(None, automation.as_deref()))
    }
}

/// Window-handle resolution and OS window enumeration.
pub trait WindowSource: TreeWalker {
    fn native_window_handle(
        &self,
        node: &Self::Node,
    ) -> Result<Option<WindowHandle>, ProviderError>;

    /// Enumerate child windows of `parent`. A `None` parent enumerates every
    /// window in the system.
    fn child_windows(
        &self,
        parent: Option<WindowHandle>,
        depth: WindowDepth,
    ) -> Result<Vec<WindowHandle>, ProviderError>;

    fn element_from_handle(
        &self,
        handle: WindowHandle,
    ) -> Result<Option<Self::Node>, ProviderError>;
}

/// Top-level window enumeration.
pub trait DesktopSource: TreeWalker {
    /// Top-level windows in OS enumeration order.
    fn top_level_windows(&self) -> Result<Vec<Self::Node>, ProviderError>;
}

/// Everything the query engine needs from a host provider.
pub trait AutomationProvider: PropertySource + WindowSource + DesktopSource {}

impl<T> AutomationProvider for T where T: PropertySource + WindowSource + DesktopSource {}
