//! Shared vocabulary for the element query engine.
//!
//! Identity types, the static property and control-type registries, typed
//! property values and the fault type every provider port returns.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

mod control_type;
mod property;

pub use control_type::ControlType;
pub use property::{ParseValueError, PropertyId, PropertyKind, PropertyValue};

/// Fault raised by an accessibility provider while reading the live tree.
///
/// All variants are treated as transient by the retry layer: the tree may be
/// mutated by the target application between any two calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider call failed: {0}")]
    Transient(String),
    #[error("element no longer available: {0}")]
    ElementUnavailable(String),
}

impl ProviderError {
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::ElementUnavailable(msg.into())
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider-assigned identity of a live element.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RuntimeId(pub Vec<i32>);

impl fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|part| part.to_string()).collect();
        f.write_str(&parts.join("."))
    }
}

/// Native OS window handle.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Key used to decide whether two discovered elements are the same node.
///
/// The runtime id wins; a non-empty automation id is the fallback. Elements
/// carrying neither are never considered duplicates of anything.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum IdentityKey {
    Runtime(RuntimeId),
    Automation(String),
}

impl IdentityKey {
    pub fn from_parts(runtime_id: Option<RuntimeId>, automation_id: Option<&str>) -> Option<Self> {
        if let Some(id) = runtime_id {
            if !id.0.is_empty() {
                return Some(IdentityKey::Runtime(id));
            }
        }
        match automation_id {
            Some(id) if !id.is_empty() => Some(IdentityKey::Automation(id.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Runtime(id) => write!(f, "runtime:{id}"),
            IdentityKey::Automation(id) => write!(f, "automation:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_prefers_runtime_id() {
        let key = IdentityKey::from_parts(Some(RuntimeId(vec![42, 7])), Some("okButton"));
        assert_eq!(key, Some(IdentityKey::Runtime(RuntimeId(vec![42, 7]))));
    }

    #[test]
    fn identity_falls_back_to_automation_id() {
        let key = IdentityKey::from_parts(None, Some("okButton"));
        assert_eq!(key, Some(IdentityKey::Automation("okButton".into())));

        let empty_runtime = IdentityKey::from_parts(Some(RuntimeId(Vec::new())), Some("x"));
        assert_eq!(empty_runtime, Some(IdentityKey::Automation("x".into())));
    }

    #[test]
    fn identity_absent_without_ids() {
        assert_eq!(IdentityKey::from_parts(None, Some("")), None);
        assert_eq!(IdentityKey::from_parts(None, None), None);
    }

    #[test]
    fn runtime_id_display_joins_parts() {
        assert_eq!(RuntimeId(vec![42, 1, 3]).to_string(), "42.1.3");
        assert_eq!(WindowHandle(255).to_string(), "0xff");
    }
}
