use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::ControlType;

/// Value shape a property carries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PropertyKind {
    Text,
    Int,
    Bool,
    ControlType,
    IntArray,
}

/// Element properties the engine knows how to read and compare.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum PropertyId {
    AcceleratorKey,
    AccessKey,
    AutomationId,
    ClassName,
    ControlType,
    FrameworkId,
    HasKeyboardFocus,
    HelpText,
    IsContentElement,
    IsControlElement,
    IsEnabled,
    IsKeyboardFocusable,
    IsOffscreen,
    IsPassword,
    ItemStatus,
    ItemType,
    LocalizedControlType,
    Name,
    NativeWindowHandle,
    ProcessId,
    RuntimeId,
    Value,
}

static BY_NAME: Lazy<HashMap<String, PropertyId>> = Lazy::new(|| {
    PropertyId::ALL
        .iter()
        .map(|id| (id.name().to_ascii_lowercase(), *id))
        .collect()
});

impl PropertyId {
    pub const ALL: [PropertyId; 22] = [
        PropertyId::AcceleratorKey,
        PropertyId::AccessKey,
        PropertyId::AutomationId,
        PropertyId::ClassName,
        PropertyId::ControlType,
        PropertyId::FrameworkId,
        PropertyId::HasKeyboardFocus,
        PropertyId::HelpText,
        PropertyId::IsContentElement,
        PropertyId::IsControlElement,
        PropertyId::IsEnabled,
        PropertyId::IsKeyboardFocusable,
        PropertyId::IsOffscreen,
        PropertyId::IsPassword,
        PropertyId::ItemStatus,
        PropertyId::ItemType,
        PropertyId::LocalizedControlType,
        PropertyId::Name,
        PropertyId::NativeWindowHandle,
        PropertyId::ProcessId,
        PropertyId::RuntimeId,
        PropertyId::Value,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PropertyId::AcceleratorKey => "AcceleratorKey",
            PropertyId::AccessKey => "AccessKey",
            PropertyId::AutomationId => "AutomationId",
            PropertyId::ClassName => "ClassName",
            PropertyId::ControlType => "ControlType",
            PropertyId::FrameworkId => "FrameworkId",
            PropertyId::HasKeyboardFocus => "HasKeyboardFocus",
            PropertyId::HelpText => "HelpText",
            PropertyId::IsContentElement => "IsContentElement",
            PropertyId::IsControlElement => "IsControlElement",
            PropertyId::IsEnabled => "IsEnabled",
            PropertyId::IsKeyboardFocusable => "IsKeyboardFocusable",
            PropertyId::IsOffscreen => "IsOffscreen",
            PropertyId::IsPassword => "IsPassword",
            PropertyId::ItemStatus => "ItemStatus",
            PropertyId::ItemType => "ItemType",
            PropertyId::LocalizedControlType => "LocalizedControlType",
            PropertyId::Name => "Name",
            PropertyId::NativeWindowHandle => "NativeWindowHandle",
            PropertyId::ProcessId => "ProcessId",
            PropertyId::RuntimeId => "RuntimeId",
            PropertyId::Value => "Value",
        }
    }

    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyId::ControlType => PropertyKind::ControlType,
            PropertyId::RuntimeId => PropertyKind::IntArray,
            PropertyId::NativeWindowHandle | PropertyId::ProcessId => PropertyKind::Int,
            PropertyId::HasKeyboardFocus
            | PropertyId::IsContentElement
            | PropertyId::IsControlElement
            | PropertyId::IsEnabled
            | PropertyId::IsKeyboardFocusable
            | PropertyId::IsOffscreen
            | PropertyId::IsPassword => PropertyKind::Bool,
            _ => PropertyKind::Text,
        }
    }

    /// Resolve a property name through the static registry (ASCII case-insensitive).
    pub fn lookup(name: &str) -> Option<PropertyId> {
        BY_NAME.get(&name.to_ascii_lowercase()).copied()
    }

    /// Parse textual input into a value of this property's kind.
    pub fn parse_value(&self, raw: &str) -> Result<PropertyValue, ParseValueError> {
        PropertyValue::parse(self.kind(), raw).map_err(|reason| ParseValueError {
            property: self.name(),
            raw: raw.to_string(),
            reason,
        })
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid value '{raw}' for property {property}: {reason}")]
pub struct ParseValueError {
    pub property: &'static str,
    pub raw: String,
    pub reason: String,
}

/// Typed property value as read from the provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyValue {
    Text(String),
    Int(i64),
    Bool(bool),
    ControlType(ControlType),
    IntArray(Vec<i32>),
}

impl PropertyValue {
    pub fn text(value: impl Into<String>) -> Self {
        PropertyValue::Text(value.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_control_type(&self) -> Option<ControlType> {
        match self {
            PropertyValue::ControlType(value) => Some(*value),
            _ => None,
        }
    }

    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Text(_) => PropertyKind::Text,
            PropertyValue::Int(_) => PropertyKind::Int,
            PropertyValue::Bool(_) => PropertyKind::Bool,
            PropertyValue::ControlType(_) => PropertyKind::ControlType,
            PropertyValue::IntArray(_) => PropertyKind::IntArray,
        }
    }

    pub fn parse(kind: PropertyKind, raw: &str) -> Result<PropertyValue, String> {
        match kind {
            PropertyKind::Text => Ok(PropertyValue::Text(raw.to_string())),
            PropertyKind::Int => {
                let trimmed = raw.trim();
                let parsed = match trimmed
                    .strip_prefix("0x")
                    .or_else(|| trimmed.strip_prefix("0X"))
                {
                    Some(hex) => i64::from_str_radix(hex, 16),
                    None => trimmed.parse::<i64>(),
                };
                parsed
                    .map(PropertyValue::Int)
                    .map_err(|err| err.to_string())
            }
            PropertyKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(PropertyValue::Bool(true)),
                "false" | "0" => Ok(PropertyValue::Bool(false)),
                other => Err(format!("expected true or false, got '{other}'")),
            },
            PropertyKind::ControlType => ControlType::lookup(raw.trim())
                .map(PropertyValue::ControlType)
                .ok_or_else(|| format!("unknown control type '{}'", raw.trim())),
            PropertyKind::IntArray => raw
                .split(|c: char| c == '.' || c == ',')
                .map(|part| part.trim())
                .filter(|part| !part.is_empty())
                .map(|part| part.parse::<i32>().map_err(|err| err.to_string()))
                .collect::<Result<Vec<_>, _>>()
                .map(PropertyValue::IntArray),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(value) => f.write_str(value),
            PropertyValue::Int(value) => write!(f, "{value}"),
            PropertyValue::Bool(value) => write!(f, "{value}"),
            PropertyValue::ControlType(value) => f.write_str(value.name()),
            PropertyValue::IntArray(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                f.write_str(&parts.join("."))
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<ControlType> for PropertyValue {
    fn from(value: ControlType) -> Self {
        PropertyValue::ControlType(value)
    }
}
