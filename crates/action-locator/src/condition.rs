//! Condition model: predicates over an element's properties

use std::fmt;

use action_primitives::PropertySource;
use regex::{Regex, RegexBuilder};
use tracing::debug;
use uiquery_core_types::{ControlType, PropertyId, PropertyValue, ProviderError};

use crate::errors::LocatorError;

/// Compiled `/pattern/flags` value.
///
/// Recognised flags: `i` (case-insensitive), `m` (multi-line anchors) and
/// `s` (dot matches newline). Matching is unanchored, like a search.
#[derive(Clone, Debug)]
pub struct ValuePattern {
    pattern: String,
    flags: String,
    regex: Regex,
}

impl ValuePattern {
    /// Parse `/pattern/flags`. `None` means "not a pattern": the caller falls
    /// back to literal equality.
    pub fn parse(text: &str) -> Option<ValuePattern> {
        let body = text.strip_prefix('/')?;
        let end = body.rfind('/')?;
        let (pattern, flags) = (&body[..end], &body[end + 1..]);

        let mut builder = RegexBuilder::new(pattern);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                other => {
                    debug!(value = text, flag = %other, "unrecognised pattern flag; using literal value");
                    return None;
                }
            };
        }

        match builder.build() {
            Ok(regex) => Some(ValuePattern {
                pattern: pattern.to_string(),
                flags: flags.to_string(),
                regex,
            }),
            Err(err) => {
                debug!(value = text, error = %err, "pattern does not compile; using literal value");
                None
            }
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }
}

impl PartialEq for ValuePattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.flags == other.flags
    }
}

impl fmt::Display for ValuePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.pattern, self.flags)
    }
}

/// Predicate over a node's properties.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    PropertyEquals {
        property: PropertyId,
        value: PropertyValue,
    },
    PropertyMatches {
        property: PropertyId,
        pattern: ValuePattern,
    },
    And(Vec<Condition>),
    Constant(bool),
}

impl Condition {
    pub fn equals(property: PropertyId, value: impl Into<PropertyValue>) -> Self {
        Condition::PropertyEquals {
            property,
            value: value.into(),
        }
    }

    pub fn matches(property: PropertyId, pattern: ValuePattern) -> Self {
        Condition::PropertyMatches { property, pattern }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Condition::equals(PropertyId::Name, PropertyValue::Text(name.into()))
    }

    pub fn automation_id(id: impl Into<String>) -> Self {
        Condition::equals(PropertyId::AutomationId, PropertyValue::Text(id.into()))
    }

    pub fn control_type(control_type: ControlType) -> Self {
        Condition::equals(PropertyId::ControlType, control_type)
    }

    pub fn always() -> Self {
        Condition::Constant(true)
    }

    /// Conjunction, collapsed: no operand is `true`, a single operand stands alone.
    pub fn all(mut conditions: Vec<Condition>) -> Self {
        match conditions.len() {
            0 => Condition::Constant(true),
            1 => conditions.remove(0),
            _ => Condition::And(conditions),
        }
    }

    /// Build a condition from textual input.
    ///
    /// With `use_regex` set, a `/pattern/flags` value becomes a pattern match;
    /// anything that fails to parse as a pattern is compared literally.
    pub fn from_text(
        property: PropertyId,
        raw: &str,
        use_regex: bool,
    ) -> Result<Condition, LocatorError> {
        if use_regex {
            if let Some(pattern) = ValuePattern::parse(raw) {
                return Ok(Condition::matches(property, pattern));
            }
        }
        Ok(Condition::PropertyEquals {
            property,
            value: property.parse_value(raw)?,
        })
    }

    /// Evaluate against a node. Reads properties only.
    pub fn evaluate<P>(&self, provider: &P, node: &P::Node) -> Result<bool, ProviderError>
    where
        P: PropertySource + ?Sized,
    {
        match self {
            Condition::PropertyEquals { property, value } => {
                Ok(provider.property(node, *property)?.as_ref() == Some(value))
            }
            Condition::PropertyMatches { property, pattern } => {
                Ok(match provider.property(node, *property)? {
                    Some(actual) => pattern.is_match(&actual.to_string()),
                    None => false,
                })
            }
            Condition::And(conditions) => {
                for condition in conditions {
                    if !condition.evaluate(provider, node)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Constant(value) => Ok(*value),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::PropertyEquals { property, value } => write!(f, "{property}='{value}'"),
            Condition::PropertyMatches { property, pattern } => write!(f, "{property}~{pattern}"),
            Condition::And(conditions) => {
                let parts: Vec<String> = conditions.iter().map(|c| c.to_string()).collect();
                write!(f, "({})", parts.join(" and "))
            }
            Condition::Constant(value) => write!(f, "{value}"),
        }
    }
}
