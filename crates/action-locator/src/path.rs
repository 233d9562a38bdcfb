//! Path expression parsing.
//!
//! ```text
//! path      := "."? segment+
//! segment   := ("/" | "//") node-test
//! node-test := type-name? ("[" predicate ("and" predicate)* "]")?
//! predicate := "@" attr "=" "'" value "'"
//! ```

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::warn;
use uiquery_core_types::{ControlType, PropertyId};

use crate::condition::Condition;
use crate::errors::LocatorError;
use crate::types::Scope;

const TYPE_NAME: &str = r"(?:[A-Za-z_][A-Za-z0-9_]*|\*)";
const PREDICATE: &str = r"@[A-Za-z_][A-Za-z0-9_]*\s*=\s*'[^']*'";

static PREDICATES: Lazy<String> =
    Lazy::new(|| format!(r"\[\s*{PREDICATE}(?:\s+and\s+{PREDICATE})*\s*\]"));

static NODE_TEST: Lazy<String> =
    Lazy::new(|| format!(r"(?:{TYPE_NAME}(?:{preds})?|{preds})", preds = &*PREDICATES));

static PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\.?(?:(?://|/){})+$", &*NODE_TEST)).expect("path grammar")
});

static SEGMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(//|/)({})", &*NODE_TEST)).expect("segment grammar")
});

static NODE_TEST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^({TYPE_NAME})?(\[.*\])?$")).expect("node test grammar")
});

static PREDICATE_LIST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^{}$", &*PREDICATES)).expect("predicate list grammar")
});

static PREDICATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@([A-Za-z_][A-Za-z0-9_]*)\s*=\s*'([^']*)'").expect("predicate grammar")
});

/// `@attribute='value'`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Predicate {
    pub attribute: String,
    pub value: String,
}

/// Type name and predicates of one path step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeTest {
    pub raw: String,
    /// `None` when absent or `*`
    pub type_name: Option<String>,
    pub predicates: Vec<Predicate>,
}

impl NodeTest {
    /// Parse a bare node test such as `Button[@Name='OK']`.
    pub fn parse(raw: &str) -> Result<NodeTest, LocatorError> {
        let trimmed = raw.trim();
        let caps = NODE_TEST_RE
            .captures(trimmed)
            .filter(|_| !trimmed.is_empty())
            .ok_or_else(|| LocatorError::invalid_path(raw, "malformed node test"))?;

        let type_name = caps
            .get(1)
            .map(|m| m.as_str())
            .filter(|name| *name != "*")
            .map(str::to_string);

        let predicates = match caps.get(2) {
            Some(block) => {
                let block = block.as_str();
                if !PREDICATE_LIST_RE.is_match(block) {
                    return Err(LocatorError::invalid_path(raw, "malformed predicate list"));
                }
                PREDICATE_RE
                    .captures_iter(block)
                    .map(|p| Predicate {
                        attribute: p[1].to_string(),
                        value: p[2].to_string(),
                    })
                    .collect()
            }
            None => Vec::new(),
        };

        Ok(NodeTest {
            raw: trimmed.to_string(),
            type_name,
            predicates,
        })
    }

    /// Build the condition this node test stands for.
    ///
    /// An unresolvable type name is reported and left out. An unknown
    /// attribute or a value of the wrong shape is a hard error.
    pub fn compile(&self, use_regex: bool) -> Result<Condition, LocatorError> {
        let mut conditions = Vec::with_capacity(self.predicates.len() + 1);

        if let Some(type_name) = &self.type_name {
            match ControlType::lookup(type_name) {
                Some(control_type) => conditions.push(Condition::control_type(control_type)),
                None => warn!(type_name = %type_name, node_test = %self.raw, "unknown control type ignored"),
            }
        }

        for predicate in &self.predicates {
            let property = PropertyId::lookup(&predicate.attribute)
                .ok_or_else(|| LocatorError::UnknownProperty(predicate.attribute.clone()))?;
            conditions.push(Condition::from_text(property, &predicate.value, use_regex)?);
        }

        Ok(Condition::all(conditions))
    }

    /// Node test text describing an element, preferring automation id over name.
    /// Values containing a quote cannot be expressed and are skipped.
    pub fn describe(
        control_type: Option<ControlType>,
        automation_id: Option<&str>,
        name: Option<&str>,
    ) -> String {
        let mut out = control_type.map(|ct| ct.name().to_string()).unwrap_or_else(|| "*".into());
        let usable = |value: &&str| !value.is_empty() && !value.contains('\'');
        if let Some(id) = automation_id.filter(usable) {
            out.push_str(&format!("[@AutomationId='{id}']"));
        } else if let Some(name) = name.filter(usable) {
            out.push_str(&format!("[@Name='{name}']"));
        }
        out
    }
}

impl fmt::Display for NodeTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One step of a path: a scope and the node test applied within it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PathSegment {
    pub scope: Scope,
    pub node_test: NodeTest,
}

impl PathSegment {
    pub fn compile(&self, use_regex: bool) -> Result<CompiledSegment, LocatorError> {
        Ok(CompiledSegment {
            scope: self.scope,
            condition: self.node_test.compile(use_regex)?,
            source: self.to_string(),
        })
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.scope.delimiter().unwrap_or("/"), self.node_test)
    }
}

/// Segment with its node test turned into a condition.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledSegment {
    pub scope: Scope,
    pub condition: Condition,
    pub source: String,
}

/// Parsed path expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PathExpression {
    /// Leading `.`: anchored at the calling element instead of the session root
    pub relative: bool,
    pub segments: Vec<PathSegment>,
}

impl PathExpression {
    /// Validate the whole string, then split it into segments.
    pub fn parse(path: &str) -> Result<PathExpression, LocatorError> {
        let path = path.trim();
        if path.is_empty() {
            return Err(LocatorError::MissingArgument("path"));
        }
        if !PATH_RE.is_match(path) {
            return Err(LocatorError::invalid_path(
                path,
                "expected '.'? followed by one or more '/' or '//' steps",
            ));
        }

        let relative = path.starts_with('.');
        let body = if relative { &path[1..] } else { path };

        let mut segments = Vec::new();
        let mut cursor = 0;
        for caps in SEGMENT_RE.captures_iter(body) {
            let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
            if whole.start != cursor {
                return Err(LocatorError::invalid_path(path, "unexpected text between steps"));
            }
            cursor = whole.end;

            let scope = if &caps[1] == "//" {
                Scope::Descendants
            } else {
                Scope::Children
            };
            segments.push(PathSegment {
                scope,
                node_test: NodeTest::parse(&caps[2])?,
            });
        }
        if cursor != body.len() || segments.is_empty() {
            return Err(LocatorError::invalid_path(path, "trailing text after last step"));
        }

        Ok(PathExpression { relative, segments })
    }

    pub fn compile(&self, use_regex: bool) -> Result<Vec<CompiledSegment>, LocatorError> {
        self.segments.iter().map(|s| s.compile(use_regex)).collect()
    }
}

impl FromStr for PathExpression {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathExpression::parse(s)
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.relative {
            f.write_str(".")?;
        }
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uiquery_core_types::PropertyValue;

    #[test]
    fn test_relative_two_step_path() {
        let path: PathExpression = "./Pane[@Name='Foo']/Button[@AutomationId='1']"
            .parse()
            .unwrap();
        assert!(path.relative);
        assert_eq!(path.segments.len(), 2);

        let pane = &path.segments[0];
        assert_eq!(pane.scope, Scope::Children);
        assert_eq!(pane.node_test.type_name.as_deref(), Some("Pane"));
        assert_eq!(
            pane.node_test.predicates,
            vec![Predicate {
                attribute: "Name".into(),
                value: "Foo".into()
            }]
        );

        let button = &path.segments[1];
        assert_eq!(button.scope, Scope::Children);
        assert_eq!(button.node_test.type_name.as_deref(), Some("Button"));
        assert_eq!(
            button.node_test.predicates,
            vec![Predicate {
                attribute: "AutomationId".into(),
                value: "1".into()
            }]
        );
    }

    #[test]
    fn test_descendant_steps_and_conjunctions() {
        let path =
            PathExpression::parse("//Window[@Name='Main' and @ClassName='Frame']//Edit").unwrap();
        assert!(!path.relative);
        assert_eq!(path.segments[0].scope, Scope::Descendants);
        assert_eq!(path.segments[0].node_test.predicates.len(), 2);
        assert_eq!(path.segments[1].scope, Scope::Descendants);
        assert!(path.segments[1].node_test.predicates.is_empty());
        assert_eq!(
            path.to_string(),
            "//Window[@Name='Main' and @ClassName='Frame']//Edit"
        );
    }

    #[test]
    fn test_predicate_values_may_contain_delimiters() {
        let path = PathExpression::parse("/Text[@Name='a/b [x] and //y']").unwrap();
        assert_eq!(path.segments.len(), 1);
        assert_eq!(path.segments[0].node_test.predicates[0].value, "a/b [x] and //y");
    }

    #[test]
    fn test_predicates_without_type_and_wildcard() {
        let path = PathExpression::parse("/[@AutomationId='x']/*").unwrap();
        assert_eq!(path.segments[0].node_test.type_name, None);
        assert_eq!(path.segments[1].node_test.type_name, None);
        assert_eq!(path.segments[1].compile(false).unwrap().condition, Condition::always());
    }

    #[test]
    fn test_malformed_paths_rejected() {
        for bad in [
            "Button",
            "./",
            "/Button[",
            "/Button[@Name=\"x\"]",
            "/Button[@Name='x' or @Name='y']",
            "//",
            "/Button extra",
            "../Button",
            "/Button[]",
        ] {
            let err = PathExpression::parse(bad).unwrap_err();
            assert!(
                matches!(err, LocatorError::InvalidPath { .. }),
                "{bad}: {err:?}"
            );
        }
        assert_eq!(
            PathExpression::parse("  ").unwrap_err(),
            LocatorError::MissingArgument("path")
        );
    }

    #[test]
    fn test_compile_builds_conjunction() {
        let segment = PathExpression::parse("/Button[@Name='OK' and @IsEnabled='true']")
            .unwrap()
            .segments
            .remove(0);
        let compiled = segment.compile(false).unwrap();
        assert_eq!(
            compiled.condition,
            Condition::And(vec![
                Condition::control_type(ControlType::Button),
                Condition::name("OK"),
                Condition::equals(PropertyId::IsEnabled, PropertyValue::Bool(true)),
            ])
        );
        assert_eq!(compiled.source, "/Button[@Name='OK' and @IsEnabled='true']");
    }

    #[test]
    fn test_unknown_type_is_omitted() {
        let test = NodeTest::parse("Gizmo[@Name='x']").unwrap();
        assert_eq!(test.compile(false).unwrap(), Condition::name("x"));
    }

    #[test]
    fn test_unknown_attribute_is_hard_error() {
        let test = NodeTest::parse("Button[@Colour='red']").unwrap();
        assert_eq!(
            test.compile(false).unwrap_err(),
            LocatorError::UnknownProperty("Colour".into())
        );
    }

    #[test]
    fn test_regex_values_compile_to_patterns() {
        let test = NodeTest::parse("Button[@Name='/^ok$/i']").unwrap();
        assert!(matches!(
            test.compile(true).unwrap(),
            Condition::And(ref parts) if matches!(parts[1], Condition::PropertyMatches { .. })
        ));
        assert!(matches!(
            test.compile(false).unwrap(),
            Condition::And(ref parts) if parts[1] == Condition::name("/^ok$/i")
        ));
    }

    #[test]
    fn test_describe_prefers_automation_id() {
        assert_eq!(
            NodeTest::describe(Some(ControlType::Button), Some("ok"), Some("OK")),
            "Button[@AutomationId='ok']"
        );
        assert_eq!(
            NodeTest::describe(Some(ControlType::Pane), Some(""), Some("Main")),
            "Pane[@Name='Main']"
        );
        assert_eq!(NodeTest::describe(None, None, Some("it's")), "*");
    }
}
