//! Element handles and search sessions

use std::fmt;
use std::sync::{Arc, Weak};

use action_primitives::{retry, wait_until, AutomationProvider};
use tracing::{debug, info, warn};
use uiquery_core_types::{
    ControlType, IdentityKey, PropertyId, PropertyValue, ProviderError, SessionId,
};

use crate::condition::Condition;
use crate::config::SearchConfig;
use crate::errors::LocatorError;
use crate::finder::ElementFinder;
use crate::hidden::find_all_including_hidden;
use crate::path::{NodeTest, PathExpression};
use crate::resolver::PathResolver;
use crate::types::Scope;

/// A provider plus the configuration every root handle starts with.
pub struct Session<P: AutomationProvider> {
    provider: Arc<P>,
    config: SearchConfig,
    id: SessionId,
}

impl<P: AutomationProvider> Session<P> {
    pub fn new(provider: Arc<P>, config: SearchConfig) -> Self {
        Self {
            provider,
            config,
            id: SessionId::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn config(&self) -> SearchConfig {
        self.config
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Create the session root handle for `node`.
    pub fn attach(&self, node: P::Node) -> ElementHandle<P> {
        debug!(session = %self.id, ?node, "session root attached");
        ElementHandle::new_root(self.provider.clone(), node, self.id.clone(), self.config)
    }
}

/// One discovery step back towards the session root. Holds provider nodes
/// only, never handles.
struct Trail<N> {
    node: N,
    via: Scope,
    up: Option<Arc<Trail<N>>>,
}

struct HandleInner<P: AutomationProvider> {
    provider: Arc<P>,
    node: P::Node,
    parent: Weak<HandleInner<P>>,
    root: Weak<HandleInner<P>>,
    root_node: P::Node,
    session_id: SessionId,
    config: SearchConfig,
    trail: Option<Arc<Trail<P::Node>>>,
}

/// A discovered node together with its discovery context.
///
/// Parent and root links are weak: a handle keeps neither alive, and both
/// read as `None` once the caller has dropped them. Each handle owns its
/// own copy of the search configuration.
pub struct ElementHandle<P: AutomationProvider> {
    inner: Arc<HandleInner<P>>,
}

impl<P: AutomationProvider> Clone for ElementHandle<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: AutomationProvider> fmt::Debug for ElementHandle<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementHandle")
            .field("node", &self.inner.node)
            .field("session", &self.inner.session_id)
            .field("discovered_via", &self.discovered_via())
            .finish()
    }
}

impl<P: AutomationProvider> ElementHandle<P> {
    fn new_root(
        provider: Arc<P>,
        node: P::Node,
        session_id: SessionId,
        config: SearchConfig,
    ) -> Self {
        let inner = Arc::new_cyclic(|root| HandleInner {
            provider,
            root_node: node.clone(),
            node,
            parent: Weak::new(),
            root: root.clone(),
            session_id,
            config,
            trail: None,
        });
        Self { inner }
    }

    /// Handle for a node found from this one.
    pub(crate) fn discovered(&self, node: P::Node, via: Scope) -> Self {
        self.discovered_with(node, via, self.inner.config)
    }

    /// Handle for a node found from this one, carrying `config` instead of
    /// this handle's own.
    pub(crate) fn discovered_with(&self, node: P::Node, via: Scope, config: SearchConfig) -> Self {
        let inner = &self.inner;
        let trail = Arc::new(Trail {
            node: node.clone(),
            via,
            up: inner.trail.clone(),
        });
        Self {
            inner: Arc::new(HandleInner {
                provider: inner.provider.clone(),
                node,
                parent: Arc::downgrade(inner),
                root: inner.root.clone(),
                root_node: inner.root_node.clone(),
                session_id: inner.session_id.clone(),
                config,
                trail: Some(trail),
            }),
        }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.inner.provider
    }

    pub fn node(&self) -> &P::Node {
        &self.inner.node
    }

    pub fn config(&self) -> SearchConfig {
        self.inner.config
    }

    pub fn session_id(&self) -> &SessionId {
        &self.inner.session_id
    }

    /// Scope of the search that produced this handle; `None` for a session root.
    pub fn discovered_via(&self) -> Option<Scope> {
        self.inner.trail.as_ref().map(|step| step.via)
    }

    /// Same element and links, different configuration. A session root
    /// stays a session root.
    pub fn with_config(&self, config: SearchConfig) -> Self {
        let inner = &self.inner;
        if self.is_session_root() {
            return Self::new_root(
                inner.provider.clone(),
                inner.node.clone(),
                inner.session_id.clone(),
                config,
            );
        }
        self.relinked(config)
    }

    /// Copy of this handle under `config`, with parent and root links intact.
    fn relinked(&self, config: SearchConfig) -> Self {
        let inner = &self.inner;
        Self {
            inner: Arc::new(HandleInner {
                provider: inner.provider.clone(),
                node: inner.node.clone(),
                parent: inner.parent.clone(),
                root: inner.root.clone(),
                root_node: inner.root_node.clone(),
                session_id: inner.session_id.clone(),
                config,
                trail: inner.trail.clone(),
            }),
        }
    }

    pub fn is_session_root(&self) -> bool {
        std::ptr::eq(self.inner.root.as_ptr(), Arc::as_ptr(&self.inner))
    }

    pub fn parent(&self) -> Option<Self> {
        self.inner.parent.upgrade().map(|inner| Self { inner })
    }

    pub fn root(&self) -> Option<Self> {
        self.inner.root.upgrade().map(|inner| Self { inner })
    }

    /// The session root, re-attached if every handle to it has been dropped.
    pub fn session_root(&self) -> Self {
        self.root().unwrap_or_else(|| {
            Self::new_root(
                self.inner.provider.clone(),
                self.inner.root_node.clone(),
                self.inner.session_id.clone(),
                self.inner.config,
            )
        })
    }

    /// Live ancestors, nearest first.
    pub fn ancestors(&self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(handle) = current {
            current = handle.parent();
            out.push(handle);
        }
        out
    }

    pub fn property(&self, property: PropertyId) -> Result<Option<PropertyValue>, LocatorError> {
        Ok(self.inner.provider.property(&self.inner.node, property)?)
    }

    fn text_property(&self, property: PropertyId) -> Result<Option<String>, LocatorError> {
        Ok(self
            .property(property)?
            .and_then(|value| value.as_str().map(str::to_string)))
    }

    pub fn name(&self) -> Result<Option<String>, LocatorError> {
        self.text_property(PropertyId::Name)
    }

    pub fn automation_id(&self) -> Result<Option<String>, LocatorError> {
        self.text_property(PropertyId::AutomationId)
    }

    pub fn class_name(&self) -> Result<Option<String>, LocatorError> {
        self.text_property(PropertyId::ClassName)
    }

    pub fn control_type(&self) -> Result<Option<ControlType>, LocatorError> {
        Ok(self
            .property(PropertyId::ControlType)?
            .and_then(|value| value.as_control_type()))
    }

    pub fn identity(&self) -> Result<Option<IdentityKey>, LocatorError> {
        Ok(self.inner.provider.identity(&self.inner.node)?)
    }

    /// Whether both handles refer to the same element by identity.
    pub fn same_element(&self, other: &Self) -> Result<bool, LocatorError> {
        Ok(match (self.identity()?, other.identity()?) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        })
    }

    /// Walk-visible children, without polling.
    pub fn children(&self) -> Result<Vec<Self>, LocatorError> {
        let nodes = ElementFinder::new(&*self.inner.provider).find_all(
            &self.inner.node,
            Scope::Children,
            &Condition::always(),
        )?;
        Ok(nodes
            .into_iter()
            .map(|node| self.discovered(node, Scope::Children))
            .collect())
    }

    pub(crate) fn satisfies(&self, condition: &Condition) -> Result<bool, ProviderError> {
        condition.evaluate(&*self.inner.provider, &self.inner.node)
    }

    /// One primary-walk pass. A self match returns this handle unchanged.
    pub(crate) fn first_once(
        &self,
        scope: Scope,
        condition: &Condition,
    ) -> Result<Option<Self>, ProviderError> {
        let found = ElementFinder::new(&*self.inner.provider).find_first(
            &self.inner.node,
            scope,
            condition,
        )?;
        Ok(found.map(|node| match scope {
            Scope::Element => self.clone(),
            _ => self.discovered(node, scope),
        }))
    }

    /// One pass including hidden elements, governed by `search`. Found
    /// handles carry `carried` as their configuration.
    pub(crate) fn all_once(
        &self,
        scope: Scope,
        condition: &Condition,
        search: &SearchConfig,
        carried: SearchConfig,
    ) -> Result<Vec<Self>, ProviderError> {
        if scope == Scope::Element {
            let found = self.first_once(scope, condition)?;
            return Ok(found
                .map(|handle| {
                    if handle.config() == carried {
                        handle
                    } else {
                        handle.relinked(carried)
                    }
                })
                .into_iter()
                .collect());
        }
        let nodes = find_all_including_hidden(
            &*self.inner.provider,
            &self.inner.node,
            scope,
            condition,
            search.include_all_os_windows,
        )?;
        Ok(nodes
            .into_iter()
            .map(|node| self.discovered_with(node, scope, carried))
            .collect())
    }

    fn report_miss(&self, operation: &str, target: &str) {
        let config = self.config();
        if config.report_errors {
            warn!(
                session = %self.inner.session_id,
                operation,
                target,
                waited = config.wait_for_element,
                timeout_ms = config.timeout_ms,
                "element not found"
            );
        }
    }

    /// First element in `scope` satisfying `condition`.
    pub fn find_first(
        &self,
        scope: Scope,
        condition: &Condition,
    ) -> Result<Option<Self>, LocatorError> {
        let config = self.config();
        debug!(session = %self.inner.session_id, %scope, %condition, "find first");
        let found = retry(&config.retry_policy(), "find_first", || {
            self.first_once(scope, condition)
        });
        if found.is_none() {
            self.report_miss("find_first", &condition.to_string());
        }
        Ok(found)
    }

    /// Every element in `scope` satisfying `condition`, hidden ones included.
    pub fn find_all(&self, scope: Scope, condition: &Condition) -> Result<Vec<Self>, LocatorError> {
        let config = self.config();
        debug!(session = %self.inner.session_id, %scope, %condition, "find all");
        let found = retry(&config.retry_policy(), "find_all", || {
            let handles = self.all_once(scope, condition, &config, config)?;
            Ok::<_, ProviderError>((!handles.is_empty()).then_some(handles))
        })
        .unwrap_or_default();
        if found.is_empty() {
            self.report_miss("find_all", &condition.to_string());
        }
        Ok(found)
    }

    pub fn find_by_properties(
        &self,
        scope: Scope,
        properties: &[(PropertyId, PropertyValue)],
    ) -> Result<Option<Self>, LocatorError> {
        if properties.is_empty() {
            return Err(LocatorError::EmptyConditionSet("find_by_properties"));
        }
        let condition = Condition::all(
            properties
                .iter()
                .map(|(property, value)| Condition::equals(*property, value.clone()))
                .collect(),
        );
        self.find_first(scope, &condition)
    }

    /// Like [`find_by_properties`](Self::find_by_properties), with property
    /// names resolved through the registry and values parsed from text.
    pub fn find_by_named_properties(
        &self,
        scope: Scope,
        properties: &[(&str, &str)],
    ) -> Result<Option<Self>, LocatorError> {
        if properties.is_empty() {
            return Err(LocatorError::EmptyConditionSet("find_by_named_properties"));
        }
        let use_regex = self.config().use_regex_values;
        let mut conditions = Vec::with_capacity(properties.len());
        for (name, value) in properties {
            let name = name.trim();
            if name.is_empty() {
                return Err(LocatorError::MissingArgument("property name"));
            }
            let property = PropertyId::lookup(name)
                .ok_or_else(|| LocatorError::UnknownProperty(name.to_string()))?;
            conditions.push(Condition::from_text(property, value, use_regex)?);
        }
        self.find_first(scope, &Condition::all(conditions))
    }

    /// Resolve a path expression to its first full match.
    pub fn find_by_path(&self, path: &str) -> Result<Option<Self>, LocatorError> {
        let expression = PathExpression::parse(path)?;
        let config = self.config();
        let resolver = PathResolver::new(&expression, config)?;
        info!(
            session = %self.inner.session_id,
            path = %expression,
            strategy = resolver.strategy().name(),
            "resolving path"
        );
        let found = retry(&config.retry_policy(), "find_by_path", || {
            resolver.resolve_first(self)
        });
        if found.is_none() {
            self.report_miss("find_by_path", path);
        }
        Ok(found)
    }

    /// Every full match of a path expression, in depth-first discovery order.
    pub fn find_all_by_path(&self, path: &str) -> Result<Vec<Self>, LocatorError> {
        let expression = PathExpression::parse(path)?;
        let config = self.config();
        let resolver = PathResolver::new(&expression, config)?;
        info!(
            session = %self.inner.session_id,
            path = %expression,
            strategy = resolver.strategy().name(),
            "resolving all matches of path"
        );
        let found = retry(&config.retry_policy(), "find_all_by_path", || {
            let handles = resolver.resolve_all(self)?;
            Ok::<_, ProviderError>((!handles.is_empty()).then_some(handles))
        })
        .unwrap_or_default();
        if found.is_empty() {
            self.report_miss("find_all_by_path", path);
        }
        Ok(found)
    }

    /// Poll until nothing in `scope` satisfies `condition`.
    pub fn wait_until_gone(&self, scope: Scope, condition: &Condition) -> Result<bool, LocatorError> {
        let config = self.config();
        let gone = wait_until(&config.retry_policy(), "wait_until_gone", || {
            self.first_once(scope, condition).map(|found| found.is_none())
        });
        if !gone && config.report_errors {
            warn!(
                session = %self.inner.session_id,
                %condition,
                timeout_ms = config.timeout_ms,
                "element still present"
            );
        }
        Ok(gone)
    }

    /// Path expression rebuilt from the discovery chain back to the session root.
    pub fn locator_path(&self) -> Result<String, LocatorError> {
        let mut steps = Vec::new();
        let mut current = self.inner.trail.clone();
        while let Some(step) = current {
            let delimiter = step.via.delimiter().unwrap_or("//");
            steps.push(format!("{delimiter}{}", self.describe(&step.node)?));
            current = step.up.clone();
        }
        if steps.is_empty() {
            return Ok(".".to_string());
        }
        steps.reverse();
        Ok(steps.concat())
    }

    fn describe(&self, node: &P::Node) -> Result<String, LocatorError> {
        let provider = &self.inner.provider;
        let text = |property| -> Result<Option<String>, ProviderError> {
            Ok(provider
                .property(node, property)?
                .and_then(|value| value.as_str().map(str::to_string)))
        };
        let control_type = provider
            .property(node, PropertyId::ControlType)?
            .and_then(|value| value.as_control_type());
        Ok(NodeTest::describe(
            control_type,
            text(PropertyId::AutomationId)?.as_deref(),
            text(PropertyId::Name)?.as_deref(),
        ))
    }
}
