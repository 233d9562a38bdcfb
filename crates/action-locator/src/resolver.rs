//! Depth-first path resolution with backtracking

use std::collections::HashSet;

use action_primitives::AutomationProvider;
use tracing::debug;
use uiquery_core_types::ProviderError;

use crate::config::SearchConfig;
use crate::errors::LocatorError;
use crate::handle::ElementHandle;
use crate::path::{CompiledSegment, PathExpression};
use crate::strategies::AnchorStrategy;

/// A compiled path plus the anchoring strategy chosen for it.
///
/// Each resolve call is a single pass; polling belongs to the caller.
#[derive(Debug, Clone)]
pub struct PathResolver {
    segments: Vec<CompiledSegment>,
    relative: bool,
    strategy: AnchorStrategy,
    /// Per-segment sub-searches run quiet and single-shot
    step_config: SearchConfig,
    /// Configuration every handle found along the path carries
    result_config: SearchConfig,
}

impl PathResolver {
    pub fn new(path: &PathExpression, config: SearchConfig) -> Result<Self, LocatorError> {
        Ok(Self {
            segments: path.compile(config.use_regex_values)?,
            relative: path.relative,
            strategy: AnchorStrategy::select(path.relative, &config),
            step_config: config.nested(),
            result_config: config,
        })
    }

    pub fn strategy(&self) -> AnchorStrategy {
        self.strategy
    }

    pub fn segments(&self) -> &[CompiledSegment] {
        &self.segments
    }

    /// First anchor, in order, from which the whole path resolves.
    pub fn resolve_first<P: AutomationProvider>(
        &self,
        start: &ElementHandle<P>,
    ) -> Result<Option<ElementHandle<P>>, ProviderError> {
        for anchor in self.strategy.anchors(start, self.relative, self.result_config)? {
            if let Some(found) = self.match_from(&anchor, 0)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Every full match from every anchor, de-duplicated by identity.
    pub fn resolve_all<P: AutomationProvider>(
        &self,
        start: &ElementHandle<P>,
    ) -> Result<Vec<ElementHandle<P>>, ProviderError> {
        let mut matches = Vec::new();
        let mut seen = HashSet::new();
        for anchor in self.strategy.anchors(start, self.relative, self.result_config)? {
            self.collect_from(&anchor, 0, &mut |handle| {
                if let Some(key) = start.provider().identity(handle.node())? {
                    if !seen.insert(key) {
                        return Ok(());
                    }
                }
                matches.push(handle);
                Ok(())
            })?;
        }
        Ok(matches)
    }

    fn candidates<P: AutomationProvider>(
        &self,
        current: &ElementHandle<P>,
        index: usize,
    ) -> Result<Vec<ElementHandle<P>>, ProviderError> {
        let segment = &self.segments[index];
        let candidates = current.all_once(
            segment.scope,
            &segment.condition,
            &self.step_config,
            self.result_config,
        )?;
        debug!(
            segment = %segment.source,
            depth = index,
            candidates = candidates.len(),
            "path step expanded"
        );
        Ok(candidates)
    }

    /// Terminal candidates must still satisfy the node test on their own.
    fn accepts<P: AutomationProvider>(
        &self,
        candidate: &ElementHandle<P>,
        index: usize,
    ) -> Result<bool, ProviderError> {
        let accepted = candidate.satisfies(&self.segments[index].condition)?;
        if !accepted {
            debug!(node = ?candidate.node(), "terminal candidate failed re-test");
        }
        Ok(accepted)
    }

    fn match_from<P: AutomationProvider>(
        &self,
        current: &ElementHandle<P>,
        index: usize,
    ) -> Result<Option<ElementHandle<P>>, ProviderError> {
        if index >= self.segments.len() {
            return Ok(None);
        }
        let terminal = index + 1 == self.segments.len();

        for candidate in self.candidates(current, index)? {
            if terminal {
                if self.accepts(&candidate, index)? {
                    return Ok(Some(candidate));
                }
            } else if let Some(found) = self.match_from(&candidate, index + 1)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn collect_from<P, F>(
        &self,
        current: &ElementHandle<P>,
        index: usize,
        emit: &mut F,
    ) -> Result<(), ProviderError>
    where
        P: AutomationProvider,
        F: FnMut(ElementHandle<P>) -> Result<(), ProviderError>,
    {
        if index >= self.segments.len() {
            return Ok(());
        }
        let terminal = index + 1 == self.segments.len();

        for candidate in self.candidates(current, index)? {
            if terminal {
                if self.accepts(&candidate, index)? {
                    emit(candidate)?;
                }
            } else {
                self.collect_from(&candidate, index + 1, emit)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use crate::handle::Session;
    use crate::types::Scope;
    use action_primitives::{MemoryTree, NodeSpec};
    use std::sync::Arc;
    use uiquery_core_types::{ControlType, PropertyId};

    fn resolver(path: &str) -> PathResolver {
        PathResolver::new(&PathExpression::parse(path).unwrap(), SearchConfig::default()).unwrap()
    }

    fn tree() -> Arc<MemoryTree> {
        let spec = NodeSpec::new(ControlType::Window)
            .child(
                NodeSpec::new(ControlType::Group)
                    .with_automation_id("a1")
                    .child(NodeSpec::new(ControlType::Text).with_automation_id("t1")),
            )
            .child(
                NodeSpec::new(ControlType::Group)
                    .with_automation_id("a2")
                    .child(NodeSpec::new(ControlType::Button).with_automation_id("b2"))
                    .child(NodeSpec::new(ControlType::Button).with_automation_id("b3")),
            );
        Arc::new(MemoryTree::from_spec(&spec).unwrap())
    }

    fn root(tree: &Arc<MemoryTree>) -> ElementHandle<MemoryTree> {
        Session::new(tree.clone(), SearchConfig::default().with_wait(false)).attach(tree.root())
    }

    #[test]
    fn test_backtracks_to_second_candidate() {
        let tree = tree();
        let root = root(&tree);
        let found = resolver("./Group/Button").resolve_first(&root).unwrap().unwrap();
        assert_eq!(found.automation_id().unwrap().as_deref(), Some("b2"));

        assert_eq!(found.discovered_via(), Some(Scope::Children));
        assert_eq!(
            found.locator_path().unwrap(),
            "/Group[@AutomationId='a2']/Button[@AutomationId='b2']"
        );
    }

    #[test]
    fn test_resolve_all_in_discovery_order() {
        let tree = tree();
        let root = root(&tree);
        let ids: Vec<_> = resolver("//Group/*")
            .resolve_all(&root)
            .unwrap()
            .iter()
            .map(|h| h.automation_id().unwrap().unwrap())
            .collect();
        assert_eq!(ids, vec!["t1", "b2", "b3"]);
    }

    #[test]
    fn test_unresolvable_path_is_none() {
        let tree = tree();
        let root = root(&tree);
        assert!(resolver("./Group/Edit").resolve_first(&root).unwrap().is_none());
        assert!(resolver("./Group/Edit").resolve_all(&root).unwrap().is_empty());
    }

    #[test]
    fn test_terminal_retest_rejects_changed_element() {
        let tree = tree();
        let root = root(&tree);
        let resolver = resolver("./Group[@AutomationId='a1']");
        let candidate = root
            .first_once(Scope::Children, &Condition::automation_id("a1"))
            .unwrap()
            .unwrap();
        assert!(resolver.accepts(&candidate, 0).unwrap());

        let a1 = tree.find_by_automation_id("a1").unwrap();
        tree.set_property(
            a1,
            PropertyId::AutomationId,
            "renamed".into(),
        )
        .unwrap();
        assert!(!resolver.accepts(&candidate, 0).unwrap());
    }

    #[test]
    fn test_provider_fault_propagates_to_caller() {
        let tree = tree();
        let root = root(&tree);
        tree.fail_next_calls(1);
        assert!(resolver("./Group/Button").resolve_first(&root).is_err());
        assert!(resolver("./Group/Button").resolve_first(&root).unwrap().is_some());
    }
}
