//! Element finder: a condition applied over a traversal within a scope

use action_primitives::PropertySource;
use tracing::trace;
use uiquery_core_types::ProviderError;

use crate::condition::Condition;
use crate::traversal::{walk, TraversalMode};
use crate::types::Scope;

/// How many matches a search collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cardinality {
    First,
    All,
}

/// Finds nodes matching a [`Condition`] under a root node.
///
/// "No match" is an empty result, never an error. Provider faults are
/// returned as-is for the retry layer to absorb.
pub struct ElementFinder<'a, P: PropertySource + ?Sized> {
    provider: &'a P,
}

impl<'a, P: PropertySource + ?Sized> ElementFinder<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// First match in scope order; level order for descendant scopes.
    pub fn find_first(
        &self,
        root: &P::Node,
        scope: Scope,
        condition: &Condition,
    ) -> Result<Option<P::Node>, ProviderError> {
        Ok(self
            .find(root, scope, condition, Cardinality::First)?
            .into_iter()
            .next())
    }

    /// Every match, in discovery order.
    pub fn find_all(
        &self,
        root: &P::Node,
        scope: Scope,
        condition: &Condition,
    ) -> Result<Vec<P::Node>, ProviderError> {
        self.find(root, scope, condition, Cardinality::All)
    }

    fn find(
        &self,
        root: &P::Node,
        scope: Scope,
        condition: &Condition,
        cardinality: Cardinality,
    ) -> Result<Vec<P::Node>, ProviderError> {
        let mut matches = Vec::new();

        if scope.includes_self() && condition.evaluate(self.provider, root)? {
            matches.push(root.clone());
            if cardinality == Cardinality::First {
                return Ok(matches);
            }
        }

        let mode = match scope {
            Scope::Element => return Ok(matches),
            Scope::Children => TraversalMode::Children,
            Scope::Descendants | Scope::Subtree => TraversalMode::Descendants,
        };

        walk(self.provider, root, mode, |node| {
            if condition.evaluate(self.provider, node)? {
                trace!(?node, "condition matched");
                matches.push(node.clone());
                return Ok(cardinality == Cardinality::All);
            }
            Ok(true)
        })?;

        Ok(matches)
    }
}
