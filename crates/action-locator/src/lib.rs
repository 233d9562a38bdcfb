//! Accessibility element query engine
//!
//! This crate locates elements in a live UI accessibility tree:
//! - Property conditions with literal or `/pattern/flags` values
//! - Level-order traversal and scoped element finding
//! - Merging of elements only reachable through OS window enumeration
//! - Slash-delimited path expressions with backtracking resolution
//! - Element handles with weak parent/root links and per-handle search config

pub mod condition;
pub mod config;
pub mod errors;
pub mod finder;
pub mod handle;
pub mod hidden;
pub mod path;
pub mod resolver;
pub mod strategies;
pub mod traversal;
pub mod types;

pub use condition::{Condition, ValuePattern};
pub use config::SearchConfig;
pub use errors::LocatorError;
pub use finder::ElementFinder;
pub use handle::{ElementHandle, Session};
pub use hidden::find_all_including_hidden;
pub use path::{CompiledSegment, NodeTest, PathExpression, PathSegment, Predicate};
pub use resolver::PathResolver;
pub use strategies::AnchorStrategy;
pub use traversal::{walk, walk_children, walk_descendants, TraversalMode};
pub use types::Scope;
