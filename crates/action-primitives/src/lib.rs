//! Primitives the element query engine is built on
//!
//! This crate provides:
//! - The collaborator ports a host accessibility provider implements
//!   (tree walk, property read, window enumeration, top-level windows)
//! - Fixed-interval polling bounded by a timeout
//! - An in-memory snapshot tree implementing every port, for offline
//!   evaluation and tests

pub mod memory;
pub mod ports;
mod waiting;

pub use memory::{MemNodeId, MemoryTree, NodeSpec, SnapshotError};
pub use ports::*;
pub use waiting::*;
