//! # Discourse Model
//!
//! Plain data shared by every conversion direction: nodes, relations,
//! signals, secondary edges, the relation table and the tree arena.
//!
//! Design rule: no markup, no tab-separated text here. This module is pure
//! data and the structural bookkeeping derived from it.

pub mod node;
pub mod relations;
pub mod secedge;
pub mod signal;
pub mod tree;

pub use node::{Node, NodeId, NodeKind, RelKind, Relation};
pub use relations::{RelationTable, SignalInventory, DEFAULT_SIGNAL_TYPES};
pub use secedge::SecondaryEdge;
pub use signal::{Signal, TokenSet};
pub use tree::{Ancestors, RstTree};
