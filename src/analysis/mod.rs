//! Memory-dependence analysis infrastructure.
//!
//! This module hosts the analyses that turn a read/write graph into
//! dependence information usable by a slicer. It currently contains a single
//! sub-module:
//!
//! - [`memssa`] - Memory SSA construction and the reaching-definitions query
//!
//! # Usage
//!
//! ```rust,ignore
//! use slicescope::analysis::memssa::{MemorySsa, RwGraph};
//!
//! let graph: RwGraph = build_graph();
//! let mut ssa = MemorySsa::new(graph);
//! ssa.run();
//!
//! for load in loads {
//!     let defs = ssa.reaching_definitions(load);
//!     println!("{load} may read from {defs:?}");
//! }
//! ```

pub mod memssa;

// Re-export primary types at module level
pub use memssa::{
    BlockId, DefSite, DefinitionsMap, DisjointIntervalSet, Interval, IntervalMap, MemorySsa,
    NodeId, Offset, RwBlock, RwGraph, RwNode, RwNodeKind, Target,
};
