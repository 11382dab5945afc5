//! Memory SSA construction and reaching definitions.
//!
//! This module builds a Memory-SSA form over a control-flow graph of
//! read/write nodes and answers, for each read, which writes may have
//! produced the value being read.
//!
//! # Architecture
//!
//! The module is organized into focused sub-modules, leaves first:
//!
//! - [`offset`] - byte offsets with a distinguished *unknown* top value
//! - [`interval`] - both-closed byte intervals and disjoint interval sets
//! - [`interval_map`] - ordered mapping from intervals to definition sets
//! - [`definitions`] - per-target definitions map with strong/weak updates
//! - [`graph`] - the arena-owned CFG of read/write nodes
//! - [`transform`] - the LVN/GVN phases and the reaching-definitions query
//!
//! # Algorithm
//!
//! Construction runs in two phases. *Local value numbering* (LVN) walks each
//! block in program order, recording strong and weak writes in the block's
//! definitions map and wiring intra-block def-use edges. Wherever a read is
//! not fully explained by the block itself, a PHI node is materialised at the
//! block head for the uncovered byte range. *Global value numbering* (GVN)
//! then completes the operand lists of all PHIs by searching predecessor
//! blocks, creating further PHIs on demand until a fixpoint is reached.
//!
//! PHIs are an internal artefact: the public query collapses chains of PHIs
//! into their non-PHI leaves, so callers only ever see real writes.
//!
//! # Example
//!
//! ```rust,ignore
//! use slicescope::analysis::memssa::{MemorySsa, RwGraph, RwNodeKind, Target};
//!
//! let mut graph = RwGraph::new();
//! let entry = graph.create_block();
//!
//! let t = Target::new(7);
//! let store = graph.create(RwNodeKind::Op);
//! graph.node_mut(store).add_overwrite(t, 0.into(), 4.into());
//! graph.place(entry, store)?;
//!
//! let load = graph.create(RwNodeKind::Op);
//! graph.node_mut(load).add_use(t, 0.into(), 4.into());
//! graph.place(entry, load)?;
//!
//! let mut ssa = MemorySsa::new(graph);
//! ssa.run();
//! assert_eq!(ssa.reaching_definitions(load), vec![store]);
//! ```

mod definitions;
mod graph;
mod interval;
mod interval_map;
mod offset;
mod transform;

pub use definitions::{DefSite, DefinitionsMap, Target};
pub use graph::{BlockId, NodeId, RwBlock, RwGraph, RwNode, RwNodeKind};
pub use interval::{DisjointIntervalSet, Interval};
pub use interval_map::IntervalMap;
pub use offset::Offset;
pub use transform::MemorySsa;
