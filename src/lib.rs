// Copyright 2025-2026 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]

//! # slicescope
//!
//! The memory-dependence core of a program-slicing and dependence-analysis
//! toolkit. Given a control-flow graph whose nodes carry memory-access
//! summaries (sets of write-sites and read-sites over abstract memory targets
//! with byte-offset intervals), `slicescope` answers: *for each read, which
//! writes may have produced the value being read?*
//!
//! It does so by constructing a Memory-SSA form in which synthetic join nodes
//! (PHIs) are materialised on demand wherever multiple incoming definitions
//! converge, and by maintaining a per-block interval map from
//! `(target, offset, length)` to the set of defining nodes.
//!
//! # Architecture
//!
//! The library is organized around a small number of layers:
//!
//! - **Interval layer**: byte intervals over partially-unknown offsets with
//!   overlap, subset, and union operations
//! - **Definitions layer**: per-target interval maps recording which nodes
//!   define which byte ranges, with strong and weak update disciplines
//! - **Graph layer**: an arena-owned control-flow graph of read/write nodes
//! - **Analysis layer**: local and global value numbering phases that stamp
//!   each node with its reaching definitions, plus the query surface
//!
//! # Usage
//!
//! ```rust,ignore
//! use slicescope::{MemorySsa, RwGraph, RwNodeKind, Target};
//!
//! // Build a graph of read/write nodes (normally done by a front-end
//! // lowering a compiled IR and a pointer analysis).
//! let mut graph = RwGraph::new();
//! let block = graph.create_block();
//! let store = graph.create(RwNodeKind::Op);
//! graph.node_mut(store).add_overwrite(Target::new(0), 0.into(), 4.into());
//! graph.place(block, store)?;
//!
//! // Run the transformation and query reaching definitions.
//! let mut ssa = MemorySsa::new(graph);
//! ssa.run();
//! let defs = ssa.reaching_definitions(some_load);
//! ```
//!
//! # Scope
//!
//! The front-end that lowers an intermediate representation into the
//! read/write graph, the pointer analysis that supplies memory targets, the
//! control-dependence analyses, and the slicer that walks dependence edges
//! are external collaborators. This crate consumes a fully-built graph and
//! publishes def-use edges on its nodes.

pub mod analysis;

mod error;

/// Convenience alias for operations that can fail with a [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;

pub use analysis::{
    BlockId, DefSite, DefinitionsMap, DisjointIntervalSet, Interval, IntervalMap, MemorySsa,
    NodeId, Offset, RwBlock, RwGraph, RwNode, RwNodeKind, Target,
};
