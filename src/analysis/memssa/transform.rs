//! Memory SSA transformation: local and global value numbering.
//!
//! [`MemorySsa`] consumes a fully-built [`RwGraph`] and stamps every read
//! with the set of writes that may have produced the value it observes.
//!
//! # Algorithm
//!
//! The transformation runs in two phases:
//!
//! 1. **Local value numbering** ([`run`](MemorySsa::run), first phase) walks
//!    each block in program order. Strong writes kill and replace the
//!    overlapping slices of the block's definitions map; weak writes are
//!    resolved as a read first (so they join whatever came before them) and
//!    then appended. Reads pull their definitions from the map, and every
//!    byte range the block cannot explain locally gets a fresh PHI node
//!    prepended at the block head.
//!
//! 2. **Global value numbering** (second phase) completes the operand lists
//!    of all PHIs. For each PHI, every predecessor is searched for
//!    definitions of the joined range; byte ranges a predecessor cannot
//!    explain are chased through unique-predecessor chains, and further PHIs
//!    are materialised at merge points (and at blocks with no predecessors,
//!    where they stay empty and later collapse to nothing). Freshly created
//!    PHIs join the worklist, and the fixpoint is reached when it drains.
//!
//! The public query [`reaching_definitions`](MemorySsa::reaching_definitions)
//! then collapses chains of PHIs into their non-PHI leaves, so callers only
//! ever see real writes.

use std::collections::{HashSet, VecDeque};

use crate::analysis::memssa::{
    BlockId, DefSite, DefinitionsMap, Interval, NodeId, RwGraph, RwNodeKind, Target,
};

/// The Memory SSA transformation over a read/write graph.
///
/// Owns the graph for the duration of the analysis; PHI nodes created along
/// the way are owned by the graph like every other node. The transformation
/// is single-threaded and deterministic.
///
/// # Examples
///
/// ```rust,ignore
/// use slicescope::{MemorySsa, RwGraph};
///
/// let graph: RwGraph = front_end.lower(module)?;
/// let mut ssa = MemorySsa::new(graph);
/// ssa.run();
///
/// for load in loads {
///     println!("{load} reads from {:?}", ssa.reaching_definitions(load));
/// }
/// ```
#[derive(Debug)]
pub struct MemorySsa {
    graph: RwGraph,
    /// All PHI nodes created so far, in creation order. Append-only: the
    /// GVN worklist snapshots the length around a search to learn which
    /// PHIs that search created.
    phis: Vec<NodeId>,
    executed: bool,
}

impl MemorySsa {
    /// Creates the transformation over `graph`.
    ///
    /// Nothing is computed until [`run`](Self::run) is called.
    #[must_use]
    pub fn new(graph: RwGraph) -> Self {
        MemorySsa {
            graph,
            phis: Vec::new(),
            executed: false,
        }
    }

    /// Returns the analysed graph.
    #[must_use]
    pub fn graph(&self) -> &RwGraph {
        &self.graph
    }

    /// Consumes the transformation and hands the graph back, PHI nodes and
    /// def-use edges included.
    #[must_use]
    pub fn into_graph(self) -> RwGraph {
        self.graph
    }

    /// Returns the PHI nodes created by the transformation, in creation
    /// order.
    #[must_use]
    pub fn phis(&self) -> &[NodeId] {
        &self.phis
    }

    /// Executes the transformation: local value numbering over every block,
    /// then the global fixpoint over all PHI nodes.
    ///
    /// Idempotent: calling `run` a second time is a no-op, so def-use sets
    /// are stable once computed.
    pub fn run(&mut self) {
        if self.executed {
            return;
        }
        self.executed = true;
        self.perform_lvn();
        self.perform_gvn();
    }

    /// Returns the non-PHI nodes that may have written the value read by
    /// `read`, duplicate-free and in ascending node order.
    ///
    /// Reads through an unknown target cannot be answered from the def-use
    /// edges alone and fall back to an exhaustive walk of the predecessor
    /// graph. Only meaningful after [`run`](Self::run).
    #[must_use]
    pub fn reaching_definitions(&self, read: NodeId) -> Vec<NodeId> {
        let node = self.graph.node(read);
        let result = if node.uses_unknown() {
            self.find_all_reaching_definitions(read)
        } else {
            self.gather_non_phis_defs(node.defuse.iter().copied())
        };
        if result.is_empty() && !node.uses().is_empty() {
            log::warn!(target: "memssa", "no reaching definition found for read {read}");
        }
        result
    }

    // ---- local value numbering -------------------------------------------

    fn perform_lvn(&mut self) {
        log::debug!(target: "memssa", "starting LVN over {} blocks", self.graph.block_count());
        for block in self.graph.block_ids().collect::<Vec<_>>() {
            self.lvn_block(block);
        }
        log::debug!(target: "memssa", "LVN finished, {} phis created", self.phis.len());
    }

    /// Runs local value numbering for one block, in program order.
    fn lvn_block(&mut self, block: BlockId) {
        // Snapshot the node list: PHIs prepended along the way must not
        // disturb the traversal.
        let nodes = self.graph.block(block).nodes().to_vec();
        for node in nodes {
            // strong updates
            let overwrites = self.graph.node(node).overwrites().to_vec();
            for ds in overwrites {
                debug_assert!(!ds.offset.is_unknown(), "strong update on unknown offset");
                debug_assert!(!ds.target.is_unknown(), "strong update on unknown memory");
                self.graph.block_mut(block).definitions.update(&ds, node);
            }

            // weak updates
            let defs = self.graph.node(node).defs().to_vec();
            for ds in defs {
                if ds.target.is_unknown() {
                    // A write through an unknown pointer may hit any memory
                    // we know about, and is also registered under the
                    // unknown sentinel so GVN can find it.
                    let definitions = &mut self.graph.block_mut(block).definitions;
                    definitions.add_all(node);
                    definitions.add(&DefSite::UNKNOWN, node);
                    continue;
                }

                // A weak update joins the previous definitions of its range,
                // so resolve it as a read first. This must happen before the
                // write is recorded, or the node would find itself.
                let found = self.find_definitions_in_block(block, &ds);
                self.graph.node_mut(node).defuse.extend(found);
                self.graph.block_mut(block).definitions.add(&ds, node);
            }

            // uses
            let uses = self.graph.node(node).uses().to_vec();
            for ds in uses {
                let found = self.find_definitions_in_block(block, &ds);
                self.graph.node_mut(node).defuse.extend(found);
            }
        }
    }

    /// Finds the nodes defining `ds` within `block`, creating PHI nodes for
    /// the byte ranges the block cannot explain on its own.
    fn find_definitions_in_block(&mut self, block: BlockId, ds: &DefSite) -> Vec<NodeId> {
        let (mut defs, uncovered) = {
            let definitions = &self.graph.block(block).definitions;
            let mut defs: Vec<NodeId> = definitions.get(ds).into_iter().collect();
            defs.extend(definitions.get(&DefSite::UNKNOWN));
            (defs, definitions.undefined_intervals(ds))
        };

        for interval in uncovered {
            let phi = self.create_phi(block, ds.target, &interval);
            defs.push(phi);
        }
        defs
    }

    /// Creates a PHI node joining the definitions of `interval` of `target`
    /// at the head of `block`, and queues it for GVN.
    fn create_phi(&mut self, block: BlockId, target: Target, interval: &Interval) -> NodeId {
        let ds = DefSite::new(target, interval.start(), interval.length());
        debug_assert_eq!(
            self.graph.block(block).definitions.undefined_intervals(&ds),
            vec![*interval],
            "phi inserted over an already explained range"
        );

        let phi = self.graph.create(RwNodeKind::Phi);
        self.graph
            .node_mut(phi)
            .add_overwrite(target, interval.start(), interval.length());

        // The phi now defines the previously uncovered range in this block.
        self.graph.block_mut(block).definitions.update(&ds, phi);
        self.graph
            .prepend_and_update_cfg(block, phi)
            .expect("a fresh phi node is always placeable");

        self.phis.push(phi);
        phi
    }

    // ---- global value numbering ------------------------------------------

    fn perform_gvn(&mut self) {
        log::debug!(target: "memssa", "starting GVN over {} phis", self.phis.len());
        let mut worklist: VecDeque<NodeId> = self.phis.iter().copied().collect();

        while let Some(phi) = worklist.pop_front() {
            debug_assert_eq!(
                self.graph.node(phi).overwrites().len(),
                1,
                "a phi joins exactly one range"
            );
            let ds = self.graph.node(phi).overwrites()[0];
            let Some(block) = self.graph.node(phi).block() else {
                log::debug!(target: "memssa", "skipping phi {phi} without a block");
                continue;
            };

            let preds = self.graph.block(block).predecessors().to_vec();
            for pred in preds {
                let known_phis = self.phis.len();
                let found = self.find_definitions(pred, &ds);
                self.graph.node_mut(phi).defuse.extend(found);

                // Everything appended past the snapshot is exactly the set
                // of phis this search created; each is queued once.
                for &fresh in &self.phis[known_phis..] {
                    worklist.push_back(fresh);
                }
            }
        }
        log::debug!(target: "memssa", "GVN finished, {} phis total", self.phis.len());
    }

    /// Finds the nodes defining `ds` seen from the end of `block`, creating
    /// PHI nodes where several incoming definitions converge.
    ///
    /// Byte ranges the block cannot explain are chased through
    /// unique-predecessor chains iteratively; at merge points (and at blocks
    /// with no predecessors) a PHI over the hole is materialised instead, so
    /// that after this call the block fully explains the query.
    fn find_definitions(&mut self, block: BlockId, ds: &DefSite) -> Vec<NodeId> {
        let mut defs = Vec::new();
        let mut worklist = vec![(block, *ds)];
        // Unreachable single-predecessor cycles would otherwise never
        // terminate; reachable chains are visited once anyway.
        let mut seen: HashSet<(BlockId, DefSite)> = HashSet::new();

        while let Some((current, ds)) = worklist.pop() {
            if !seen.insert((current, ds)) {
                continue;
            }

            let (found, uncovered) = {
                let definitions = &self.graph.block(current).definitions;
                let mut found: Vec<NodeId> = definitions.get(&ds).into_iter().collect();
                found.extend(definitions.get(&DefSite::UNKNOWN));
                (found, definitions.undefined_intervals(&ds))
            };
            defs.extend(found);

            for interval in uncovered {
                if let Some(pred) = self.graph.block(current).single_predecessor() {
                    // A unique predecessor is consulted directly, narrowed
                    // to the hole; no phi is needed here.
                    worklist.push((
                        pred,
                        DefSite::new(ds.target, interval.start(), interval.length()),
                    ));
                } else {
                    let phi = self.create_phi(current, ds.target, &interval);
                    defs.push(phi);
                }
            }
        }
        defs
    }

    // ---- queries ---------------------------------------------------------

    /// Recursively replaces every PHI in `seeds` with its operands,
    /// returning only non-PHI terminals, duplicate-free and sorted.
    ///
    /// PHIs may reference themselves or form cycles through back-edges; the
    /// visited set makes the collapse terminate.
    fn gather_non_phis_defs(&self, seeds: impl IntoIterator<Item = NodeId>) -> Vec<NodeId> {
        let mut result: HashSet<NodeId> = HashSet::new();
        let mut visited_phis: HashSet<NodeId> = HashSet::new();
        let mut stack: Vec<NodeId> = seeds.into_iter().collect();

        while let Some(node) = stack.pop() {
            if self.graph.node(node).is_phi() {
                if visited_phis.insert(node) {
                    stack.extend(self.graph.node(node).defuse.iter().copied());
                }
            } else {
                result.insert(node);
            }
        }

        let mut result: Vec<NodeId> = result.into_iter().collect();
        result.sort_unstable();
        result
    }

    /// Exhaustively recomputes every definition reaching `from`, used for
    /// reads through unknown targets where the def-use edges alone cannot
    /// answer the query.
    ///
    /// Rebuilds a scratch definitions map for the prefix of the node's block
    /// (the strong/weak logic of LVN, without touching shared state), then
    /// walks the predecessor graph accumulating each block's post-LVN
    /// summary.
    fn find_all_reaching_definitions(&self, from: NodeId) -> Vec<NodeId> {
        log::debug!(target: "memssa", "finding all reaching definitions for {from}");
        let Some(block) = self.graph.node(from).block() else {
            log::debug!(target: "memssa", "read {from} has no block");
            return Vec::new();
        };

        let mut defs: DefinitionsMap<NodeId> = DefinitionsMap::new();
        let mut found: HashSet<NodeId> = HashSet::new();

        // Definitions in this block, from the head up to the read itself.
        for &node in self.graph.block(block).nodes() {
            if node == from {
                break;
            }
            let summaries = self.graph.node(node);
            for ds in summaries.overwrites() {
                defs.update(ds, node);
            }
            for ds in summaries.defs() {
                if ds.target.is_unknown() {
                    defs.add_all(node);
                    defs.add(&DefSite::UNKNOWN, node);
                } else {
                    defs.add(ds, node);
                }
            }
        }
        for (_, map) in defs.iter() {
            for (_, node) in map.iter() {
                found.insert(*node);
            }
        }

        // Definitions from the predecessors. The initiating block is
        // deliberately not marked visited: a self-loop must be able to
        // reprocess it once.
        let mut visited: HashSet<BlockId> = HashSet::new();
        if let Some(pred) = self.graph.block(block).single_predecessor() {
            self.collect_reaching(&mut defs, pred, &mut found, &mut visited);
        } else {
            for &pred in self.graph.block(block).predecessors() {
                let mut branch_defs = defs.clone();
                self.collect_reaching(&mut branch_defs, pred, &mut found, &mut visited);
            }
        }

        self.gather_non_phis_defs(found)
    }

    /// Merges `from`'s post-LVN definitions summary into the scratch map and
    /// recurses into its predecessors.
    ///
    /// Along unique-predecessor chains the scratch map is shared; at merge
    /// points every branch gets its own copy, since definitions gathered on
    /// one branch must not shadow holes on another.
    fn collect_reaching(
        &self,
        defs: &mut DefinitionsMap<NodeId>,
        from: BlockId,
        found: &mut HashSet<NodeId>,
        visited: &mut HashSet<BlockId>,
    ) {
        if !visited.insert(from) {
            return;
        }

        for (target, map) in self.graph.block(from).definitions.iter() {
            if !defs.defines_target(*target) {
                // Nothing closer defines this target; take the whole summary.
                for (interval, node) in map.iter() {
                    defs.add(
                        &DefSite::new(*target, interval.start(), interval.length()),
                        *node,
                    );
                    found.insert(*node);
                }
                continue;
            }

            // Only the byte ranges still unexplained may shine through.
            for (interval, node) in map.iter() {
                let uncovered = defs.undefined_intervals(&DefSite::new(
                    *target,
                    interval.start(),
                    interval.length(),
                ));
                for hole in uncovered {
                    defs.add(&DefSite::new(*target, hole.start(), hole.length()), *node);
                }
            }
        }

        if let Some(pred) = self.graph.block(from).single_predecessor() {
            self.collect_reaching(defs, pred, found, visited);
        } else {
            for &pred in self.graph.block(from).predecessors() {
                let mut branch_defs = defs.clone();
                self.collect_reaching(&mut branch_defs, pred, found, visited);
            }
        }
    }
}
