//! The control-flow graph of read/write nodes.
//!
//! This module provides the arena-owned graph the analysis runs on. A
//! front-end lowers its intermediate representation into [`RwNode`]s carrying
//! memory-access summaries, groups them into [`RwBlock`]s, and wires the
//! blocks with predecessor/successor edges. The graph owns every node and
//! block; the rest of the crate refers to them through the [`NodeId`] and
//! [`BlockId`] handles, which stay valid across growth and make the cyclic
//! def-use edges trivially safe to represent.

use std::{collections::HashSet, fmt};

use crate::{
    analysis::memssa::{DefSite, DefinitionsMap, Offset, Target},
    Error, Result,
};

/// A strongly-typed identifier for nodes within a read/write graph.
///
/// Node IDs are assigned sequentially by [`RwGraph::create`] and are only
/// meaningful for the graph that created them. They are used to reference
/// nodes in def-use sets, worklists, and analysis results.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the raw index value of this node identifier.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A strongly-typed identifier for basic blocks within a read/write graph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    /// Returns the raw index value of this block identifier.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// The kind of a read/write node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RwNodeKind {
    /// An ordinary operation: a store, a load, or both.
    Op,
    /// A synthetic join node materialised at a control-flow merge.
    Phi,
    /// A call site, summarising the memory effects of the callee.
    Call,
    /// A function return.
    Return,
    /// A global variable; its initialiser is modelled as a write placed in
    /// the entry block by the graph builder.
    Global,
}

/// A node of the read/write graph.
///
/// Each node summarises the memory effects of one operation of the lowered
/// program:
///
/// - `overwrites` - ranges this node definitely writes (strong updates);
///   their target and offset must be known
/// - `defs` - ranges this node may write (weak updates)
/// - `uses` - ranges this node reads
///
/// After the analysis has run, `defuse` holds the reaching-definition nodes
/// for this node's reads. PHI nodes carry exactly one def-site in
/// `overwrites`, describing the byte range they join.
#[derive(Debug)]
pub struct RwNode {
    kind: RwNodeKind,
    overwrites: Vec<DefSite>,
    defs: Vec<DefSite>,
    uses: Vec<DefSite>,
    block: Option<BlockId>,
    pub(crate) defuse: HashSet<NodeId>,
}

impl RwNode {
    fn new(kind: RwNodeKind) -> Self {
        RwNode {
            kind,
            overwrites: Vec::new(),
            defs: Vec::new(),
            uses: Vec::new(),
            block: None,
            defuse: HashSet::new(),
        }
    }

    /// Returns the kind of this node.
    #[must_use]
    pub const fn kind(&self) -> RwNodeKind {
        self.kind
    }

    /// Returns `true` if this is a PHI node.
    #[must_use]
    pub fn is_phi(&self) -> bool {
        self.kind == RwNodeKind::Phi
    }

    /// Returns the block this node lives in, if it has been placed.
    #[must_use]
    pub const fn block(&self) -> Option<BlockId> {
        self.block
    }

    /// Returns the ranges this node definitely writes.
    #[must_use]
    pub fn overwrites(&self) -> &[DefSite] {
        &self.overwrites
    }

    /// Returns the ranges this node may write.
    #[must_use]
    pub fn defs(&self) -> &[DefSite] {
        &self.defs
    }

    /// Returns the ranges this node reads.
    #[must_use]
    pub fn uses(&self) -> &[DefSite] {
        &self.uses
    }

    /// Returns the reaching-definition nodes accumulated for this node's
    /// reads. Populated by the analysis; may contain PHI nodes.
    #[must_use]
    pub fn defuse(&self) -> &HashSet<NodeId> {
        &self.defuse
    }

    /// Records that this node definitely writes `length` bytes of `target`
    /// at `offset`.
    pub fn add_overwrite(&mut self, target: Target, offset: Offset, length: Offset) {
        self.overwrites.push(DefSite::new(target, offset, length));
    }

    /// Records that this node may write `length` bytes of `target` at
    /// `offset`.
    pub fn add_def(&mut self, target: Target, offset: Offset, length: Offset) {
        self.defs.push(DefSite::new(target, offset, length));
    }

    /// Records that this node reads `length` bytes of `target` at `offset`.
    pub fn add_use(&mut self, target: Target, offset: Offset, length: Offset) {
        self.uses.push(DefSite::new(target, offset, length));
    }

    /// Returns `true` if any read of this node goes through an unknown
    /// target.
    #[must_use]
    pub fn uses_unknown(&self) -> bool {
        self.uses.iter().any(|ds| ds.target.is_unknown())
    }
}

/// A basic block of the read/write graph.
///
/// Holds its nodes in program order, its predecessor and successor links,
/// and the [`DefinitionsMap`] summarising the writes within the block once
/// local value numbering has run.
#[derive(Debug, Default)]
pub struct RwBlock {
    nodes: Vec<NodeId>,
    predecessors: Vec<BlockId>,
    successors: Vec<BlockId>,
    pub(crate) definitions: DefinitionsMap<NodeId>,
}

impl RwBlock {
    /// Returns the nodes of this block in program order.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Returns the predecessor blocks.
    #[must_use]
    pub fn predecessors(&self) -> &[BlockId] {
        &self.predecessors
    }

    /// Returns the successor blocks.
    #[must_use]
    pub fn successors(&self) -> &[BlockId] {
        &self.successors
    }

    /// Returns the unique predecessor, or `None` if the block has zero or
    /// several predecessors.
    #[must_use]
    pub fn single_predecessor(&self) -> Option<BlockId> {
        match self.predecessors.as_slice() {
            [pred] => Some(*pred),
            _ => None,
        }
    }

    /// Returns the per-block definitions summary.
    ///
    /// Empty until the analysis has run its local value numbering phase.
    #[must_use]
    pub fn definitions(&self) -> &DefinitionsMap<NodeId> {
        &self.definitions
    }
}

/// The arena-owned control-flow graph of read/write nodes.
///
/// The graph owns all nodes and blocks; everything else refers to them by
/// id. Nodes created before being placed float freely until
/// [`place`](Self::place) puts them into a block.
///
/// # Examples
///
/// ```rust
/// use slicescope::{RwGraph, RwNodeKind, Target};
///
/// let mut graph = RwGraph::new();
/// let entry = graph.create_block();
/// let body = graph.create_block();
/// graph.add_edge(entry, body)?;
///
/// let store = graph.create(RwNodeKind::Op);
/// graph.node_mut(store).add_overwrite(Target::new(0), 0.into(), 4.into());
/// graph.place(entry, store)?;
/// # Ok::<(), slicescope::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct RwGraph {
    nodes: Vec<RwNode>,
    blocks: Vec<RwBlock>,
}

impl RwGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new node of the given kind, owned by the graph.
    pub fn create(&mut self, kind: RwNodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(RwNode::new(kind));
        id
    }

    /// Creates a new empty basic block.
    pub fn create_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(RwBlock::default());
        id
    }

    /// Adds a control-flow edge from `from` to `to`.
    ///
    /// Parallel edges are allowed; a block reached twice from the same
    /// predecessor simply lists it twice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBlock`] if either id is not part of this
    /// graph.
    pub fn add_edge(&mut self, from: BlockId, to: BlockId) -> Result<()> {
        self.check_block(from)?;
        self.check_block(to)?;
        self.blocks[from.0].successors.push(to);
        self.blocks[to.0].predecessors.push(from);
        Ok(())
    }

    /// Appends `node` to the end of `block` and records the ownership.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBlock`] or [`Error::InvalidNode`] for ids
    /// that are not part of this graph, and [`Error::NodePlaced`] if the
    /// node already belongs to a block.
    pub fn place(&mut self, block: BlockId, node: NodeId) -> Result<()> {
        self.check_block(block)?;
        self.check_node(node)?;
        if self.nodes[node.0].block.is_some() {
            return Err(Error::NodePlaced(node.0));
        }
        self.blocks[block.0].nodes.push(node);
        self.nodes[node.0].block = Some(block);
        Ok(())
    }

    /// Splices `node` in at the head of `block` and records the ownership.
    ///
    /// Used to insert freshly-created PHI nodes before the code of the
    /// block they join definitions for.
    ///
    /// # Errors
    ///
    /// Same conditions as [`place`](Self::place).
    pub fn prepend_and_update_cfg(&mut self, block: BlockId, node: NodeId) -> Result<()> {
        self.check_block(block)?;
        self.check_node(node)?;
        if self.nodes[node.0].block.is_some() {
            return Err(Error::NodePlaced(node.0));
        }
        self.blocks[block.0].nodes.insert(0, node);
        self.nodes[node.0].block = Some(block);
        Ok(())
    }

    /// Returns the node with the given id.
    ///
    /// # Panics
    ///
    /// Panics if the id was not created by this graph.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &RwNode {
        &self.nodes[id.0]
    }

    /// Returns a mutable reference to the node with the given id.
    ///
    /// # Panics
    ///
    /// Panics if the id was not created by this graph.
    pub fn node_mut(&mut self, id: NodeId) -> &mut RwNode {
        &mut self.nodes[id.0]
    }

    /// Returns the block with the given id.
    ///
    /// # Panics
    ///
    /// Panics if the id was not created by this graph.
    #[must_use]
    pub fn block(&self, id: BlockId) -> &RwBlock {
        &self.blocks[id.0]
    }

    pub(crate) fn block_mut(&mut self, id: BlockId) -> &mut RwBlock {
        &mut self.blocks[id.0]
    }

    /// Iterates over the block ids in creation order, which is the order the
    /// front-end enumerated them.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len()).map(BlockId)
    }

    /// Iterates over the node ids in creation order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Returns the number of blocks in the graph.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the number of nodes in the graph, PHIs included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn check_block(&self, id: BlockId) -> Result<()> {
        if id.0 < self.blocks.len() {
            Ok(())
        } else {
            Err(Error::InvalidBlock(id.0))
        }
    }

    fn check_node(&self, id: NodeId) -> Result<()> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(Error::InvalidNode(id.0))
        }
    }
}
