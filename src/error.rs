use thiserror::Error;

/// The generic Error type, which provides coverage for all errors this library
/// can potentially return.
///
/// All analysis algorithms in this crate are total: pathological inputs yield
/// empty result sets rather than errors. The variants below therefore cover
/// only graph *construction*, where a front-end wiring up blocks and nodes can
/// hand us inconsistent identifiers.
///
/// # Examples
///
/// ```rust
/// use slicescope::{Error, RwGraph, RwNodeKind};
///
/// let mut graph = RwGraph::new();
/// let block = graph.create_block();
/// let node = graph.create(RwNodeKind::Op);
/// graph.place(block, node).unwrap();
///
/// // Placing the same node twice is a builder bug, reported as an error.
/// match graph.place(block, node) {
///     Err(Error::NodePlaced(_)) => {}
///     other => panic!("expected NodePlaced, got {other:?}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A block identifier does not refer to a block of this graph.
    ///
    /// Block identifiers are only valid for the graph that created them;
    /// this error indicates an identifier from a different graph or a
    /// fabricated index.
    #[error("block {0} is not part of this graph")]
    InvalidBlock(usize),

    /// A node identifier does not refer to a node of this graph.
    ///
    /// Node identifiers are only valid for the graph that created them;
    /// this error indicates an identifier from a different graph or a
    /// fabricated index.
    #[error("node {0} is not part of this graph")]
    InvalidNode(usize),

    /// A node was placed into a block while it already belongs to another.
    ///
    /// Every node lives in at most one basic block. The front-end must not
    /// place the same node twice.
    #[error("node {0} is already placed in a block")]
    NodePlaced(usize),
}
