//! End-to-end reaching-definitions scenarios driven through the public API.
//!
//! Each test builds a small read/write graph the way a front-end would,
//! runs the Memory SSA transformation, and checks the reaching definitions
//! of the reads against the memory semantics of the program shape.

use slicescope::{BlockId, MemorySsa, NodeId, Offset, RwGraph, RwNodeKind, Target};

fn store(graph: &mut RwGraph, block: BlockId, t: Target, offset: u64, length: u64) -> NodeId {
    let node = graph.create(RwNodeKind::Op);
    graph
        .node_mut(node)
        .add_overwrite(t, offset.into(), length.into());
    graph.place(block, node).unwrap();
    node
}

fn weak_store(graph: &mut RwGraph, block: BlockId, t: Target, offset: u64, length: u64) -> NodeId {
    let node = graph.create(RwNodeKind::Op);
    graph.node_mut(node).add_def(t, offset.into(), length.into());
    graph.place(block, node).unwrap();
    node
}

fn load(graph: &mut RwGraph, block: BlockId, t: Target, offset: u64, length: u64) -> NodeId {
    let node = graph.create(RwNodeKind::Op);
    graph.node_mut(node).add_use(t, offset.into(), length.into());
    graph.place(block, node).unwrap();
    node
}

/// Entry branching to two blocks that fall through to a join.
fn diamond(graph: &mut RwGraph) -> (BlockId, BlockId, BlockId, BlockId) {
    let entry = graph.create_block();
    let left = graph.create_block();
    let right = graph.create_block();
    let join = graph.create_block();
    graph.add_edge(entry, left).unwrap();
    graph.add_edge(entry, right).unwrap();
    graph.add_edge(left, join).unwrap();
    graph.add_edge(right, join).unwrap();
    (entry, left, right, join)
}

#[test]
fn straight_line_reads_both_stores() {
    let mut graph = RwGraph::new();
    let block = graph.create_block();
    let t = Target::new(0);

    let n1 = store(&mut graph, block, t, 0, 4);
    let n2 = store(&mut graph, block, t, 4, 4);
    let n3 = load(&mut graph, block, t, 0, 8);

    let mut ssa = MemorySsa::new(graph);
    ssa.run();

    assert_eq!(ssa.reaching_definitions(n3), vec![n1, n2]);
    assert!(ssa.phis().is_empty());
}

#[test]
fn diamond_join_merges_both_branches() {
    let mut graph = RwGraph::new();
    let (_, left, right, join) = diamond(&mut graph);
    let t = Target::new(0);

    let nl = store(&mut graph, left, t, 0, 4);
    let nr = store(&mut graph, right, t, 0, 4);
    let nu = load(&mut graph, join, t, 0, 4);

    let mut ssa = MemorySsa::new(graph);
    ssa.run();

    // One phi at the head of the join block, joining exactly [0, 4).
    assert_eq!(ssa.phis().len(), 1);
    let phi = ssa.phis()[0];
    assert_eq!(ssa.graph().node(phi).block(), Some(join));
    assert_eq!(ssa.graph().block(join).nodes()[0], phi);

    let phi_operands = ssa.graph().node(phi).defuse();
    assert!(phi_operands.contains(&nl));
    assert!(phi_operands.contains(&nr));

    assert!(ssa.graph().node(nu).defuse().contains(&phi));
    assert_eq!(ssa.reaching_definitions(nu), vec![nl, nr]);
}

#[test]
fn partial_branch_cover_still_lists_narrow_store() {
    let mut graph = RwGraph::new();
    let (_, left, right, join) = diamond(&mut graph);
    let t = Target::new(0);

    // The left branch defines only half of what the join reads.
    let nl = store(&mut graph, left, t, 0, 4);
    let nr = store(&mut graph, right, t, 0, 8);
    let nu = load(&mut graph, join, t, 0, 8);

    let mut ssa = MemorySsa::new(graph);
    ssa.run();

    // The joining phi spans the whole read, and nL is listed even though it
    // only contributes the [0, 4) slice.
    let phi = ssa.phis()[0];
    let joined = ssa.graph().node(phi).overwrites()[0];
    assert_eq!(joined.target, t);
    assert_eq!(joined.offset, Offset::new(0));
    assert_eq!(joined.length, Offset::new(8));

    assert_eq!(ssa.reaching_definitions(nu), vec![nl, nr]);
}

#[test]
fn loop_header_joins_entry_and_back_edge() {
    let mut graph = RwGraph::new();
    let entry = graph.create_block();
    let header = graph.create_block();
    graph.add_edge(entry, header).unwrap();
    graph.add_edge(header, header).unwrap();

    let t = Target::new(0);
    let ne = store(&mut graph, entry, t, 0, 4);
    let nu = load(&mut graph, header, t, 0, 4);
    let nh = store(&mut graph, header, t, 0, 4);

    let mut ssa = MemorySsa::new(graph);
    ssa.run();

    let phi = ssa.phis()[0];
    let operands = ssa.graph().node(phi).defuse();
    assert!(operands.contains(&ne));
    assert!(operands.contains(&nh));

    assert_eq!(ssa.reaching_definitions(nu), vec![ne, nh]);
}

#[test]
fn unknown_write_may_reach_any_load() {
    let mut graph = RwGraph::new();
    let block = graph.create_block();
    let t = Target::new(0);

    let ns = graph.create(RwNodeKind::Op);
    graph
        .node_mut(ns)
        .add_def(Target::UNKNOWN, Offset::ZERO, Offset::UNKNOWN);
    graph.place(block, ns).unwrap();

    // T itself was never defined before this load.
    let nl = load(&mut graph, block, t, 0, 4);

    let mut ssa = MemorySsa::new(graph);
    ssa.run();

    // The load observes the unknown write plus a phi over the undefined
    // range; only the real write survives the query.
    let defuse = ssa.graph().node(nl).defuse();
    assert!(defuse.contains(&ns));
    assert!(defuse.iter().any(|n| ssa.graph().node(*n).is_phi()));

    let reaching = ssa.reaching_definitions(nl);
    assert!(reaching.contains(&ns));
}

#[test]
fn unknown_write_fans_out_to_known_targets() {
    let mut graph = RwGraph::new();
    let block = graph.create_block();
    let t = Target::new(0);

    let n1 = store(&mut graph, block, t, 0, 4);
    let ns = graph.create(RwNodeKind::Op);
    graph
        .node_mut(ns)
        .add_def(Target::UNKNOWN, Offset::ZERO, Offset::UNKNOWN);
    graph.place(block, ns).unwrap();
    let nl = load(&mut graph, block, t, 0, 4);

    let mut ssa = MemorySsa::new(graph);
    ssa.run();

    // Both the direct store and the unknown write may have produced the
    // value being read.
    assert_eq!(ssa.reaching_definitions(nl), vec![n1, ns]);
}

#[test]
fn weak_update_does_not_shadow_strong_update() {
    let mut graph = RwGraph::new();
    let block = graph.create_block();
    let t = Target::new(0);

    let n1 = store(&mut graph, block, t, 0, 8);
    let n2 = weak_store(&mut graph, block, t, 4, 4);
    let n3 = load(&mut graph, block, t, 0, 8);

    let mut ssa = MemorySsa::new(graph);
    ssa.run();

    // The weak update joins the wider strong one instead of killing its
    // [0, 4) half.
    assert_eq!(ssa.reaching_definitions(n3), vec![n1, n2]);
}

#[test]
fn strong_update_kills_previous_definition() {
    let mut graph = RwGraph::new();
    let block = graph.create_block();
    let t = Target::new(0);

    let _n1 = store(&mut graph, block, t, 0, 4);
    let n2 = store(&mut graph, block, t, 0, 4);
    let n3 = load(&mut graph, block, t, 0, 4);

    let mut ssa = MemorySsa::new(graph);
    ssa.run();

    assert_eq!(ssa.reaching_definitions(n3), vec![n2]);
}

#[test]
fn read_through_unknown_pointer_sees_all_reaching_writes() {
    let mut graph = RwGraph::new();
    let entry = graph.create_block();
    let body = graph.create_block();
    graph.add_edge(entry, body).unwrap();

    let n1 = store(&mut graph, entry, Target::new(0), 0, 4);
    let n2 = store(&mut graph, body, Target::new(1), 0, 4);

    let read = graph.create(RwNodeKind::Op);
    graph
        .node_mut(read)
        .add_use(Target::UNKNOWN, Offset::ZERO, Offset::UNKNOWN);
    graph.place(body, read).unwrap();

    let mut ssa = MemorySsa::new(graph);
    ssa.run();

    assert_eq!(ssa.reaching_definitions(read), vec![n1, n2]);
}

#[test]
fn global_initialiser_reaches_loads() {
    let mut graph = RwGraph::new();
    let entry = graph.create_block();
    let body = graph.create_block();
    graph.add_edge(entry, body).unwrap();

    // The graph builder materialises a global's initialiser as a write in
    // the entry block.
    let t = Target::new(0);
    let global = graph.create(RwNodeKind::Global);
    graph.node_mut(global).add_overwrite(t, 0.into(), 8.into());
    graph.place(entry, global).unwrap();

    let nu = load(&mut graph, body, t, 0, 8);

    let mut ssa = MemorySsa::new(graph);
    ssa.run();

    assert_eq!(ssa.reaching_definitions(nu), vec![global]);
}

#[test]
fn run_twice_yields_identical_defuse() {
    let mut graph = RwGraph::new();
    let (_, left, right, join) = diamond(&mut graph);
    let t = Target::new(0);

    store(&mut graph, left, t, 0, 4);
    store(&mut graph, right, t, 0, 8);
    let nu = load(&mut graph, join, t, 0, 8);

    let mut ssa = MemorySsa::new(graph);
    ssa.run();
    let first = ssa.reaching_definitions(nu);
    let first_defuse = ssa.graph().node(nu).defuse().clone();
    let node_count = ssa.graph().node_count();

    ssa.run();
    assert_eq!(ssa.reaching_definitions(nu), first);
    assert_eq!(ssa.graph().node(nu).defuse(), &first_defuse);
    assert_eq!(ssa.graph().node_count(), node_count);
}

#[test]
fn query_results_are_phi_free_and_duplicate_free() {
    let mut graph = RwGraph::new();
    let (_, left, right, join) = diamond(&mut graph);
    let t = Target::new(0);

    store(&mut graph, left, t, 0, 4);
    store(&mut graph, right, t, 0, 4);
    let nu = load(&mut graph, join, t, 0, 4);

    let mut ssa = MemorySsa::new(graph);
    ssa.run();

    let result = ssa.reaching_definitions(nu);
    let unique: std::collections::HashSet<_> = result.iter().copied().collect();
    assert_eq!(unique.len(), result.len());
    for node in result {
        assert!(!ssa.graph().node(node).is_phi());
    }
}

#[test]
fn load_with_unknown_offset_is_conservative() {
    let mut graph = RwGraph::new();
    let block = graph.create_block();
    let t = Target::new(0);

    let n1 = store(&mut graph, block, t, 0, 4);
    let n2 = store(&mut graph, block, t, 100, 4);

    let nu = graph.create(RwNodeKind::Op);
    graph.node_mut(nu).add_use(t, Offset::UNKNOWN, 4.into());
    graph.place(block, nu).unwrap();

    let mut ssa = MemorySsa::new(graph);
    ssa.run();

    // An unknown offset may alias any byte of the target.
    let reaching = ssa.reaching_definitions(nu);
    assert!(reaching.contains(&n1));
    assert!(reaching.contains(&n2));
}

#[test]
fn zero_length_load_does_not_crash() {
    let mut graph = RwGraph::new();
    let block = graph.create_block();
    let t = Target::new(0);

    let n1 = store(&mut graph, block, t, 0, 4);
    let nu = load(&mut graph, block, t, 8, 0);

    let mut ssa = MemorySsa::new(graph);
    ssa.run();

    // Zero-length intervals are treated as unknown and answered
    // conservatively.
    assert_eq!(ssa.reaching_definitions(nu), vec![n1]);
}

#[test]
fn undefined_read_returns_empty_set() {
    let mut graph = RwGraph::new();
    let block = graph.create_block();
    let nu = load(&mut graph, block, Target::new(0), 0, 4);

    let mut ssa = MemorySsa::new(graph);
    ssa.run();

    assert!(ssa.reaching_definitions(nu).is_empty());
}

#[test]
fn single_predecessor_chain_needs_no_join_at_source() {
    let mut graph = RwGraph::new();
    let b0 = graph.create_block();
    let b1 = graph.create_block();
    let b2 = graph.create_block();
    graph.add_edge(b0, b1).unwrap();
    graph.add_edge(b1, b2).unwrap();

    let t = Target::new(0);
    let n0 = store(&mut graph, b0, t, 0, 4);
    let nu = load(&mut graph, b2, t, 0, 4);

    let mut ssa = MemorySsa::new(graph);
    ssa.run();

    // The definition is found by walking the unique-predecessor chain; no
    // phi is materialised anywhere upstream of the read's block.
    assert_eq!(ssa.reaching_definitions(nu), vec![n0]);
    for &phi in ssa.phis() {
        assert_eq!(ssa.graph().node(phi).block(), Some(b2));
    }
}

#[test]
fn adjacent_stores_fully_cover_wider_read() {
    let mut graph = RwGraph::new();
    let (_, left, right, join) = diamond(&mut graph);
    let t = Target::new(0);

    // Each branch covers the full range with two exactly adjacent stores.
    let l1 = store(&mut graph, left, t, 0, 4);
    let l2 = store(&mut graph, left, t, 4, 4);
    let r1 = store(&mut graph, right, t, 0, 8);
    let nu = load(&mut graph, join, t, 0, 8);

    let mut ssa = MemorySsa::new(graph);
    ssa.run();

    assert_eq!(ssa.reaching_definitions(nu), vec![l1, l2, r1]);
}
