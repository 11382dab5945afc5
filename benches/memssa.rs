//! Benchmarks for Memory SSA construction.
//!
//! Measures the two costs that dominate real workloads:
//! - running the LVN/GVN phases over a CFG with many join points
//! - answering reaching-definitions queries once the form is built
//!
//! The synthetic shapes are a ladder of diamonds (every rung is a join that
//! needs a phi) and a long unique-predecessor chain (no phis, pure
//! traversal).

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use slicescope::{BlockId, MemorySsa, NodeId, RwGraph, RwNodeKind, Target};

fn store(graph: &mut RwGraph, block: BlockId, t: Target, offset: u64, length: u64) -> NodeId {
    let node = graph.create(RwNodeKind::Op);
    graph
        .node_mut(node)
        .add_overwrite(t, offset.into(), length.into());
    graph.place(block, node).unwrap();
    node
}

fn load(graph: &mut RwGraph, block: BlockId, t: Target, offset: u64, length: u64) -> NodeId {
    let node = graph.create(RwNodeKind::Op);
    graph.node_mut(node).add_use(t, offset.into(), length.into());
    graph.place(block, node).unwrap();
    node
}

/// Builds `rungs` stacked diamonds; each rung stores into both branches and
/// loads at its join. Returns the graph and the load of the last rung.
fn diamond_ladder(rungs: usize) -> (RwGraph, NodeId) {
    let mut graph = RwGraph::new();
    let t = Target::new(0);
    let mut top = graph.create_block();
    let mut last_load = None;

    for rung in 0..rungs {
        let left = graph.create_block();
        let right = graph.create_block();
        let join = graph.create_block();
        graph.add_edge(top, left).unwrap();
        graph.add_edge(top, right).unwrap();
        graph.add_edge(left, join).unwrap();
        graph.add_edge(right, join).unwrap();

        let offset = (rung as u64 % 8) * 4;
        store(&mut graph, left, t, offset, 4);
        store(&mut graph, right, t, offset, 4);
        last_load = Some(load(&mut graph, join, t, offset, 4));

        top = join;
    }

    (graph, last_load.expect("at least one rung"))
}

/// Builds a chain of `length` blocks with a store at the head and a load at
/// the tail.
fn chain(length: usize) -> (RwGraph, NodeId) {
    let mut graph = RwGraph::new();
    let t = Target::new(0);
    let head = graph.create_block();
    store(&mut graph, head, t, 0, 8);

    let mut current = head;
    for _ in 1..length {
        let next = graph.create_block();
        graph.add_edge(current, next).unwrap();
        current = next;
    }
    let tail_load = load(&mut graph, current, t, 0, 8);

    (graph, tail_load)
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("memssa_run");
    for rungs in [16, 64, 256] {
        group.bench_with_input(BenchmarkId::new("diamond_ladder", rungs), &rungs, |b, &rungs| {
            b.iter(|| {
                let (graph, _) = diamond_ladder(rungs);
                let mut ssa = MemorySsa::new(graph);
                ssa.run();
                black_box(ssa)
            });
        });
    }
    for length in [64, 1024] {
        group.bench_with_input(BenchmarkId::new("chain", length), &length, |b, &length| {
            b.iter(|| {
                let (graph, _) = chain(length);
                let mut ssa = MemorySsa::new(graph);
                ssa.run();
                black_box(ssa)
            });
        });
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let (graph, last_load) = diamond_ladder(256);
    let mut ssa = MemorySsa::new(graph);
    ssa.run();

    c.bench_function("memssa_reaching_definitions", |b| {
        b.iter(|| black_box(ssa.reaching_definitions(black_box(last_load))));
    });
}

criterion_group!(benches, bench_construction, bench_queries);
criterion_main!(benches);
