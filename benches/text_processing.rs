use criterion::{black_box, criterion_group, criterion_main, Criterion};
use graph_rag::rag::{
    build_full_text_query, ContextAssembler, GraphEdge, GraphStore, MemoryGraph,
    RelationshipLine, StructuredContext,
};

fn fulltext_query_benchmark(c: &mut Criterion) {
    let name = "Elizabeth (I) of the House: Tudor && Stuart || [Windsor]^2".repeat(4);

    c.bench_function("build_full_text_query_reserved_chars", |b| {
        b.iter(|| {
            let query = build_full_text_query(black_box(name.as_str()));
            black_box(query.map(|q| q.len()).unwrap_or(0));
        });
    });
}

fn assemble_benchmark(c: &mut Criterion) {
    let structured = StructuredContext {
        lines: (0..50)
            .map(|i| {
                RelationshipLine::from(GraphEdge::new(
                    "Elizabeth I",
                    "RELATED_TO",
                    format!("Entity {i}"),
                ))
            })
            .collect(),
    };
    let passages: Vec<String> = (0..4)
        .map(|i| format!("Passage {i} about the Tudor dynasty and its monarchs. ").repeat(20))
        .collect();
    let assembler = ContextAssembler::new();

    c.bench_function("assemble_context_50_lines_4_passages", |b| {
        b.iter(|| {
            let ctx = assembler.assemble(black_box(&structured), black_box(&passages));
            black_box(ctx.as_str().len());
        });
    });
}

fn memory_graph_benchmark(c: &mut Criterion) {
    let mut graph = MemoryGraph::new();
    for i in 0..500 {
        graph.add_relationship(&format!("Person {i}"), "MEMBER_OF", &format!("House {}", i % 20));
    }
    graph.add_relationship("Elizabeth I", "BELONGS_TO", "House Of Tudor");
    let query = build_full_text_query("Elizabeth I").unwrap_or_default();
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");

    c.bench_function("memory_graph_fuzzy_lookup_1000_nodes", |b| {
        b.iter(|| {
            let nodes = rt.block_on(graph.query_full_text("entity", black_box(&query), 2));
            black_box(nodes.map(|n| n.len()).unwrap_or(0));
        });
    });
}

criterion_group!(
    benches,
    fulltext_query_benchmark,
    assemble_benchmark,
    memory_graph_benchmark
);
criterion_main!(benches);
