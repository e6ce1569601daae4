use criterion::{criterion_group, criterion_main, Criterion};
use once_cell::sync::Lazy;
use searoute_lib::{
    triplicate, Coordinate, Network, PassageRuleConfig, RouteOptions, RouterOptions, RoutingGraph,
    SeaRouter, DEFAULT_TOLERANCE,
};
use std::hint::black_box;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

static NETWORK: Lazy<Network> = Lazy::new(|| {
    Network::load(&fixtures_dir().join("sample_network.geojson")).expect("fixture loads")
});
static RULES: Lazy<PassageRuleConfig> = Lazy::new(|| {
    PassageRuleConfig::load(&fixtures_dir().join("passages.json")).expect("fixture loads")
});
static ROUTER: Lazy<SeaRouter> = Lazy::new(|| {
    SeaRouter::new(NETWORK.clone(), Some(&*RULES), RouterOptions::default())
        .expect("router builds")
});

const ANCONA: [f64; 2] = [13.5029, 43.6214];
const BAB_EL_MANDEB: [f64; 2] = [43.3, 12.6];
const VANCOUVER: Coordinate = Coordinate::new(-123.1203, 49.2705);
const TIANJIN: Coordinate = Coordinate::new(117.7006, 38.9847);

fn benchmark_routing(c: &mut Criterion) {
    let router = &*ROUTER;

    c.bench_function("build_router", |b| {
        b.iter(|| {
            let router = SeaRouter::new(NETWORK.clone(), Some(&*RULES), RouterOptions::default())
                .expect("router builds");
            black_box(router.profiles().len())
        });
    });

    c.bench_function("compile_graph", |b| {
        let tripled = triplicate(&NETWORK);
        b.iter(|| {
            let graph = RoutingGraph::compile(&tripled, DEFAULT_TOLERANCE).expect("compiles");
            black_box(graph.edge_count())
        });
    });

    c.bench_function("route_default_snapped", |b| {
        let options = RouteOptions::default();
        b.iter(|| {
            let result = router
                .shortest_route(&ANCONA, &BAB_EL_MANDEB, &options)
                .expect("query succeeds");
            black_box(result.map(|r| r.distance_km))
        });
    });

    c.bench_function("route_vlcc_with_path", |b| {
        let options = RouteOptions::for_profile("vlcc").with_path(true);
        b.iter(|| {
            let result = router
                .shortest_route(&ANCONA, &BAB_EL_MANDEB, &options)
                .expect("query succeeds");
            black_box(result.map(|r| r.vertex_count))
        });
    });

    c.bench_function("route_across_antimeridian", |b| {
        let options = RouteOptions::default().with_path(true);
        b.iter(|| {
            let result = router
                .shortest_path(VANCOUVER, TIANJIN, &options)
                .expect("query succeeds");
            black_box(result.map(|r| r.distance_km))
        });
    });
}

criterion_group!(benches, benchmark_routing);
criterion_main!(benches);
