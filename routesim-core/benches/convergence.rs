use criterion::{
    BenchmarkGroup, Criterion, Throughput, black_box, criterion_group, criterion_main,
    measurement::WallTime,
};
use routesim_core::{network::Network, packet::Packet, router::RouterId};

const BANDWIDTH: f64 = 10.0;

/// `side * side` routers, each linked to its right and bottom neighbours
fn grid(side: usize) -> Network<()> {
    let mut network = Network::new(side * side);
    let id = |row: usize, column: usize| RouterId::from(row * side + column);

    for row in 0..side {
        for column in 0..side {
            if column + 1 < side {
                network
                    .configure_link(id(row, column), id(row, column + 1))
                    .set_bandwidth(BANDWIDTH)
                    .apply()
                    .unwrap();
            }
            if row + 1 < side {
                network
                    .configure_link(id(row, column), id(row + 1, column))
                    .set_bandwidth(BANDWIDTH)
                    .apply()
                    .unwrap();
            }
        }
    }

    network
}

fn bench_convergence(group: &mut BenchmarkGroup<'_, WallTime>, side: usize) {
    let ticks = 4 * side as u64;
    group.throughput(Throughput::Elements(ticks * (side * side) as u64));
    group.bench_function(format!("{side}x{side} grid, {ticks} ticks"), |b| {
        b.iter_with_setup(
            || grid(side),
            |mut network| {
                network.run_with(ticks, |event| {
                    black_box(event);
                });
                network
            },
        )
    });
}

fn convergence(c: &mut Criterion) {
    let mut group = c.benchmark_group("convergence");
    for side in [4, 8, 16] {
        bench_convergence(&mut group, side);
    }
    group.finish();
}

fn trace_under_load(c: &mut Criterion) {
    let side = 8;
    let mut network = grid(side);
    network.run_with(100, |_| {});

    let origin = RouterId::ZERO;
    let destination = RouterId::from(side * side - 1);

    c.bench_function("trace across a converged 8x8 grid", |b| {
        b.iter(|| {
            let trace = Packet::routing_trace(network.packet_id_generator(), origin, destination);
            network.send(trace).unwrap();
            network.run_with(4 * side as u64, |event| {
                black_box(event);
            });
        })
    });
}

criterion_group!(benches, convergence, trace_under_load);
criterion_main!(benches);
