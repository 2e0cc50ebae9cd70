use criterion::{
    BenchmarkGroup, Criterion, Throughput, black_box, criterion_group, criterion_main,
    measurement::WallTime,
};
use dossim_core::{
    Delay, SimTime, Simulation, TimeQueue,
    measure::{Rate, TrustRatio},
};

fn time_queue(c: &mut Criterion) {
    let delay = Delay::new(0.001).unwrap();

    c.bench_function("time_queue schedule+pop", |b| {
        let mut queue = TimeQueue::new();
        for i in 0..1_000u64 {
            queue.schedule_after(delay, i);
        }

        b.iter(|| {
            let item = queue.pop_next().unwrap();
            queue.schedule_after(delay, black_box(item));
        })
    });
}

fn bench_attack_size(group: &mut BenchmarkGroup<'_, WallTime>, attacker: u32) {
    let horizon = SimTime::new(80.0).unwrap();

    let mut simulation = Simulation::new();
    simulation.sink("victim").build();
    simulation.scrubber("scrubber").set_forward("victim").build();
    simulation
        .splitter("OLAD")
        .set_trust(TrustRatio::new(0.8).unwrap())
        .set_scrubber("scrubber")
        .set_direct("victim")
        .build();
    simulation.source("legitimate").set_destination("OLAD").build();
    simulation
        .source("attacker")
        .set_rate(Rate::from(attacker))
        .set_malicious(true)
        .set_destination("OLAD")
        .build();

    // every emitted packet is one receive and one service step, roughly
    let packets = (7 + u64::from(attacker)) * 80;

    group.throughput(Throughput::Elements(packets));
    group.bench_function(format!("{attacker} attack rate"), |b| {
        b.iter(|| simulation.run(black_box(horizon)).unwrap())
    });
}

fn simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation");

    for attacker in [0, 50, 100, 300] {
        bench_attack_size(&mut group, attacker);
    }

    group.finish();
}

criterion_group!(benches, time_queue, simulation);
criterion_main!(benches);
