use conduitweld::prelude::*;
use conduitweld::util::try_collect;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

fn scale(factor: i64) -> Transformer<i64, i64> {
    Transformer::new(MapTransformer::new(move |x: i64| black_box(x * factor)))
}

fn shift(offset: i64) -> Transformer<i64, i64> {
    Transformer::new(MapTransformer::new(move |x: i64| black_box(x + offset)))
}

fn bench_serial_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("serial_chain");

    for size in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("map", size), size, |b, &size| {
            let producer = Producer::new(RangeProducer::new(0..size)).then(scale(2));
            b.iter(|| try_collect(producer.produce()).unwrap());
        });

        let id = BenchmarkId::new("map_filter_map", size);
        group.bench_with_input(id, size, |b, &size| {
            let evens = Transformer::new(FilterTransformer::new(|x: &i64| x % 2 == 0));
            let producer = Producer::new(RangeProducer::new(0..size))
                .then(shift(1))
                .then(evens)
                .then(scale(3));
            b.iter(|| try_collect(producer.produce()).unwrap());
        });
    }

    group.finish();
}

fn bench_concurrent_groups(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_groups");

    for branches in [2, 4, 8].iter() {
        group.bench_with_input(
            BenchmarkId::new("producer_group", branches),
            branches,
            |b, &branches| {
                let range = || Producer::new(RangeProducer::new(0..1000));
                let producer = (1..branches)
                    .map(|_| range())
                    .fold(range(), Producer::with_branch);
                b.iter(|| try_collect(producer.produce()).unwrap());
            },
        );

        group.bench_with_input(
            BenchmarkId::new("transformer_group", branches),
            branches,
            |b, &branches| {
                let transformer = (1..branches)
                    .map(shift)
                    .try_fold(shift(0), Transformer::with_branch)
                    .unwrap();
                b.iter(|| {
                    let input: Products<i64> = Box::new((0i64..1000).map(Ok::<_, Error>));
                    try_collect(transformer.process(input)).unwrap()
                });
            },
        );
    }

    group.finish();
}

fn bench_flow_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("flow_run");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    for batch_size in [10, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::new("async_batch_size", batch_size),
            batch_size,
            |b, &batch_size| {
                b.iter(|| {
                    runtime.block_on(async {
                        Producer::new(RangeProducer::new(0..10000))
                            .then(shift(1))
                            .into_flow(CountConsumer::new())
                            .batch_size(batch_size)
                            .run()
                            .await
                            .unwrap()
                    })
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("sync_batch_size", batch_size),
            batch_size,
            |b, &batch_size| {
                b.iter(|| {
                    Producer::new(RangeProducer::new(0..10000))
                        .then(shift(1))
                        .into_flow(CountConsumer::new())
                        .batch_size(batch_size)
                        .run_sync()
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_serial_chain,
    bench_concurrent_groups,
    bench_flow_run
);
criterion_main!(benches);
