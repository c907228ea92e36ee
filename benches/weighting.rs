use criterion::Criterion;
use grb_likelihood::{
    CountsTrait, EventsCounter, ResponseMatrixWeighter, TimeInterval, TimeIntervalTable,
    WeighterSettings,
};
use grb_likelihood_test_util::{
    GBM_INSTRUMENT, event_counts, poisson_arrival_times, response_library,
};
use rand::prelude::*;
use std::hint::black_box;

pub fn bench_counts(c: &mut Criterion) {
    let times = poisson_arrival_times(1000.0, 0.0, 1000.0, 0);
    let counter = EventsCounter::from_counts_file(&event_counts(times, GBM_INSTRUMENT)).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    let spans: Vec<_> = (0..1000)
        .map(|_| {
            let a = rng.random_range(1.0..900.0);
            (a, a + rng.random_range(0.0..99.0))
        })
        .collect();

    c.bench_function("Count events within 1000 spans of 10^6 events", |b| {
        b.iter(|| {
            spans
                .iter()
                .map(|&(a, b)| counter.count(black_box(a), black_box(b)).unwrap())
                .sum::<f64>()
        });
    });
}

pub fn bench_weighting(c: &mut Criterion) {
    const N_CHANNELS: usize = 128;

    let library = response_library(100, 0.0, 30.0, N_CHANNELS, GBM_INSTRUMENT);
    let times = poisson_arrival_times(100.0, 0.0, 3000.0, 1);
    let counter = EventsCounter::from_counts_file(&event_counts(times, GBM_INSTRUMENT)).unwrap();
    let bins = (0..50).map(|i| {
        TimeInterval::new(f64::from(i) * 50.0 + 7.0, f64::from(i + 1) * 50.0 + 7.0).unwrap()
    });
    let table = TimeIntervalTable::new(bins, &counter).unwrap();
    let weighter = ResponseMatrixWeighter::new(WeighterSettings::default());

    c.bench_function("Weight 128-channel matrices for 50 intervals", |b| {
        b.iter(|| {
            weighter
                .run(
                    black_box(&library),
                    "library.json",
                    &table,
                    &counter,
                    GBM_INSTRUMENT,
                )
                .unwrap()
        });
    });
}
