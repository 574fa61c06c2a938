use criterion::{criterion_group, criterion_main, Criterion};
use markerforge::candidates::{self, SamplingMode, Strategy};
use markerforge::pairwise::loader::load_two_point;
use markerforge::types::{Item, MappedOrder, Order};
use markerforge::estimator::MapEstimator;
use std::hint::black_box;
use std::io::Cursor;

fn chain_csv(n: usize) -> String {
    let mut csv = String::from("marker_a,marker_b,rf,lod\n");
    for a in 0..n {
        for b in a + 1..n {
            let d = (b - a) as f64;
            csv.push_str(&format!(
                "m{},m{},{},{}\n",
                a,
                b,
                (0.02 * d).min(0.5),
                (12.0 - d).max(0.1)
            ));
        }
    }
    csv
}

fn criterion_benchmark(c: &mut Criterion) {
    let order = Order::new((0..12 as Item).collect()).expect("unique items");
    let mut rng = fastrand::Rng::with_seed(1);

    c.bench_function("exhaustive ws=6", |b| {
        b.iter(|| {
            candidates::generate(black_box(&order), 3, 6, &Strategy::Exhaustive, &mut rng)
        })
    });

    c.bench_function("pairwise ws=6 with reverse", |b| {
        b.iter(|| {
            candidates::generate(
                black_box(&order),
                3,
                6,
                &Strategy::Pairwise { reverse: true },
                &mut rng,
            )
        })
    });

    let similar = Strategy::Sampled {
        n: Some(60),
        mode: SamplingMode::Similar,
    };
    c.bench_function("sampled 60 of ws=6", |b| {
        b.iter(|| candidates::generate(black_box(&order), 3, 6, &similar, &mut rng))
    });

    let table = load_two_point(Cursor::new(chain_csv(40))).expect("Failed to load table");
    let long = Order::new(table.items()).expect("unique items");
    c.bench_function("two-point map (40 markers)", |b| {
        b.iter(|| {
            let fit = table
                .estimate_map(black_box(&long), 1e-3, 1)
                .expect("complete table");
            MappedOrder::new(long.clone(), fit)
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
