//! Criterion benchmarks for rfsmote-rf: class-weighted training and prediction.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use rfsmote_rf::{ClassWeight, RandomForestConfig, SplitMethod};

/// Three classes at a 10:2:1 ratio; the first three columns carry signal.
fn make_imbalanced(n_samples: usize, n_features: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let class = match i % 13 {
            0 => 2,
            1 | 2 => 1,
            _ => 0,
        };
        labels.push(class);
        features.push(
            (0..n_features)
                .map(|f| {
                    let base = if f < 3 { class as f64 * 0.8 } else { 0.0 };
                    base + rng.r#gen::<f64>()
                })
                .collect(),
        );
    }
    let names = (0..n_features).map(|f| format!("f{f}")).collect();
    (features, labels, names)
}

fn bench_train(c: &mut Criterion) {
    let (features, labels, names) = make_imbalanced(2000, 21, 42);
    let mut group = c.benchmark_group("rf_train_2000x21_30trees");
    for (name, method) in [
        ("exact", SplitMethod::Exact),
        ("histogram", SplitMethod::Histogram { n_bins: 64 }),
    ] {
        let cfg = RandomForestConfig::new(30)
            .unwrap()
            .with_max_depth(Some(8))
            .with_class_weight(ClassWeight::Balanced)
            .with_split_method(method)
            .with_seed(42);
        group.bench_function(name, |b| {
            b.iter(|| cfg.fit(&features, &labels, &names).unwrap());
        });
    }
    group.finish();
}

fn bench_predict_batch(c: &mut Criterion) {
    let (features, labels, names) = make_imbalanced(2000, 21, 42);
    let forest = RandomForestConfig::new(30)
        .unwrap()
        .with_max_depth(Some(8))
        .with_seed(42)
        .fit(&features, &labels, &names)
        .unwrap()
        .into_forest();

    c.bench_function("rf_predict_batch_2000x21_30trees", |b| {
        b.iter(|| forest.predict_batch(&features).unwrap());
    });
}

criterion_group!(benches, bench_train, bench_predict_batch);
criterion_main!(benches);
