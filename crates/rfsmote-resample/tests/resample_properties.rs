//! Property tests for the split → oversample → cap chain on a deterministic
//! three-class dataset shaped like the diabetes indicators table.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use rfsmote_resample::{ClassCounts, RowCap, SamplingStrategy, SmoteConfig, StratifiedSplit};

/// 2000 rows at roughly 84:2:14, four features shifted by class.
fn make_dataset(seed: u64) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::new();
    let mut labels = Vec::new();
    for i in 0..2000 {
        let class = match i % 50 {
            0 => 1,
            1..=7 => 2,
            _ => 0,
        };
        features.push(
            (0..4)
                .map(|f| class as f64 * (f as f64 + 1.0) + rng.r#gen::<f64>())
                .collect(),
        );
        labels.push(class);
    }
    (features, labels)
}

fn run_chain(seed: u64, threads: usize) -> (ClassCounts, ClassCounts, ClassCounts, usize) {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .unwrap();
    pool.install(|| {
        let (features, labels) = make_dataset(1);
        let split = StratifiedSplit::new(0.2)
            .unwrap()
            .with_seed(seed)
            .split(&features, &labels)
            .unwrap();
        let resampled = SmoteConfig::new(SamplingStrategy::NotMajority(600))
            .with_seed(seed)
            .resample(&split.train_features, &split.train_labels)
            .unwrap();
        let after_smote = ClassCounts::from_labels(&resampled.labels);
        let (capped, capped_labels) = RowCap::new(2000)
            .unwrap()
            .with_seed(seed)
            .apply(resampled.features, resampled.labels)
            .unwrap();
        assert_eq!(capped.len(), capped_labels.len());
        (
            ClassCounts::from_labels(&split.train_labels),
            ClassCounts::from_labels(&split.test_labels),
            after_smote,
            capped.len(),
        )
    })
}

#[test]
fn split_sizes_and_class_presence() {
    let (train, test, _, _) = run_chain(42, 2);
    assert_eq!(test.total(), 400);
    assert_eq!(train.total(), 1600);
    assert_eq!(test.to_string(), "{0: 336, 1: 8, 2: 56}");
    assert_eq!(train.to_string(), "{0: 1344, 1: 32, 2: 224}");
}

#[test]
fn non_majority_classes_reach_target() {
    let (train, _, after, _) = run_chain(42, 2);
    assert_eq!(after.get(0), train.get(0));
    assert_eq!(after.get(1), 600);
    assert_eq!(after.get(2), 600);
}

#[test]
fn cap_bounds_total() {
    let (_, _, after, capped) = run_chain(42, 2);
    assert_eq!(after.total(), 1344 + 600 + 600);
    assert_eq!(capped, 2000);
}

#[test]
fn distributions_independent_of_thread_count() {
    assert_eq!(run_chain(7, 1), run_chain(7, 4));
}

#[test]
fn smote_rows_reproducible_across_pools() {
    let (features, labels) = make_dataset(2);
    let run = |threads| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap()
            .install(|| {
                SmoteConfig::new(SamplingStrategy::NotMajority(500))
                    .resample(&features, &labels)
                    .unwrap()
                    .features
            })
    };
    assert_eq!(run(1), run(3));
}
