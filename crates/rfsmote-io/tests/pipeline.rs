//! End-to-end integration tests: CSV -> dataset -> importance CSV / PNG / metrics JSON.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rfsmote_io::{
    AverageScore, ClassScore, DatasetReader, FeatureScore, IMPORTANCES_CSV, IMPORTANCES_PNG,
    ImportanceChart, IoError, ReportWriter, RunMetrics,
};
use tempfile::TempDir;

/// Path to the test fixture directory.
fn fixture_path(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn fixture_loads_numeric_columns() {
    let dataset = DatasetReader::new(&fixture_path("indicators_12.csv"), "Diabetes_012")
        .read()
        .expect("fixture should parse");

    assert_eq!(dataset.n_samples(), 12);
    assert_eq!(dataset.feature_names(), ["HighBP", "BMI", "Smoker", "Age"]);
    assert_eq!(dataset.dropped_columns(), ["Region"]);
    assert_eq!(dataset.labels()[..6], [0; 6]);
    assert_eq!(dataset.labels()[6..8], [1, 1]);
    assert_eq!(dataset.labels()[8..], [2; 4]);
    assert_eq!(dataset.features()[7], vec![1.0, 30.5, 0.0, 8.0]);
}

#[test]
fn wrong_target_is_reported() {
    let err = DatasetReader::new(&fixture_path("indicators_12.csv"), "Outcome")
        .read()
        .unwrap_err();
    assert!(matches!(err, IoError::MissingTargetColumn { ref target, .. } if target == "Outcome"));
}

#[test]
fn artifacts_round_trip() {
    let dataset = DatasetReader::new(&fixture_path("indicators_12.csv"), "Diabetes_012")
        .read()
        .unwrap();
    let ranked: Vec<(&str, f64)> = dataset
        .feature_names()
        .iter()
        .map(String::as_str)
        .zip([0.45, 0.3, 0.05, 0.2])
        .collect();
    let mut ranked_sorted = ranked.clone();
    ranked_sorted.sort_by(|a, b| b.1.total_cmp(&a.1));

    let dir = TempDir::new().unwrap();
    let writer = ReportWriter::new(&dir.path().join("out")).unwrap();

    // 1. Importance table
    let csv_path = writer.write_importances(&ranked_sorted).unwrap();
    assert_eq!(csv_path, dir.path().join("out").join(IMPORTANCES_CSV));
    let mut rdr = csv::Reader::from_path(&csv_path).unwrap();
    let rows: Vec<(String, f64)> = rdr.deserialize().map(Result::unwrap).collect();
    assert_eq!(rows[0], ("HighBP".to_string(), 0.45));
    assert_eq!(rows[3], ("Smoker".to_string(), 0.05));
    let total: f64 = rows.iter().map(|r| r.1).sum();
    assert!((total - 1.0).abs() < 1e-12);

    // 2. Chart
    let png_path = writer
        .write_chart(&ImportanceChart::default().with_top_n(3), &ranked_sorted)
        .unwrap();
    assert_eq!(png_path.file_name().unwrap(), IMPORTANCES_PNG);
    assert!(fs::metadata(&png_path).unwrap().len() > 0);

    // 3. Metrics JSON
    let labels = [0usize, 1, 2];
    let matrix = vec![vec![6usize, 0, 0], vec![0, 1, 1], vec![0, 0, 4]];
    let metrics = RunMetrics {
        accuracy: 11.0 / 12.0,
        classes: labels
            .iter()
            .map(|&class| ClassScore {
                class,
                precision: 1.0,
                recall: 1.0,
                f1: 1.0,
                support: matrix[class].iter().sum(),
            })
            .collect(),
        macro_avg: AverageScore {
            precision: 1.0,
            recall: 1.0,
            f1: 1.0,
        },
        weighted_avg: AverageScore {
            precision: 1.0,
            recall: 1.0,
            f1: 1.0,
        },
        labels: &labels,
        confusion_matrix: &matrix,
        class_distribution: BTreeMap::from([
            ("full", BTreeMap::from([(0, 6), (1, 2), (2, 4)])),
            ("train", BTreeMap::from([(0, 4), (1, 1), (2, 3)])),
        ]),
        importances: ranked_sorted
            .iter()
            .enumerate()
            .map(|(i, &(feature, importance))| FeatureScore {
                feature,
                importance,
                rank: i + 1,
            })
            .collect(),
    };
    let json_path = dir.path().join("metrics.json");
    writer.write_metrics(&json_path, &metrics).unwrap();

    let content: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(content["labels"].as_array().unwrap().len(), 3);
    assert_eq!(content["classes"][2]["support"], 4);
    assert_eq!(content["class_distribution"]["full"]["1"], 2);
    assert_eq!(content["importances"][0]["feature"], "HighBP");
    assert_eq!(content["importances"][3]["rank"], 4);
}
