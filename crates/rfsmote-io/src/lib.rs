//! File I/O for the rfsmote pipeline: dataset loading and report artifacts.

mod chart;
mod domain;
mod error;
mod reader;
mod writer;

pub use chart::ImportanceChart;
pub use domain::{AverageScore, ClassScore, FeatureScore, LabeledDataset, RunMetrics};
pub use error::IoError;
pub use reader::DatasetReader;
pub use writer::{IMPORTANCES_CSV, IMPORTANCES_PNG, ReportWriter};
