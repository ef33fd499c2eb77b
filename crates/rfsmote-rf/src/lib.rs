//! Class-weighted Random Forest classification: train, predict, evaluate.
//!
//! CART decision trees with weighted Gini/Entropy impurity, exact or
//! histogram split search, bootstrap aggregation trained in parallel via
//! rayon, mean-decrease-in-impurity feature importance, a text
//! classification report, and bincode model persistence.

mod class_weight;
mod config;
mod confusion;
mod error;
mod forest;
mod histogram;
mod importance;
mod node;
mod predict;
mod report;
mod result;
mod serialize;
mod split;
mod tree;

pub use class_weight::ClassWeight;
pub use config::{MaxFeatures, RandomForestConfig};
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use error::RfError;
pub use forest::RandomForest;
pub use importance::RankedFeature;
pub use node::{FeatureIndex, Impurity, Node, NodeIndex, NodeStats};
pub use predict::ClassDistribution;
pub use report::{AverageMetrics, ClassificationReport};
pub use result::{RandomForestResult, TrainingMetadata};
pub use split::{SplitCriterion, SplitMethod};
pub use tree::{DecisionTree, DecisionTreeConfig};
