//! Rebalancing a labeled dataset before training.
//!
//! Class counting, seeded stratified train/test splitting, SMOTE
//! oversampling with a parallel same-class neighbor search, and a seeded
//! row cap. Every random draw comes from a `ChaCha8Rng` seeded by the
//! caller, so results are reproducible for any rayon pool size.

mod cap;
mod counts;
mod error;
mod shape;
mod smote;
mod split;

pub use cap::RowCap;
pub use counts::ClassCounts;
pub use error::ResampleError;
pub use smote::{Resampled, SamplingStrategy, SmoteConfig};
pub use split::{StratifiedSplit, TrainTestSplit};
