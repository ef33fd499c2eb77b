use serde::{Deserialize, Serialize};

/// Zero-based feature column index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based column.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Position of a node in its tree's arena. The root is always 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) const ROOT: NodeIndex = NodeIndex(0);

    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the arena position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Class-weighted Gini or Entropy impurity.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Impurity(f64);

impl Impurity {
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

/// What reached a node during growth.
///
/// `n_samples` counts bootstrap rows, duplicates included; `weight` is the
/// same rows' class-weighted mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeStats {
    /// Impurity of the rows before any split.
    pub impurity: Impurity,
    /// Bootstrap rows at the node.
    pub n_samples: usize,
    /// Class-weighted mass at the node.
    pub weight: f64,
}

/// A node in a decision tree arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    /// Rows with `feature <= threshold` descend to `left`, the rest to `right`.
    Split {
        /// Column tested.
        feature: FeatureIndex,
        /// Split point.
        threshold: f64,
        /// Child for `<= threshold`.
        left: NodeIndex,
        /// Child for `> threshold`.
        right: NodeIndex,
        /// `weight * impurity` minus the same for both children.
        impurity_decrease: f64,
        /// Rows reaching this node.
        stats: NodeStats,
    },
    /// A terminal node carrying the weighted class distribution.
    Leaf {
        /// First class with the largest weighted mass.
        prediction: usize,
        /// Weighted class mass normalized to sum to 1.
        distribution: Vec<f64>,
        /// Rows reaching this node.
        stats: NodeStats,
    },
}

impl Node {
    /// Return what reached this node.
    #[must_use]
    pub fn stats(&self) -> &NodeStats {
        match self {
            Node::Split { stats, .. } | Node::Leaf { stats, .. } => stats,
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}
