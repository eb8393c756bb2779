//! Decision tree storage and traversal.
//!
//! Nodes live in a flat arena with the root at index 0; split nodes refer to
//! their children by index. Every child has exactly one parent.

use crate::utils::error::IntegrityError;
use serde::{Deserialize, Serialize};

/// Depth the shipped models are trained to.
pub const DEFAULT_MAX_DEPTH: usize = 15;

/// A node in a decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Node {
    /// Go to `left` if `features[feature] <= threshold`, else to `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { value: f64 },
}

impl Node {
    pub fn split(feature: usize, threshold: f64, left: usize, right: usize) -> Self {
        Self::Split {
            feature,
            threshold,
            left,
            right,
        }
    }

    pub fn leaf(value: f64) -> Self {
        Self::Leaf { value }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    max_depth: usize,
}

impl DecisionTree {
    /// Wraps `nodes` without checking them; see [`DecisionTree::validate`].
    pub fn new(nodes: Vec<Node>, max_depth: usize) -> Self {
        Self { nodes, max_depth }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Number of splits on the longest root-to-leaf path.
    ///
    /// Only meaningful for a tree that passed [`DecisionTree::validate`].
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut deepest = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            match self.nodes.get(index) {
                Some(Node::Split { left, right, .. }) if depth < self.max_depth => {
                    stack.push((*left, depth + 1));
                    stack.push((*right, depth + 1));
                }
                _ => deepest = deepest.max(depth),
            }
        }
        deepest
    }

    /// Walks the tree for one feature vector.
    ///
    /// At most `max_depth` comparisons are made; a tree that needs more (or
    /// loops back on itself) is reported as [`IntegrityError::DepthExceeded`].
    pub fn evaluate(&self, features: &[f64]) -> Result<f64, IntegrityError> {
        let mut index = 0;
        let mut parent = None;

        for _ in 0..=self.max_depth {
            let node = match self.nodes.get(index) {
                Some(node) => node,
                None => {
                    return Err(match parent {
                        None => IntegrityError::EmptyTree,
                        Some(p) => IntegrityError::MissingChild {
                            node: p,
                            child: index,
                            len: self.nodes.len(),
                        },
                    })
                }
            };

            match node {
                Node::Leaf { value } => {
                    return if value.is_finite() {
                        Ok(*value)
                    } else {
                        Err(IntegrityError::NonFinite { node: index })
                    };
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = features
                        .get(*feature)
                        .ok_or(IntegrityError::FeatureOutOfRange {
                            node: index,
                            feature: *feature,
                            available: features.len(),
                        })?;
                    parent = Some(index);
                    index = if *x <= *threshold { *left } else { *right };
                }
            }
        }

        Err(IntegrityError::DepthExceeded {
            max_depth: self.max_depth,
        })
    }

    /// Checks every node reachable from the root against the properties
    /// [`DecisionTree::evaluate`] relies on.
    pub fn validate(&self, n_features: usize) -> Result<(), IntegrityError> {
        if self.nodes.is_empty() {
            return Err(IntegrityError::EmptyTree);
        }

        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![(0usize, 0usize)];
        seen[0] = true;

        while let Some((index, depth)) = stack.pop() {
            match &self.nodes[index] {
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(IntegrityError::NonFinite { node: index });
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if depth >= self.max_depth {
                        return Err(IntegrityError::DepthExceeded {
                            max_depth: self.max_depth,
                        });
                    }
                    if *feature >= n_features {
                        return Err(IntegrityError::FeatureOutOfRange {
                            node: index,
                            feature: *feature,
                            available: n_features,
                        });
                    }
                    if !threshold.is_finite() {
                        return Err(IntegrityError::NonFinite { node: index });
                    }
                    for &child in [left, right] {
                        if child >= self.nodes.len() {
                            return Err(IntegrityError::MissingChild {
                                node: index,
                                child,
                                len: self.nodes.len(),
                            });
                        }
                        if seen[child] {
                            return Err(IntegrityError::Malformed {
                                message: format!(
                                    "node {} is referenced more than once (from node {})",
                                    child, index
                                ),
                            });
                        }
                        seen[child] = true;
                        stack.push((child, depth + 1));
                    }
                }
            }
        }

        let unreachable = seen.iter().filter(|s| !**s).count();
        if unreachable > 0 {
            tracing::debug!("Tree has {} unreachable nodes", unreachable);
        }

        Ok(())
    }
}
