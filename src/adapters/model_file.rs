//! JSON model file format.
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "feature_layout": "extended",
//!   "max_depth": 15,
//!   "tree": { "nodes": [ {"split": {"feature": 0, "threshold": 1.5, "left": 1, "right": 2}},
//!                        {"leaf": {"value": 420.0}},
//!                        {"leaf": {"value": 910.0}} ] }
//! }
//! ```
//!
//! `tree` may also be a nested object, `{"type": "split", "feature": 0,
//! "threshold": 1.5, "left": {...}, "right": {...}}` / `{"type": "leaf",
//! "value": 420.0}`, which is flattened into the node arena on load.

use crate::core::features::FeatureLayout;
use crate::core::model::TreeModel;
use crate::core::tree::{DecisionTree, Node, DEFAULT_MAX_DEPTH};
use crate::domain::ports::ModelSource;
use crate::utils::error::{IntegrityError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

/// Model location used when nothing else is configured.
pub const DEFAULT_MODEL_PATH: &str = "decision_tree.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub format_version: u32,
    #[serde(default)]
    pub feature_layout: FeatureLayout,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    pub tree: TreeRepr,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeRepr {
    Arena { nodes: Vec<Node> },
    Nested(NestedNode),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NestedNode {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<NestedNode>,
        right: Box<NestedNode>,
    },
    Leaf {
        value: f64,
    },
}

impl NestedNode {
    /// Appends this subtree in pre-order and returns the index of its root.
    fn flatten_into(&self, nodes: &mut Vec<Node>) -> usize {
        let index = nodes.len();
        match self {
            Self::Leaf { value } => nodes.push(Node::leaf(*value)),
            Self::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                // Placeholder until both children have indices.
                nodes.push(Node::leaf(0.0));
                let l = left.flatten_into(nodes);
                let r = right.flatten_into(nodes);
                nodes[index] = Node::split(*feature, *threshold, l, r);
            }
        }
        index
    }
}

impl TreeRepr {
    fn into_nodes(self) -> Vec<Node> {
        match self {
            Self::Arena { nodes } => nodes,
            Self::Nested(root) => {
                let mut nodes = Vec::new();
                root.flatten_into(&mut nodes);
                nodes
            }
        }
    }
}

impl ModelFile {
    pub fn from_model(model: &TreeModel) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            feature_layout: model.layout(),
            max_depth: model.tree().max_depth(),
            tree: TreeRepr::Arena {
                nodes: model.tree().nodes().to_vec(),
            },
        }
    }

    pub fn into_model(self) -> std::result::Result<TreeModel, IntegrityError> {
        if self.format_version != FORMAT_VERSION {
            return Err(IntegrityError::UnsupportedVersion {
                found: self.format_version,
                expected: FORMAT_VERSION,
            });
        }
        let tree = DecisionTree::new(self.tree.into_nodes(), self.max_depth);
        TreeModel::new(self.feature_layout, tree)
    }
}

pub fn decode(bytes: &[u8]) -> std::result::Result<TreeModel, IntegrityError> {
    let file: ModelFile = serde_json::from_slice(bytes).map_err(|e| IntegrityError::Malformed {
        message: e.to_string(),
    })?;
    file.into_model()
}

pub fn encode(model: &TreeModel) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ModelFile::from_model(model))?)
}

/// Reads and decodes a model from `source`.
pub fn load_model<S: ModelSource + ?Sized>(source: &S) -> Result<TreeModel> {
    let bytes = source.read_model()?;
    let model = decode(&bytes)?;
    tracing::debug!("Loaded model from {}: {}", source.describe(), model.summary());
    Ok(model)
}

#[derive(Debug, Clone)]
pub struct LocalModelFile {
    path: PathBuf,
}

impl LocalModelFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelSource for LocalModelFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read_model(&self) -> Result<Vec<u8>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(IntegrityError::MissingModel {
                path: self.describe(),
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Model bytes held in memory, mostly for tests and embedding.
#[derive(Debug, Clone)]
pub struct InMemoryModel {
    bytes: Vec<u8>,
}

impl InMemoryModel {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl ModelSource for InMemoryModel {
    fn describe(&self) -> String {
        format!("<memory: {} bytes>", self.bytes.len())
    }

    fn read_model(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}
