use crate::core::features::{FeatureLayout, FeatureVector};
use crate::core::tree::DecisionTree;
use crate::domain::model::InputTriple;
use crate::domain::ports::Predictor;
use crate::utils::error::IntegrityError;

/// A validated tree together with the feature layout it was trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeModel {
    layout: FeatureLayout,
    tree: DecisionTree,
}

impl TreeModel {
    pub fn new(layout: FeatureLayout, tree: DecisionTree) -> Result<Self, IntegrityError> {
        tree.validate(layout.width())?;
        Ok(Self { layout, tree })
    }

    pub fn layout(&self) -> FeatureLayout {
        self.layout
    }

    pub fn tree(&self) -> &DecisionTree {
        &self.tree
    }

    pub fn features(&self, input: &InputTriple) -> FeatureVector {
        FeatureVector::extract(input, self.layout)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} nodes, {} leaves, depth {} (max {}), {} layout with {} features",
            self.tree.len(),
            self.tree.leaf_count(),
            self.tree.depth(),
            self.tree.max_depth(),
            self.layout,
            self.layout.width()
        )
    }
}

impl Predictor for TreeModel {
    fn predict(&self, input: &InputTriple) -> Result<f64, IntegrityError> {
        let features = self.features(input);
        if tracing::enabled!(tracing::Level::TRACE) {
            for (name, value) in features.named() {
                tracing::trace!(feature = name, value, "Feature");
            }
        }
        self.tree.evaluate(features.as_slice())
    }

    fn describe(&self) -> String {
        self.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree::{Node, DEFAULT_MAX_DEPTH};

    #[test]
    fn test_new_validates_against_layout() {
        // Feature 13 exists in the extended layout only.
        let tree = DecisionTree::new(
            vec![Node::split(13, 5.0, 1, 2), Node::leaf(1.0), Node::leaf(2.0)],
            DEFAULT_MAX_DEPTH,
        );
        assert!(TreeModel::new(FeatureLayout::Extended, tree.clone()).is_ok());
        assert!(matches!(
            TreeModel::new(FeatureLayout::Compact, tree),
            Err(IntegrityError::FeatureOutOfRange { feature: 13, available: 12, .. })
        ));
    }

    #[test]
    fn test_predict_uses_layout() {
        // Index 9 is days_squared in the extended layout, log_days in compact.
        let tree = DecisionTree::new(
            vec![Node::split(9, 4.0, 1, 2), Node::leaf(10.0), Node::leaf(20.0)],
            DEFAULT_MAX_DEPTH,
        );
        let input = InputTriple::new(3, 0.0, 0.0);
        let extended = TreeModel::new(FeatureLayout::Extended, tree.clone()).unwrap();
        let compact = TreeModel::new(FeatureLayout::Compact, tree).unwrap();
        assert_eq!(extended.predict(&input), Ok(20.0));
        assert_eq!(compact.predict(&input), Ok(10.0));
    }

    #[test]
    fn test_model_as_predictor() {
        let tree = DecisionTree::new(
            vec![Node::split(0, 2.0, 1, 2), Node::leaf(1.0), Node::leaf(2.0)],
            DEFAULT_MAX_DEPTH,
        );
        let model = TreeModel::new(FeatureLayout::Compact, tree).unwrap();
        let predictor: &dyn Predictor = &model;
        assert_eq!(predictor.predict(&InputTriple::new(3, 0.0, 0.0)), Ok(2.0));
        assert_eq!(predictor.predict(&InputTriple::new(2, 0.0, 0.0)), Ok(1.0));
        assert_eq!(predictor.describe(), model.summary());
    }

    #[test]
    fn test_summary() {
        let model = TreeModel::new(
            FeatureLayout::Compact,
            DecisionTree::new(vec![Node::leaf(1.0)], DEFAULT_MAX_DEPTH),
        )
        .unwrap();
        assert_eq!(
            model.summary(),
            "1 nodes, 1 leaves, depth 0 (max 15), compact layout with 12 features"
        );
    }
}
