//! Sparse feature vectors and training instances

use crate::core::{LinearError, Result};

/// A feature and its value. The index identifies the feature dimension
/// and must be at least 1; index uniqueness within one vector is
/// expected but not enforced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureValue {
    pub index: i32,
    pub value: f64,
}

impl FeatureValue {
    /// Create a new feature value
    pub const fn new(index: i32, value: f64) -> Self {
        Self { index, value }
    }
}

/// A sparse feature vector, represented as a sequence of non-zero
/// features.
pub type FeatureVector = Vec<FeatureValue>;

/// A class label (or regression target) together with its feature
/// vector. The label is an integral class id for classification and the
/// target value for regression.
#[derive(Debug, Clone)]
pub struct TrainingInstance {
    pub label: f64,
    pub features: FeatureVector,
}

impl TrainingInstance {
    /// Create a new training instance
    pub fn new(label: f64, features: FeatureVector) -> Self {
        Self { label, features }
    }
}

/// Convert a dense vector to the sparse representation used by this
/// crate. The features are numbered 1..=n in order, so the following
/// vectors are equal:
///
/// ```
/// use rlinear::{from_dense_vector, FeatureValue};
///
/// assert_eq!(
///     from_dense_vector(&[0.2, 0.1, 0.3, 0.6]),
///     vec![
///         FeatureValue::new(1, 0.2),
///         FeatureValue::new(2, 0.1),
///         FeatureValue::new(3, 0.3),
///         FeatureValue::new(4, 0.6),
///     ]
/// );
/// ```
pub fn from_dense_vector(dense: &[f64]) -> FeatureVector {
    dense
        .iter()
        .enumerate()
        .map(|(idx, &value)| FeatureValue::new(idx as i32 + 1, value))
        .collect()
}

/// Copy of `features` ordered ascending by index; the original is left
/// unmodified. The sort is stable, so duplicate indices keep their
/// relative order.
pub(crate) fn sorted_feature_vector(features: &FeatureVector) -> FeatureVector {
    let mut sorted = features.clone();
    sorted.sort_by_key(|fv| fv.index);
    sorted
}

/// Fail with `InvalidFeatureIndex` if any index is below one. Runs
/// before any native allocation, so a rejected vector never creates
/// partial native state.
pub(crate) fn verify_feature_indices(features: &FeatureVector) -> Result<()> {
    for fv in features {
        if fv.index < 1 {
            return Err(LinearError::InvalidFeatureIndex {
                index: fv.index,
                value: fv.value,
            });
        }
    }
    Ok(())
}
