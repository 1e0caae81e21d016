//! Nearest-centroid classification engine.
//!
//! Training computes the mean input vector of every class; inference
//! returns the class whose centroid is closest in squared Euclidean
//! distance. Simple, fully deterministic, and good enough to exercise
//! the quartile-bucketed strategy end to end.

use serde::{Deserialize, Serialize};
use surrofit_predictor::engine::{BoxedClassifierModel, ClassifierEngine, ClassifierModel};

/// Nearest-centroid classifier engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct CentroidClassifier;

/// Trained centroid model: one optional centroid per class index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidModel {
    centroids: Vec<Option<Vec<f32>>>,
}

impl CentroidModel {
    fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b)
            .map(|(&x, &y)| (x - y) * (x - y))
            .sum()
    }
}

impl ClassifierModel for CentroidModel {
    fn decide(&self, input: &[f32]) -> usize {
        let mut best_class = 0;
        let mut best_distance = f32::INFINITY;
        for (class, centroid) in self.centroids.iter().enumerate() {
            if let Some(centroid) = centroid {
                let distance = Self::squared_distance(input, centroid);
                if distance < best_distance {
                    best_distance = distance;
                    best_class = class;
                }
            }
        }
        best_class
    }

    fn to_blob(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

impl ClassifierEngine for CentroidClassifier {
    #[expect(clippy::cast_precision_loss)]
    fn fit(
        &self,
        inputs: &[Vec<f32>],
        classes: &[usize],
        total_classes: usize,
    ) -> Option<BoxedClassifierModel> {
        if inputs.is_empty() || inputs.len() != classes.len() {
            return None;
        }
        let input_len = inputs[0].len();
        let mut sums = vec![vec![0.0_f32; input_len]; total_classes];
        let mut counts = vec![0_usize; total_classes];
        for (input, &class) in inputs.iter().zip(classes) {
            if class >= total_classes || input.len() != input_len {
                return None;
            }
            for (sum, &value) in sums[class].iter_mut().zip(input) {
                *sum += value;
            }
            counts[class] += 1;
        }

        let centroids = sums
            .into_iter()
            .zip(&counts)
            .map(|(sum, &count)| {
                (count > 0).then(|| {
                    sum.into_iter()
                        .map(|value| value / count as f32)
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        Some(Box::new(CentroidModel { centroids }))
    }

    fn load(&self, blob: &[u8]) -> Option<BoxedClassifierModel> {
        let model: CentroidModel = serde_json::from_slice(blob).ok()?;
        Some(Box::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separable_classes_are_recovered() {
        let inputs = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![10.0, 10.0],
            vec![11.0, 10.0],
        ];
        let classes = vec![0, 0, 3, 3];
        let model = CentroidClassifier.fit(&inputs, &classes, 4).unwrap();

        assert_eq!(model.decide(&[0.5, 0.1]), 0);
        assert_eq!(model.decide(&[10.5, 9.9]), 3);
    }

    #[test]
    fn empty_training_data_yields_no_model() {
        assert!(CentroidClassifier.fit(&[], &[], 4).is_none());
    }

    #[test]
    fn mismatched_labels_yield_no_model() {
        let inputs = vec![vec![1.0]];
        assert!(CentroidClassifier.fit(&inputs, &[0, 1], 4).is_none());
        assert!(CentroidClassifier.fit(&inputs, &[9], 4).is_none());
    }

    #[test]
    fn blob_round_trips_through_the_engine() {
        let inputs = vec![vec![0.0], vec![8.0]];
        let classes = vec![0, 1];
        let model = CentroidClassifier.fit(&inputs, &classes, 2).unwrap();
        let blob = model.to_blob();

        let restored = CentroidClassifier.load(&blob).unwrap();
        assert_eq!(restored.decide(&[0.5]), 0);
        assert_eq!(restored.decide(&[7.0]), 1);
    }

    #[test]
    fn garbage_blob_is_rejected() {
        assert!(CentroidClassifier.load(b"not a model").is_none());
    }
}
