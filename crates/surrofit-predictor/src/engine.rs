//! Capability interfaces for the bound learning engines.
//!
//! The concrete learning algorithms (tree induction, network
//! backpropagation) live outside this crate. Strategies only ever see
//! these traits, so any engine can be substituted without touching
//! orchestration logic. Models cross the persistence boundary as opaque
//! blobs: `to_blob` on the model, `load` on the engine that produced it.

/// A trained classification model.
pub trait ClassifierModel: Send {
    /// Returns the predicted class index for an input vector.
    fn decide(&self, input: &[f32]) -> usize;

    /// Serializes the model into an opaque blob.
    fn to_blob(&self) -> Vec<u8>;
}

/// Boxed [`ClassifierModel`] trait object.
pub type BoxedClassifierModel = Box<dyn ClassifierModel>;

/// A classification engine: builds a fresh model from labeled samples.
///
/// `fit` returns `None` when the samples admit no usable model (empty or
/// degenerate training split); the caller treats that as non-fatal and
/// keeps whatever model it had.
///
/// Engines are shared by reference across evaluation workers, hence the
/// `Sync` bound; models live behind the predictor lock and only need
/// `Send`.
pub trait ClassifierEngine: Send + Sync {
    /// Trains a model mapping each input vector to its class label in
    /// `0..total_classes`.
    fn fit(
        &self,
        inputs: &[Vec<f32>],
        classes: &[usize],
        total_classes: usize,
    ) -> Option<BoxedClassifierModel>;

    /// Restores a model previously serialized with
    /// [`ClassifierModel::to_blob`].
    fn load(&self, blob: &[u8]) -> Option<BoxedClassifierModel>;
}

/// A trainable regression model, fine-tuned incrementally from its
/// current weights.
pub trait RegressionModel: Send {
    /// Computes normalized outputs for a normalized input vector.
    fn infer(&self, input: &[f32]) -> Vec<f32>;

    /// Runs one training pass over the given normalized samples, updating
    /// the model in place.
    fn train_epoch(&mut self, inputs: &[Vec<f32>], targets: &[Vec<f32>]);

    /// Serializes the model into an opaque blob.
    fn to_blob(&self) -> Vec<u8>;
}

/// Boxed [`RegressionModel`] trait object.
pub type BoxedRegressionModel = Box<dyn RegressionModel>;

/// A regression engine: creates and restores trainable models.
pub trait RegressionEngine: Send + Sync {
    /// Creates a freshly initialized model with the given layer sizes.
    fn create(&self, input_len: usize, output_len: usize) -> BoxedRegressionModel;

    /// Restores a model previously serialized with
    /// [`RegressionModel::to_blob`].
    fn load(&self, blob: &[u8]) -> Option<BoxedRegressionModel>;
}
