//! Trait for wrapped object detection models.

use std::collections::HashMap;

use ndarray::Array3;

use crate::protocol::{ClassId, DetectionTarget};

/// Descriptive metadata a detector may expose.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelMetadata {
    /// Human-readable model identifier.
    pub id: String,
    /// Display names for the class ids the model predicts.
    pub index_to_label: Option<HashMap<ClassId, String>>,
}

impl ModelMetadata {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            index_to_label: None,
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (ClassId, S)>,
        S: Into<String>,
    {
        self.index_to_label = Some(
            labels
                .into_iter()
                .map(|(id, label)| (id, label.into()))
                .collect(),
        );
        self
    }
}

/// Trait for object detection models wrapped by a `DetectorAdapter`.
///
/// Implement this trait to connect any detection model to the adapter.
///
/// # Example
///
/// ```ignore
/// use detect_interop::{Detector, DetectionTarget};
/// use ndarray::Array3;
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl Detector for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&self, images: &[Array3<u8>]) -> Result<Vec<DetectionTarget>, Self::Error> {
///         // Run inference and return one target per image
///         Ok(images.iter().map(|_| DetectionTarget::empty()).collect())
///     }
/// }
/// ```
pub trait Detector {
    /// Error type for detection failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run inference on a batch of channel-first images.
    ///
    /// # Arguments
    /// * `images` - Images of shape `(C, H, W)`
    ///
    /// # Returns
    /// One `DetectionTarget` per input image, in input order, or an error.
    fn detect(&self, images: &[Array3<u8>]) -> Result<Vec<DetectionTarget>, Self::Error>;

    /// Metadata describing the model, including optional class labels.
    fn metadata(&self) -> ModelMetadata {
        ModelMetadata::default()
    }
}

/// Plain functions and closures are detectors without metadata.
impl<F, E> Detector for F
where
    F: Fn(&[Array3<u8>]) -> Result<Vec<DetectionTarget>, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn detect(&self, images: &[Array3<u8>]) -> Result<Vec<DetectionTarget>, Self::Error> {
        self(images)
    }
}
