//! Raw per-image detection targets produced by a wrapped detector.

use ndarray::{Array1, Array2, ArrayD, ArrayView1, Ix1, Ix2};

use super::{AxisAlignedBox, ClassId};
use crate::error::{AdapterError, Result};

/// Confidence scores attached to a target's detected objects.
#[derive(Debug, Clone, PartialEq)]
pub enum Scores {
    /// One confidence per object, aligned with the target's labels.
    Single(Array1<f32>),
    /// One row of per-class scores per object; the column index is the class id.
    Multiclass(Array2<f32>),
}

impl Scores {
    /// Classify a dynamic score array by rank.
    pub fn from_dyn(scores: ArrayD<f32>) -> Result<Self> {
        let actual = scores.shape().to_vec();
        let mismatch = || AdapterError::ScoreShapeMismatch {
            expected: "rank 1 or rank 2 scores".to_string(),
            actual: actual.clone(),
        };
        match scores.ndim() {
            1 => Ok(Scores::Single(
                scores.into_dimensionality::<Ix1>().map_err(|_| mismatch())?,
            )),
            2 => Ok(Scores::Multiclass(
                scores.into_dimensionality::<Ix2>().map_err(|_| mismatch())?,
            )),
            _ => Err(mismatch()),
        }
    }

    /// Number of objects the scores describe.
    pub fn len(&self) -> usize {
        match self {
            Scores::Single(scores) => scores.len(),
            Scores::Multiclass(scores) => scores.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_multiclass(&self) -> bool {
        matches!(self, Scores::Multiclass(_))
    }
}

impl From<Array1<f32>> for Scores {
    fn from(scores: Array1<f32>) -> Self {
        Scores::Single(scores)
    }
}

impl From<Array2<f32>> for Scores {
    fn from(scores: Array2<f32>) -> Self {
        Scores::Multiclass(scores)
    }
}

/// Detections for a single image: boxes, labels and scores.
///
/// Shapes are validated on construction. Single-label scores must align with
/// both boxes and labels. Multiclass scores must have one row per box; the
/// labels of a multiclass target are informational and may differ in length.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionTarget {
    boxes: Array2<f32>,
    labels: Array1<ClassId>,
    scores: Scores,
}

impl DetectionTarget {
    pub fn new(
        boxes: Array2<f32>,
        labels: Array1<ClassId>,
        scores: impl Into<Scores>,
    ) -> Result<Self> {
        let scores = scores.into();
        let num_boxes = boxes.nrows();

        if boxes.ncols() != 4 && !(num_boxes == 0 && boxes.ncols() == 0) {
            return Err(AdapterError::BoxShapeMismatch {
                shape: boxes.shape().to_vec(),
            });
        }

        match &scores {
            Scores::Single(values) => {
                if labels.len() != num_boxes {
                    return Err(AdapterError::LabelCountMismatch {
                        boxes: num_boxes,
                        labels: labels.len(),
                    });
                }
                if values.len() != num_boxes {
                    return Err(AdapterError::ScoreShapeMismatch {
                        expected: format!("({num_boxes},)"),
                        actual: values.shape().to_vec(),
                    });
                }
            }
            Scores::Multiclass(values) => {
                if values.nrows() != num_boxes {
                    return Err(AdapterError::ScoreShapeMismatch {
                        expected: format!("({num_boxes}, C)"),
                        actual: values.shape().to_vec(),
                    });
                }
            }
        }

        Ok(Self {
            boxes,
            labels,
            scores,
        })
    }

    /// Build a target from dynamically shaped arrays, as detectors commonly
    /// produce them. Empty boxes may be given as a rank-1 empty array.
    pub fn from_dyn(
        boxes: ArrayD<f32>,
        labels: Array1<ClassId>,
        scores: ArrayD<f32>,
    ) -> Result<Self> {
        let box_shape = boxes.shape().to_vec();
        let boxes = if boxes.is_empty() {
            Array2::zeros((0, 4))
        } else {
            boxes
                .into_dimensionality::<Ix2>()
                .map_err(|_| AdapterError::BoxShapeMismatch { shape: box_shape })?
        };
        Self::new(boxes, labels, Scores::from_dyn(scores)?)
    }

    /// A target with no detections.
    pub fn empty() -> Self {
        Self {
            boxes: Array2::zeros((0, 4)),
            labels: Array1::zeros(0),
            scores: Scores::Single(Array1::zeros(0)),
        }
    }

    pub fn boxes(&self) -> &Array2<f32> {
        &self.boxes
    }

    pub fn labels(&self) -> &Array1<ClassId> {
        &self.labels
    }

    pub fn scores(&self) -> &Scores {
        &self.scores
    }

    /// Number of detected objects.
    pub fn len(&self) -> usize {
        self.boxes.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Box of object `index` as an axis-aligned box.
    pub fn bbox(&self, index: usize) -> AxisAlignedBox {
        let row: ArrayView1<f32> = self.boxes.row(index);
        AxisAlignedBox::from_tlbr(row[0], row[1], row[2], row[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{IxDyn, array};

    #[test]
    fn test_single_label_target() {
        let target = DetectionTarget::new(
            array![[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]],
            array![0, 2],
            array![0.25f32, 0.75],
        )
        .unwrap();

        assert_eq!(target.len(), 2);
        assert!(!target.scores().is_multiclass());
        assert_eq!(target.bbox(1).to_tlbr(), [5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_multiclass_labels_not_aligned() {
        let target = DetectionTarget::new(
            array![[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]],
            array![0, 2, 0],
            array![[0.25f32, 0.0, 0.75], [0.95, 0.0, 0.0]],
        )
        .unwrap();

        assert!(target.scores().is_multiclass());
        assert_eq!(target.scores().len(), 2);
    }

    #[test]
    fn test_label_count_mismatch() {
        let err = DetectionTarget::new(
            array![[1.0, 2.0, 3.0, 4.0]],
            array![0, 1],
            array![0.5f32],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AdapterError::LabelCountMismatch { boxes: 1, labels: 2 }
        ));
    }

    #[test]
    fn test_score_count_mismatch() {
        let err = DetectionTarget::new(
            array![[1.0, 2.0, 3.0, 4.0]],
            array![0],
            array![[0.5f32, 0.5], [0.1, 0.9]],
        )
        .unwrap_err();
        assert!(matches!(err, AdapterError::ScoreShapeMismatch { .. }));
    }

    #[test]
    fn test_box_shape_mismatch() {
        let err = DetectionTarget::new(array![[1.0, 2.0, 3.0]], array![0], array![0.5f32])
            .unwrap_err();
        assert!(matches!(err, AdapterError::BoxShapeMismatch { .. }));
    }

    #[test]
    fn test_from_dyn_empty() {
        let target = DetectionTarget::from_dyn(
            ArrayD::zeros(IxDyn(&[0])),
            Array1::zeros(0),
            ArrayD::zeros(IxDyn(&[0])),
        )
        .unwrap();
        assert!(target.is_empty());
        assert_eq!(target, DetectionTarget::empty());
    }

    #[test]
    fn test_from_dyn_rejects_rank_three_scores() {
        let err = DetectionTarget::from_dyn(
            ArrayD::zeros(IxDyn(&[1, 4])),
            Array1::zeros(1),
            ArrayD::zeros(IxDyn(&[1, 2, 3])),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AdapterError::ScoreShapeMismatch { ref actual, .. } if actual == &[1, 2, 3]
        ));
    }
}
