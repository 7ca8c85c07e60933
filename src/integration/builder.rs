//! Builder for assembling a `DetectionTarget` object by object.

use ndarray::{Array1, Array2};

use crate::error::{AdapterError, Result};
use crate::protocol::{AxisAlignedBox, ClassId, DetectionTarget, Scores};

#[derive(Debug, Clone)]
enum ObjectScore {
    Single(f32),
    PerClass(Vec<f32>),
}

/// Builder for creating `DetectionTarget` objects from individual detections.
///
/// All objects must carry the same kind of score: either one confidence each
/// or a per-class score row of a common width.
#[derive(Debug, Clone, Default)]
pub struct TargetBuilder {
    boxes: Vec<AxisAlignedBox>,
    labels: Vec<ClassId>,
    scores: Vec<ObjectScore>,
}

impl TargetBuilder {
    /// Create a new, empty target builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object with a single confidence score.
    pub fn object(mut self, bbox: AxisAlignedBox, label: ClassId, score: f32) -> Self {
        self.boxes.push(bbox);
        self.labels.push(label);
        self.scores.push(ObjectScore::Single(score));
        self
    }

    /// Add an object with one score per class, indexed by class id.
    pub fn object_with_class_scores(
        mut self,
        bbox: AxisAlignedBox,
        label: ClassId,
        class_scores: impl Into<Vec<f32>>,
    ) -> Self {
        self.boxes.push(bbox);
        self.labels.push(label);
        self.scores.push(ObjectScore::PerClass(class_scores.into()));
        self
    }

    /// Add an object given as TLBR coordinates (x1, y1, x2, y2).
    pub fn tlbr(self, tlbr: [f32; 4], label: ClassId, score: f32) -> Self {
        self.object(AxisAlignedBox::from(tlbr), label, score)
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Build the final `DetectionTarget`.
    pub fn build(self) -> Result<DetectionTarget> {
        if self.boxes.is_empty() {
            return Ok(DetectionTarget::empty());
        }

        let num_objects = self.boxes.len();
        let boxes = Array2::from_shape_vec(
            (num_objects, 4),
            self.boxes.iter().flat_map(|bbox| bbox.to_tlbr()).collect(),
        )
        .map_err(|_| AdapterError::BoxShapeMismatch {
            shape: vec![num_objects, 4],
        })?;
        let labels = Array1::from(self.labels);
        let scores = Self::collect_scores(self.scores)?;

        DetectionTarget::new(boxes, labels, scores)
    }

    fn collect_scores(scores: Vec<ObjectScore>) -> Result<Scores> {
        let num_objects = scores.len();
        let row_width = match &scores[0] {
            ObjectScore::Single(_) => None,
            ObjectScore::PerClass(first) => Some(first.len()),
        };
        match row_width {
            None => scores
                .into_iter()
                .map(|score| match score {
                    ObjectScore::Single(value) => Ok(value),
                    ObjectScore::PerClass(row) => Err(AdapterError::ScoreShapeMismatch {
                        expected: "a single score".to_string(),
                        actual: vec![row.len()],
                    }),
                })
                .collect::<Result<Vec<f32>>>()
                .map(|values| Scores::Single(Array1::from(values))),
            Some(num_classes) => {
                let mut flat = Vec::with_capacity(num_objects * num_classes);
                for score in scores {
                    match score {
                        ObjectScore::PerClass(row) if row.len() == num_classes => {
                            flat.extend(row)
                        }
                        ObjectScore::PerClass(row) => {
                            return Err(AdapterError::ScoreShapeMismatch {
                                expected: format!("{num_classes} class scores"),
                                actual: vec![row.len()],
                            });
                        }
                        ObjectScore::Single(_) => {
                            return Err(AdapterError::ScoreShapeMismatch {
                                expected: format!("{num_classes} class scores"),
                                actual: vec![],
                            });
                        }
                    }
                }
                Array2::from_shape_vec((num_objects, num_classes), flat)
                    .map(Scores::Multiclass)
                    .map_err(|_| AdapterError::ScoreShapeMismatch {
                        expected: format!("({num_objects}, {num_classes})"),
                        actual: vec![],
                    })
            }
        }
    }
}
