//! DetectorAdapter translating raw detection targets into scored boxes.

use std::collections::VecDeque;
use std::iter::FusedIterator;

use ndarray::ArrayD;
use tracing::{debug, trace};

use super::config::{AdapterConfig, DetectorRef};
use super::detector::Detector;
use crate::error::{AdapterError, Result};
use crate::protocol::{
    ChannelMode, ClassId, ClassScores, ClassTable, DetectionRecord, DetectionTarget, ImageBatch,
    ScoredBox, Scores,
};

/// Wraps a `Detector` and exposes its output as per-image `DetectionRecord`s.
///
/// The adapter holds no mutable state: every call to `detect_objects` is
/// independent of the previous ones.
pub struct DetectorAdapter<D: Detector> {
    detector: D,
    classes: ClassTable,
    img_batch_size: usize,
    channel_mode: ChannelMode,
}

impl<D: Detector> DetectorAdapter<D> {
    /// Create an adapter for the given class ids.
    ///
    /// Class names are taken from the detector's label metadata; ids it does
    /// not name are displayed as their number.
    pub fn new(detector: D, ids: &[ClassId], img_batch_size: usize) -> Result<Self> {
        let metadata = detector.metadata();
        let classes = ClassTable::from_labels(ids, metadata.index_to_label.as_ref())?;
        Self::with_class_table(detector, classes, img_batch_size)
    }

    /// Create an adapter with an explicit id to name table.
    pub fn with_class_table(
        detector: D,
        classes: ClassTable,
        img_batch_size: usize,
    ) -> Result<Self> {
        if img_batch_size == 0 {
            return Err(AdapterError::InvalidBatchSize(img_batch_size));
        }
        Ok(Self {
            detector,
            classes,
            img_batch_size,
            channel_mode: ChannelMode::default(),
        })
    }

    /// Set how images are normalised before being sent to the detector.
    pub fn with_channel_mode(mut self, channel_mode: ChannelMode) -> Self {
        self.channel_mode = channel_mode;
        self
    }

    /// Rebuilding an adapter from configuration alone is not possible: the
    /// wrapped detector cannot be restored from its description.
    pub fn from_config(_config: &AdapterConfig) -> Result<Self> {
        Err(AdapterError::unsupported(
            "from_config",
            "Constructor arg 'detector' is not configurable",
        ))
    }

    /// Rebuild an adapter from a configuration and a caller-supplied detector.
    pub fn from_config_with(detector: D, config: &AdapterConfig) -> Result<Self> {
        let adapter = if config.class_names.is_empty() {
            Self::new(detector, &config.ids, config.img_batch_size)?
        } else {
            if config.class_names.len() != config.ids.len() {
                return Err(AdapterError::unsupported(
                    "from_config_with",
                    format!(
                        "{} class names for {} ids",
                        config.class_names.len(),
                        config.ids.len()
                    ),
                ));
            }
            let classes = ClassTable::new(
                config
                    .ids
                    .iter()
                    .copied()
                    .zip(config.class_names.iter().cloned()),
            )?;
            Self::with_class_table(detector, classes, config.img_batch_size)?
        };
        Ok(adapter.with_channel_mode(config.channel_mode))
    }

    /// Current configuration. The detector appears only as an opaque reference.
    pub fn get_config(&self) -> AdapterConfig {
        AdapterConfig {
            detector: DetectorRef {
                id: self.detector.metadata().id,
                type_name: std::any::type_name::<D>().to_string(),
            },
            ids: self.classes.ids().collect(),
            class_names: self.classes.iter().map(|(_, name)| name.to_string()).collect(),
            img_batch_size: self.img_batch_size,
            channel_mode: self.channel_mode,
        }
    }

    /// Run the detector over `images` and lazily yield one record per image.
    ///
    /// Images are dispatched in chunks of at most `img_batch_size`; a chunk is
    /// only sent to the detector once the iterator needs its first record.
    ///
    /// A bare `Array3<u8>` converts into a stack of `(H, W)` greyscale images
    /// (`ImageBatch::stacked_greyscale`). Pass a single colour image as
    /// `vec![image]`.
    pub fn detect_objects(&self, images: impl Into<ImageBatch>) -> Detections<'_, D> {
        Detections {
            adapter: self,
            remaining: images.into().into_iter(),
            dispatched: 0,
            chunk_index: 0,
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Run the detector over `images` and collect every record.
    pub fn detect_all(&self, images: impl Into<ImageBatch>) -> Result<Vec<DetectionRecord>> {
        self.detect_objects(images).collect()
    }

    /// Convert one raw target into an output record.
    pub fn convert_target(&self, target: &DetectionTarget) -> Result<DetectionRecord> {
        match target.scores() {
            Scores::Single(scores) => target
                .labels()
                .iter()
                .zip(scores)
                .enumerate()
                .map(|(index, (&label, &score))| {
                    let name = self
                        .classes
                        .name(label)
                        .ok_or(AdapterError::UnknownClassId(label))?;
                    let mut class_scores = ClassScores::with_capacity(1);
                    class_scores.insert(name, score);
                    Ok(ScoredBox::new(target.bbox(index), class_scores))
                })
                .collect(),
            Scores::Multiclass(scores) => {
                let columns = scores.ncols();
                if scores.nrows() > 0 {
                    if let Some(id) = self.classes.ids().find(|&id| id >= columns) {
                        return Err(AdapterError::ClassIdOutOfRange { id, columns });
                    }
                }
                Ok(scores
                    .outer_iter()
                    .enumerate()
                    .map(|(index, row)| {
                        let class_scores = self
                            .classes
                            .iter()
                            .map(|(id, name)| (name, row[id]))
                            .collect();
                        ScoredBox::new(target.bbox(index), class_scores)
                    })
                    .collect())
            }
        }
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    pub fn img_batch_size(&self) -> usize {
        self.img_batch_size
    }

    pub fn channel_mode(&self) -> ChannelMode {
        self.channel_mode
    }
}

impl<D: Detector> std::fmt::Debug for DetectorAdapter<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorAdapter")
            .field("detector", &std::any::type_name::<D>())
            .field("classes", &self.classes)
            .field("img_batch_size", &self.img_batch_size)
            .field("channel_mode", &self.channel_mode)
            .finish()
    }
}

/// Lazy iterator over the records produced by `DetectorAdapter::detect_objects`.
///
/// Yields one `Result<DetectionRecord>` per input image, in input order. The
/// iterator stops after the first error.
pub struct Detections<'a, D: Detector> {
    adapter: &'a DetectorAdapter<D>,
    remaining: std::vec::IntoIter<ArrayD<u8>>,
    dispatched: usize,
    chunk_index: usize,
    pending: VecDeque<Result<DetectionRecord>>,
    finished: bool,
}

impl<D: Detector> Detections<'_, D> {
    /// Dispatch the next chunk and queue its records. Returns false when no
    /// images are left.
    fn dispatch_next_chunk(&mut self) -> Result<bool> {
        let adapter = self.adapter;
        let chunk: Vec<ArrayD<u8>> = self
            .remaining
            .by_ref()
            .take(adapter.img_batch_size)
            .collect();
        if chunk.is_empty() {
            return Ok(false);
        }

        let start = self.dispatched;
        self.dispatched += chunk.len();
        let mut images = Vec::with_capacity(chunk.len());
        let mut invalid = None;
        for (offset, image) in chunk.into_iter().enumerate() {
            match adapter.channel_mode.normalize(start + offset, image) {
                Ok(image) => images.push(image),
                Err(err) => {
                    invalid = Some(err);
                    break;
                }
            }
        }

        // Images ahead of an invalid one are still dispatched.
        if !images.is_empty() {
            debug!(
                chunk = self.chunk_index,
                start,
                size = images.len(),
                "dispatching image chunk"
            );
            self.chunk_index += 1;

            let targets = adapter
                .detector
                .detect(&images)
                .map_err(AdapterError::detector)?;
            if targets.len() != images.len() {
                return Err(AdapterError::TargetCountMismatch {
                    expected: images.len(),
                    actual: targets.len(),
                });
            }

            for (offset, target) in targets.iter().enumerate() {
                let record = adapter.convert_target(target);
                let failed = record.is_err();
                if let Ok(objects) = &record {
                    trace!(
                        image = start + offset,
                        objects = objects.len(),
                        "converted target"
                    );
                }
                self.pending.push_back(record);
                if failed {
                    return Ok(true);
                }
            }
        }

        if let Some(err) = invalid {
            self.pending.push_back(Err(err));
        }
        Ok(true)
    }
}

impl<D: Detector> Iterator for Detections<'_, D> {
    type Item = Result<DetectionRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if self.pending.is_empty() {
            match self.dispatch_next_chunk() {
                Ok(true) => {}
                Ok(false) => {
                    self.finished = true;
                    return None;
                }
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }

        let item = self.pending.pop_front()?;
        if item.is_err() {
            self.finished = true;
            self.pending.clear();
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            (0, Some(self.pending.len() + self.remaining.len()))
        }
    }
}

impl<D: Detector> FusedIterator for Detections<'_, D> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::ModelMetadata;
    use ndarray::{Array3, IxDyn, array};
    use std::cell::RefCell;

    struct MockDetector {
        target: DetectionTarget,
        calls: RefCell<Vec<usize>>,
    }

    impl MockDetector {
        fn new(target: DetectionTarget) -> Self {
            Self {
                target,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Detector for MockDetector {
        type Error = std::convert::Infallible;

        fn detect(
            &self,
            images: &[Array3<u8>],
        ) -> std::result::Result<Vec<DetectionTarget>, Self::Error> {
            self.calls.borrow_mut().push(images.len());
            Ok(vec![self.target.clone(); images.len()])
        }

        fn metadata(&self) -> ModelMetadata {
            ModelMetadata::new("mock").with_labels([(0, "A"), (1, "B"), (2, "C")])
        }
    }

    fn mock_adapter(
        target: DetectionTarget,
        ids: &[ClassId],
        img_batch_size: usize,
    ) -> DetectorAdapter<MockDetector> {
        DetectorAdapter::new(MockDetector::new(target), ids, img_batch_size).unwrap()
    }

    fn single_label_target() -> DetectionTarget {
        DetectionTarget::new(
            array![
                [1.0, 2.0, 3.0, 4.0],
                [1.0, 2.0, 3.0, 4.0],
                [5.0, 6.0, 7.0, 8.0]
            ],
            array![0, 2, 0],
            array![0.25f32, 0.75, 0.95],
        )
        .unwrap()
    }

    #[test]
    fn test_names_from_metadata() {
        let adapter = mock_adapter(DetectionTarget::empty(), &[0, 1, 2], 1);
        assert_eq!(adapter.classes().name(2), Some("C"));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let err = DetectorAdapter::new(MockDetector::new(DetectionTarget::empty()), &[0], 0)
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidBatchSize(0)));
    }

    #[test]
    fn test_convert_single_label() {
        let adapter = mock_adapter(DetectionTarget::empty(), &[0, 1, 2], 1);
        let record = adapter.convert_target(&single_label_target()).unwrap();

        assert_eq!(record.len(), 3);
        assert_eq!(record[1].bbox.to_tlbr(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(record[1].scores.len(), 1);
        assert_eq!(record[1].scores.get("C"), Some(0.75));
    }

    #[test]
    fn test_unknown_label_rejected() {
        let adapter = mock_adapter(DetectionTarget::empty(), &[0, 1], 1);
        let err = adapter.convert_target(&single_label_target()).unwrap_err();
        assert!(matches!(err, AdapterError::UnknownClassId(2)));
    }

    #[test]
    fn test_multiclass_missing_column_rejected() {
        let adapter = mock_adapter(DetectionTarget::empty(), &[0, 1, 2, 3], 1);
        let target = DetectionTarget::new(
            array![[1.0, 2.0, 3.0, 4.0]],
            array![0],
            array![[0.1f32, 0.2, 0.7]],
        )
        .unwrap();
        let err = adapter.convert_target(&target).unwrap_err();
        assert!(matches!(
            err,
            AdapterError::ClassIdOutOfRange { id: 3, columns: 3 }
        ));
    }

    #[test]
    fn test_detector_called_lazily_per_chunk() {
        let adapter = mock_adapter(single_label_target(), &[0, 1, 2], 2);
        let images = vec![Array3::<u8>::zeros((3, 4, 4)); 5];

        let mut detections = adapter.detect_objects(images);
        assert!(adapter.detector().calls.borrow().is_empty());

        assert!(detections.next().unwrap().is_ok());
        assert_eq!(*adapter.detector().calls.borrow(), vec![2]);

        assert_eq!(detections.by_ref().count(), 4);
        assert_eq!(*adapter.detector().calls.borrow(), vec![2, 2, 1]);
        assert!(detections.next().is_none());
    }

    #[test]
    fn test_invalid_image_stops_iteration() {
        let adapter = mock_adapter(DetectionTarget::empty(), &[0], 1);
        let images = vec![
            ArrayD::<u8>::zeros(IxDyn(&[3, 4, 4])),
            ArrayD::<u8>::zeros(IxDyn(&[4])),
            ArrayD::<u8>::zeros(IxDyn(&[3, 4, 4])),
        ];

        let results: Vec<_> = adapter.detect_objects(images).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(AdapterError::InvalidImageShape { index: 1, .. })
        ));
    }

    #[test]
    fn test_images_before_invalid_one_in_chunk_are_dispatched() {
        let adapter = mock_adapter(single_label_target(), &[0, 1, 2], 3);
        let images = vec![
            ArrayD::<u8>::zeros(IxDyn(&[3, 4, 4])),
            ArrayD::<u8>::zeros(IxDyn(&[4, 4])),
            ArrayD::<u8>::zeros(IxDyn(&[4])),
            ArrayD::<u8>::zeros(IxDyn(&[3, 4, 4])),
        ];

        let results: Vec<_> = adapter.detect_objects(images).collect();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().len(), 3);
        assert_eq!(results[1].as_ref().unwrap().len(), 3);
        assert!(matches!(
            results[2],
            Err(AdapterError::InvalidImageShape { index: 2, .. })
        ));
        assert_eq!(*adapter.detector().calls.borrow(), vec![2]);
    }

    #[test]
    fn test_invalid_first_image_in_chunk_skips_detector() {
        let adapter = mock_adapter(single_label_target(), &[0, 1, 2], 2);
        let images = vec![
            ArrayD::<u8>::zeros(IxDyn(&[3, 4, 4])),
            ArrayD::<u8>::zeros(IxDyn(&[3, 4, 4])),
            ArrayD::<u8>::zeros(IxDyn(&[2, 4, 4])),
            ArrayD::<u8>::zeros(IxDyn(&[3, 4, 4])),
        ];

        let results: Vec<_> = adapter.detect_objects(images).collect();
        assert_eq!(results.len(), 3);
        assert!(results[..2].iter().all(|result| result.is_ok()));
        assert!(matches!(
            results[2],
            Err(AdapterError::InvalidImageShape { index: 2, .. })
        ));
        assert_eq!(*adapter.detector().calls.borrow(), vec![2]);
    }

    #[test]
    fn test_get_config_records_classes() {
        let adapter = mock_adapter(DetectionTarget::empty(), &[0, 2], 3)
            .with_channel_mode(ChannelMode::Passthrough);
        let config = adapter.get_config();

        assert_eq!(config.detector.id, "mock");
        assert_eq!(config.ids, vec![0, 2]);
        assert_eq!(config.class_names, vec!["A".to_string(), "C".to_string()]);
        assert_eq!(config.img_batch_size, 3);
        assert_eq!(config.channel_mode, ChannelMode::Passthrough);
    }
}
