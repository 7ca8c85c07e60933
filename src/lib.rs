//! Adapter from batched object detectors to per-image scored bounding boxes.
//!
//! A wrapped [`Detector`] receives chunks of channel-first images and returns
//! one [`DetectionTarget`] per image: boxes, integer labels and either one
//! score per object or a per-class score matrix. [`DetectorAdapter`] turns
//! those targets into [`DetectionRecord`]s, pairing each box with a mapping
//! from class display name to score.

pub mod error;
pub mod integration;
pub mod protocol;

pub use error::{AdapterError, Result};
pub use integration::{
    AdapterConfig, Detections, Detector, DetectorAdapter, DetectorRef, ModelMetadata,
    TargetBuilder,
};
pub use protocol::{
    AxisAlignedBox, ChannelMode, ClassId, ClassScores, ClassTable, DetectionRecord,
    DetectionTarget, ImageBatch, ScoredBox, Scores,
};
