//! Data model shared by both sides of the adapter.
//!
//! The input side is what a wrapped detector consumes and produces (image
//! batches and raw `DetectionTarget`s); the output side is the per-image
//! `DetectionRecord` of boxes paired with class-name scores.

mod bbox;
mod class_table;
mod image;
mod record;
mod target;

/// Integer class identifier as reported by detectors.
pub type ClassId = usize;

pub use bbox::AxisAlignedBox;
pub use class_table::ClassTable;
pub use image::{ChannelMode, ImageBatch};
pub use record::{ClassScores, DetectionRecord, ScoredBox};
pub use target::{DetectionTarget, Scores};
