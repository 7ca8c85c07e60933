//! Integration layer between a wrapped detector and the output protocol.
//!
//! This module provides the `Detector` trait that inference backends
//! implement, the `DetectorAdapter` that translates their raw targets into
//! per-image records, and the adapter's serialisable configuration.

mod adapter;
mod builder;
mod config;
mod detector;

pub use adapter::{DetectorAdapter, Detections};
pub use builder::TargetBuilder;
pub use config::{AdapterConfig, DetectorRef};
pub use detector::{Detector, ModelMetadata};
