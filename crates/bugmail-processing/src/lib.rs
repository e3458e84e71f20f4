//! Bugmail processing library
//!
//! CPU-bound attachment work: classifying filenames into display labels and
//! re-encoding oversized screenshots to fit the media host's size limit.

pub mod classifier;
pub mod compression;

pub use classifier::{FileClassifier, LabelCounters};
pub use compression::{CompressionResult, ImageCompressor};
