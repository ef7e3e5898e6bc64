//! Data ingestion and preparation for ACAML.
//!
//! Provides CSV loading into a typed [`ac_types::Dataset`], the column encoder
//! that turns categorical/text features into integer codes, and small
//! deterministic sample datasets.

pub mod encoder;
pub mod loaders;
pub mod samples;

pub use encoder::{ColumnEncoder, EncodingReport};
pub use loaders::CsvLoader;
pub use samples::SAMPLE_TARGET;
