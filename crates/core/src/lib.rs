//! Core library: scanning, label extraction, result writing, analysis.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod extractor;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod scanner;

pub use error::LabelerError;
