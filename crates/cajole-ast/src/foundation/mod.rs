//! Foundation types shared across the pipeline.

pub mod span;

pub use span::{SourceFile, SourceMap, Span};
