// End-to-end batch pipeline: normalize -> classify -> filter.

pub mod sift;

pub use sift::{classify, normalize, run, RunSummary};
