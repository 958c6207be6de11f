// occsift: industry occupation sifting over multi-year wage tables.
//
// This is the library root. Each module corresponds to a stage or
// supporting subsystem of the sift pipeline.

pub mod config;
pub mod error;
pub mod filter;
pub mod output;
pub mod pipeline;
pub mod presets;
pub mod schema;
pub mod status;
pub mod topics;

pub use error::PipelineError;
