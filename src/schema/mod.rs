// Schema reconciliation: yearly tables into one canonical unified table.

pub mod normalize;
pub mod renames;
pub mod table;

pub use normalize::{write_checkpoint, Normalizer, CHECKPOINT_FILE};
pub use table::{Cell, Table};
