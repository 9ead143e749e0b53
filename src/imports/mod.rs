//! Import dependency analysis
//!
//! Collection of raw `(module, import_reference)` rows from the tree,
//! enrichment into a classified relation table, and statistics on top of it.
//!
//! @module imports

pub mod collect;
pub mod enrich;
pub mod stats;
mod stdlib;

pub use collect::{ImportCollector, ImportRow, NO_IMPORTS};
pub use enrich::{enrich, resolve, EnrichedImport};
pub use stats::Edge;
pub use stdlib::is_stdlib;
