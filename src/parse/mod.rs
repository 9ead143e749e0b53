//! Source parsing: syntax offsets, segmentation and directory listing

pub mod segment;
pub mod syntax;
mod walker;

pub use segment::{separate, split_all, Segment, Split};
pub use syntax::{ClassOutline, Definition, SyntaxKind, SyntaxNode};
pub use walker::{DirectoryLister, Entry};
