//! Diagram documents and rendering
//!
//! @module diagram

pub mod plantuml;
pub mod render;

pub use plantuml::{relation_graph, ClassDiagramVisitor, InheritanceVisitor, PlantUmlDocument};
pub use render::{DiagramRenderer, PlantUmlServer, RenderOutcome, RenderPool};
