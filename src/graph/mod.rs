//! Module graph: the reference host engine the apex mutators run on.
//!
//! Provides the graph data model, variant splitting and edge resolution,
//! dependency walks, and the parallel / bottom-up phase runners.

mod context;
pub mod engine;
pub mod mutation;
pub mod phase;
pub mod query;
pub mod types;

pub use engine::ModuleGraph;
pub use types::{DepEdge, GraphStats, ModuleDiagnostic, ModuleNode, VariantSummary};
