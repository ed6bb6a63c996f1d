//! # apex-variants
//!
//! Per-bundle build variants for a module graph.
//!
//! A module packaged into several bundles ("apexes") may need to be compiled
//! differently for each of them, e.g. against an older minimum SDK. This
//! crate collects those requirements, merges the ones that would compile
//! identically, splits each module into a platform variant plus one variant
//! per remaining requirement, and tracks which bundle contains which module.
//!
//! ## Key Pieces
//!
//! - **Requirement model**: [`ApexInfo`], merged by [`merge_apex_variations`]
//! - **Mutators**: `apex_deps` → `apex_unique` → `apex` → `apex_min_sdk`,
//!   chained by [`run_apex_pass`]
//! - **Registry**: [`ApexDependencyRegistry`], module → bundle → direct member
//! - **Host engine**: [`ModuleGraph`], a petgraph-backed reference engine that
//!   runs the mutators level by level with rayon
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use apex_variants::{run_apex_pass, ApexConfig, Manifest};
//!
//! let manifest = Manifest::load("modules.toml".as_ref()).unwrap();
//! let mut graph = manifest.into_graph(ApexConfig::default()).unwrap();
//! run_apex_pass(&mut graph).unwrap();
//!
//! for variant in graph.summaries() {
//!     println!("{} {:?} {:?}", variant.name, variant.variation, variant.in_apexes);
//! }
//! ```

pub mod api_level;
pub mod apex;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod modules;
pub mod pass;

// Re-exports for convenience
pub use api_level::ApiLevel;
pub use apex::{
    check_available_for_apex, check_min_sdk_version, choose_sdk_version, merge_apex_variations,
    ApexDependencyRegistry, ApexInfo, ApexModule, ApexModuleBase, ApexProperties, SdkRef,
    UpdatableModule,
};
pub use config::ApexConfig;
pub use context::{BaseModuleContext, BottomUpMutatorContext, DepTag, Module};
pub use error::{ApexError, Result};
pub use graph::{ModuleDiagnostic, ModuleGraph};
pub use manifest::Manifest;
pub use modules::{ApexBundle, LibraryModule};
pub use pass::run_apex_pass;
