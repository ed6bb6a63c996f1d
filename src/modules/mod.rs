//! Concrete module kinds: packageable libraries and the bundles that
//! package them.

pub mod bundle;
pub mod library;

pub use bundle::{apex_deps_mutator, apex_min_sdk_mutator, create_bundle_variation, ApexBundle};
pub use library::{LibraryModule, APEX_INHERIT};
