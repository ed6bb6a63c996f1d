//! Capabilities the apex core consumes from the host graph engine.
//!
//! The apex mutators only ever see these traits. [`crate::graph::ModuleGraph`]
//! is one implementation; tests provide their own.

use std::any::Any;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::apex::{ApexDependencyRegistry, ApexModule};
use crate::config::ApexConfig;

/// Kind of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepTag {
    /// The dependency is packaged together with the depending module.
    Payload,
    /// The dependency is linked against through a stable interface and is
    /// outside the payload boundary.
    External,
}

/// A build unit in the graph.
pub trait Module: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    /// View of this module's apex capabilities, if it participates.
    fn as_apex_module(&self) -> Option<&dyn ApexModule> {
        None
    }

    /// A fresh replica of this module for a new variant.
    fn clone_variant(&self) -> Arc<dyn Module>;

    fn is_installable(&self) -> bool;

    /// Keep the variant in the graph but produce no install action for it.
    fn make_uninstallable(&self);

    /// Whether `dep` is packaged into the same bundle as this module.
    fn dep_is_in_same_apex(&self, _dep: &dyn Module) -> bool {
        true
    }
}

/// One edge reported by [`BaseModuleContext::walk_deps`].
pub struct DepWalkEdge<'a> {
    pub from: &'a dyn Module,
    pub to: &'a dyn Module,
    pub tag: DepTag,
    /// Module names from the walk root down to `to`, inclusive.
    pub path: &'a [&'a str],
}

/// Read access to the module being processed plus the error sinks.
pub trait BaseModuleContext {
    fn module(&self) -> &dyn Module;

    fn module_name(&self) -> &str {
        self.module().name()
    }

    /// Building for the host target.
    fn host(&self) -> bool;

    fn config(&self) -> &ApexConfig;

    fn apex_registry(&self) -> &ApexDependencyRegistry;

    fn other_module_exists(&self, name: &str) -> bool;

    fn module_error(&self, message: String);

    fn property_error(&self, property: &str, message: String);

    fn other_module_error(&self, other: &dyn Module, message: String);

    /// Depth-first walk over the transitive dependencies of the current
    /// module. The callback decides whether to descend past each edge.
    fn walk_deps(&self, visit: &mut dyn FnMut(&DepWalkEdge<'_>) -> bool);
}

/// Context handed to bottom-up mutators. Graph changes requested here are
/// applied once the current level of the traversal has finished.
pub trait BottomUpMutatorContext: BaseModuleContext {
    /// Shared handle to the module being mutated.
    fn module_handle(&self) -> Arc<dyn Module>;

    fn visit_direct_deps(&self, visit: &mut dyn FnMut(&dyn Module));

    /// Variation used for edges into this module that ask for a variation it
    /// does not have.
    fn set_default_dependency_variation(&mut self, variation: Option<String>);

    /// Replicate the current module once per label, in label order.
    fn create_variations(&mut self, variations: &[String]) -> Vec<Arc<dyn Module>>;

    /// Make edges that ask for `from` resolve to the variant named `to`.
    fn create_alias_variation(&mut self, from: &str, to: &str);
}
