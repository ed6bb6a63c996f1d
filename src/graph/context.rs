//
//  context.rs
//  ApexVariants
//
//  Created by hak (tharun)
//

use petgraph::graph::NodeIndex;
use std::sync::Arc;

use super::engine::ModuleGraph;
use super::mutation::PendingMutation;
use super::types::ModuleDiagnostic;
use crate::apex::ApexDependencyRegistry;
use crate::config::ApexConfig;
use crate::context::{BaseModuleContext, BottomUpMutatorContext, DepWalkEdge, Module};

/// Per-node context handed to mutators by [`ModuleGraph`]. Reads go straight
/// to the graph; structural changes are queued in a [`PendingMutation`].
pub(crate) struct GraphContext<'g> {
    graph: &'g ModuleGraph,
    node: NodeIndex,
    module: Arc<dyn Module>,
    pending: PendingMutation,
}

impl<'g> GraphContext<'g> {
    pub(crate) fn new(graph: &'g ModuleGraph, node: NodeIndex) -> Self {
        Self {
            graph,
            node,
            module: graph.graph[node].module().clone(),
            pending: PendingMutation::new(node),
        }
    }

    fn variation(&self) -> &str {
        self.graph.graph[self.node].variation()
    }

    pub(crate) fn into_pending(self) -> PendingMutation {
        self.pending
    }
}

impl BaseModuleContext for GraphContext<'_> {
    fn module(&self) -> &dyn Module {
        &*self.module
    }

    fn host(&self) -> bool {
        self.graph.config.build.host
    }

    fn config(&self) -> &ApexConfig {
        &self.graph.config
    }

    fn apex_registry(&self) -> &ApexDependencyRegistry {
        &self.graph.registry
    }

    fn other_module_exists(&self, name: &str) -> bool {
        self.graph.contains_module(name)
    }

    fn module_error(&self, message: String) {
        self.graph
            .report(ModuleDiagnostic::new(self.module.name(), self.variation(), message));
    }

    fn property_error(&self, property: &str, message: String) {
        self.graph.report(
            ModuleDiagnostic::new(self.module.name(), self.variation(), message)
                .with_property(property),
        );
    }

    fn other_module_error(&self, other: &dyn Module, message: String) {
        let variation = other
            .as_apex_module()
            .map(|apex| apex.apex_variation_name())
            .unwrap_or("");
        self.graph
            .report(ModuleDiagnostic::new(other.name(), variation, message));
    }

    fn walk_deps(&self, visit: &mut dyn FnMut(&DepWalkEdge<'_>) -> bool) {
        self.graph.walk_deps_from(self.node, visit);
    }
}

impl BottomUpMutatorContext for GraphContext<'_> {
    fn module_handle(&self) -> Arc<dyn Module> {
        self.module.clone()
    }

    fn visit_direct_deps(&self, visit: &mut dyn FnMut(&dyn Module)) {
        for (target, _) in self.graph.dep_edges(self.node) {
            visit(&**self.graph.graph[target].module());
        }
    }

    fn set_default_dependency_variation(&mut self, variation: Option<String>) {
        self.pending.default_variation = Some(variation);
    }

    fn create_variations(&mut self, variations: &[String]) -> Vec<Arc<dyn Module>> {
        self.pending.variations = variations
            .iter()
            .map(|label| (label.clone(), self.module.clone_variant()))
            .collect();
        self.pending
            .variations
            .iter()
            .map(|(_, module)| module.clone())
            .collect()
    }

    fn create_alias_variation(&mut self, from: &str, to: &str) {
        self.pending.aliases.push((from.to_string(), to.to_string()));
    }
}
