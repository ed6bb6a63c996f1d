//
//  mutation.rs
//  ApexVariants
//
//  Created by hak (tharun)
//

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::sync::Arc;

use tracing::{debug, warn};

use super::engine::ModuleGraph;
use super::types::*;
use crate::context::{DepTag, Module};

/// Graph changes a mutator queued for one node. Applied after the level
/// barrier so parallel visitors never see a half-split graph.
pub(crate) struct PendingMutation {
    pub(crate) node: NodeIndex,
    /// New variants in label order; empty when the node is not split.
    pub(crate) variations: Vec<(String, Arc<dyn Module>)>,
    pub(crate) aliases: Vec<(String, String)>,
    /// `Some(None)` clears the default; `None` leaves it untouched.
    pub(crate) default_variation: Option<Option<String>>,
}

impl PendingMutation {
    pub(crate) fn new(node: NodeIndex) -> Self {
        Self {
            node,
            variations: Vec::new(),
            aliases: Vec::new(),
            default_variation: None,
        }
    }

    fn is_empty(&self) -> bool {
        self.variations.is_empty() && self.aliases.is_empty() && self.default_variation.is_none()
    }
}

impl ModuleGraph {
    /// Find the variant of `name` serving an edge that asks for `variation`.
    ///
    /// An unsplit module serves every request. Otherwise: exact label, then
    /// alias, then the module's default variation.
    pub fn resolve_variant(&self, name: &str, variation: &str) -> Option<NodeIndex> {
        let variants = self.name_index.get(name)?;
        if let [only] = variants.as_slice() {
            return Some(*only);
        }
        let exact = |wanted: &str| {
            variants
                .iter()
                .copied()
                .find(|&idx| self.graph[idx].variation == wanted)
        };
        if let Some(idx) = exact(variation) {
            return Some(idx);
        }
        if let Some(target) = self.aliases.get(name).and_then(|a| a.get(variation)) {
            if let Some(idx) = exact(target) {
                return Some(idx);
            }
        }
        let default = self.default_variations.get(name)?;
        debug!(module = name, requested = variation, default = %default, "falling back to default variation");
        exact(default)
    }

    /// Apply the changes one mutator queued for its node.
    pub(crate) fn apply_mutation(&mut self, pending: PendingMutation) {
        if pending.is_empty() {
            return;
        }
        let name = self.graph[pending.node].name().to_string();

        match pending.default_variation {
            Some(Some(variation)) => {
                self.default_variations.insert(name.clone(), variation);
            }
            Some(None) => {
                self.default_variations.remove(&name);
            }
            None => {}
        }
        if !pending.aliases.is_empty() {
            let aliases = self.aliases.entry(name.clone()).or_default();
            for (from, to) in pending.aliases {
                aliases.insert(from, to);
            }
        }
        if !pending.variations.is_empty() {
            self.split_node(pending.node, &name, pending.variations);
        }
    }

    /// Replace `node` with one node per variation. The original node becomes
    /// the first replica; every edge touching it is re-resolved.
    fn split_node(&mut self, node: NodeIndex, name: &str, variations: Vec<(String, Arc<dyn Module>)>) {
        let outgoing: Vec<(NodeIndex, DepTag)> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.target(), e.weight().tag))
            .collect();
        let incoming: Vec<(NodeIndex, DepTag)> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| (e.source(), e.weight().tag))
            .collect();

        self.graph.retain_edges(|g, e| {
            g.edge_endpoints(e)
                .map_or(true, |(a, b)| a != node && b != node)
        });

        let mut replicas = Vec::with_capacity(variations.len());
        for (i, (variation, module)) in variations.into_iter().enumerate() {
            let idx = if i == 0 {
                let weight = &mut self.graph[node];
                weight.module = module;
                weight.variation = variation;
                node
            } else {
                self.graph.add_node(ModuleNode::new(module, variation))
            };
            replicas.push(idx);
        }
        self.name_index.insert(name.to_string(), replicas.clone());

        // Petgraph lists edges newest first; restore declaration order.
        for &replica in &replicas {
            let variation = self.graph[replica].variation.clone();
            for &(target, tag) in outgoing.iter().rev() {
                let dep = self.graph[target].name().to_string();
                self.connect(replica, &dep, &variation, tag);
            }
        }
        for &(source, tag) in incoming.iter().rev() {
            let variation = self.graph[source].variation.clone();
            self.connect(source, name, &variation, tag);
        }

        debug!(module = name, variants = replicas.len(), "split module");
    }

    fn connect(&mut self, source: NodeIndex, dep: &str, variation: &str, tag: DepTag) {
        match self.resolve_variant(dep, variation) {
            Some(target) => {
                self.graph.add_edge(source, target, DepEdge::new(tag));
            }
            None => {
                let from = self.graph[source].name().to_string();
                warn!(module = %from, dependency = dep, variation, "missing variant");
                self.report(ModuleDiagnostic::new(
                    &from,
                    variation,
                    format!("dependency {:?} has no variant {:?}", dep, variation),
                ));
            }
        }
    }
}
