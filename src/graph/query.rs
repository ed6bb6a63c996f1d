//
//  query.rs
//  ApexVariants
//
//  Created by hak (tharun)
//

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashSet;
use std::sync::Arc;

use super::engine::ModuleGraph;
use super::types::*;
use crate::context::{DepTag, DepWalkEdge, Module};

impl ModuleGraph {
    /// Variants of `name` in label order.
    pub fn variants(&self, name: &str) -> Vec<&ModuleNode> {
        self.name_index
            .get(name)
            .map(|nodes| nodes.iter().map(|&idx| &self.graph[idx]).collect())
            .unwrap_or_default()
    }

    pub fn variation_names(&self, name: &str) -> Vec<String> {
        self.variants(name)
            .into_iter()
            .map(|node| node.variation.clone())
            .collect()
    }

    /// The variant of `name` labelled exactly `variation`.
    pub fn module(&self, name: &str, variation: &str) -> Option<&Arc<dyn Module>> {
        self.node_index(name, variation)
            .map(|idx| self.graph[idx].module())
    }

    pub(crate) fn node_index(&self, name: &str, variation: &str) -> Option<NodeIndex> {
        self.name_index
            .get(name)?
            .iter()
            .copied()
            .find(|&idx| self.graph[idx].variation == variation)
    }

    /// All module names, sorted.
    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.name_index.keys().cloned().collect();
        names.sort();
        names
    }

    /// Direct dependencies of one variant as (name, variation, tag), in
    /// declaration order.
    pub fn direct_deps(&self, name: &str, variation: &str) -> Vec<(String, String, DepTag)> {
        let Some(idx) = self.node_index(name, variation) else {
            return Vec::new();
        };
        self.dep_edges(idx)
            .into_iter()
            .map(|(target, tag)| {
                let node = &self.graph[target];
                (node.name().to_string(), node.variation.clone(), tag)
            })
            .collect()
    }

    pub(crate) fn dep_edges(&self, idx: NodeIndex) -> Vec<(NodeIndex, DepTag)> {
        let mut edges: Vec<(NodeIndex, DepTag)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), e.weight().tag))
            .collect();
        edges.reverse();
        edges
    }

    /// Depth-first walk over the transitive dependencies of `start`.
    ///
    /// `visit` sees every edge reachable through descended nodes; each
    /// dependency is descended into at most once.
    pub fn walk_deps_from(&self, start: NodeIndex, visit: &mut dyn FnMut(&DepWalkEdge<'_>) -> bool) {
        let mut visited = HashSet::new();
        visited.insert(start);
        let mut path = vec![self.graph[start].name()];
        self.walk_inner(start, &mut path, &mut visited, visit);
    }

    fn walk_inner<'g>(
        &'g self,
        node: NodeIndex,
        path: &mut Vec<&'g str>,
        visited: &mut HashSet<NodeIndex>,
        visit: &mut dyn FnMut(&DepWalkEdge<'_>) -> bool,
    ) {
        for (target, tag) in self.dep_edges(node) {
            let to = &self.graph[target];
            path.push(to.name());
            let descend = visit(&DepWalkEdge {
                from: &*self.graph[node].module,
                to: &*to.module,
                tag,
                path: path.as_slice(),
            });
            if descend && visited.insert(target) {
                self.walk_inner(target, path, visited, visit);
            }
            path.pop();
        }
    }

    /// One summary per variant, sorted by module then label order.
    pub fn summaries(&self) -> Vec<VariantSummary> {
        let mut summaries = Vec::new();
        for name in self.module_names() {
            for node in self.variants(&name) {
                let apex = node.module.as_apex_module();
                summaries.push(VariantSummary {
                    name: name.clone(),
                    variation: node.variation.clone(),
                    in_apexes: apex.map(|a| a.in_apexes().to_vec()).unwrap_or_default(),
                    installable: node.module.is_installable(),
                    updatable: apex.is_some_and(|a| a.updatable()),
                });
            }
        }
        summaries
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            module_count: self.name_index.len(),
            variant_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            alias_count: self.aliases.values().map(|a| a.len()).sum(),
        }
    }
}
