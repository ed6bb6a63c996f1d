//
//  phase.rs
//  ApexVariants
//
//  Created by hak (tharun)
//

use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use std::collections::HashMap;

use tracing::{debug, info};

use super::context::GraphContext;
use super::engine::ModuleGraph;
use super::mutation::PendingMutation;
use crate::context::{BaseModuleContext, BottomUpMutatorContext};
use crate::error::{ApexError, Result};

impl ModuleGraph {
    /// Visit every variant concurrently. Returns once all visits finished,
    /// failing with every diagnostic reported during the phase.
    ///
    /// A visitor's `Err` is recorded as a diagnostic on its module.
    pub fn run_parallel<F>(&self, phase: &str, visit: F) -> Result<()>
    where
        F: Fn(&dyn BaseModuleContext) -> Result<()> + Sync,
    {
        let nodes: Vec<NodeIndex> = self.graph.node_indices().collect();
        nodes.par_iter().for_each(|&node| {
            let ctx = GraphContext::new(self, node);
            if let Err(err) = visit(&ctx) {
                ctx.module_error(err.to_string());
            }
        });

        info!(phase, variants = nodes.len(), "finished parallel phase");
        self.finish_phase(phase)
    }

    /// Visit every variant after all of its dependencies, running each
    /// dependency level concurrently. Graph changes queued by a level are
    /// applied before the next level starts.
    pub fn run_bottom_up<F>(&mut self, phase: &str, mutator: F) -> Result<()>
    where
        F: Fn(&mut dyn BottomUpMutatorContext) -> Result<()> + Sync,
    {
        let levels = self.bottom_up_levels()?;
        let mut visited = 0;

        for (depth, level) in levels.iter().enumerate() {
            let graph = &*self;
            let pending: Vec<PendingMutation> = level
                .par_iter()
                .map(|&node| {
                    let mut ctx = GraphContext::new(graph, node);
                    if let Err(err) = mutator(&mut ctx) {
                        ctx.module_error(err.to_string());
                    }
                    ctx.into_pending()
                })
                .collect();

            debug!(phase, depth, modules = level.len(), "finished level");
            visited += level.len();
            for mutation in pending {
                self.apply_mutation(mutation);
            }
        }

        info!(
            phase,
            levels = levels.len(),
            visited,
            variants = self.graph.node_count(),
            "finished bottom-up phase"
        );
        self.finish_phase(phase)
    }

    /// Group nodes by dependency depth: leaves first, each node one level
    /// above its deepest dependency. Within a level nodes are sorted by name
    /// and variation.
    pub(crate) fn bottom_up_levels(&self) -> Result<Vec<Vec<NodeIndex>>> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            ApexError::DependencyCycle(self.graph[cycle.node_id()].name().to_string())
        })?;

        // Edges point at dependencies, so the sort lists dependents first.
        let mut depth: HashMap<NodeIndex, usize> = HashMap::with_capacity(order.len());
        let mut levels: Vec<Vec<NodeIndex>> = Vec::new();
        for &node in order.iter().rev() {
            let level = self
                .dep_edges(node)
                .iter()
                .filter_map(|(dep, _)| depth.get(dep))
                .map(|d| d + 1)
                .max()
                .unwrap_or(0);
            depth.insert(node, level);
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(node);
        }

        for level in &mut levels {
            level.sort_by(|&a, &b| {
                let (a, b) = (&self.graph[a], &self.graph[b]);
                (a.name(), a.variation()).cmp(&(b.name(), b.variation()))
            });
        }
        Ok(levels)
    }
}
