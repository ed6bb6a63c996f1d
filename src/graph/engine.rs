//
//  engine.rs
//  ApexVariants
//
//  Created by hak (tharun)
//

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::types::*;
use crate::apex::ApexDependencyRegistry;
use crate::config::ApexConfig;
use crate::context::{DepTag, Module};
use crate::error::{ApexError, Result};

/// The module graph: every variant of every module, plus the indexes the
/// mutators need to resolve dependency edges between variants.
pub struct ModuleGraph {
    /// Edges point from the dependent module to its dependency.
    pub(crate) graph: DiGraph<ModuleNode, DepEdge>,
    /// Index: module name -> its variants, in label order.
    pub(crate) name_index: HashMap<String, Vec<NodeIndex>>,
    /// Index: module name -> requested variation -> variation that serves it.
    pub(crate) aliases: HashMap<String, HashMap<String, String>>,
    /// Index: module name -> variation used when no other rule matches.
    pub(crate) default_variations: HashMap<String, String>,
    pub(crate) config: ApexConfig,
    pub(crate) registry: Arc<ApexDependencyRegistry>,
    /// Diagnostics reported during the running phase.
    diagnostics: Mutex<Vec<ModuleDiagnostic>>,
}

impl fmt::Debug for ModuleGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("ModuleGraph")
            .field("modules", &stats.module_count)
            .field("variants", &stats.variant_count)
            .field("edges", &stats.edge_count)
            .finish()
    }
}

impl ModuleGraph {
    /// Create an empty graph with its own dependency registry.
    pub fn new(config: ApexConfig) -> Self {
        Self::with_registry(config, Arc::new(ApexDependencyRegistry::new()))
    }

    /// Create an empty graph sharing `registry` with other passes.
    pub fn with_registry(config: ApexConfig, registry: Arc<ApexDependencyRegistry>) -> Self {
        Self {
            graph: DiGraph::new(),
            name_index: HashMap::new(),
            aliases: HashMap::new(),
            default_variations: HashMap::new(),
            config,
            registry,
            diagnostics: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &ApexConfig {
        &self.config
    }

    pub fn registry(&self) -> &ApexDependencyRegistry {
        &self.registry
    }

    pub fn registry_handle(&self) -> Arc<ApexDependencyRegistry> {
        self.registry.clone()
    }

    // ─── Node Operations ────────────────────────────────────────

    /// Add a module with a single, unnamed variant.
    pub fn add_module(&mut self, module: Arc<dyn Module>) -> Result<NodeIndex> {
        let name = module.name().to_string();
        if self.name_index.contains_key(&name) {
            return Err(ApexError::DuplicateModule(name));
        }
        let idx = self.graph.add_node(ModuleNode::new(module, String::new()));
        debug!(module = %name, "added module");
        self.name_index.insert(name, vec![idx]);
        Ok(idx)
    }

    pub fn contains_module(&self, name: &str) -> bool {
        self.name_index.contains_key(name)
    }

    // ─── Edge Operations ────────────────────────────────────────

    /// Add a dependency from every variant of `from` to the matching variant
    /// of `to`.
    pub fn add_dependency(&mut self, from: &str, to: &str, tag: DepTag) -> Result<()> {
        let sources = self
            .name_index
            .get(from)
            .cloned()
            .ok_or_else(|| ApexError::UnknownModule(from.to_string()))?;
        if !self.name_index.contains_key(to) {
            return Err(ApexError::UnknownModule(to.to_string()));
        }
        for source in sources {
            let variation = self.graph[source].variation.clone();
            match self.resolve_variant(to, &variation) {
                Some(target) => {
                    self.graph.add_edge(source, target, DepEdge::new(tag));
                }
                None => self.report(ModuleDiagnostic::new(
                    from,
                    &variation,
                    format!("dependency {:?} has no variant {:?}", to, variation),
                )),
            }
        }
        Ok(())
    }

    // ─── Diagnostics ────────────────────────────────────────────

    fn diagnostics(&self) -> MutexGuard<'_, Vec<ModuleDiagnostic>> {
        self.diagnostics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a problem with a module. Safe to call from parallel visitors.
    pub fn report(&self, diagnostic: ModuleDiagnostic) {
        debug!(%diagnostic, "module error");
        self.diagnostics().push(diagnostic);
    }

    /// Drain every diagnostic reported since the last drain, sorted by module
    /// and variation so output does not depend on scheduling.
    pub fn take_diagnostics(&self) -> Vec<ModuleDiagnostic> {
        let mut diagnostics = std::mem::take(&mut *self.diagnostics());
        diagnostics.sort_by(|a, b| {
            (&a.module, &a.variation, &a.message).cmp(&(&b.module, &b.variation, &b.message))
        });
        diagnostics
    }

    /// Close out `phase`: fail with every diagnostic it reported.
    pub(crate) fn finish_phase(&self, phase: &str) -> Result<()> {
        let diagnostics = self.take_diagnostics();
        if diagnostics.is_empty() {
            return Ok(());
        }
        Err(ApexError::ModuleErrors {
            phase: phase.to_string(),
            diagnostics,
        })
    }
}
