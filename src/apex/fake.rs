//! In-memory context for driving the apex mutators without a graph engine.

use std::cell::RefCell;
use std::sync::Arc;

use crate::apex::ApexDependencyRegistry;
use crate::config::ApexConfig;
use crate::context::{BaseModuleContext, BottomUpMutatorContext, DepTag, DepWalkEdge, Module};

pub(crate) struct FakeContext {
    pub module: Arc<dyn Module>,
    /// Direct dependencies with their edge tags.
    pub deps: Vec<(Arc<dyn Module>, DepTag)>,
    pub config: ApexConfig,
    pub registry: ApexDependencyRegistry,
    pub existing: Vec<String>,
    pub errors: RefCell<Vec<String>>,
    pub default_variation: Option<Option<String>>,
    pub variations: Vec<String>,
    pub aliases: Vec<(String, String)>,
}

impl FakeContext {
    pub fn new(module: Arc<dyn Module>) -> Self {
        Self {
            module,
            deps: Vec::new(),
            config: ApexConfig::default(),
            registry: ApexDependencyRegistry::new(),
            existing: Vec::new(),
            errors: RefCell::new(Vec::new()),
            default_variation: None,
            variations: Vec::new(),
            aliases: Vec::new(),
        }
    }

    pub fn with_dep(mut self, dep: Arc<dyn Module>, tag: DepTag) -> Self {
        self.deps.push((dep, tag));
        self
    }

    pub fn with_existing(mut self, names: &[&str]) -> Self {
        self.existing.extend(names.iter().map(|s| s.to_string()));
        self
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }
}

impl BaseModuleContext for FakeContext {
    fn module(&self) -> &dyn Module {
        &*self.module
    }

    fn host(&self) -> bool {
        self.config.build.host
    }

    fn config(&self) -> &ApexConfig {
        &self.config
    }

    fn apex_registry(&self) -> &ApexDependencyRegistry {
        &self.registry
    }

    fn other_module_exists(&self, name: &str) -> bool {
        self.existing.iter().any(|n| n == name)
    }

    fn module_error(&self, message: String) {
        self.errors
            .borrow_mut()
            .push(format!("{}: {}", self.module.name(), message));
    }

    fn property_error(&self, property: &str, message: String) {
        self.errors
            .borrow_mut()
            .push(format!("{}: {}: {}", self.module.name(), property, message));
    }

    fn other_module_error(&self, other: &dyn Module, message: String) {
        self.errors
            .borrow_mut()
            .push(format!("{}: {}", other.name(), message));
    }

    /// Walks only the direct dependencies.
    fn walk_deps(&self, visit: &mut dyn FnMut(&DepWalkEdge<'_>) -> bool) {
        for (dep, tag) in &self.deps {
            let path = [self.module.name(), dep.name()];
            visit(&DepWalkEdge {
                from: &*self.module,
                to: &**dep,
                tag: *tag,
                path: &path,
            });
        }
    }
}

impl BottomUpMutatorContext for FakeContext {
    fn module_handle(&self) -> Arc<dyn Module> {
        self.module.clone()
    }

    fn visit_direct_deps(&self, visit: &mut dyn FnMut(&dyn Module)) {
        for (dep, _) in &self.deps {
            visit(&**dep);
        }
    }

    fn set_default_dependency_variation(&mut self, variation: Option<String>) {
        self.default_variation = Some(variation);
    }

    fn create_variations(&mut self, variations: &[String]) -> Vec<Arc<dyn Module>> {
        self.variations = variations.to_vec();
        variations
            .iter()
            .map(|_| self.module.clone_variant())
            .collect()
    }

    fn create_alias_variation(&mut self, from: &str, to: &str) {
        self.aliases.push((from.to_string(), to.to_string()));
    }
}
