//! Which modules each bundle reaches, directly or transitively.
//!
//! ```text
//! registry["foo"]["bar"] == true   foo is listed in bundle bar's contents
//! registry["foo"]["bar"] == false  foo is only reachable from bar's contents
//! no entry                          foo is not built for bar
//! ```
//!
//! Entries only ever grow: indirect can become direct, never the reverse.
//! The registry lives for one build pass; call [`ApexDependencyRegistry::clear`]
//! between independent passes, never while a pass is still writing.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use super::info::ApexInfo;

type ApexesForModule = HashMap<String, bool>;

/// Module → bundle → "is a direct member".
#[derive(Debug, Default)]
pub struct ApexDependencyRegistry {
    modules: Mutex<HashMap<String, ApexesForModule>>,
}

impl ApexDependencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn modules(&self) -> MutexGuard<'_, HashMap<String, ApexesForModule>> {
        self.modules
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record that `module_name` is depended on by the bundles of `apex`:
    /// its own variation name and every bundle in `in_apexes`.
    ///
    /// Each bundle is upgraded independently with `existing || direct_dep`.
    pub fn update_apex_dependency(&self, apex: &ApexInfo, module_name: &str, direct_dep: bool) {
        let mut modules = self.modules();
        let apexes_for_module = modules.entry(module_name.to_string()).or_default();

        let bundles = std::iter::once(&apex.apex_variation_name).chain(apex.in_apexes.iter());
        for bundle in bundles {
            let entry = apexes_for_module.entry(bundle.clone()).or_insert(false);
            *entry |= direct_dep;
        }
        debug!(
            module = module_name,
            variation = %apex.apex_variation_name,
            direct = direct_dep,
            "updated apex dependency"
        );
    }

    /// `module_name` is listed directly in `apex_name`.
    pub fn directly_in_apex(&self, apex_name: &str, module_name: &str) -> bool {
        self.modules()
            .get(module_name)
            .and_then(|apexes| apexes.get(apex_name).copied())
            .unwrap_or(false)
    }

    /// `module_name` is listed directly in every bundle of `apex_names`.
    /// True for an empty list.
    pub fn directly_in_all_apexes<S: AsRef<str>>(&self, apex_names: &[S], module_name: &str) -> bool {
        let modules = self.modules();
        let apexes = modules.get(module_name);
        apex_names.iter().all(|apex| {
            apexes
                .and_then(|a| a.get(apex.as_ref()).copied())
                .unwrap_or(false)
        })
    }

    /// `module_name` is listed directly in some bundle. Host builds have no
    /// bundles.
    pub fn directly_in_any_apex(&self, host: bool, module_name: &str) -> bool {
        if host {
            return false;
        }
        self.modules()
            .get(module_name)
            .is_some_and(|apexes| apexes.values().any(|&direct| direct))
    }

    /// `module_name` is reachable from some bundle, directly or not.
    pub fn in_any_apex(&self, module_name: &str) -> bool {
        self.modules()
            .get(module_name)
            .is_some_and(|apexes| !apexes.is_empty())
    }

    /// Every bundle that reaches `module_name`.
    pub fn apexes_for_module(&self, module_name: &str) -> BTreeSet<String> {
        self.modules()
            .get(module_name)
            .map(|apexes| apexes.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// All recorded modules, sorted.
    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules().keys().cloned().collect();
        names.sort();
        names
    }

    /// Copy of every entry, sorted for output.
    pub fn snapshot(&self) -> BTreeMap<String, BTreeMap<String, bool>> {
        self.modules()
            .iter()
            .map(|(module, apexes)| {
                let apexes = apexes.iter().map(|(a, &direct)| (a.clone(), direct)).collect();
                (module.clone(), apexes)
            })
            .collect()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.modules().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.modules().is_empty()
    }
}
