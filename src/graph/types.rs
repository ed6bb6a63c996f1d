//
//  types.rs
//  ApexVariants
//
//  Created by hak (tharun)
//

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::context::{DepTag, Module};

/// A node in the module graph: one variant of one module.
#[derive(Clone)]
pub struct ModuleNode {
    pub(crate) module: Arc<dyn Module>,
    /// Variation label; empty for an unsplit module or the platform variant.
    pub(crate) variation: String,
}

impl ModuleNode {
    pub fn new(module: Arc<dyn Module>, variation: String) -> Self {
        Self { module, variation }
    }

    pub fn module(&self) -> &Arc<dyn Module> {
        &self.module
    }

    pub fn name(&self) -> &str {
        self.module.name()
    }

    pub fn variation(&self) -> &str {
        &self.variation
    }
}

impl fmt::Debug for ModuleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleNode")
            .field("name", &self.module.name())
            .field("variation", &self.variation)
            .finish()
    }
}

/// Edge data: dependent → dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepEdge {
    pub tag: DepTag,
}

impl DepEdge {
    pub fn new(tag: DepTag) -> Self {
        Self { tag }
    }
}

/// An error attributed to a module variant, optionally to one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDiagnostic {
    pub module: String,
    pub variation: String,
    pub property: Option<String>,
    pub message: String,
}

impl ModuleDiagnostic {
    pub fn new(module: &str, variation: &str, message: String) -> Self {
        Self {
            module: module.to_string(),
            variation: variation.to_string(),
            property: None,
            message,
        }
    }

    pub fn with_property(mut self, property: &str) -> Self {
        self.property = Some(property.to_string());
        self
    }
}

impl fmt::Display for ModuleDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module {:?}", self.module)?;
        if !self.variation.is_empty() {
            write!(f, " variant {:?}", self.variation)?;
        }
        if let Some(property) = &self.property {
            write!(f, ": {}", property)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Summary of one module variant after a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantSummary {
    pub name: String,
    pub variation: String,
    pub in_apexes: Vec<String>,
    pub installable: bool,
    pub updatable: bool,
}

/// Graph statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub module_count: usize,
    pub variant_count: usize,
    pub edge_count: usize,
    pub alias_count: usize,
}
