//
//  library.rs
//  ApexVariants
//
//  Created by hak (tharun)
//

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::api_level::ApiLevel;
use crate::apex::{ApexModule, ApexModuleBase, ApexProperties};
use crate::context::{BaseModuleContext, Module};

/// min_sdk_version value that defers to the enclosing bundle.
pub const APEX_INHERIT: &str = "apex_inherit";

/// A library that can be packaged into bundles.
#[derive(Debug)]
pub struct LibraryModule {
    name: String,
    apex: ApexModuleBase,
    min_sdk_version: Option<String>,
    unique_apex_variations: bool,
    installable: AtomicBool,
}

impl LibraryModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            apex: ApexModuleBase::new(ApexProperties::default()),
            min_sdk_version: None,
            unique_apex_variations: false,
            installable: AtomicBool::new(true),
        }
    }

    pub fn with_apex_available<S: AsRef<str>>(mut self, apex_available: &[S]) -> Self {
        self.apex.properties.apex_available =
            apex_available.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn with_min_sdk_version(mut self, min_sdk_version: impl Into<String>) -> Self {
        self.min_sdk_version = Some(min_sdk_version.into());
        self
    }

    /// Build one variant per bundle instead of merging identical ones.
    pub fn with_unique_apex_variations(mut self, unique: bool) -> Self {
        self.unique_apex_variations = unique;
        self
    }

    /// Stub libraries are linked against but never split per bundle, and
    /// bundles do not collect anything behind them.
    pub fn with_stubs(mut self, stubs: bool) -> Self {
        if stubs {
            self.apex = ApexModuleBase::without_variants(self.apex.properties.clone());
        }
        self
    }

    pub fn min_sdk_version(&self) -> Option<&str> {
        self.min_sdk_version.as_deref()
    }
}

impl Module for LibraryModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_apex_module(&self) -> Option<&dyn ApexModule> {
        Some(self)
    }

    fn clone_variant(&self) -> Arc<dyn Module> {
        Arc::new(Self {
            name: self.name.clone(),
            apex: self.apex.clone(),
            min_sdk_version: self.min_sdk_version.clone(),
            unique_apex_variations: self.unique_apex_variations,
            installable: AtomicBool::new(self.is_installable()),
        })
    }

    fn is_installable(&self) -> bool {
        self.installable.load(Ordering::Acquire)
    }

    fn make_uninstallable(&self) {
        self.installable.store(false, Ordering::Release);
    }
}

impl ApexModule for LibraryModule {
    fn apex_module_base(&self) -> &ApexModuleBase {
        &self.apex
    }

    fn unique_apex_variations(&self) -> bool {
        self.unique_apex_variations
    }

    fn is_installable_to_apex(&self) -> bool {
        true
    }

    fn should_support_sdk_version(
        &self,
        ctx: &dyn BaseModuleContext,
        sdk_version: &ApiLevel,
    ) -> Result<(), String> {
        let min_sdk_version = match self.min_sdk_version.as_deref() {
            Some(APEX_INHERIT) => return Ok(()),
            Some(v) if !v.is_empty() => v,
            _ => return Err("neither min_sdk_version nor sdk_version specified".to_string()),
        };
        let level = ctx
            .config()
            .api_level(min_sdk_version)
            .map_err(|e| e.to_string())?;
        if level > *sdk_version {
            return Err(format!("newer SDK({})", level));
        }
        Ok(())
    }
}
