//! Apex capabilities of a module and the embeddable state behind them.
//!
//! Concrete module kinds hold an [`ApexModuleBase`] and implement
//! [`ApexModule::apex_module_base`]; every other capability has a default
//! that delegates to the base.
//!
//! Lifecycle of the base:
//! 1. collection: bundles append requirements concurrently via
//!    [`ApexModuleBase::build_for_apex`];
//! 2. uniqueness: the `apex_unique` mutator freezes the requirement set and
//!    resolves the "unique variations for deps" flag;
//! 3. mutation: the `apex` mutator splits the module and assigns each variant
//!    its [`ApexInfo`] once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};

use tracing::debug;

use super::available::{check_available_for_apex, AVAILABLE_TO_PLATFORM};
use super::info::{ApexInfo, ApexProperties};
use crate::api_level::ApiLevel;
use crate::context::{BaseModuleContext, Module};
use crate::error::{ApexError, Result};

/// A module that may be built differently for each bundle it ends up in.
///
/// A module included in `apex.foo` and `apex.bar` is split into a platform
/// variant plus one variant per distinct build requirement.
pub trait ApexModule: Module {
    fn apex_module_base(&self) -> &ApexModuleBase;

    /// Needs one variant per concrete bundle; disables merging.
    fn unique_apex_variations(&self) -> bool {
        false
    }

    /// `Ok` if this module can run on `sdk_version`, otherwise the reason.
    fn should_support_sdk_version(
        &self,
        ctx: &dyn BaseModuleContext,
        sdk_version: &ApiLevel,
    ) -> std::result::Result<(), String>;

    /// Whether the module is installed into a bundle as a file.
    fn is_installable_to_apex(&self) -> bool {
        false
    }

    fn can_have_apex_variants(&self) -> bool {
        self.apex_module_base().can_have_apex_variants()
    }

    /// Mark that this module should be built for `apex`. Idempotent per
    /// variation name.
    fn build_for_apex(&self, apex: ApexInfo) -> Result<()> {
        self.apex_module_base().build_for_apex(self.name(), apex)
    }

    /// Variation this variant was built for; empty for the platform variant.
    fn apex_variation_name(&self) -> &str {
        self.apex_module_base().apex_variation_name()
    }

    /// Bundles this variant is part of.
    fn in_apexes(&self) -> &[String] {
        self.apex_module_base().in_apexes()
    }

    fn is_for_platform(&self) -> bool {
        self.apex_variation_name().is_empty()
    }

    fn updatable(&self) -> bool {
        self.apex_module_base()
            .apex_info()
            .map(|info| info.updatable)
            .unwrap_or(false)
    }

    fn apex_available(&self) -> &[String] {
        &self.apex_module_base().properties.apex_available
    }

    /// Whether this module may be part of `what`, a bundle name or the
    /// platform sentinel.
    fn available_for(&self, what: &str) -> bool {
        check_available_for_apex(what, self.apex_available())
    }

    fn not_available_for_platform(&self) -> bool {
        self.apex_module_base().not_available_for_platform()
    }

    fn set_not_available_for_platform(&self) {
        self.apex_module_base().set_not_available_for_platform()
    }
}

/// Phase of the requirement set held by an [`ApexModuleBase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Collecting,
    Frozen,
    Resolved,
}

/// Default state for [`ApexModule`]. Embed one per module.
#[derive(Debug)]
pub struct ApexModuleBase {
    pub properties: ApexProperties,

    can_have_apex_variants: bool,

    /// Requirements recorded during collection.
    apex_variations: Mutex<Vec<ApexInfo>>,
    phase: Mutex<Phase>,

    /// Requirement of this variant, set once when the module is split.
    info: OnceLock<ApexInfo>,
    not_available_for_platform: AtomicBool,
    unique_apex_variations_for_deps: AtomicBool,
}

impl ApexModuleBase {
    /// Base for a module that can have apex variants.
    pub fn new(properties: ApexProperties) -> Self {
        Self {
            properties,
            can_have_apex_variants: true,
            apex_variations: Mutex::new(Vec::new()),
            phase: Mutex::new(Phase::Collecting),
            info: OnceLock::new(),
            not_available_for_platform: AtomicBool::new(false),
            unique_apex_variations_for_deps: AtomicBool::new(false),
        }
    }

    /// Base for a module type that is never split, e.g. NDK stubs.
    pub fn without_variants(properties: ApexProperties) -> Self {
        Self {
            can_have_apex_variants: false,
            ..Self::new(properties)
        }
    }

    pub fn can_have_apex_variants(&self) -> bool {
        self.can_have_apex_variants
    }

    fn phase(&self) -> Phase {
        *lock(&self.phase)
    }

    pub(crate) fn build_for_apex(&self, module: &str, apex: ApexInfo) -> Result<()> {
        // Hold the phase lock so a concurrent freeze cannot slip in between.
        let phase = lock(&self.phase);
        if *phase != Phase::Collecting {
            return Err(ApexError::RequirementsFrozen {
                module: module.to_string(),
                variation: apex.apex_variation_name,
            });
        }
        let mut variations = lock(&self.apex_variations);
        if variations
            .iter()
            .any(|v| v.apex_variation_name == apex.apex_variation_name)
        {
            return Ok(());
        }
        debug!(module, variation = %apex.apex_variation_name, "recorded apex requirement");
        variations.push(apex);
        Ok(())
    }

    /// Requirements recorded so far, in recording order.
    pub fn apex_variations(&self) -> Vec<ApexInfo> {
        lock(&self.apex_variations).clone()
    }

    pub fn has_apex_variations(&self) -> bool {
        !lock(&self.apex_variations).is_empty()
    }

    /// Every bundle named by the recorded requirements.
    pub(crate) fn collected_in_apexes(&self) -> Vec<String> {
        lock(&self.apex_variations)
            .iter()
            .flat_map(|info| info.in_apexes.iter().cloned())
            .collect()
    }

    /// Close collection. Further `build_for_apex` calls fail.
    pub fn freeze_apex_variations(&self) {
        let mut phase = lock(&self.phase);
        if *phase == Phase::Collecting {
            *phase = Phase::Frozen;
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.phase() != Phase::Collecting
    }

    pub(crate) fn mark_uniqueness_resolved(&self) {
        *lock(&self.phase) = Phase::Resolved;
    }

    /// The "unique variations for deps" flag is final.
    pub fn uniqueness_resolved(&self) -> bool {
        self.phase() == Phase::Resolved
    }

    pub fn unique_apex_variations_for_deps(&self) -> bool {
        self.unique_apex_variations_for_deps.load(Ordering::Acquire)
    }

    pub(crate) fn set_unique_apex_variations_for_deps(&self) {
        self.unique_apex_variations_for_deps
            .store(true, Ordering::Release);
    }

    pub fn apex_info(&self) -> Option<&ApexInfo> {
        self.info.get()
    }

    pub(crate) fn set_apex_info(&self, module: &str, info: ApexInfo) -> Result<()> {
        self.info
            .set(info)
            .map_err(|_| ApexError::VariationAssigned(module.to_string()))
    }

    pub fn apex_variation_name(&self) -> &str {
        self.info
            .get()
            .map(|info| info.apex_variation_name.as_str())
            .unwrap_or("")
    }

    pub fn in_apexes(&self) -> &[String] {
        self.info
            .get()
            .map(|info| info.in_apexes.as_slice())
            .unwrap_or(&[])
    }

    pub fn not_available_for_platform(&self) -> bool {
        self.not_available_for_platform.load(Ordering::Acquire)
    }

    pub fn set_not_available_for_platform(&self) {
        self.not_available_for_platform
            .store(true, Ordering::Release);
    }

    pub fn available_for_platform(&self) -> bool {
        check_available_for_apex(AVAILABLE_TO_PLATFORM, &self.properties.apex_available)
    }
}

impl Clone for ApexModuleBase {
    fn clone(&self) -> Self {
        Self {
            properties: self.properties.clone(),
            can_have_apex_variants: self.can_have_apex_variants,
            apex_variations: Mutex::new(self.apex_variations()),
            phase: Mutex::new(self.phase()),
            info: self.info.clone(),
            not_available_for_platform: AtomicBool::new(self.not_available_for_platform()),
            unique_apex_variations_for_deps: AtomicBool::new(
                self.unique_apex_variations_for_deps(),
            ),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn info(bundle: &str) -> ApexInfo {
        ApexInfo::for_bundle(bundle, ApiLevel::finalized(29))
    }

    #[test]
    fn test_build_for_apex_dedupes_by_variation() {
        let base = ApexModuleBase::new(ApexProperties::default());
        base.build_for_apex("libfoo", info("a")).unwrap();
        base.build_for_apex("libfoo", info("a").with_updatable(true)).unwrap();
        base.build_for_apex("libfoo", info("b")).unwrap();

        let recorded = base.apex_variations();
        assert_eq!(recorded.len(), 2);
        assert!(!recorded[0].updatable);
    }

    #[test]
    fn test_concurrent_build_for_apex() {
        let base = Arc::new(ApexModuleBase::new(ApexProperties::default()));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let base = base.clone();
                thread::spawn(move || {
                    for j in 0..50 {
                        let name = format!("bundle{}", (i * 50 + j) % 100);
                        base.build_for_apex("libfoo", info(&name)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(base.apex_variations().len(), 100);
    }

    #[test]
    fn test_frozen_rejects_new_requirements() {
        let base = ApexModuleBase::new(ApexProperties::default());
        base.build_for_apex("libfoo", info("a")).unwrap();
        base.freeze_apex_variations();

        let err = base.build_for_apex("libfoo", info("b")).unwrap_err();
        assert!(matches!(err, ApexError::RequirementsFrozen { .. }));
        assert_eq!(base.apex_variations().len(), 1);
    }

    #[test]
    fn test_info_is_assigned_once() {
        let base = ApexModuleBase::new(ApexProperties::default());
        assert_eq!(base.apex_variation_name(), "");
        assert!(base.in_apexes().is_empty());

        base.set_apex_info("libfoo", info("a")).unwrap();
        assert_eq!(base.apex_variation_name(), "a");
        assert_eq!(base.in_apexes(), ["a".to_string()]);
        assert!(base.set_apex_info("libfoo", info("b")).is_err());
    }

    #[test]
    fn test_default_availability_is_platform() {
        let base = ApexModuleBase::new(ApexProperties::default());
        assert!(base.available_for_platform());

        let base = ApexModuleBase::new(ApexProperties {
            apex_available: vec!["com.android.foo".to_string()],
        });
        assert!(!base.available_for_platform());
    }
}
