//
//  mutator.rs
//  ApexVariants
//
//  Created by hak (tharun)
//

use std::sync::Arc;

use tracing::debug;

use super::available::{is_availability_sentinel, AVAILABLE_TO_PLATFORM};
use super::info::ApexInfo;
use super::merge::{merge_apex_variations, sort_by_variation_name, VariationAlias};
use super::module::ApexModule;
use crate::context::{BaseModuleContext, BottomUpMutatorContext, Module};
use crate::error::{ApexError, Result};

/// Whether two requirement lists share a concrete bundle.
///
/// Looks at membership lists rather than `dep_is_in_same_apex`: the
/// question is whether the dependency is in the bundle because it was
/// placed there, not merely reachable.
pub fn any_in_same_apex(a: &[String], b: &[String]) -> bool {
    let mut sorted = b.to_vec();
    sorted.sort();
    a.iter().any(|apex| sorted.binary_search(apex).is_ok())
}

/// Flag `module` as needing unique variants when a dependency sharing one of
/// its bundles needs them.
///
/// Dependencies must already have resolved their own flag, i.e. this runs
/// bottom-up. Freezes the module's requirement set.
pub fn update_unique_apex_variations_for_deps(
    ctx: &dyn BottomUpMutatorContext,
    module: &dyn ApexModule,
) -> Result<()> {
    let base = module.apex_module_base();
    base.freeze_apex_variations();

    let own_apexes = base.collected_in_apexes();
    let mut out_of_order: Option<String> = None;

    ctx.visit_direct_deps(&mut |dep| {
        let Some(dep) = dep.as_apex_module() else {
            return;
        };
        let dep_base = dep.apex_module_base();
        if !dep_base.uniqueness_resolved() {
            out_of_order.get_or_insert_with(|| dep.name().to_string());
            return;
        }
        if any_in_same_apex(&dep_base.collected_in_apexes(), &own_apexes)
            && (dep.unique_apex_variations() || dep_base.unique_apex_variations_for_deps())
        {
            base.set_unique_apex_variations_for_deps();
        }
    });

    if let Some(dependency) = out_of_order {
        return Err(ApexError::PhaseOrder {
            phase: "apex_unique",
            module: module.name().to_string(),
            dependency,
        });
    }

    base.mark_uniqueness_resolved();
    Ok(())
}

/// Report `apex_available` entries that do not name a module in the graph.
pub fn check_apex_available_property<C>(ctx: &C, module: &dyn ApexModule)
where
    C: BaseModuleContext + ?Sized,
{
    if ctx.config().build.allow_missing_dependencies {
        return;
    }
    for name in module.apex_available() {
        if is_availability_sentinel(name) {
            continue;
        }
        if !ctx.other_module_exists(name) {
            ctx.property_error(
                "apex_available",
                format!("{:?} is not a valid module name", name),
            );
        }
    }
}

/// Split `module` into a platform variant plus one variant per (merged)
/// requirement. Returns the created variants; empty when nothing was
/// requested for the module.
pub fn create_apex_variations(
    ctx: &mut dyn BottomUpMutatorContext,
    module: &dyn ApexModule,
) -> Result<Vec<Arc<dyn Module>>> {
    let base = module.apex_module_base();
    if !base.is_frozen() {
        return Err(ApexError::PhaseOrder {
            phase: "apex",
            module: module.name().to_string(),
            dependency: module.name().to_string(),
        });
    }

    if !base.has_apex_variations() {
        return Ok(Vec::new());
    }
    let requested = base.apex_variations();

    check_apex_available_property(&*ctx, module);

    let (mut apex_variations, aliases): (Vec<ApexInfo>, Vec<VariationAlias>) =
        if module.unique_apex_variations() || base.unique_apex_variations_for_deps() {
            (requested, Vec::new())
        } else {
            merge_apex_variations(&requested)
        };
    sort_by_variation_name(&mut apex_variations);

    let mut variations = Vec::with_capacity(apex_variations.len() + 1);
    // Platform variant first.
    variations.push(String::new());
    variations.extend(apex_variations.iter().map(|a| a.apex_variation_name.clone()));

    debug!(
        module = module.name(),
        requested = base.apex_variations().len(),
        variants = ?variations,
        "creating apex variations"
    );

    ctx.set_default_dependency_variation(Some(String::new()));
    let modules = ctx.create_variations(&variations);

    for (i, variant) in modules.iter().enumerate() {
        let Some(apex_variant) = variant.as_apex_module() else {
            continue;
        };
        if i == 0 {
            // Still emitted for its side effects, just never installed.
            if !ctx.host() && !apex_variant.available_for(AVAILABLE_TO_PLATFORM) {
                apex_variant.set_not_available_for_platform();
                variant.make_uninstallable();
            }
        } else {
            apex_variant
                .apex_module_base()
                .set_apex_info(module.name(), apex_variations[i - 1].clone())?;
        }
    }

    for (from, to) in &aliases {
        ctx.create_alias_variation(from, to);
    }

    Ok(modules)
}

/// Bottom-up mutator resolving the "unique variations for deps" flag.
pub fn apex_unique_variations_mutator(ctx: &mut dyn BottomUpMutatorContext) -> Result<()> {
    let ctx: &dyn BottomUpMutatorContext = ctx;
    match ctx.module().as_apex_module() {
        Some(apex_module) => update_unique_apex_variations_for_deps(ctx, apex_module),
        None => Ok(()),
    }
}

/// Bottom-up mutator splitting every module that had requirements recorded.
pub fn apex_variations_mutator(ctx: &mut dyn BottomUpMutatorContext) -> Result<()> {
    let module = ctx.module_handle();
    match module.as_apex_module() {
        Some(apex_module) if apex_module.can_have_apex_variants() => {
            create_apex_variations(ctx, apex_module).map(|_| ())
        }
        _ => Ok(()),
    }
}
