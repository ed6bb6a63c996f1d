//! min_sdk_version enforcement over a bundle's payload.

use tracing::debug;

use super::module::ApexModule;
use crate::api_level::ApiLevel;
use crate::context::{BaseModuleContext, Module};

/// One dependency edge inside a bundle's payload walk.
pub struct PayloadDep<'a> {
    pub from: &'a dyn Module,
    pub to: &'a dyn Module,
    /// Apex view of `to`.
    pub to_apex: &'a dyn ApexModule,
    /// The edge leaves the payload boundary.
    pub external: bool,
    /// Module names from the bundle down to `to`.
    pub path: &'a [&'a str],
}

/// Return true to keep walking past `to`.
pub type PayloadDepsCallback<'a> = dyn FnMut(&dyn BaseModuleContext, &PayloadDep<'_>) -> bool + 'a;

/// A bundle or app whose payload can be walked.
pub trait UpdatableModule: Module {
    fn walk_payload_deps(&self, ctx: &dyn BaseModuleContext, visit: &mut PayloadDepsCallback<'_>);
}

/// Check that every dependency packaged with `module` supports
/// `min_sdk_version`.
///
/// Skipped for host builds, coverage builds, and unfinalized levels.
pub fn check_min_sdk_version(
    module: &dyn UpdatableModule,
    ctx: &dyn BaseModuleContext,
    min_sdk_version: &ApiLevel,
) {
    if ctx.host() {
        return;
    }
    if ctx.config().coverage_enabled() {
        return;
    }
    if min_sdk_version.is_current() {
        return;
    }

    let allowlist = &ctx.config().min_sdk_allowlist;
    module.walk_payload_deps(ctx, &mut |ctx, dep| {
        // External deps sit behind a stable interface.
        if dep.external {
            return false;
        }
        if !dep.from.dep_is_in_same_apex(dep.to) {
            return false;
        }
        if let Err(reason) = dep.to_apex.should_support_sdk_version(ctx, min_sdk_version) {
            let exempt = allowlist
                .level_for(dep.to.name())
                .is_some_and(|level| level <= *min_sdk_version);
            if !exempt {
                ctx.other_module_error(
                    dep.to,
                    format!(
                        "should support min_sdk_version({}) for {:?}: {}. Dependency path: {}",
                        min_sdk_version,
                        ctx.module_name(),
                        reason,
                        dep.path.join(" -> ")
                    ),
                );
                return false;
            }
            debug!(module = dep.to.name(), "min_sdk_version violation allowlisted");
        }
        true
    });
}
