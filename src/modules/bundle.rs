//
//  bundle.rs
//  ApexVariants
//
//  Created by hak (tharun)
//

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::api_level::ApiLevel;
use crate::apex::{check_min_sdk_version, ApexInfo, PayloadDep, PayloadDepsCallback, SdkRef, UpdatableModule};
use crate::config::ApexConfig;
use crate::context::{BaseModuleContext, BottomUpMutatorContext, DepTag, Module};
use crate::error::Result;

/// A bundle definition: the modules reachable over its payload edges are
/// built for it.
#[derive(Debug)]
pub struct ApexBundle {
    name: String,
    min_sdk_version: Option<String>,
    updatable: bool,
    required_sdks: Vec<SdkRef>,
    installable: AtomicBool,
}

impl ApexBundle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_sdk_version: None,
            updatable: false,
            required_sdks: Vec::new(),
            installable: AtomicBool::new(true),
        }
    }

    pub fn with_min_sdk_version(mut self, min_sdk_version: impl Into<String>) -> Self {
        self.min_sdk_version = Some(min_sdk_version.into());
        self
    }

    pub fn with_updatable(mut self, updatable: bool) -> Self {
        self.updatable = updatable;
        self
    }

    pub fn with_required_sdk(mut self, sdk: SdkRef) -> Self {
        self.required_sdks.push(sdk);
        self
    }

    pub fn updatable(&self) -> bool {
        self.updatable
    }

    /// Parsed min_sdk_version; an unset value means the in-development level.
    pub fn min_sdk_version(&self, config: &ApexConfig) -> Result<ApiLevel> {
        match self.min_sdk_version.as_deref() {
            Some(raw) if !raw.is_empty() => config.api_level(raw),
            _ => Ok(ApiLevel::current()),
        }
    }

    /// The requirement this bundle places on its payload.
    pub fn apex_info(&self, config: &ApexConfig) -> Result<ApexInfo> {
        let mut info = ApexInfo::for_bundle(self.name.clone(), self.min_sdk_version(config)?)
            .with_updatable(self.updatable);
        info.required_sdks = self.required_sdks.clone();
        Ok(info)
    }
}

impl Module for ApexBundle {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_variant(&self) -> Arc<dyn Module> {
        Arc::new(Self {
            name: self.name.clone(),
            min_sdk_version: self.min_sdk_version.clone(),
            updatable: self.updatable,
            required_sdks: self.required_sdks.clone(),
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

impl UpdatableModule for ApexBundle {
    fn walk_payload_deps(&self, ctx: &dyn BaseModuleContext, visit: &mut PayloadDepsCallback<'_>) {
        ctx.walk_deps(&mut |edge| {
            let Some(to_apex) = edge.to.as_apex_module() else {
                return false;
            };
            visit(
                ctx,
                &PayloadDep {
                    from: edge.from,
                    to: edge.to,
                    to_apex,
                    external: edge.tag == DepTag::External,
                    path: edge.path,
                },
            )
        });
    }
}

/// Parallel phase: every bundle records its requirement on each module
/// reachable over payload edges, and fills the dependency registry.
pub fn apex_deps_mutator(ctx: &dyn BaseModuleContext) -> Result<()> {
    let Some(bundle) = ctx.module().as_any().downcast_ref::<ApexBundle>() else {
        return Ok(());
    };
    let info = bundle.apex_info(ctx.config())?;
    let mut failure = None;

    ctx.walk_deps(&mut |edge| {
        if edge.tag != DepTag::Payload {
            return false;
        }
        let Some(child) = edge.to.as_apex_module() else {
            return false;
        };
        if !child.can_have_apex_variants() || !edge.from.dep_is_in_same_apex(edge.to) {
            return false;
        }
        if let Err(err) = child.build_for_apex(info.clone()) {
            failure.get_or_insert(err);
            return false;
        }
        // The path starts at the bundle itself.
        let direct = edge.path.len() == 2;
        ctx.apex_registry()
            .update_apex_dependency(&info, child.name(), direct);
        true
    });

    debug!(bundle = bundle.name(), variation = %info.apex_variation_name, "collected payload");
    failure.map_or(Ok(()), Err)
}

/// Parallel phase: updatable bundles check their payload against their
/// min_sdk_version.
pub fn apex_min_sdk_mutator(ctx: &dyn BaseModuleContext) -> Result<()> {
    let Some(bundle) = ctx.module().as_any().downcast_ref::<ApexBundle>() else {
        return Ok(());
    };
    if !bundle.updatable() {
        return Ok(());
    }
    let min_sdk_version = bundle.min_sdk_version(ctx.config())?;
    check_min_sdk_version(bundle, ctx, &min_sdk_version);
    Ok(())
}

/// Give a bundle a single variant named after itself, so that its edges
/// resolve to the variants built for it.
pub fn create_bundle_variation(ctx: &mut dyn BottomUpMutatorContext) -> bool {
    let handle = ctx.module_handle();
    if handle.as_any().downcast_ref::<ApexBundle>().is_none() {
        return false;
    }
    ctx.create_variations(&[handle.name().to_string()]);
    true
}
