//! Apex variant core: requirement model, merging, variant creation, the
//! bundle membership registry, and min_sdk_version enforcement.

pub mod available;
#[cfg(test)]
pub(crate) mod fake;
pub mod info;
pub mod merge;
pub mod min_sdk;
pub mod module;
pub mod mutator;
pub mod registry;
pub mod sdk;

pub use available::{
    check_available_for_apex, AVAILABLE_TO_ANY_APEX, AVAILABLE_TO_GKI_APEX, AVAILABLE_TO_PLATFORM,
};
pub use info::{ApexInfo, ApexProperties, SdkRef};
pub use merge::{merge_apex_variations, VariationAlias};
pub use min_sdk::{check_min_sdk_version, PayloadDep, PayloadDepsCallback, UpdatableModule};
pub use module::{ApexModule, ApexModuleBase};
pub use mutator::{
    apex_unique_variations_mutator, apex_variations_mutator, create_apex_variations,
    update_unique_apex_variations_for_deps,
};
pub use registry::ApexDependencyRegistry;
pub use sdk::choose_sdk_version;
