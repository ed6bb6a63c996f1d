//
//  info.rs
//  ApexVariants
//
//  Created by hak (tharun)
//

use serde::{Deserialize, Serialize};

use crate::api_level::ApiLevel;

/// A companion SDK a bundle is built against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SdkRef {
    pub name: String,
    pub version: String,
}

impl SdkRef {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// One bundle-specific build requirement recorded against a module.
///
/// After merging, `apex_variation_name` is the merged variation and
/// `in_apexes` lists every concrete bundle the variation stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApexInfo {
    /// Name of the variation this module is mutated into.
    pub apex_variation_name: String,
    pub min_sdk_version: ApiLevel,
    pub updatable: bool,
    #[serde(default)]
    pub required_sdks: Vec<SdkRef>,
    #[serde(default)]
    pub in_apexes: Vec<String>,
}

impl ApexInfo {
    /// Requirement for a single bundle: the variation is named after the
    /// bundle and the bundle is its only member.
    pub fn for_bundle(bundle: impl Into<String>, min_sdk_version: ApiLevel) -> Self {
        let bundle = bundle.into();
        Self {
            apex_variation_name: bundle.clone(),
            min_sdk_version,
            updatable: false,
            required_sdks: Vec::new(),
            in_apexes: vec![bundle],
        }
    }

    pub fn with_updatable(mut self, updatable: bool) -> Self {
        self.updatable = updatable;
        self
    }

    pub fn with_required_sdk(mut self, sdk: SdkRef) -> Self {
        self.required_sdks.push(sdk);
        self
    }

    /// Key shared by every requirement that would compile identically.
    /// Also used as the name of the merged variation.
    pub fn merged_name(&self) -> String {
        let mut name = format!("apex{}", self.min_sdk_version.final_or_future_int());
        for sdk in &self.required_sdks {
            name.push('_');
            name.push_str(&sdk.name);
            name.push('_');
            name.push_str(&sdk.version);
        }
        name
    }
}

/// Per-module apex configuration from the build definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApexProperties {
    /// Bundles allowed to contain this module. Empty means platform only.
    ///
    /// `//apex_available:anyapex` matches any bundle,
    /// `//apex_available:platform` the non-bundle partitions, and
    /// `com.android.gki.*` any bundle named with the `com.android.gki.` prefix.
    #[serde(default)]
    pub apex_available: Vec<String>,
}
