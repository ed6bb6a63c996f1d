//
//  config.rs
//  ApexVariants
//
//  Created by hak (tharun)
//

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::api_level::ApiLevel;
use crate::error::{ApexError, Result};

/// Top-level configuration for an apex variant pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApexConfig {
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub coverage: CoverageConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub min_sdk_allowlist: MinSdkAllowlist,
}

/// Build target settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Building for the host rather than a device.
    #[serde(default)]
    pub host: bool,
    /// Tolerate references to modules that are not in the graph.
    #[serde(default)]
    pub allow_missing_dependencies: bool,
}

/// Coverage instrumentation switches. Any of them disables min_sdk_version
/// enforcement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverageConfig {
    #[serde(default)]
    pub emma_instrument: bool,
    #[serde(default)]
    pub native_coverage: bool,
    #[serde(default)]
    pub clang_coverage: bool,
}

/// Platform version settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Unfinalized codenames accepted as preview API levels.
    #[serde(default)]
    pub active_codenames: Vec<String>,
}

/// Modules exempted from min_sdk_version enforcement up to a finalized level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinSdkAllowlist {
    #[serde(default = "default_allowlist_version")]
    pub version: u32,
    #[serde(default)]
    pub modules: BTreeMap<String, i32>,
}

fn default_allowlist_version() -> u32 {
    1
}

// TODO: drop entries as the listed modules declare a min_sdk_version of their own.
const BUILTIN_MIN_SDK_ALLOWLIST: &[(&str, i32)] = &[
    ("adbd", 30),
    ("android.net.ipsec.ike", 30),
    ("androidx-constraintlayout_constraintlayout-solver", 30),
    ("androidx.annotation_annotation", 28),
    ("androidx.arch.core_core-common", 28),
    ("androidx.collection_collection", 28),
    ("androidx.lifecycle_lifecycle-common", 28),
    ("apache-commons-compress", 29),
    ("bouncycastle_ike_digests", 30),
    ("brotli-java", 29),
    ("captiveportal-lib", 28),
    ("flatbuffer_headers", 30),
    ("framework-permission", 30),
    ("framework-statsd", 30),
    ("gemmlowp_headers", 30),
    ("ike-internals", 30),
    ("kotlinx-coroutines-android", 28),
    ("kotlinx-coroutines-core", 28),
    ("libadb_crypto", 30),
    ("libadb_pairing_auth", 30),
    ("libadb_pairing_connection", 30),
    ("libadb_pairing_server", 30),
    ("libadb_protos", 30),
    ("libadb_tls_connection", 30),
    ("libadbconnection_client", 30),
    ("libadbconnection_server", 30),
    ("libadbd_core", 30),
    ("libadbd_services", 30),
    ("libadbd", 30),
    ("libapp_processes_protos_lite", 30),
    ("libasyncio", 30),
    ("libbrotli", 30),
    ("libbuildversion", 30),
    ("libcrypto_static", 30),
    ("libcrypto_utils", 30),
    ("libdiagnose_usb", 30),
    ("libeigen", 30),
    ("liblz4", 30),
    ("libmdnssd", 30),
    ("libneuralnetworks_common", 30),
    ("libneuralnetworks_headers", 30),
    ("libneuralnetworks", 30),
    ("libprocpartition", 30),
    ("libprotobuf-java-lite", 30),
    ("libprotoutil", 30),
    ("libqemu_pipe", 30),
    ("libstats_jni", 30),
    ("libstatslog_statsd", 30),
    ("libstatsmetadata", 30),
    ("libstatspull", 30),
    ("libstatssocket", 30),
    ("libsync", 30),
    ("libtextclassifier_hash_headers", 30),
    ("libtextclassifier_hash_static", 30),
    ("libtflite_kernel_utils", 30),
    ("libwatchdog", 29),
    ("libzstd", 30),
    ("metrics-constants-protos", 28),
    ("net-utils-framework-common", 29),
    ("permissioncontroller-statsd", 28),
    ("philox_random_headers", 30),
    ("philox_random", 30),
    ("service-permission", 30),
    ("service-statsd", 30),
    ("statsd-aidl-ndk_platform", 30),
    ("statsd", 30),
    ("tensorflow_headers", 30),
    ("xz-java", 29),
];

impl Default for MinSdkAllowlist {
    fn default() -> Self {
        Self {
            version: default_allowlist_version(),
            modules: BUILTIN_MIN_SDK_ALLOWLIST
                .iter()
                .map(|(name, level)| (name.to_string(), *level))
                .collect(),
        }
    }
}

impl MinSdkAllowlist {
    /// An allowlist with no exemptions.
    pub fn empty() -> Self {
        Self {
            version: default_allowlist_version(),
            modules: BTreeMap::new(),
        }
    }

    /// The grandfathered level for a module, if it is listed.
    pub fn level_for(&self, module: &str) -> Option<ApiLevel> {
        self.modules.get(module).map(|&level| ApiLevel::finalized(level))
    }

    pub fn with_module(mut self, module: &str, level: i32) -> Self {
        self.modules.insert(module.to_string(), level);
        self
    }
}

impl ApexConfig {
    /// Load config from a TOML file. A missing file yields the defaults;
    /// unreadable or malformed files are errors.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        toml::from_str(&contents).map_err(|source| ApexError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse config from TOML, reporting malformed input.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Any coverage instrumentation enabled.
    pub fn coverage_enabled(&self) -> bool {
        self.coverage.emma_instrument
            || self.coverage.native_coverage
            || self.coverage.clang_coverage
    }

    /// Parse a user-supplied level with this config's active codenames.
    pub fn api_level(&self, raw: &str) -> Result<ApiLevel> {
        ApiLevel::from_user(raw, &self.platform.active_codenames)
    }
}
