//
//  manifest.rs
//  ApexVariants
//
//  Created by hak (tharun)
//

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::apex::SdkRef;
use crate::config::ApexConfig;
use crate::context::DepTag;
use crate::error::{ApexError, Result};
use crate::graph::ModuleGraph;
use crate::modules::{ApexBundle, LibraryModule};

/// A module graph described in TOML.
///
/// ```toml
/// [[bundle]]
/// name = "com.android.foo"
/// min_sdk_version = "29"
/// updatable = true
/// payload = ["libfoo"]
///
/// [[module]]
/// name = "libfoo"
/// apex_available = ["com.android.foo"]
/// min_sdk_version = "29"
/// deps = ["libbar"]
/// external_deps = ["libc"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, rename = "bundle")]
    pub bundles: Vec<BundleSpec>,
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleSpec {
    pub name: String,
    #[serde(default)]
    pub min_sdk_version: Option<String>,
    #[serde(default)]
    pub updatable: bool,
    #[serde(default)]
    pub required_sdks: Vec<SdkRef>,
    /// Modules packaged into the bundle.
    #[serde(default)]
    pub payload: Vec<String>,
    /// Modules the bundle links against without packaging them.
    #[serde(default)]
    pub external: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub name: String,
    #[serde(default)]
    pub apex_available: Vec<String>,
    #[serde(default)]
    pub min_sdk_version: Option<String>,
    #[serde(default)]
    pub unique_apex_variations: bool,
    /// Never split; payload collection stops here.
    #[serde(default)]
    pub stubs: bool,
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default)]
    pub external_deps: Vec<String>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|source| ApexError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Build the graph: every module first, then every edge.
    pub fn into_graph(self, config: ApexConfig) -> Result<ModuleGraph> {
        let mut graph = ModuleGraph::new(config);

        for bundle in &self.bundles {
            let mut module = ApexBundle::new(bundle.name.clone()).with_updatable(bundle.updatable);
            if let Some(level) = &bundle.min_sdk_version {
                module = module.with_min_sdk_version(level.clone());
            }
            for sdk in &bundle.required_sdks {
                module = module.with_required_sdk(sdk.clone());
            }
            graph.add_module(Arc::new(module))?;
        }
        for spec in &self.modules {
            let mut module = LibraryModule::new(spec.name.clone())
                .with_apex_available(&spec.apex_available)
                .with_unique_apex_variations(spec.unique_apex_variations)
                .with_stubs(spec.stubs);
            if let Some(level) = &spec.min_sdk_version {
                module = module.with_min_sdk_version(level.clone());
            }
            graph.add_module(Arc::new(module))?;
        }

        for bundle in &self.bundles {
            add_edges(&mut graph, &bundle.name, &bundle.payload, &bundle.external)?;
        }
        for spec in &self.modules {
            add_edges(&mut graph, &spec.name, &spec.deps, &spec.external_deps)?;
        }

        let stats = graph.stats();
        info!(
            bundles = self.bundles.len(),
            modules = stats.module_count,
            edges = stats.edge_count,
            "built module graph"
        );
        Ok(graph)
    }
}

fn add_edges(graph: &mut ModuleGraph, from: &str, payload: &[String], external: &[String]) -> Result<()> {
    for dep in payload {
        graph.add_dependency(from, dep, DepTag::Payload)?;
    }
    for dep in external {
        graph.add_dependency(from, dep, DepTag::External)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"
[[bundle]]
name = "com.android.foo"
min_sdk_version = "29"
updatable = true
payload = ["libfoo"]
external = ["libc"]
required_sdks = [{ name = "sdk", version = "1" }]

[[module]]
name = "libfoo"
apex_available = ["com.android.foo"]
deps = ["libbar"]

[[module]]
name = "libbar"
min_sdk_version = "apex_inherit"

[[module]]
name = "libc"
"#;

    #[test]
    fn test_parse() {
        let manifest = Manifest::from_toml_str(MANIFEST).unwrap();
        assert_eq!(manifest.bundles.len(), 1);
        assert_eq!(manifest.bundles[0].required_sdks, vec![SdkRef::new("sdk", "1")]);
        assert_eq!(manifest.modules.len(), 3);
        assert_eq!(manifest.modules[1].min_sdk_version.as_deref(), Some("apex_inherit"));
        assert!(manifest.modules[2].deps.is_empty());
    }

    #[test]
    fn test_into_graph() {
        let graph = Manifest::from_toml_str(MANIFEST)
            .unwrap()
            .into_graph(ApexConfig::default())
            .unwrap();

        let stats = graph.stats();
        assert_eq!(stats.module_count, 4);
        assert_eq!(stats.edge_count, 3);
        assert_eq!(
            graph.direct_deps("com.android.foo", ""),
            vec![
                ("libfoo".to_string(), String::new(), DepTag::Payload),
                ("libc".to_string(), String::new(), DepTag::External),
            ]
        );
    }

    #[test]
    fn test_unknown_dependency() {
        let manifest = Manifest::from_toml_str(
            r#"
[[module]]
name = "libfoo"
deps = ["libmissing"]
"#,
        )
        .unwrap();
        let err = manifest.into_graph(ApexConfig::default()).unwrap_err();
        assert!(matches!(err, ApexError::UnknownModule(name) if name == "libmissing"));
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[[module]]\nname = ").unwrap();

        let err = Manifest::load(&path).unwrap_err();
        assert!(matches!(err, ApexError::ManifestParse { .. }));
        assert!(err.to_string().contains("broken.toml"));

        let err = Manifest::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ApexError::Io(_)));
    }
}
