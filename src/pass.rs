//! The full apex pass over a [`ModuleGraph`].
//!
//! ```text
//! apex_deps      (parallel)   bundles record requirements on their payload
//! apex_unique    (bottom-up)  freeze requirements, propagate uniqueness
//! apex           (bottom-up)  split modules into platform + apex variants
//! apex_min_sdk   (parallel)   updatable bundles check their payload
//! ```
//!
//! Each phase fails with every diagnostic it collected once all of its
//! modules were visited; later phases do not run.

use tracing::info;

use crate::apex::apex_unique_variations_mutator;
use crate::apex::apex_variations_mutator;
use crate::context::BottomUpMutatorContext;
use crate::error::Result;
use crate::graph::ModuleGraph;
use crate::modules::{apex_deps_mutator, apex_min_sdk_mutator, create_bundle_variation};

pub const APEX_DEPS: &str = "apex_deps";
pub const APEX_UNIQUE: &str = "apex_unique";
pub const APEX: &str = "apex";
pub const APEX_MIN_SDK: &str = "apex_min_sdk";

/// Bottom-up mutator for the `apex` phase. Bundles get a single variant named
/// after themselves; every other module is split by its requirements.
pub fn apex_mutator(ctx: &mut dyn BottomUpMutatorContext) -> Result<()> {
    if create_bundle_variation(ctx) {
        return Ok(());
    }
    apex_variations_mutator(ctx)
}

/// Run all apex phases in order. The registry is not reset; share a fresh
/// graph per pass.
pub fn run_apex_pass(graph: &mut ModuleGraph) -> Result<()> {
    graph.run_parallel(APEX_DEPS, apex_deps_mutator)?;
    graph.run_bottom_up(APEX_UNIQUE, apex_unique_variations_mutator)?;
    graph.run_bottom_up(APEX, apex_mutator)?;
    graph.run_parallel(APEX_MIN_SDK, apex_min_sdk_mutator)?;

    let stats = graph.stats();
    info!(
        modules = stats.module_count,
        variants = stats.variant_count,
        aliases = stats.alias_count,
        "apex pass complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apex::AVAILABLE_TO_ANY_APEX;
    use crate::config::{ApexConfig, MinSdkAllowlist};
    use crate::context::DepTag;
    use crate::error::ApexError;
    use crate::manifest::{BundleSpec, Manifest, ModuleSpec};

    fn bundle(name: &str, min_sdk: &str, payload: &[&str]) -> BundleSpec {
        BundleSpec {
            name: name.to_string(),
            min_sdk_version: Some(min_sdk.to_string()),
            updatable: true,
            payload: payload.iter().map(|s| s.to_string()).collect(),
            ..BundleSpec::default()
        }
    }

    fn module(name: &str, min_sdk: &str, deps: &[&str]) -> ModuleSpec {
        ModuleSpec {
            name: name.to_string(),
            apex_available: vec![AVAILABLE_TO_ANY_APEX.to_string()],
            min_sdk_version: Some(min_sdk.to_string()),
            deps: deps.iter().map(|s| s.to_string()).collect(),
            ..ModuleSpec::default()
        }
    }

    fn graph(manifest: Manifest, config: ApexConfig) -> ModuleGraph {
        manifest.into_graph(config).unwrap()
    }

    fn in_apexes(graph: &ModuleGraph, name: &str, variation: &str) -> Vec<String> {
        graph
            .module(name, variation)
            .and_then(|m| m.as_apex_module().map(|a| a.in_apexes().to_vec()))
            .unwrap()
    }

    #[test]
    fn test_identical_requirements_share_one_variant() {
        let mut graph = graph(
            Manifest {
                bundles: vec![
                    bundle("b1", "29", &["libfoo"]),
                    bundle("b2", "29", &["libfoo"]),
                    bundle("b3", "29", &["libfoo"]),
                ],
                modules: vec![module("libfoo", "29", &["libbar"]), module("libbar", "29", &[])],
            },
            ApexConfig::default(),
        );
        run_apex_pass(&mut graph).unwrap();

        assert_eq!(graph.variation_names("libfoo"), vec!["", "apex29"]);
        assert_eq!(graph.variation_names("libbar"), vec!["", "apex29"]);
        assert_eq!(in_apexes(&graph, "libfoo", "apex29"), vec!["b1", "b2", "b3"]);
        assert!(in_apexes(&graph, "libfoo", "").is_empty());

        for b in ["b1", "b2", "b3"] {
            assert_eq!(graph.variation_names(b), vec![b]);
            assert_eq!(
                graph.direct_deps(b, b),
                vec![("libfoo".to_string(), "apex29".to_string(), DepTag::Payload)]
            );
        }
        assert_eq!(
            graph.direct_deps("libfoo", "apex29"),
            vec![("libbar".to_string(), "apex29".to_string(), DepTag::Payload)]
        );

        let registry = graph.registry();
        assert!(registry.directly_in_all_apexes(&["b1", "b2", "b3"], "libfoo"));
        assert!(!registry.directly_in_apex("b1", "libbar"));
        assert!(registry.in_any_apex("libbar"));
    }

    #[test]
    fn test_distinct_min_sdk_splits() {
        let mut graph = graph(
            Manifest {
                bundles: vec![bundle("b1", "29", &["libfoo"]), bundle("b2", "30", &["libfoo"])],
                modules: vec![module("libfoo", "29", &[])],
            },
            ApexConfig::default(),
        );
        run_apex_pass(&mut graph).unwrap();

        assert_eq!(graph.variation_names("libfoo"), vec!["", "apex29", "apex30"]);
        assert_eq!(in_apexes(&graph, "libfoo", "apex30"), vec!["b2"]);
        assert_eq!(graph.stats().alias_count, 2);
    }

    #[test]
    fn test_platform_variant_not_installable_when_unavailable() {
        let mut graph = graph(
            Manifest {
                bundles: vec![bundle("b1", "29", &["libfoo"])],
                modules: vec![module("libfoo", "29", &[]), module("libplatform", "29", &[])],
            },
            ApexConfig::default(),
        );
        run_apex_pass(&mut graph).unwrap();

        let platform = graph.module("libfoo", "").unwrap();
        assert!(!platform.is_installable());
        assert!(platform.as_apex_module().unwrap().not_available_for_platform());
        let apex29 = graph.module("libfoo", "apex29").unwrap();
        assert!(apex29.is_installable());
        assert!(!apex29.as_apex_module().unwrap().not_available_for_platform());
        // Never requested by a bundle, never split.
        assert_eq!(graph.variation_names("libplatform"), vec![""]);
        assert!(graph.module("libplatform", "").unwrap().is_installable());
    }

    #[test]
    fn test_host_keeps_platform_variant_installable() {
        let mut config = ApexConfig::default();
        config.build.host = true;
        let mut graph = graph(
            Manifest {
                bundles: vec![bundle("b1", "29", &["libfoo"])],
                modules: vec![module("libfoo", "29", &[])],
            },
            config,
        );
        run_apex_pass(&mut graph).unwrap();

        assert!(graph.module("libfoo", "").unwrap().is_installable());
    }

    #[test]
    fn test_unique_requirement_propagates_to_dependents() {
        let mut libbar = module("libbar", "29", &[]);
        libbar.unique_apex_variations = true;
        let mut graph = graph(
            Manifest {
                bundles: vec![bundle("b1", "29", &["libfoo"]), bundle("b2", "29", &["libfoo"])],
                modules: vec![module("libfoo", "29", &["libbar"]), libbar],
            },
            ApexConfig::default(),
        );
        run_apex_pass(&mut graph).unwrap();

        assert_eq!(graph.variation_names("libbar"), vec!["", "b1", "b2"]);
        assert_eq!(graph.variation_names("libfoo"), vec!["", "b1", "b2"]);
        assert_eq!(
            graph.direct_deps("libfoo", "b2"),
            vec![("libbar".to_string(), "b2".to_string(), DepTag::Payload)]
        );
        assert_eq!(graph.stats().alias_count, 0);
    }

    #[test]
    fn test_stub_library_is_neither_split_nor_walked_through() {
        let mut libstub = module("libstub", "29", &["libinner"]);
        libstub.stubs = true;
        let mut graph = graph(
            Manifest {
                bundles: vec![bundle("b1", "29", &["libfoo"])],
                modules: vec![
                    module("libfoo", "29", &["libstub"]),
                    libstub,
                    module("libinner", "29", &[]),
                ],
            },
            ApexConfig::default(),
        );
        run_apex_pass(&mut graph).unwrap();

        assert_eq!(graph.variation_names("libfoo"), vec!["", "apex29"]);
        assert_eq!(graph.variation_names("libstub"), vec![""]);
        assert_eq!(graph.variation_names("libinner"), vec![""]);

        let stub = graph.module("libstub", "").unwrap().as_apex_module().unwrap();
        assert!(!stub.can_have_apex_variants());
        assert!(!stub.apex_module_base().has_apex_variations());
        assert!(stub.is_for_platform());

        let registry = graph.registry();
        assert!(registry.directly_in_apex("b1", "libfoo"));
        assert!(!registry.in_any_apex("libstub"));
        assert!(!registry.in_any_apex("libinner"));

        // The bundle variant of libfoo links against the single stub variant.
        assert_eq!(
            graph.direct_deps("libfoo", "apex29"),
            vec![("libstub".to_string(), String::new(), DepTag::Payload)]
        );
    }

    #[test]
    fn test_min_sdk_violation_reported_once() {
        let mut graph = graph(
            Manifest {
                bundles: vec![bundle("b1", "29", &["libfoo"])],
                modules: vec![
                    module("libfoo", "30", &["libbar"]),
                    ModuleSpec {
                        min_sdk_version: None,
                        ..module("libbar", "", &[])
                    },
                ],
            },
            ApexConfig::default(),
        );
        let err = run_apex_pass(&mut graph).unwrap_err();

        assert!(matches!(&err, ApexError::ModuleErrors { phase, .. } if phase == APEX_MIN_SDK));
        let diagnostics = err.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].module, "libfoo");
        assert_eq!(diagnostics[0].variation, "apex29");
        assert!(diagnostics[0].message.contains("newer SDK(30)"));
        assert!(diagnostics[0].message.contains("Dependency path: b1 -> libfoo"));
    }

    #[test]
    fn test_min_sdk_reports_transitive_dependency_path() {
        let mut graph = graph(
            Manifest {
                bundles: vec![bundle("b1", "29", &["libfoo"])],
                modules: vec![
                    module("libfoo", "29", &["libbar"]),
                    ModuleSpec {
                        min_sdk_version: None,
                        ..module("libbar", "", &[])
                    },
                ],
            },
            ApexConfig::default(),
        );
        let err = run_apex_pass(&mut graph).unwrap_err();
        let diagnostics = err.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].module, "libbar");
        assert!(diagnostics[0]
            .message
            .contains("neither min_sdk_version nor sdk_version specified"));
        assert!(diagnostics[0]
            .message
            .contains("Dependency path: b1 -> libfoo -> libbar"));
    }

    #[test]
    fn test_external_edge_is_not_checked() {
        let mut libfoo = module("libfoo", "29", &[]);
        libfoo.external_deps = vec!["libc".to_string()];
        let mut graph = graph(
            Manifest {
                bundles: vec![bundle("b1", "29", &["libfoo"])],
                modules: vec![libfoo, module("libc", "31", &[])],
            },
            ApexConfig::default(),
        );
        run_apex_pass(&mut graph).unwrap();

        // Outside the payload, so never built for the bundle.
        assert_eq!(graph.variation_names("libc"), vec![""]);
    }

    #[test]
    fn test_allowlist_exempts_listed_level() {
        let manifest = Manifest {
            bundles: vec![bundle("b1", "29", &["libfoo"])],
            modules: vec![module("libfoo", "30", &[])],
        };

        let mut config = ApexConfig::default();
        config.min_sdk_allowlist = MinSdkAllowlist::empty().with_module("libfoo", 29);
        let mut exempt = graph(manifest.clone(), config);
        run_apex_pass(&mut exempt).unwrap();

        let mut config = ApexConfig::default();
        config.min_sdk_allowlist = MinSdkAllowlist::empty().with_module("libfoo", 30);
        let mut listed_too_high = graph(manifest, config);
        assert!(run_apex_pass(&mut listed_too_high).is_err());
    }

    #[test]
    fn test_min_sdk_skipped_for_coverage_current_and_non_updatable() {
        let manifest = |b: BundleSpec| Manifest {
            bundles: vec![b],
            modules: vec![module("libfoo", "31", &[])],
        };

        let mut config = ApexConfig::default();
        config.coverage.native_coverage = true;
        let mut coverage = graph(manifest(bundle("b1", "29", &["libfoo"])), config);
        run_apex_pass(&mut coverage).unwrap();

        let mut current = graph(manifest(bundle("b1", "current", &["libfoo"])), ApexConfig::default());
        run_apex_pass(&mut current).unwrap();
        assert_eq!(current.variation_names("libfoo"), vec!["", "apex10000"]);

        let mut platform_bundle = bundle("b1", "29", &["libfoo"]);
        platform_bundle.updatable = false;
        let mut non_updatable = graph(manifest(platform_bundle), ApexConfig::default());
        run_apex_pass(&mut non_updatable).unwrap();
        assert!(!non_updatable
            .module("libfoo", "apex29")
            .and_then(|m| m.as_apex_module().map(|a| a.updatable()))
            .unwrap());
    }

    #[test]
    fn test_invalid_apex_available_fails_apex_phase() {
        let mut libfoo = module("libfoo", "29", &[]);
        libfoo.apex_available = vec!["com.android.nope".to_string()];
        let manifest = Manifest {
            bundles: vec![bundle("b1", "29", &["libfoo"])],
            modules: vec![libfoo],
        };

        let mut strict = graph(manifest.clone(), ApexConfig::default());
        let err = run_apex_pass(&mut strict).unwrap_err();
        assert!(matches!(&err, ApexError::ModuleErrors { phase, .. } if phase == APEX));
        let diagnostics = err.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].property.as_deref(), Some("apex_available"));
        assert!(diagnostics[0].message.contains("com.android.nope"));

        let mut config = ApexConfig::default();
        config.build.allow_missing_dependencies = true;
        let mut lenient = graph(manifest, config);
        run_apex_pass(&mut lenient).unwrap();
    }

    #[test]
    fn test_updatable_flag_reaches_variants() {
        let mut graph = graph(
            Manifest {
                bundles: vec![bundle("b1", "29", &["libfoo"])],
                modules: vec![module("libfoo", "29", &[])],
            },
            ApexConfig::default(),
        );
        run_apex_pass(&mut graph).unwrap();

        let variant = graph.module("libfoo", "apex29").unwrap();
        let apex = variant.as_apex_module().unwrap();
        assert!(apex.updatable());
        assert!(!apex.is_for_platform());
        assert!(graph
            .module("libfoo", "")
            .unwrap()
            .as_apex_module()
            .unwrap()
            .is_for_platform());
    }
}
