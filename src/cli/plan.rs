//! Plan command: run the apex pass over a manifest and report the result.
//!
//! Diagnostics do not abort the report; the variants reached before the
//! failing phase are still printed, followed by every diagnostic.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use crate::config::ApexConfig;
use crate::error::ApexError;
use crate::graph::{GraphStats, ModuleDiagnostic, ModuleGraph, VariantSummary};
use crate::manifest::Manifest;
use crate::pass::run_apex_pass;

/// Everything the pass produced for one manifest.
#[derive(Debug, Serialize)]
pub struct PlanReport {
    pub variants: Vec<VariantSummary>,
    /// module → bundle → direct member
    pub registry: BTreeMap<String, BTreeMap<String, bool>>,
    pub failed_phase: Option<String>,
    pub diagnostics: Vec<ModuleDiagnostic>,
}

impl PlanReport {
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

pub fn load_graph(manifest: &Path, config: ApexConfig) -> Result<ModuleGraph> {
    let parsed = Manifest::load(manifest)
        .with_context(|| format!("Failed to load manifest {}", manifest.display()))?;
    parsed
        .into_graph(config)
        .with_context(|| format!("Invalid module graph in {}", manifest.display()))
}

/// Run the pass, turning phase diagnostics into report entries.
pub fn build_report(graph: &mut ModuleGraph) -> Result<PlanReport> {
    let (failed_phase, diagnostics) = match run_apex_pass(graph) {
        Ok(()) => (None, Vec::new()),
        Err(ApexError::ModuleErrors { phase, diagnostics }) => (Some(phase), diagnostics),
        Err(err) => return Err(err).context("apex pass failed"),
    };
    Ok(PlanReport {
        variants: graph.summaries(),
        registry: graph.registry().snapshot(),
        failed_phase,
        diagnostics,
    })
}

/// Human-readable report.
pub fn render_text(report: &PlanReport) -> String {
    let mut out = String::new();
    let mut current = "";
    for variant in &report.variants {
        if variant.name != current {
            let _ = writeln!(out, "{}", variant.name);
            current = &variant.name;
        }
        let label = if variant.variation.is_empty() {
            "(platform)"
        } else {
            variant.variation.as_str()
        };
        let _ = write!(out, "  {}", label);
        if !variant.in_apexes.is_empty() {
            let _ = write!(out, " [{}]", variant.in_apexes.join(", "));
        }
        if !variant.installable {
            let _ = write!(out, " uninstallable");
        }
        if variant.updatable {
            let _ = write!(out, " updatable");
        }
        out.push('\n');
    }

    if !report.registry.is_empty() {
        out.push_str("\nregistry:\n");
        for (module, apexes) in &report.registry {
            let entries: Vec<String> = apexes
                .iter()
                .map(|(apex, &direct)| {
                    if direct {
                        apex.clone()
                    } else {
                        format!("{} (indirect)", apex)
                    }
                })
                .collect();
            let _ = writeln!(out, "  {}: {}", module, entries.join(", "));
        }
    }
    out
}

/// Entry point for `plan`. Returns false when the pass reported diagnostics.
pub fn execute(manifest: &Path, config: ApexConfig, json: bool) -> Result<bool> {
    let mut graph = load_graph(manifest, config)?;
    let report = build_report(&mut graph)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report));
    }
    print_diagnostics(&report);
    Ok(report.is_ok())
}

/// Entry point for `stats`.
pub fn stats(manifest: &Path, config: ApexConfig) -> Result<bool> {
    let mut graph = load_graph(manifest, config)?;
    let before = graph.stats();
    let report = build_report(&mut graph)?;
    let after = graph.stats();

    print_stats("before", &before);
    print_stats("after", &after);
    println!("registry: {} modules", report.registry.len());
    print_diagnostics(&report);
    Ok(report.is_ok())
}

fn print_stats(label: &str, stats: &GraphStats) {
    println!(
        "{}: {} modules, {} variants, {} edges, {} aliases",
        label, stats.module_count, stats.variant_count, stats.edge_count, stats.alias_count
    );
}

fn print_diagnostics(report: &PlanReport) {
    if let Some(phase) = &report.failed_phase {
        eprintln!("{} failed with {} error(s):", phase, report.diagnostics.len());
    }
    for diagnostic in &report.diagnostics {
        eprintln!("  {}", diagnostic);
    }
}
