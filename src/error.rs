//! Error types for apex variant mutation.

use std::fmt;
use std::path::PathBuf;

use crate::graph::ModuleDiagnostic;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApexError>;

#[derive(Debug, thiserror::Error)]
pub enum ApexError {
    #[error("ApiLevel must be an integer or a preview codename: {0:?}")]
    InvalidApiLevel(String),

    #[error("not found a version(<={ceiling}) in versionList: {candidates:?}")]
    NoSdkVersion {
        ceiling: String,
        candidates: Vec<String>,
        #[source]
        source: Option<Box<ApexError>>,
    },

    #[error("module {0:?} already exists")]
    DuplicateModule(String),

    #[error("unknown module {0:?}")]
    UnknownModule(String),

    #[error("dependency cycle detected at module {0:?}")]
    DependencyCycle(String),

    #[error("cannot record apex variation {variation:?} on {module:?}: requirements are frozen")]
    RequirementsFrozen { module: String, variation: String },

    #[error("{module:?} ran {phase} before dependency {dependency:?} was resolved")]
    PhaseOrder {
        phase: &'static str,
        module: String,
        dependency: String,
    },

    #[error("apex variation of {0:?} is already assigned")]
    VariationAssigned(String),

    #[error("{phase}: {}", DiagnosticList(.diagnostics))]
    ModuleErrors {
        phase: String,
        diagnostics: Vec<ModuleDiagnostic>,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApexError {
    /// Diagnostics carried by a failed phase, empty for every other error.
    pub fn diagnostics(&self) -> &[ModuleDiagnostic] {
        match self {
            ApexError::ModuleErrors { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

struct DiagnosticList<'a>(&'a [ModuleDiagnostic]);

impl fmt::Display for DiagnosticList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s)", self.0.len())?;
        for diagnostic in self.0 {
            write!(f, "\n  {}", diagnostic)?;
        }
        Ok(())
    }
}
