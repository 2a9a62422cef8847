//! # rstdep: RST constituent trees ↔ discourse dependencies
//!
//! Lossless conversion between Rhetorical Structure Theory analyses in the
//! rs3/rs4 markup and one-head-per-unit dependency graphs in the
//! tab-separated rsd format.
//!
//! ## Design Principles
//!
//! 1. **Arena model**: `RstTree` stores nodes contiguously; every link is a `NodeId`
//! 2. **Formats own nothing**: markup and rsd readers produce plain data
//! 3. **Deterministic output**: the canonicalizer fixes group ids, so
//!    `rs3 → rsd → rs3` reproduces the canonical markup byte for byte
//! 4. **Call-local state**: a conversion shares nothing with any other
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rstdep::{Converter, Converted, ConvertConfig, HeadAlgorithm};
//!
//! # fn example(xml: &str) -> rstdep::Result<()> {
//! let converter = Converter::new(ConvertConfig::default().with_algorithm(HeadAlgorithm::Li));
//!
//! match converter.rs3_to_rsd(xml)? {
//!     Converted::Rsd(rsd) => {
//!         let rebuilt = converter.rsd_to_rs3(&rsd)?;
//!         println!("{rebuilt}");
//!     }
//!     Converted::Diagnostic(message) => eprintln!("skipped: {message}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Head Algorithms
//!
//! | Algorithm | Multinuc members attach to | Round trip |
//! |-----------|---------------------------|------------|
//! | `li` (default) | the leftmost member | exact |
//! | `chain` | their left neighbour | lossy |
//! | `hirao` | the multinuc's own head | lossy |

// ============================================================================
// Modules
// ============================================================================

pub mod canonical;
pub mod config;
pub mod features;
pub mod model;
pub mod project;
pub mod reconstruct;
pub mod rs3;
pub mod rsd;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    Node, NodeId, NodeKind, RelKind, Relation, RelationTable, RstTree, SecondaryEdge, Signal,
    TokenSet,
};

// ============================================================================
// Re-exports: Formats and settings
// ============================================================================

pub use config::{ConvertConfig, DepthOrdering, HeadAlgorithm, RelationPolicy};
pub use features::FeatureProvider;
pub use rs3::WriteOptions;
pub use rsd::{DepGraph, DepRecord, DepSecedge};

// ============================================================================
// Top-level Converter handle
// ============================================================================

/// Outcome of a markup → rsd conversion.
///
/// Unreadable markup is an expected condition when converting a corpus, so
/// it comes back as a diagnostic instead of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Converted {
    Rsd(String),
    Diagnostic(String),
}

impl Converted {
    pub fn is_diagnostic(&self) -> bool {
        matches!(self, Converted::Diagnostic(_))
    }

    pub fn rsd(&self) -> Option<&str> {
        match self {
            Converted::Rsd(rsd) => Some(rsd),
            Converted::Diagnostic(_) => None,
        }
    }
}

/// The primary entry point. A `Converter` holds the settings for every
/// conversion it runs; conversions themselves are independent.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConvertConfig,
}

impl Converter {
    pub fn new(config: ConvertConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Markup → tree.
    pub fn parse_rs3(&self, xml: &str) -> Result<RstTree> {
        rs3::parse(xml)
    }

    /// Tree → dependency graph.
    pub fn project(
        &self,
        tree: &RstTree,
        provider: Option<&dyn FeatureProvider>,
    ) -> Result<DepGraph> {
        project::project(tree, &self.config, provider)
    }

    /// Dependency graph → canonical tree.
    pub fn reconstruct(&self, graph: &DepGraph) -> Result<RstTree> {
        reconstruct::reconstruct(graph, &self.config)
    }

    pub fn write_rs3(&self, tree: &RstTree) -> String {
        rs3::write(
            tree,
            WriteOptions {
                default_signals: self.config.default_signals,
            },
        )
    }

    /// Markup → rsd text, with the feature column left empty.
    pub fn rs3_to_rsd(&self, xml: &str) -> Result<Converted> {
        self.convert_rs3(xml, None)
    }

    /// Markup → rsd text, with features from `provider`.
    pub fn rs3_to_rsd_with(&self, xml: &str, provider: &dyn FeatureProvider) -> Result<Converted> {
        self.convert_rs3(xml, Some(provider))
    }

    /// Reads a markup file and converts it.
    pub fn rs3_file_to_rsd(&self, path: impl AsRef<std::path::Path>) -> Result<Converted> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "converting constituent file");
        self.rs3_to_rsd(&xml)
    }

    fn convert_rs3(&self, xml: &str, provider: Option<&dyn FeatureProvider>) -> Result<Converted> {
        let tree = match self.parse_rs3(xml) {
            Ok(tree) => tree,
            Err(e) if e.is_diagnostic() => {
                tracing::warn!(error = %e, "constituent markup not converted");
                return Ok(Converted::Diagnostic(e.to_string()));
            }
            Err(e) => return Err(e),
        };
        let graph = self.project(&tree, provider)?;
        Ok(Converted::Rsd(graph.to_rsd()))
    }

    /// rsd text → canonical markup.
    pub fn rsd_to_rs3(&self, rsd: &str) -> Result<String> {
        let graph = DepGraph::parse(rsd)?;
        let tree = self.reconstruct(&graph)?;
        Ok(self.write_rs3(&tree))
    }

    /// CoNLL-U with `Discourse=` annotations → rsd text.
    pub fn conllu_to_rsd(&self, conllu: &str) -> Result<String> {
        Ok(rsd::conllu::parse(conllu)?.to_rsd())
    }

    /// CoNLL-U with `Discourse=` annotations → canonical markup.
    pub fn conllu_to_rs3(&self, conllu: &str) -> Result<String> {
        let graph = rsd::conllu::parse(conllu)?;
        let tree = self.reconstruct(&graph)?;
        Ok(self.write_rs3(&tree))
    }

    /// Markup → canonical markup, without going through dependencies.
    pub fn normalize_rs3(&self, xml: &str) -> Result<String> {
        let tree = canonical::canonicalize(self.parse_rs3(xml)?)?;
        Ok(self.write_rs3(&tree))
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed markup: {0}")]
    Malformed(String),

    #[error("Document contains no segments")]
    NoSegments,

    #[error("Unknown node {id} ({context})")]
    UnknownNode { id: String, context: String },

    #[error("Cycle through node {node}: path exceeds {limit} steps")]
    Cycle { node: u32, limit: usize },

    #[error("Relation {name:?} ({kind}) is not in the canonical relation table")]
    UnknownRelation { name: String, kind: RelKind },

    #[error("Syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("Corrupt structure: {0}")]
    Corrupt(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Unreadable input that is reported rather than raised.
    pub fn is_diagnostic(&self) -> bool {
        matches!(self, Error::Malformed(_) | Error::NoSegments)
    }

    /// Errors that signal corpus-wide schema drift; a batch run should stop
    /// rather than continue with the next file.
    pub fn halts_run(&self) -> bool {
        matches!(self, Error::UnknownRelation { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
