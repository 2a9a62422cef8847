//! Conversion settings.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::RelationTable;
use crate::{Error, Result};

// ============================================================================
// Head algorithm
// ============================================================================

/// How multinuc members choose their dependency head.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadAlgorithm {
    /// Every member attaches to the multinuc's leftmost member.
    #[default]
    Li,
    /// Each member attaches to its left neighbour.
    Chain,
    /// Members adopt the head and relation of the multinuc itself.
    Hirao,
}

impl HeadAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            HeadAlgorithm::Li => "li",
            HeadAlgorithm::Chain => "chain",
            HeadAlgorithm::Hirao => "hirao",
        }
    }
}

impl FromStr for HeadAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "li" => Ok(HeadAlgorithm::Li),
            "chain" => Ok(HeadAlgorithm::Chain),
            "hirao" => Ok(HeadAlgorithm::Hirao),
            other => Err(Error::Config(format!("unknown head algorithm {other:?}"))),
        }
    }
}

impl std::fmt::Display for HeadAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Sibling ordering during reconstruction
// ============================================================================

/// Order in which siblings sharing a head are stacked into spans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthOrdering {
    /// The stored `dist` column.
    #[default]
    Dist,
    /// Left dependents attach closest, then right dependents.
    Ltr,
    /// Right dependents attach closest, then left dependents.
    Rtl,
}

impl DepthOrdering {
    pub fn as_str(self) -> &'static str {
        match self {
            DepthOrdering::Dist => "dist",
            DepthOrdering::Ltr => "ltr",
            DepthOrdering::Rtl => "rtl",
        }
    }
}

impl FromStr for DepthOrdering {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dist" => Ok(DepthOrdering::Dist),
            "ltr" => Ok(DepthOrdering::Ltr),
            "rtl" => Ok(DepthOrdering::Rtl),
            other => Err(Error::Config(format!("unknown depth ordering {other:?}"))),
        }
    }
}

impl std::fmt::Display for DepthOrdering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Relation inventory
// ============================================================================

/// Source of the `<relations>` header when rebuilding markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode")]
pub enum RelationPolicy {
    /// Declare exactly the relations the records use.
    #[default]
    Collect,
    /// Declare a fixed table and check every record against it.
    Canonical {
        table: RelationTable,
        /// Fail on an unlisted relation instead of substituting `span`.
        strict: bool,
    },
}

impl RelationPolicy {
    /// The default eRST inventory, strict.
    pub fn erst(strict: bool) -> Self {
        RelationPolicy::Canonical {
            table: RelationTable::erst_default(),
            strict,
        }
    }
}

// ============================================================================
// ConvertConfig
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub algorithm: HeadAlgorithm,
    /// Exempt same-unit multinucs from the hirao and chain rewrites.
    pub keep_same_unit: bool,
    /// Write each leaf's source id into the fourth dependency column.
    pub node_ids: bool,
    pub ordering: DepthOrdering,
    pub relations: RelationPolicy,
    /// Write the default eRST signal inventory into `<sigtypes>`.
    pub default_signals: bool,
}

impl ConvertConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_algorithm(mut self, algorithm: HeadAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_ordering(mut self, ordering: DepthOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_relations(mut self, relations: RelationPolicy) -> Self {
        self.relations = relations;
        self
    }
}
