//! Relation inventories: the `<relations>` header table and the default
//! eRST inventories used when generating headers.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::RelKind;

/// Declared relation names, split by kind.
///
/// A name may be declared for both kinds; the builder disambiguates per
/// edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationTable {
    satellite: BTreeSet<String>,
    multinuc: BTreeSet<String>,
}

const ERST_SATELLITE: &[&str] = &[
    "adversative-antithesis",
    "attribution-positive",
    "attribution-negative",
    "context-background",
    "causal-cause",
    "context-circumstance",
    "adversative-concession",
    "contingency-condition",
    "elaboration-additional",
    "elaboration-attribute",
    "evaluation-comment",
    "explanation-evidence",
    "explanation-justify",
    "mode-manner",
    "mode-means",
    "explanation-motivation",
    "organization-phatic",
    "organization-preparation",
    "organization-heading",
    "purpose-goal",
    "purpose-attribute",
    "topic-question",
    "restatement-partial",
    "causal-result",
    "topic-solutionhood",
];

const ERST_MULTINUC: &[&str] = &[
    "joint-other",
    "adversative-contrast",
    "same-unit",
    "joint-sequence",
    "joint-disjunction",
    "restatement-repetition",
    "joint-list",
];

/// Default eRST signal inventory: `(type, subtypes)`.
pub const DEFAULT_SIGNAL_TYPES: &[(&str, &[&str])] = &[
    ("dm", &["dm"]),
    (
        "graphical",
        &[
            "colon",
            "dash",
            "items_in_sequence",
            "layout",
            "parentheses",
            "question_mark",
            "quotation_marks",
            "semicolon",
        ],
    ),
    ("lexical", &["alternate_expression", "indicative_phrase", "indicative_word"]),
    ("morphological", &["mood", "tense"]),
    ("numerical", &["same_count"]),
    ("orphan", &["orphan"]),
    (
        "reference",
        &[
            "comparative_reference",
            "demonstrative_reference",
            "personal_reference",
            "propositional_reference",
        ],
    ),
    (
        "semantic",
        &[
            "antonymy",
            "attribution_source",
            "lexical_chain",
            "meronymy",
            "negation",
            "repetition",
            "synonymy",
        ],
    ),
    (
        "syntactic",
        &[
            "infinitival_clause",
            "interrupted_matrix_clause",
            "modified_head",
            "nominal_modifier",
            "parallel_syntactic_construction",
            "past_participial_clause",
            "present_participial_clause",
            "relative_clause",
            "reported_speech",
            "subject_auxiliary_inversion",
        ],
    ),
    ("unsure", &["unsure"]),
];

impl RelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default eRST relation inventory.
    pub fn erst_default() -> Self {
        let mut table = Self::new();
        for name in ERST_SATELLITE {
            table.insert(*name, RelKind::Satellite);
        }
        for name in ERST_MULTINUC {
            table.insert(*name, RelKind::Multinuc);
        }
        table
    }

    /// Declares `name` for `kind`. Span is never declared.
    pub fn insert(&mut self, name: impl Into<String>, kind: RelKind) {
        match kind {
            RelKind::Satellite => {
                self.satellite.insert(name.into());
            }
            RelKind::Multinuc => {
                self.multinuc.insert(name.into());
            }
            RelKind::Span => {}
        }
    }

    pub fn declares(&self, name: &str, kind: RelKind) -> bool {
        match kind {
            RelKind::Satellite => self.satellite.contains(name),
            RelKind::Multinuc => self.multinuc.contains(name),
            RelKind::Span => false,
        }
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.satellite.contains(name) || self.multinuc.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.satellite.is_empty() && self.multinuc.is_empty()
    }

    pub fn len(&self) -> usize {
        self.satellite.len() + self.multinuc.len()
    }

    /// All `(name, kind)` pairs, satellite relations first, each kind sorted.
    pub fn iter(&self) -> impl Iterator<Item = (&str, RelKind)> {
        self.satellite
            .iter()
            .map(|n| (n.as_str(), RelKind::Satellite))
            .chain(self.multinuc.iter().map(|n| (n.as_str(), RelKind::Multinuc)))
    }
}

/// Signal types and subtypes observed while writing one document.
///
/// Lives for a single conversion call; the writer fills it and renders the
/// `<sigtypes>` header from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalInventory(BTreeMap<String, BTreeSet<String>>);

impl SignalInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn erst_default() -> Self {
        let mut inventory = Self::new();
        for (kind, subtypes) in DEFAULT_SIGNAL_TYPES {
            for subtype in *subtypes {
                inventory.record(kind, subtype);
            }
        }
        inventory
    }

    pub fn record(&mut self, kind: &str, subtype: &str) {
        self.0
            .entry(kind.to_string())
            .or_default()
            .insert(subtype.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(type, subtypes)` in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}
