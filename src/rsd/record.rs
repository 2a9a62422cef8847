//! The 10-column dependency record and its line codec.

use serde::{Deserialize, Serialize};

use crate::model::{Relation, Signal};
use crate::{Error, Result};

const ROOT: &str = "ROOT";

/// A secondary edge re-anchored on leaves, stored on its source leaf.
///
/// Encoded as `target:relation:source_height:target_height:signals`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepSecedge {
    pub target: u32,
    pub relation: String,
    /// Levels to climb from the source leaf to the node the edge leaves from.
    pub source_height: u32,
    pub target_height: u32,
    pub signals: Vec<Signal>,
}

impl DepSecedge {
    pub fn encode(&self) -> String {
        let mut signals: Vec<String> = self.signals.iter().map(Signal::to_rsd).collect();
        signals.sort();
        let signals = if signals.is_empty() {
            "_".to_string()
        } else {
            signals.join(";")
        };
        format!(
            "{}:{}:{}:{}:{}",
            self.target, self.relation, self.source_height, self.target_height, signals
        )
    }

    pub fn decode(s: &str) -> std::result::Result<Self, String> {
        let fields: Vec<&str> = s.splitn(5, ':').collect();
        let [target, relation, source_height, target_height, signals] = fields[..] else {
            return Err(format!("secondary edge {s:?} needs 5 ':'-separated fields"));
        };
        let number = |f: &str| {
            f.parse::<u32>()
                .map_err(|_| format!("invalid number {f:?} in secondary edge {s:?}"))
        };
        Ok(Self {
            target: number(target)?,
            relation: relation.to_string(),
            source_height: number(source_height)?,
            target_height: number(target_height)?,
            signals: decode_signals(signals)?,
        })
    }
}

/// One leaf of the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepRecord {
    pub id: u32,
    pub text: String,
    /// Ordering key among siblings sharing a head.
    pub dist: u32,
    /// Source id of the constituent node, when requested.
    pub node_id: Option<String>,
    /// Pre-rendered `key=value|…` feature string.
    pub features: Option<String>,
    /// Head leaf id; 0 for the root.
    pub head: u32,
    /// `None` is the `ROOT` relation.
    pub relation: Option<Relation>,
    pub secedges: Vec<DepSecedge>,
    pub signals: Vec<Signal>,
}

impl DepRecord {
    pub fn new(id: u32, text: impl Into<String>, head: u32, relation: Option<Relation>) -> Self {
        Self {
            id,
            text: text.into(),
            dist: 0,
            node_id: None,
            features: None,
            head,
            relation,
            secedges: Vec::new(),
            signals: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.relation.is_none()
    }

    /// `name_r`, `name_m`, `span` or `ROOT`.
    pub fn relation_label(&self) -> String {
        self.relation
            .as_ref()
            .map(Relation::tagged)
            .unwrap_or_else(|| ROOT.to_string())
    }

    pub fn to_line(&self) -> String {
        let secedges = if self.secedges.is_empty() {
            "_".to_string()
        } else {
            let mut packed: Vec<String> = self.secedges.iter().map(DepSecedge::encode).collect();
            packed.sort();
            packed.join("|")
        };
        let signals = if self.signals.is_empty() {
            "_".to_string()
        } else {
            self.signals.iter().map(Signal::to_rsd).collect::<Vec<_>>().join(";")
        };
        [
            self.id.to_string(),
            self.text.replace('\t', " "),
            self.dist.to_string(),
            self.node_id.clone().unwrap_or_else(|| "_".to_string()),
            "_".to_string(),
            self.features.clone().unwrap_or_else(|| "_".to_string()),
            self.head.to_string(),
            self.relation_label(),
            secedges,
            signals,
        ]
        .join("\t")
    }

    /// Decodes one record; `line` is the 1-based line number for errors.
    pub fn parse_line(text: &str, line: usize) -> Result<Self> {
        let syntax = |message: String| Error::Syntax { line, message };
        let fields: Vec<&str> = text.split('\t').collect();
        if fields.len() < 10 {
            return Err(syntax(format!("expected 10 columns, found {}", fields.len())));
        }
        let number = |f: &str, column: &str| {
            if f == "_" {
                return Ok(0);
            }
            f.trim()
                .parse::<u32>()
                .map_err(|_| syntax(format!("invalid {column} {f:?}")))
        };
        let optional = |f: &str| (f != "_" && !f.is_empty()).then(|| f.to_string());

        let id = number(fields[0], "id")?;
        if id == 0 {
            return Err(syntax("record id must be positive".to_string()));
        }
        let relation = match fields[7].trim() {
            ROOT => None,
            tagged => Some(Relation::from_tagged(tagged)),
        };
        let secedges = if fields[8] == "_" {
            Vec::new()
        } else {
            fields[8]
                .split('|')
                .map(DepSecedge::decode)
                .collect::<std::result::Result<_, _>>()
                .map_err(&syntax)?
        };
        Ok(Self {
            id,
            text: fields[1].to_string(),
            dist: number(fields[2], "dist")?,
            node_id: optional(fields[3]),
            features: optional(fields[5]),
            head: number(fields[6], "head")?,
            relation,
            secedges,
            signals: decode_signals(fields[9].trim_end()).map_err(&syntax)?,
        })
    }
}

fn decode_signals(s: &str) -> std::result::Result<Vec<Signal>, String> {
    if s == "_" || s.is_empty() {
        return Ok(Vec::new());
    }
    s.split(';').map(Signal::from_rsd).collect()
}

/// A whole dependency document: one record per leaf, in id order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepGraph {
    pub records: Vec<DepRecord>,
}

impl DepGraph {
    pub fn new(records: Vec<DepRecord>) -> Self {
        Self { records }
    }

    /// Parses rsd text. Blank lines and `#` comments are skipped.
    pub fn parse(rsd: &str) -> Result<Self> {
        let mut records = Vec::new();
        for (i, line) in rsd.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            records.push(DepRecord::parse_line(line, i + 1)?);
        }
        tracing::debug!(records = records.len(), "parsed dependency records");
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DepRecord> {
        self.records.iter()
    }

    pub fn get(&self, id: u32) -> Option<&DepRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// rsd text, newline-terminated.
    pub fn to_rsd(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&record.to_line());
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl std::fmt::Display for DepGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rsd())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RelKind;

    const LINE: &str = "2\tworship is legal\t5\t_\t_\t_\t5\tpreparation_r\t4:joint:1:0:dm-and-3|7:contrast:0:2:_\tdm-but-70-gold;graphical-layout-_";

    #[test]
    fn decodes_every_column() {
        let rec = DepRecord::parse_line(LINE, 1).unwrap();
        assert_eq!(rec.id, 2);
        assert_eq!(rec.dist, 5);
        assert_eq!(rec.head, 5);
        assert_eq!(rec.relation.as_ref().map(|r| r.kind), Some(RelKind::Satellite));
        assert_eq!(rec.secedges.len(), 2);
        assert_eq!(rec.secedges[0].source_height, 1);
        assert_eq!(rec.secedges[1].target_height, 2);
        assert_eq!(rec.signals[0].status.as_deref(), Some("gold"));
        assert!(rec.signals[1].tokens.is_empty());
        assert_eq!(rec.to_line(), LINE);
    }

    #[test]
    fn root_records() {
        let rec = DepRecord::parse_line("1\tx\t0\t_\t_\t_\t0\tROOT\t_\t_", 3).unwrap();
        assert!(rec.is_root());
        assert_eq!(rec.relation_label(), "ROOT");
    }

    #[test]
    fn syntax_errors_name_the_line() {
        let err = DepGraph::parse("1\tx\t0\t_\t_\t_\t0\tROOT\t_\t_\n\n2\tshort\n").unwrap_err();
        assert!(matches!(err, Error::Syntax { line: 3, .. }));
        let err = DepRecord::parse_line("1\tx\t0\t_\t_\t_\tq\tROOT\t_\t_", 1).unwrap_err();
        assert!(matches!(err, Error::Syntax { line: 1, .. }));
    }

    #[test]
    fn json_export_round_trips() {
        let graph = DepGraph::parse(&format!("{LINE}\n")).unwrap();
        let json = graph.to_json().unwrap();
        assert!(json.contains("\"preparation\""));
        assert_eq!(DepGraph::from_json(&json).unwrap(), graph);
    }
}
