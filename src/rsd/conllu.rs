//! CoNLL-U token files carrying discourse edges in the MISC column.
//!
//! A token whose MISC field holds `Discourse=<rel>:<edu>-><head>[:<dist>]`
//! (or `Discourse=ROOT:<edu>[:<dist>]`) opens a new leaf; every following
//! token up to the next such annotation belongs to it.

use super::{DepGraph, DepRecord};
use crate::model::Relation;
use crate::{Error, Result};

pub fn parse(conllu: &str) -> Result<DepGraph> {
    let mut records: Vec<DepRecord> = Vec::new();
    let mut words: Vec<&str> = Vec::new();

    for (i, line) in conllu.lines().enumerate() {
        let line_no = i + 1;
        if !line.contains('\t') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        // Multi-word token ranges and empty nodes.
        if fields[0].contains(['-', '.']) {
            continue;
        }
        let misc = fields.last().copied().unwrap_or("_");
        if let Some(value) = misc
            .split('|')
            .find_map(|a| a.trim().strip_prefix("Discourse="))
        {
            flush(&mut records, &mut words);
            records.push(discourse_record(value, line_no)?);
        }
        let Some(form) = fields.get(1) else {
            return Err(Error::Syntax {
                line: line_no,
                message: "token line lacks a FORM column".to_string(),
            });
        };
        if records.is_empty() {
            return Err(Error::Syntax {
                line: line_no,
                message: "token precedes the first Discourse annotation".to_string(),
            });
        }
        words.push(*form);
    }
    flush(&mut records, &mut words);

    tracing::debug!(records = records.len(), "read discourse annotations from CoNLL-U");
    Ok(DepGraph::new(records))
}

/// Moves the collected words into the text of the last opened record.
fn flush(records: &mut [DepRecord], words: &mut Vec<&str>) {
    if let Some(last) = records.last_mut() {
        if !words.is_empty() {
            last.text = words.join(" ");
        }
    }
    words.clear();
}

fn discourse_record(value: &str, line: usize) -> Result<DepRecord> {
    let syntax = |message: String| Error::Syntax { line, message };
    let parts: Vec<&str> = value.split(':').collect();
    let (name, edge) = match parts[..] {
        [name, edge, ..] => (name, edge),
        _ => return Err(syntax(format!("Discourse={value} lacks an edge"))),
    };
    let number = |s: &str| {
        s.trim()
            .parse::<u32>()
            .map_err(|_| syntax(format!("invalid unit id {s:?} in Discourse={value}")))
    };
    let (id, head) = match edge.split_once("->") {
        Some((id, head)) => (number(id)?, number(head)?),
        None => (number(edge)?, 0),
    };
    let dist = match parts.get(2) {
        Some(d) => number(d)?,
        None => 0,
    };
    let relation = if name == "ROOT" {
        None
    } else if name.ends_with("_m") {
        Some(Relation::from_tagged(name))
    } else {
        Some(Relation::satellite(name.strip_suffix("_r").unwrap_or(name)))
    };
    let mut record = DepRecord::new(id, String::new(), head, relation);
    record.dist = dist;
    Ok(record)
}
