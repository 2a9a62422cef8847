//! Signals: annotations of the linguistic cue behind a relation.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sorted, de-duplicated list of 1-based token ids a signal anchors on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenSet(Vec<u32>);

impl TokenSet {
    pub fn new(mut tokens: Vec<u32>) -> Self {
        tokens.sort_unstable();
        tokens.dedup();
        Self(tokens)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<u32> {
        self.0.first().copied()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Range-compressed form: `5-7,9`. Empty for an empty set.
    pub fn ranges(&self) -> String {
        let mut parts = Vec::new();
        let mut iter = self.0.iter().copied().peekable();
        while let Some(start) = iter.next() {
            let mut end = start;
            while iter.peek() == Some(&(end + 1)) {
                end += 1;
                iter.next();
            }
            if start == end {
                parts.push(start.to_string());
            } else {
                parts.push(format!("{start}-{end}"));
            }
        }
        parts.join(",")
    }

    /// Comma-expanded form: `5,6,7,9`.
    pub fn expanded(&self) -> String {
        self.0.iter().map(u32::to_string).collect::<Vec<_>>().join(",")
    }
}

/// Accepts both the expanded and the range-compressed spelling, plus `_`
/// or the empty string for "no tokens".
impl FromStr for TokenSet {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "_" {
            return Ok(Self::default());
        }
        let mut tokens = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let parse = |t: &str| {
                t.parse::<u32>()
                    .map_err(|_| format!("invalid token id {t:?} in {s:?}"))
            };
            match part.split_once('-') {
                Some((a, b)) => {
                    let (a, b) = (parse(a)?, parse(b)?);
                    if a > b {
                        return Err(format!("descending token range {part:?}"));
                    }
                    tokens.extend(a..=b);
                }
                None => tokens.push(parse(part)?),
            }
        }
        Ok(Self::new(tokens))
    }
}

/// A signal anchored on a node's incoming edge or on a secondary edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signal {
    #[serde(rename = "type")]
    pub kind: String,
    pub subtype: String,
    pub tokens: TokenSet,
    pub status: Option<String>,
}

impl Signal {
    pub fn new(kind: impl Into<String>, subtype: impl Into<String>, tokens: TokenSet) -> Self {
        Self {
            kind: kind.into(),
            subtype: subtype.into(),
            tokens,
            status: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Dependency-format spelling: `type-subtype-tokens[-status]`, with `_`
    /// standing in for an empty token list.
    pub fn to_rsd(&self) -> String {
        let tokens = if self.tokens.is_empty() {
            "_".to_string()
        } else {
            self.tokens.ranges()
        };
        match &self.status {
            Some(status) => format!("{}-{}-{}-{}", self.kind, self.subtype, tokens, status),
            None => format!("{}-{}-{}", self.kind, self.subtype, tokens),
        }
    }

    /// Parses [`Signal::to_rsd`] output. A trailing field that is not a
    /// token range is the status.
    pub fn from_rsd(s: &str) -> std::result::Result<Self, String> {
        let mut parts = s.splitn(3, '-');
        let (Some(kind), Some(subtype)) = (parts.next(), parts.next()) else {
            return Err(format!("signal {s:?} lacks a subtype"));
        };
        let rest = parts.next().unwrap_or("");
        let is_range = !rest.is_empty()
            && rest.chars().all(|c| c.is_ascii_digit() || c == '-' || c == ',');
        let (tokens, status) = if is_range || rest == "_" || rest.is_empty() {
            (rest, None)
        } else {
            match rest.rsplit_once('-') {
                Some((tokens, "_")) => (tokens, None),
                Some((tokens, status)) => (tokens, Some(status.to_string())),
                None => return Err(format!("signal {s:?} has malformed token list")),
            }
        };
        let tokens = tokens.parse::<TokenSet>()?;
        Ok(Self {
            kind: kind.to_string(),
            subtype: subtype.to_string(),
            tokens,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_compress_consecutive_ids() {
        let set: TokenSet = "9,5,6,7".parse().unwrap();
        assert_eq!(set.ranges(), "5-7,9");
        assert_eq!(set.expanded(), "5,6,7,9");
        assert_eq!("5-7,9".parse::<TokenSet>().unwrap(), set);
    }

    #[test]
    fn rsd_signal_with_and_without_status() {
        let plain = Signal::from_rsd("dm-but-70").unwrap();
        assert_eq!(plain.status, None);
        assert_eq!(plain.tokens.as_slice(), &[70]);

        let gold = Signal::from_rsd("semantic-lexical_chain-72-73,85-gold").unwrap();
        assert_eq!(gold.tokens.ranges(), "72-73,85");
        assert_eq!(gold.status.as_deref(), Some("gold"));
        assert_eq!(gold.to_rsd(), "semantic-lexical_chain-72-73,85-gold");

        let empty = Signal::from_rsd("graphical-layout-_-_").unwrap();
        assert!(empty.tokens.is_empty());
        assert_eq!(empty.status, None);
        assert_eq!(empty.to_rsd(), "graphical-layout-_");
    }

    #[test]
    fn rejects_signal_without_subtype() {
        assert!(Signal::from_rsd("dm").is_err());
        assert!("3-1".parse::<TokenSet>().is_err());
    }
}
