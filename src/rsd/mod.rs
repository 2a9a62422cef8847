//! # Dependency Format (rsd)
//!
//! One tab-separated record per leaf, ten columns:
//!
//! | # | Column | Empty |
//! |---|--------|-------|
//! | 1 | leaf id | |
//! | 2 | text | |
//! | 3 | dist | |
//! | 4 | constituent node id | `_` |
//! | 5 | reserved | `_` |
//! | 6 | features `k=v\|…` | `_` |
//! | 7 | head (0 = root) | |
//! | 8 | `name_r` / `name_m` / `ROOT` | |
//! | 9 | secondary edges, `\|`-joined | `_` |
//! | 10 | signals, `;`-joined | `_` |
//!
//! [`conllu`] reads the same information from CoNLL-U `Discourse=` MISC
//! annotations.

pub mod conllu;
pub mod record;

pub use record::{DepGraph, DepRecord, DepSecedge};
