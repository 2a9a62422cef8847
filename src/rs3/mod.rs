//! # Constituent Format (rs3 / rs4)
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Markup events | [`reader`] | [`RawDocument`] |
//! | Interpretation | [`builder`] | [`RstTree`](crate::model::RstTree) |
//! | Serialization | [`writer`] | canonical markup |

pub mod builder;
pub mod reader;
pub mod writer;

pub use builder::{build, sanitize_relname};
pub use reader::{read, RawDocument};
pub use writer::{write, WriteOptions};

use crate::model::RstTree;
use crate::Result;

/// Reads and builds a constituent tree from rs3/rs4 markup.
pub fn parse(xml: &str) -> Result<RstTree> {
    build(read(xml)?)
}
