//! Token-feature decorations for the dependency feature column.
//!
//! Linguistic enrichment lives outside this crate. A caller that has it
//! plugs in a [`FeatureProvider`]; without one the column stays `_`.

/// Supplies per-leaf feature pairs.
pub trait FeatureProvider {
    /// Features of leaf `leaf_id`, whose text is `text`. An empty list
    /// leaves the column empty.
    fn features(&self, leaf_id: u32, text: &str) -> Vec<(String, String)>;
}

/// Any closure with the right shape is a provider.
impl<F> FeatureProvider for F
where
    F: Fn(u32, &str) -> Vec<(String, String)>,
{
    fn features(&self, leaf_id: u32, text: &str) -> Vec<(String, String)> {
        self(leaf_id, text)
    }
}

/// Renders pairs as `key=value|key=value`. `=` inside a value is written
/// as `&eq;` and `|` as `&pipe;`; tabs become spaces.
pub fn render(pairs: &[(String, String)]) -> Option<String> {
    if pairs.is_empty() {
        return None;
    }
    let rendered = pairs
        .iter()
        .map(|(k, v)| {
            let value = v.replace('=', "&eq;").replace('|', "&pipe;");
            format!("{k}={value}").replace('\t', " ")
        })
        .collect::<Vec<_>>()
        .join("|");
    Some(rendered)
}
