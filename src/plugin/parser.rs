//! Multi-valued implementation entries
//!
//! A configuration value such as `"com.example.FooImpl,com.example.BarImpl"`
//! names one implementation per delimited segment. A single empty or blank
//! segment invalidates the whole entry.

use crate::plugin::{Capability, Catalog, Plugin};
use crate::types::Result;
use tracing::warn;

/// Split `raw` into trimmed identifiers, or `None` if any segment is blank.
pub fn split_identifiers(raw: &str, delimiter: char) -> Option<Vec<&str>> {
    let segments: Vec<&str> = raw.split(delimiter).map(str::trim).collect();

    if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return None;
    }

    Some(segments)
}

/// Construct every implementation named in `raw`, in order.
///
/// A malformed entry yields an empty list; any construction failure aborts
/// the whole entry.
pub fn instantiate_list<C: Capability + ?Sized>(
    catalog: &Catalog,
    raw: &str,
    delimiter: char,
) -> Result<Vec<Plugin<C>>> {
    let Some(identifiers) = split_identifiers(raw, delimiter) else {
        warn!(
            "Ignoring malformed {} implementation list: {:?}",
            C::NAME,
            raw
        );
        return Ok(Vec::new());
    };

    identifiers
        .into_iter()
        .map(|identifier| catalog.instantiate::<C>(identifier))
        .collect()
}
