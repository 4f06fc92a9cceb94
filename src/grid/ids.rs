//! Generated row ids

use std::collections::HashSet;

use crate::row::{row_id, Row};

/// A fresh id `<prefix>_<ulid>` not used by any of `rows`.
///
/// The ULID carries a timestamp plus randomness, so a collision is only
/// possible within the same millisecond; it is still checked for.
pub fn generate_row_id(prefix: &str, rows: &[Row]) -> String {
    let taken: HashSet<String> = rows.iter().filter_map(row_id).collect();
    let prefix = if prefix.is_empty() { "row" } else { prefix };
    loop {
        let candidate = format!("{}_{}", prefix, ulid::Ulid::new().to_string().to_lowercase());
        if !taken.contains(&candidate) {
            return candidate;
        }
    }
}
