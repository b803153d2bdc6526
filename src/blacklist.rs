//! Name blacklist: cast name fragments unioned with the static filter terms.
//!
//! A raw cast entry may carry several space-separated name variants
//! ("李四 李某"), so entries split on whitespace before the union. Built once
//! per film, immutable afterwards, shared read-only by the processors.

use std::collections::HashSet;

pub fn build(characters: &[String], static_filter: &HashSet<String>) -> HashSet<String> {
    let mut blacklist: HashSet<String> = characters
        .iter()
        .flat_map(|entry| entry.split_whitespace())
        .map(str::to_owned)
        .collect();
    blacklist.extend(static_filter.iter().cloned());
    blacklist
}
