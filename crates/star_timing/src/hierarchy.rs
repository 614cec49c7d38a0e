//! Hierarchy map and path-end classification.
//!
//! A [`HierarchyMap`] is the user's list of `(short name, instance prefix)`
//! pairs, kept sorted by prefix. Pins are labelled with the short name of the
//! matching prefix; ports are labelled `input` / `output`; unmatched pins are
//! `top`.
//!
//! Matching scans every entry and keeps the **last** hit in prefix order.
//! Two prefixes of the same name always nest, and the shorter one sorts first,
//! so the last hit is the innermost block. Entries with identical prefixes
//! fall back to short-name order.

use crate::path::ObjectClass;
use std::collections::BTreeMap;
use std::fmt;

/// One `(short name, prefix)` pair of the hierarchy map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HierarchyEntry {
    /// Short label used in category keys.
    pub short_name: String,
    /// Instance-path prefix identifying the hierarchy.
    pub prefix: String,
}

/// Ordered hierarchy map, sorted by prefix ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HierarchyMap {
    entries: Vec<HierarchyEntry>,
}

impl HierarchyMap {
    /// Builds a map from `(short name, prefix)` pairs, sorting by prefix.
    pub fn new<I, S, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: Into<String>,
    {
        let mut entries: Vec<HierarchyEntry> = pairs
            .into_iter()
            .map(|(s, p)| HierarchyEntry {
                short_name: s.into(),
                prefix: p.into(),
            })
            .collect();
        entries.sort_by(|a, b| {
            a.prefix
                .cmp(&b.prefix)
                .then_with(|| a.short_name.cmp(&b.short_name))
        });
        Self { entries }
    }

    /// Builds a map from the configured `short name -> prefix` table.
    pub fn from_config(map: &BTreeMap<String, String>) -> Self {
        Self::new(map.iter().map(|(s, p)| (s.as_str(), p.as_str())))
    }

    /// Returns the entries in match order.
    pub fn entries(&self) -> &[HierarchyEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the short name of the last entry whose prefix starts `name`.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        let mut hit = None;
        for entry in &self.entries {
            if name.starts_with(entry.prefix.as_str()) {
                hit = Some(entry.short_name.as_str());
            }
        }
        hit
    }

    /// Labels a path startpoint.
    pub fn classify_source(&self, name: &str, class: ObjectClass) -> SourceLabel<'_> {
        if class != ObjectClass::Pin {
            return SourceLabel::Input;
        }
        self.lookup(name).map_or(SourceLabel::Top, SourceLabel::Block)
    }

    /// Labels a path endpoint.
    pub fn classify_destination(&self, name: &str, class: ObjectClass) -> DestLabel<'_> {
        if class != ObjectClass::Pin {
            return DestLabel::Output;
        }
        self.lookup(name).map_or(DestLabel::Top, DestLabel::Block)
    }
}

/// Label of a path startpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceLabel<'m> {
    /// A pin outside every mapped hierarchy.
    Top,
    /// A boundary port.
    Input,
    /// A pin inside the named hierarchy.
    Block(&'m str),
}

/// Label of a path endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DestLabel<'m> {
    /// A pin outside every mapped hierarchy.
    Top,
    /// A boundary port.
    Output,
    /// A pin inside the named hierarchy.
    Block(&'m str),
}

impl fmt::Display for SourceLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLabel::Top => f.write_str("top"),
            SourceLabel::Input => f.write_str("input"),
            SourceLabel::Block(name) => f.write_str(name),
        }
    }
}

impl fmt::Display for DestLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestLabel::Top => f.write_str("top"),
            DestLabel::Output => f.write_str("output"),
            DestLabel::Block(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_sorted_by_prefix() {
        let map = HierarchyMap::new([("vpu", "vpuwrap/"), ("cpu", "cpu_ss/"), ("ddr", "ddr/")]);
        let prefixes: Vec<_> = map.entries().iter().map(|e| e.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["cpu_ss/", "ddr/", "vpuwrap/"]);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn overlapping_prefixes_resolve_to_last_match() {
        let map = HierarchyMap::new([("short1", "a"), ("short2", "ab")]);
        assert_eq!(map.lookup("ab_x"), Some("short2"));
        assert_eq!(map.lookup("a_x"), Some("short1"));
    }

    #[test]
    fn last_match_follows_sort_order_not_insertion_order() {
        let map = HierarchyMap::new([("short2", "ab"), ("short1", "a")]);
        assert_eq!(map.lookup("ab_x"), Some("short2"));
    }

    #[test]
    fn nested_prefixes_resolve_to_inner_block() {
        let map = HierarchyMap::new([("deep", "u_a/u_b"), ("wide", "u_a/")]);
        assert_eq!(map.lookup("u_a/u_b/q"), Some("deep"));
        assert_eq!(map.lookup("u_a/u_c/q"), Some("wide"));
    }

    #[test]
    fn identical_prefixes_keep_last_short_name() {
        let map = HierarchyMap::new([("beta", "u_x/"), ("alpha", "u_x/")]);
        assert_eq!(map.lookup("u_x/q"), Some("beta"));
    }

    #[test]
    fn unmatched_pin_is_top() {
        let map = HierarchyMap::new([("vpu", "vpuwrap/")]);
        assert_eq!(
            map.classify_source("glue/q_reg/CP", ObjectClass::Pin),
            SourceLabel::Top
        );
        assert_eq!(
            map.classify_destination("glue/q_reg/D", ObjectClass::Pin),
            DestLabel::Top
        );
    }

    #[test]
    fn ports_never_match() {
        let map = HierarchyMap::new([("vpu", "vpuwrap")]);
        assert_eq!(
            map.classify_source("vpuwrap_in", ObjectClass::Port),
            SourceLabel::Input
        );
        assert_eq!(
            map.classify_destination("vpuwrap_out", ObjectClass::Other),
            DestLabel::Output
        );
    }

    #[test]
    fn pin_matches_block() {
        let map = HierarchyMap::new([("vpu", "vpuwrap/")]);
        assert_eq!(
            map.classify_source("vpuwrap/u1/q", ObjectClass::Pin),
            SourceLabel::Block("vpu")
        );
    }

    #[test]
    fn labels_display() {
        assert_eq!(SourceLabel::Input.to_string(), "input");
        assert_eq!(DestLabel::Output.to_string(), "output");
        assert_eq!(DestLabel::Block("vpu").to_string(), "vpu");
    }

    #[test]
    fn empty_map() {
        let map = HierarchyMap::default();
        assert!(map.is_empty());
        assert_eq!(map.lookup("anything"), None);
    }
}
