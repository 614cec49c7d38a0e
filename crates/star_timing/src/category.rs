//! Category keys and the path classifier.
//!
//! A path's category is derived from the labels of its two ends (see
//! [`hierarchy`](crate::hierarchy)): paths between mapped blocks are split into
//! `within_hm` / `inter_hm`, paths touching one block get a `top:hm`-style main
//! category, and the remaining boundary combinations carry no hierarchy
//! subdivision (`none`).

use crate::hierarchy::{DestLabel, HierarchyMap, SourceLabel};
use crate::path::TimingPathRecord;
use star_common::DelayType;
use std::fmt;
use std::str::FromStr;

/// Hierarchy category used when the main category has no block subdivision.
pub const NO_HIER_CATEGORY: &str = "none";

/// The fixed set of main path categories, in reporting order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum MainCategory {
    /// Unmapped pin to unmapped pin.
    TopTop,
    /// Unmapped pin to a mapped block.
    TopHm,
    /// Unmapped pin to an output port.
    TopOutput,
    /// Between two different mapped blocks.
    InterHm,
    /// Inside one mapped block.
    WithinHm,
    /// Mapped block to an unmapped pin.
    HmTop,
    /// Mapped block to an output port.
    HmOutput,
    /// Input port to an unmapped pin.
    InputTop,
    /// Input port to a mapped block.
    InputHm,
    /// Input port to output port.
    InputOutput,
}

impl MainCategory {
    /// All main categories in reporting order.
    pub const ALL: [MainCategory; 10] = [
        MainCategory::TopTop,
        MainCategory::TopHm,
        MainCategory::TopOutput,
        MainCategory::InterHm,
        MainCategory::WithinHm,
        MainCategory::HmTop,
        MainCategory::HmOutput,
        MainCategory::InputTop,
        MainCategory::InputHm,
        MainCategory::InputOutput,
    ];

    /// Returns the key used in the statistics tree.
    pub fn as_str(self) -> &'static str {
        match self {
            MainCategory::TopTop => "top:top",
            MainCategory::TopHm => "top:hm",
            MainCategory::TopOutput => "top:output",
            MainCategory::InterHm => "inter_hm",
            MainCategory::WithinHm => "within_hm",
            MainCategory::HmTop => "hm:top",
            MainCategory::HmOutput => "hm:output",
            MainCategory::InputTop => "input:top",
            MainCategory::InputHm => "input:hm",
            MainCategory::InputOutput => "input:output",
        }
    }
}

impl fmt::Display for MainCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MainCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MainCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown main category '{s}'"))
    }
}

/// Derives `(main category, hierarchy category)` from the labels of a path's ends.
pub fn categorize(src: SourceLabel<'_>, dst: DestLabel<'_>) -> (MainCategory, String) {
    use DestLabel as D;
    use SourceLabel as S;

    match (src, dst) {
        (S::Block(s), D::Block(d)) => {
            let main = if s == d {
                MainCategory::WithinHm
            } else {
                MainCategory::InterHm
            };
            (main, format!("{s}:{d}"))
        }
        (S::Top, D::Block(d)) => (MainCategory::TopHm, format!("top:{d}")),
        (S::Input, D::Block(d)) => (MainCategory::InputHm, format!("input:{d}")),
        (S::Block(s), D::Top) => (MainCategory::HmTop, format!("{s}:top")),
        (S::Block(s), D::Output) => (MainCategory::HmOutput, format!("{s}:output")),
        (S::Top, D::Top) => (MainCategory::TopTop, NO_HIER_CATEGORY.to_string()),
        (S::Top, D::Output) => (MainCategory::TopOutput, NO_HIER_CATEGORY.to_string()),
        (S::Input, D::Top) => (MainCategory::InputTop, NO_HIER_CATEGORY.to_string()),
        (S::Input, D::Output) => (MainCategory::InputOutput, NO_HIER_CATEGORY.to_string()),
    }
}

/// The part of a category key that depends only on the path record.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathCategory {
    /// Main category.
    pub main: MainCategory,
    /// `src:dst` hierarchy label pair, or [`NO_HIER_CATEGORY`].
    pub hier: String,
    /// `endpointClock:startpointClock`.
    pub clock_pair: String,
    /// The path group reported by the tool.
    pub clock_group: String,
}

/// Full key of an aggregation bucket.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CategoryKey {
    /// Mode group the batch was queried for.
    pub mode_group: String,
    /// Delay type of the batch.
    pub delay: DelayType,
    /// Mode the batch was queried for.
    pub mode: String,
    /// Record-derived part of the key.
    pub category: PathCategory,
}

/// Classifies path records against a hierarchy map.
#[derive(Clone, Debug, Default)]
pub struct PathClassifier {
    hierarchy: HierarchyMap,
}

impl PathClassifier {
    /// Creates a classifier over the given hierarchy map.
    pub fn new(hierarchy: HierarchyMap) -> Self {
        Self { hierarchy }
    }

    /// Returns the hierarchy map.
    pub fn hierarchy(&self) -> &HierarchyMap {
        &self.hierarchy
    }

    /// Computes the record-derived part of the category key.
    pub fn classify(&self, record: &TimingPathRecord) -> PathCategory {
        let src = self
            .hierarchy
            .classify_source(&record.startpoint_name, record.startpoint_class);
        let dst = self
            .hierarchy
            .classify_destination(&record.endpoint_name, record.endpoint_class);
        let (main, hier) = categorize(src, dst);
        PathCategory {
            main,
            hier,
            clock_pair: record.clock_pair(),
            clock_group: record.path_group.clone(),
        }
    }

    /// Computes the full category key for a record queried under `(mode_group, mode, delay)`.
    pub fn key(
        &self,
        record: &TimingPathRecord,
        mode_group: &str,
        mode: &str,
        delay: DelayType,
    ) -> CategoryKey {
        CategoryKey {
            mode_group: mode_group.to_string(),
            delay,
            mode: mode.to_string(),
            category: self.classify(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::ObjectClass;

    fn path(start: &str, sc: ObjectClass, end: &str, ec: ObjectClass) -> TimingPathRecord {
        TimingPathRecord {
            startpoint_name: start.into(),
            startpoint_class: sc,
            endpoint_name: end.into(),
            endpoint_class: ec,
            startpoint_clock: Some("clk_src".into()),
            endpoint_clock: Some("clk_dst".into()),
            path_group: "clk_dst".into(),
            slack: -0.1,
        }
    }

    fn classifier() -> PathClassifier {
        PathClassifier::new(HierarchyMap::new([
            ("vpu", "vpuwrap/"),
            ("cpu", "cpu_ss/"),
        ]))
    }

    #[test]
    fn block_to_output_port() {
        let c = classifier();
        let p = path("vpuwrap/u1/q", ObjectClass::Pin, "top_port", ObjectClass::Port);
        let cat = c.classify(&p);
        assert_eq!(cat.main, MainCategory::HmOutput);
        assert_eq!(cat.hier, "vpu:output");
        assert_eq!(cat.main.as_str(), "hm:output");
    }

    #[test]
    fn within_and_inter_block() {
        let c = classifier();
        let within = path("vpuwrap/a/q", ObjectClass::Pin, "vpuwrap/b/d", ObjectClass::Pin);
        let inter = path("vpuwrap/a/q", ObjectClass::Pin, "cpu_ss/b/d", ObjectClass::Pin);
        assert_eq!(c.classify(&within).main, MainCategory::WithinHm);
        assert_eq!(c.classify(&within).hier, "vpu:vpu");
        assert_eq!(c.classify(&inter).main, MainCategory::InterHm);
        assert_eq!(c.classify(&inter).hier, "vpu:cpu");
    }

    #[test]
    fn decision_table() {
        use DestLabel as D;
        use SourceLabel as S;
        let cases = [
            (S::Top, D::Block("cpu"), "top:hm", "top:cpu"),
            (S::Input, D::Block("cpu"), "input:hm", "input:cpu"),
            (S::Block("cpu"), D::Top, "hm:top", "cpu:top"),
            (S::Block("cpu"), D::Output, "hm:output", "cpu:output"),
            (S::Top, D::Top, "top:top", "none"),
            (S::Top, D::Output, "top:output", "none"),
            (S::Input, D::Top, "input:top", "none"),
            (S::Input, D::Output, "input:output", "none"),
        ];
        for (src, dst, main, hier) in cases {
            let (m, h) = categorize(src, dst);
            assert_eq!(m.as_str(), main);
            assert_eq!(h, hier);
        }
    }

    #[test]
    fn clock_pair_and_group_copied() {
        let c = classifier();
        let mut p = path("a/q", ObjectClass::Pin, "b/d", ObjectClass::Pin);
        p.startpoint_clock = None;
        p.path_group = "**async_default**".into();
        let cat = c.classify(&p);
        assert_eq!(cat.clock_pair, "clk_dst:undef");
        assert_eq!(cat.clock_group, "**async_default**");
    }

    #[test]
    fn classification_is_deterministic() {
        let c = classifier();
        let p = path("cpu_ss/x/q", ObjectClass::Pin, "vpuwrap/y/d", ObjectClass::Pin);
        let k1 = c.key(&p, "func", "func1", DelayType::Max);
        let k2 = c.key(&p, "func", "func1", DelayType::Max);
        assert_eq!(k1, k2);
    }

    #[test]
    fn main_category_parse_and_order() {
        assert_eq!("within_hm".parse::<MainCategory>(), Ok(MainCategory::WithinHm));
        assert!("hm:hm".parse::<MainCategory>().is_err());
        let names: Vec<_> = MainCategory::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names[0], "top:top");
        assert_eq!(names[9], "input:output");
        assert_eq!(names.len(), 10);
    }
}
