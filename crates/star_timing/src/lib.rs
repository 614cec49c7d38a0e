//! Timing path classification and aggregation for STA reporting.
//!
//! This crate turns bounded batches of timing paths, queried per
//! `(modeGroup, mode, delay)` from a [`TimingSource`], into a hierarchical
//! statistics tree. Each path is classified by the hierarchy blocks its ends
//! belong to, grouped by clock pair and clock group, and reduced to WNS, TNS,
//! and failing-endpoint counts at every level.
//!
//! # Usage
//!
//! ```ignore
//! use star_timing::{aggregate, HierarchyMap, PathClassifier, PathDump, SceneMap, StatsReducer};
//!
//! let source = PathDump::open(dump_dir)?;
//! let scenes = SceneMap::build(&settings, &source.scenarios(), &sink);
//! let classifier = PathClassifier::new(HierarchyMap::from_config(&settings.hierarchy_map));
//! let (index, _batches) = aggregate(&source, &scenes, &classifier, &settings.timing, &sink);
//! let tree = StatsReducer::new(&source, &settings.timing, &settings.output_dir, &sink)
//!     .reduce(index, &scenes.groups);
//! ```
//!
//! # Architecture
//!
//! - [`path`]: timing path records
//! - [`hierarchy`]: hierarchy map and end-point labelling
//! - [`category`]: main/hierarchy categories and the path classifier
//! - [`index`]: the aggregation index
//! - [`stats`]: WNS / TNS / FEP reduction
//! - [`tree`]: the category statistics tree
//! - [`source`]: the timing source seam and query types
//! - [`dump`]: JSON path-dump timing source
//! - [`scene`]: mode groups and their backing scenarios
//! - [`pipeline`]: the aggregation pass
//! - [`reduce`]: the multi-level rollup

#![warn(missing_docs)]

pub mod category;
pub mod dump;
pub mod hierarchy;
pub mod index;
pub mod path;
pub mod pipeline;
pub mod reduce;
pub mod scene;
pub mod source;
pub mod stats;
pub mod tree;

pub use category::{
    categorize, CategoryKey, MainCategory, PathCategory, PathClassifier, NO_HIER_CATEGORY,
};
pub use dump::{DumpedPath, PathDump, ScenarioDump};
pub use hierarchy::{DestLabel, HierarchyEntry, HierarchyMap, SourceLabel};
pub use index::AggregationIndex;
pub use path::{ObjectClass, TimingPathRecord, UNDEF_CLOCK};
pub use pipeline::{aggregate, BatchOutcome, BatchReport};
pub use reduce::{StatsReducer, REPORT_DIR};
pub use scene::{ModeGroup, ModeScenes, SceneMap};
pub use source::{
    check_tool_log, NworstQuery, PathQuery, QueryError, ScenarioContext, TimingSource,
};
pub use stats::SlackStats;
pub use tree::{CategoryTree, ModeStats, NworstStats, TreeNode, MODE_STATS};
