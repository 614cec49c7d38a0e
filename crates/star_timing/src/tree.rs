//! The category statistics tree.
//!
//! Layout, one level per key:
//!
//! ```text
//! modeGroup / delay / mode_stats / mode                                   -> stats
//! modeGroup / delay / mainCat / mode_stats / mode                         -> stats
//! modeGroup / delay / mainCat / hierCat / mode_stats / mode               -> stats
//! modeGroup / delay / mainCat / hierCat / clockPair / clockGroup
//!           / mode_stats / mode                                           -> stats + n-worst + links
//! ```
//!
//! A `mode_stats` child marks a node as carrying per-mode statistics; every
//! other child is a further subdivision.

use crate::path::TimingPathRecord;
use crate::stats::SlackStats;
use indexmap::IndexMap;

/// Key of the per-mode statistics child of a tree node.
pub const MODE_STATS: &str = "mode_stats";

/// Count and total slack of an independently bounded n-worst query.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NworstStats {
    /// Number of paths returned by the query.
    pub nvp: usize,
    /// Sum of their slacks.
    pub nwtns: f64,
}

impl NworstStats {
    /// Result of an empty query.
    pub const EMPTY: NworstStats = NworstStats { nvp: 0, nwtns: 0.0 };

    /// Reduces the paths returned by an n-worst query.
    pub fn of_paths<'a, I>(paths: I) -> Self
    where
        I: IntoIterator<Item = &'a TimingPathRecord>,
    {
        let stats = SlackStats::of_paths(paths);
        Self {
            nvp: stats.fep,
            nwtns: stats.tns,
        }
    }
}

/// Statistics recorded for one mode at one tree position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModeStats {
    /// WNS / TNS / FEP of the paths at this position.
    pub stats: SlackStats,
    /// N-worst query result (leaf level only).
    pub n_worst: Option<NworstStats>,
    /// Summary report of the paths at this position (leaf level only).
    pub rpt_summary_lnk: Option<String>,
    /// Verbose report of the n-worst paths (leaf level only).
    pub rpt_verbose_lnk: Option<String>,
}

impl ModeStats {
    /// Rollup statistics without leaf-only fields.
    pub fn rollup(stats: SlackStats) -> Self {
        Self {
            stats,
            ..Self::default()
        }
    }

    /// The sentinel leaf for a mode with no paths at a clock-group position.
    pub fn empty_leaf() -> Self {
        Self {
            stats: SlackStats::EMPTY,
            n_worst: Some(NworstStats::EMPTY),
            rpt_summary_lnk: None,
            rpt_verbose_lnk: None,
        }
    }
}

/// A node of the statistics tree.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeNode {
    /// Statistics for one mode.
    Leaf(ModeStats),
    /// Named children.
    Branch(IndexMap<String, TreeNode>),
}

impl TreeNode {
    /// Creates an empty branch.
    pub fn branch() -> Self {
        TreeNode::Branch(IndexMap::new())
    }

    /// Returns the children of a branch, or `None` for a leaf.
    pub fn children(&self) -> Option<&IndexMap<String, TreeNode>> {
        match self {
            TreeNode::Branch(children) => Some(children),
            TreeNode::Leaf(_) => None,
        }
    }

    /// Returns the statistics of a leaf, or `None` for a branch.
    pub fn stats(&self) -> Option<&ModeStats> {
        match self {
            TreeNode::Leaf(stats) => Some(stats),
            TreeNode::Branch(_) => None,
        }
    }

    /// Returns the node at `path` below this one.
    pub fn get(&self, path: &[&str]) -> Option<&TreeNode> {
        let mut node = self;
        for key in path {
            node = node.children()?.get(*key)?;
        }
        Some(node)
    }

    /// Returns the statistics recorded for `mode` under this node's `mode_stats`.
    pub fn mode_stats(&self, mode: &str) -> Option<&ModeStats> {
        self.get(&[MODE_STATS, mode])?.stats()
    }

    /// Iterates over the subdivision children, skipping `mode_stats`.
    pub fn subdivisions(&self) -> impl Iterator<Item = (&str, &TreeNode)> {
        self.children()
            .into_iter()
            .flatten()
            .filter(|(key, _)| key.as_str() != MODE_STATS)
            .map(|(key, node)| (key.as_str(), node))
    }
}

/// The full statistics tree, rooted at mode groups.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryTree {
    /// Mode group name to its subtree.
    pub groups: IndexMap<String, TreeNode>,
}

impl CategoryTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node at `path`, where `path[0]` is a mode group.
    pub fn get(&self, path: &[&str]) -> Option<&TreeNode> {
        let (first, rest) = path.split_first()?;
        self.groups.get(*first)?.get(rest)
    }

    /// Records `stats` for `mode` at `path`, creating branches as needed.
    ///
    /// A leaf found where a branch is needed is replaced by a branch.
    pub fn insert_mode_stats(&mut self, path: &[&str], mode: &str, stats: ModeStats) {
        let Some((first, rest)) = path.split_first() else {
            return;
        };
        let mut node = self
            .groups
            .entry((*first).to_string())
            .or_insert_with(TreeNode::branch);
        for key in rest.iter().copied().chain([MODE_STATS]) {
            node = branch_mut(node)
                .entry(key.to_string())
                .or_insert_with(TreeNode::branch);
        }
        branch_mut(node).insert(mode.to_string(), TreeNode::Leaf(stats));
    }

    /// Returns the number of stats leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        fn count(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf(_) => 1,
                TreeNode::Branch(children) => children.values().map(count).sum(),
            }
        }
        self.groups.values().map(count).sum()
    }
}

fn branch_mut(node: &mut TreeNode) -> &mut IndexMap<String, TreeNode> {
    if let TreeNode::Leaf(_) = node {
        *node = TreeNode::branch();
    }
    match node {
        TreeNode::Branch(children) => children,
        TreeNode::Leaf(_) => unreachable!("leaf replaced by branch above"),
    }
}
