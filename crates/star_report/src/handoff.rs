//! The handoff payload consumed by the external publisher.
//!
//! Three documents are written to `<out>/handoff/`:
//!
//! - `miscInfo.yaml`: flat run metadata;
//! - `pvtInfo.yaml`: mode group / mode / delay to backing scenarios;
//! - `timingInfo.yaml`: the whole [`CategoryTree`].
//!
//! In `timingInfo`, `*` characters are stripped from clock-group keys, so two
//! clock groups differing only in wildcards collapse into one entry (the last
//! one wins). A stats leaf is written as:
//!
//! ```text
//! wns: -0.153
//! tns: -0.42
//! fep: 3
//! nvp: 1
//! nwtns: -0.153
//! rpt_summary_lnk: rpts/func_max/00001.summary.rpt
//! ```
//!
//! The WNS of an empty set is written as the integer `0`. Every other real is
//! written in its shortest round-trip form and always carries a decimal point
//! in the mantissa and a signed exponent (`0.5`, `1.0e-7`, `5.5e-17`), so YAML
//! 1.1 readers take it as a float. Non-finite values use `.inf` and `.nan`.

use crate::document::{parse_document, render_document, Document, HandoffValue};
use crate::error::EmitError;
use indexmap::IndexMap;
use star_common::DelayType;
use star_config::Settings;
use star_timing::{
    CategoryTree, ModeStats, NworstStats, SceneMap, SlackStats, TreeNode, MODE_STATS,
};
use std::path::{Path, PathBuf};

/// Directory, relative to the output directory, holding the payload.
pub const HANDOFF_DIR: &str = "handoff";
/// Run metadata document.
pub const MISC_INFO_FILE: &str = "miscInfo.yaml";
/// Mode and scenario document.
pub const PVT_INFO_FILE: &str = "pvtInfo.yaml";
/// Statistics tree document.
pub const TIMING_INFO_FILE: &str = "timingInfo.yaml";

/// Depth of clock-group keys below the tree root
/// (modeGroup / delay / mainCategory / hierCategory / clockPair / clockGroup).
const CLOCK_GROUP_DEPTH: usize = 5;

/// The three handoff documents.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandoffPayload {
    /// Run metadata.
    pub misc_info: Document,
    /// Mode groups and their scenarios.
    pub pvt_info: Document,
    /// The statistics tree.
    pub timing_info: Document,
}

impl HandoffPayload {
    /// Builds the payload for one run.
    pub fn build(settings: &Settings, scenes: &SceneMap, tree: &CategoryTree) -> Self {
        Self {
            misc_info: misc_info(settings),
            pvt_info: pvt_info(scenes),
            timing_info: timing_info(tree),
        }
    }

    /// Writes the three documents to `<output_dir>/handoff/` and returns its path.
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf, EmitError> {
        let dir = output_dir.join(HANDOFF_DIR);
        std::fs::create_dir_all(&dir).map_err(|e| EmitError::io(&dir, e))?;
        for (name, doc) in [
            (MISC_INFO_FILE, &self.misc_info),
            (PVT_INFO_FILE, &self.pvt_info),
            (TIMING_INFO_FILE, &self.timing_info),
        ] {
            let path = dir.join(name);
            std::fs::write(&path, render_document(doc)).map_err(|e| EmitError::io(&path, e))?;
        }
        Ok(dir)
    }

    /// Reads a payload written by [`HandoffPayload::write`].
    pub fn read(output_dir: &Path) -> Result<Self, EmitError> {
        let dir = output_dir.join(HANDOFF_DIR);
        let load = |name: &str| -> Result<Document, EmitError> {
            let path = dir.join(name);
            let text = std::fs::read_to_string(&path).map_err(|e| EmitError::io(&path, e))?;
            parse_document(&text)
        };
        Ok(Self {
            misc_info: load(MISC_INFO_FILE)?,
            pvt_info: load(PVT_INFO_FILE)?,
            timing_info: load(TIMING_INFO_FILE)?,
        })
    }
}

/// Flat run metadata.
pub fn misc_info(settings: &Settings) -> Document {
    let t = &settings.timing;
    let mut doc = Document::new();
    let mut put = |key: &str, value: HandoffValue| {
        doc.insert(key.to_string(), value);
    };
    put("design_name", HandoffValue::scalar(&settings.misc.design_name));
    put("build_tag", HandoffValue::scalar(&settings.misc.build_tag));
    put("vendor", HandoffValue::scalar(&settings.environment.vendor));
    put("tool", HandoffValue::scalar(&settings.environment.tool));
    put("flow", HandoffValue::scalar(&settings.environment.flow));
    put("output_dir", HandoffValue::scalar(settings.output_dir.display()));
    put("star_version", HandoffValue::scalar(env!("CARGO_PKG_VERSION")));
    put("pba_mode", HandoffValue::scalar(t.pba_mode));
    put("setup_nworst", HandoffValue::scalar(t.setup_nworst));
    put("hold_nworst", HandoffValue::scalar(t.hold_nworst));
    put("setup_slack_lt", HandoffValue::scalar(real(t.setup_slack_lt)));
    put("hold_slack_lt", HandoffValue::scalar(real(t.hold_slack_lt)));
    put("setup_max_paths", HandoffValue::scalar(t.setup_max_paths));
    put("hold_max_paths", HandoffValue::scalar(t.hold_max_paths));
    put(
        "path_types",
        HandoffValue::List(t.path_types.iter().map(|p| format!("{p:?}").to_lowercase()).collect()),
    );
    put(
        "rpt_types",
        HandoffValue::List(t.rpt_types.iter().map(|r| format!("{r:?}").to_lowercase()).collect()),
    );
    doc
}

/// Mode group / mode / delay to backing scenarios.
pub fn pvt_info(scenes: &SceneMap) -> Document {
    scenes
        .groups
        .iter()
        .map(|group| {
            let modes = group
                .modes
                .iter()
                .map(|m| {
                    let delays = DelayType::ALL
                        .into_iter()
                        .map(|d| {
                            let scenarios = m.scenarios(d).to_vec();
                            (d.as_str().to_string(), HandoffValue::List(scenarios))
                        })
                        .collect();
                    (m.mode.clone(), HandoffValue::Map(delays))
                })
                .collect();
            (group.name.clone(), HandoffValue::Map(modes))
        })
        .collect()
}

/// The statistics tree, with wildcards stripped from clock-group keys.
pub fn timing_info(tree: &CategoryTree) -> Document {
    tree.groups
        .iter()
        .map(|(name, node)| (name.clone(), node_value(node, 0, false)))
        .collect()
}

/// Removes `*` wildcard characters from a clock-group name.
pub fn strip_wildcards(name: &str) -> String {
    name.replace('*', "")
}

fn node_value(node: &TreeNode, depth: usize, under_mode_stats: bool) -> HandoffValue {
    match node {
        TreeNode::Leaf(stats) => HandoffValue::Map(leaf_document(stats)),
        TreeNode::Branch(children) => {
            let mut doc = Document::new();
            for (key, child) in children {
                let key = if depth + 1 == CLOCK_GROUP_DEPTH && !under_mode_stats {
                    strip_wildcards(key)
                } else {
                    key.clone()
                };
                let value = node_value(child, depth + 1, key == MODE_STATS);
                doc.insert(key, value);
            }
            HandoffValue::Map(doc)
        }
    }
}

fn leaf_document(stats: &ModeStats) -> Document {
    let mut doc = Document::new();
    let wns = match stats.stats.wns {
        Some(w) => real(w),
        None => "0".to_string(),
    };
    doc.insert("wns".into(), HandoffValue::Scalar(wns));
    doc.insert("tns".into(), HandoffValue::Scalar(real(stats.stats.tns)));
    doc.insert("fep".into(), HandoffValue::scalar(stats.stats.fep));
    if let Some(n) = stats.n_worst {
        doc.insert("nvp".into(), HandoffValue::scalar(n.nvp));
        doc.insert("nwtns".into(), HandoffValue::Scalar(real(n.nwtns)));
    }
    if let Some(link) = &stats.rpt_summary_lnk {
        doc.insert("rpt_summary_lnk".into(), HandoffValue::scalar(link));
    }
    if let Some(link) = &stats.rpt_verbose_lnk {
        doc.insert("rpt_verbose_lnk".into(), HandoffValue::scalar(link));
    }
    doc
}

/// Formats a real so that it always reads back as a real.
fn real(value: f64) -> String {
    if value.is_nan() {
        return ".nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { ".inf" } else { "-.inf" }.to_string();
    }
    let text = format!("{value:?}");
    let Some((mantissa, exponent)) = text.split_once('e') else {
        return text;
    };
    let dot = if mantissa.contains('.') { "" } else { ".0" };
    let sign = if exponent.starts_with('-') { "" } else { "+" };
    format!("{mantissa}{dot}e{sign}{exponent}")
}

fn parse_real(mode: &str, name: &str, text: &str) -> Result<f64, EmitError> {
    match text {
        ".nan" => Ok(f64::NAN),
        ".inf" => Ok(f64::INFINITY),
        "-.inf" => Ok(f64::NEG_INFINITY),
        _ => parse_num(mode, name, text),
    }
}

/// Rebuilds a [`CategoryTree`] from a `timingInfo` document.
pub fn tree_from_timing_info(doc: &Document) -> Result<CategoryTree, EmitError> {
    let mut groups = IndexMap::new();
    for (name, value) in doc {
        groups.insert(name.clone(), value_node(name, value, false)?);
    }
    Ok(CategoryTree { groups })
}

fn value_node(key: &str, value: &HandoffValue, is_mode: bool) -> Result<TreeNode, EmitError> {
    let Some(map) = value.as_map() else {
        return Err(EmitError::format(0, format!("'{key}' is not a map")));
    };
    if is_mode {
        return Ok(TreeNode::Leaf(leaf_stats(key, map)?));
    }
    let mut children = IndexMap::new();
    let modes_below = key == MODE_STATS;
    for (child_key, child) in map {
        children.insert(child_key.clone(), value_node(child_key, child, modes_below)?);
    }
    Ok(TreeNode::Branch(children))
}

fn scalar_field<'d>(map: &'d Document, mode: &str, name: &str) -> Result<Option<&'d str>, EmitError> {
    match map.get(name) {
        None => Ok(None),
        Some(v) => v
            .as_scalar()
            .map(Some)
            .ok_or_else(|| EmitError::format(0, format!("'{mode}.{name}' is not a scalar"))),
    }
}

fn required_field<'d>(map: &'d Document, mode: &str, name: &str) -> Result<&'d str, EmitError> {
    scalar_field(map, mode, name)?
        .ok_or_else(|| EmitError::format(0, format!("'{mode}' has no '{name}'")))
}

fn leaf_stats(mode: &str, map: &Document) -> Result<ModeStats, EmitError> {
    let field = |name: &str| scalar_field(map, mode, name);
    let required = |name: &str| required_field(map, mode, name);

    let wns = match required("wns")? {
        "0" => None,
        text => Some(parse_real(mode, "wns", text)?),
    };
    let stats = SlackStats {
        fep: parse_num(mode, "fep", required("fep")?)?,
        wns,
        tns: parse_real(mode, "tns", required("tns")?)?,
    };
    let n_worst = match (field("nvp")?, field("nwtns")?) {
        (Some(nvp), Some(nwtns)) => Some(NworstStats {
            nvp: parse_num(mode, "nvp", nvp)?,
            nwtns: parse_real(mode, "nwtns", nwtns)?,
        }),
        (None, None) => None,
        _ => {
            return Err(EmitError::format(
                0,
                format!("'{mode}' has only one of 'nvp' and 'nwtns'"),
            ))
        }
    };
    Ok(ModeStats {
        stats,
        n_worst,
        rpt_summary_lnk: field("rpt_summary_lnk")?.map(str::to_string),
        rpt_verbose_lnk: field("rpt_verbose_lnk")?.map(str::to_string),
    })
}

fn parse_num<T: std::str::FromStr>(mode: &str, name: &str, text: &str) -> Result<T, EmitError> {
    text.parse()
        .map_err(|_| EmitError::format(0, format!("'{mode}.{name}' is not a number: '{text}'")))
}
