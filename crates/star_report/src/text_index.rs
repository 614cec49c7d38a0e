//! Per-mode text index files.
//!
//! One `<mode>_<delay>.idx` file is written per declared `(mode, delay)`, with
//! three tables read from the statistics tree: the main-category overview, the
//! hierarchy breakdown, and the hierarchy + clock-group breakdown with n-worst
//! figures and a reference to the detailed report.

use crate::error::EmitError;
use star_common::DelayType;
use star_timing::{CategoryTree, ModeStats, SceneMap, TreeNode, NO_HIER_CATEGORY};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// File extension of text index files.
pub const INDEX_EXTENSION: &str = "idx";

/// Returns the file name of the index for `(mode, delay)`.
pub fn index_file_name(mode: &str, delay: DelayType) -> String {
    format!("{mode}_{delay}.{INDEX_EXTENSION}")
}

/// Renders the index of one mode.
///
/// `verbose_links` selects the verbose report as the reference of each
/// clock-group row; otherwise the summary report is referenced.
pub fn render_index(
    tree: &CategoryTree,
    mode_group: &str,
    mode: &str,
    delay: DelayType,
    verbose_links: bool,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Mode       : {mode}");
    let _ = writeln!(out, "Mode group : {mode_group}");
    let _ = writeln!(out, "Delay      : {delay} ({})", delay.check_name());

    let Some(root) = tree.get(&[mode_group, delay.as_str()]) else {
        return out;
    };
    if let Some(total) = root.mode_stats(mode) {
        let s = &total.stats;
        let _ = writeln!(
            out,
            "Total      : fep {} wns {:.2} tns {:.2}",
            s.fep,
            s.wns_value(),
            s.tns
        );
    }

    section(&mut out, "Overview", &header(false));
    for (main, node) in root.subdivisions() {
        if let Some(stats) = node.mode_stats(mode) {
            let _ = writeln!(out, "{}", row(stats, main));
        }
    }

    section(&mut out, "Hierarchy", &header(false));
    for (_, main_node) in root.subdivisions() {
        for (hier, node) in main_node.subdivisions() {
            if hier == NO_HIER_CATEGORY {
                continue;
            }
            if let Some(stats) = node.mode_stats(mode) {
                let _ = writeln!(out, "{}", row(stats, hier));
            }
        }
    }

    section(&mut out, "Hierarchy+ClockGroup", &header(true));
    for (main, main_node) in root.subdivisions() {
        for (hier, hier_node) in main_node.subdivisions() {
            let label = if hier == NO_HIER_CATEGORY { main } else { hier };
            clock_group_rows(&mut out, hier_node, label, mode, verbose_links);
        }
    }

    out
}

fn clock_group_rows(
    out: &mut String,
    hier_node: &TreeNode,
    label: &str,
    mode: &str,
    verbose_links: bool,
) {
    for (clock_pair, pair_node) in hier_node.subdivisions() {
        for (clock_group, group_node) in pair_node.subdivisions() {
            let Some(stats) = group_node.mode_stats(mode) else {
                continue;
            };
            if stats.stats.fep == 0 {
                continue;
            }
            let n = stats.n_worst.unwrap_or_default();
            let link = if verbose_links {
                stats.rpt_verbose_lnk.as_deref()
            } else {
                stats.rpt_summary_lnk.as_deref()
            };
            let _ = writeln!(
                out,
                "{} {:>10} {:>15.2} {:<40} {:<30} {}",
                row_numbers(stats),
                n.nvp,
                n.nwtns,
                label,
                format!("{clock_pair} {clock_group}"),
                link.unwrap_or("-")
            );
        }
    }
}

fn section(out: &mut String, title: &str, header: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{header}");
    let _ = writeln!(out, "{}", "-".repeat(header.len()));
}

fn header(clock_groups: bool) -> String {
    if clock_groups {
        format!(
            "{:>10} {:>10} {:>15} {:>10} {:>15} {:<40} {:<30} {}",
            "FEP", "WNS", "TNS", "NVP", "NWTNS", "Category", "Clocks", "Report"
        )
    } else {
        format!("{:>10} {:>10} {:>15} {:<40}", "FEP", "WNS", "TNS", "Category")
    }
}

fn row_numbers(stats: &ModeStats) -> String {
    let s = &stats.stats;
    format!("{:>10} {:>10.2} {:>15.2}", s.fep, s.wns_value(), s.tns)
}

fn row(stats: &ModeStats, label: &str) -> String {
    format!("{} {label:<40}", row_numbers(stats)).trim_end().to_string()
}

/// Writes one index per declared `(mode, delay)` to `output_dir` and returns
/// the written paths.
pub fn write_indexes(
    tree: &CategoryTree,
    scenes: &SceneMap,
    output_dir: &Path,
    verbose_links: bool,
) -> Result<Vec<PathBuf>, EmitError> {
    let mut written = Vec::new();
    for group in &scenes.groups {
        for mode in &group.modes {
            for delay in DelayType::ALL {
                let path = output_dir.join(index_file_name(&mode.mode, delay));
                let text = render_index(tree, &group.name, &mode.mode, delay, verbose_links);
                std::fs::write(&path, text).map_err(|e| EmitError::io(&path, e))?;
                written.push(path);
            }
        }
    }
    Ok(written)
}
