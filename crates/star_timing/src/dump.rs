//! A [`TimingSource`] backed by JSON path dumps.
//!
//! The timing tool exports one `<scenario>.json` file per loaded scenario:
//!
//! ```json
//! {
//!   "log": "captured tool output",
//!   "paths": [
//!     { "delay": "max", "startpoint_name": "u_a/q_reg/CP", "startpoint_class": "pin",
//!       "endpoint_name": "dout", "endpoint_class": "port",
//!       "startpoint_clock": "clk", "endpoint_clock": null,
//!       "path_group": "clk", "slack": -0.12, "pba_slack": -0.08 }
//!   ]
//! }
//! ```
//!
//! The dump should hold every path the tool reported for the scenario; queries
//! filter, sort, and cap it. A dump whose `log` contains the tool error marker
//! fails every query against that scenario.

use crate::path::TimingPathRecord;
use crate::source::{
    check_tool_log, NworstQuery, PathQuery, QueryError, ScenarioContext, TimingSource,
};
use serde::Deserialize;
use star_common::DelayType;
use star_config::{PbaMode, ReportType};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write as _;
use std::path::Path;

/// One exported path with its check direction and optional path-based slack.
#[derive(Clone, Debug, Deserialize)]
pub struct DumpedPath {
    /// Check direction of the path.
    pub delay: DelayType,
    /// Path-based slack, if the tool recalculated the path.
    #[serde(default)]
    pub pba_slack: Option<f64>,
    /// The graph-based path record.
    #[serde(flatten)]
    pub record: TimingPathRecord,
}

impl DumpedPath {
    fn effective(&self, pba_mode: PbaMode) -> TimingPathRecord {
        let mut record = self.record.clone();
        if pba_mode != PbaMode::None {
            if let Some(slack) = self.pba_slack {
                record.slack = slack;
            }
        }
        record
    }
}

/// The exported content of one scenario.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScenarioDump {
    /// Captured tool output for the export.
    #[serde(default)]
    pub log: String,
    /// Every exported path.
    #[serde(default)]
    pub paths: Vec<DumpedPath>,
}

#[derive(Debug)]
enum Loaded {
    Ready(ScenarioDump),
    Malformed(String),
}

/// A session made of per-scenario JSON dumps.
#[derive(Debug, Default)]
pub struct PathDump {
    scenarios: BTreeMap<String, Loaded>,
}

impl PathDump {
    /// Loads every `*.json` file in `dir`; the file stem is the scenario name.
    ///
    /// Files that fail to decode are kept as malformed scenarios: they are
    /// listed as loaded, and every query against them returns
    /// [`QueryError::Parse`].
    pub fn open(dir: &Path) -> Result<Self, QueryError> {
        let mut scenarios = BTreeMap::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = std::fs::read_to_string(&path)?;
            let loaded = match serde_json::from_str::<ScenarioDump>(&content) {
                Ok(dump) => Loaded::Ready(dump),
                Err(e) => Loaded::Malformed(e.to_string()),
            };
            scenarios.insert(name.to_string(), loaded);
        }
        Ok(Self { scenarios })
    }

    /// Builds a session from in-memory dumps.
    pub fn from_scenarios<I>(dumps: I) -> Self
    where
        I: IntoIterator<Item = (String, ScenarioDump)>,
    {
        Self {
            scenarios: dumps
                .into_iter()
                .map(|(name, dump)| (name, Loaded::Ready(dump)))
                .collect(),
        }
    }

    fn scenario(&self, name: &str) -> Result<&ScenarioDump, QueryError> {
        match self.scenarios.get(name) {
            Some(Loaded::Ready(dump)) => {
                check_tool_log(name, &dump.log)?;
                Ok(dump)
            }
            Some(Loaded::Malformed(message)) => Err(QueryError::Parse {
                scenario: name.to_string(),
                message: message.clone(),
            }),
            None => Err(QueryError::UnknownScenario(name.to_string())),
        }
    }

    /// Collects the effective records of `ctx`'s scenarios that pass `keep`.
    fn collect<F>(
        &self,
        ctx: &ScenarioContext,
        pba_mode: PbaMode,
        mut keep: F,
    ) -> Result<Vec<TimingPathRecord>, QueryError>
    where
        F: FnMut(&DumpedPath, &TimingPathRecord) -> bool,
    {
        let mut out = Vec::new();
        for name in &ctx.scenarios {
            let dump = self.scenario(name)?;
            for path in &dump.paths {
                let record = path.effective(pba_mode);
                if keep(path, &record) {
                    out.push(record);
                }
            }
        }
        out.sort_by(|a, b| a.slack.total_cmp(&b.slack));
        Ok(out)
    }
}

impl TimingSource for PathDump {
    fn scenarios(&self) -> Vec<String> {
        self.scenarios.keys().cloned().collect()
    }

    fn query_paths(
        &self,
        ctx: &ScenarioContext,
        query: &PathQuery,
    ) -> Result<Vec<TimingPathRecord>, QueryError> {
        let mut paths = self.collect(ctx, query.pba_mode, |dumped, record| {
            dumped.delay == query.delay
                && record.slack < query.slack_lt
                && query.path_types.contains(&record.path_type())
        })?;
        paths.truncate(query.max_paths);
        Ok(paths)
    }

    fn query_nworst(
        &self,
        ctx: &ScenarioContext,
        query: &NworstQuery<'_>,
    ) -> Result<Vec<TimingPathRecord>, QueryError> {
        let endpoints: HashSet<&str> = query.endpoints.iter().copied().collect();
        let candidates = self.collect(ctx, query.pba_mode, |dumped, record| {
            dumped.delay == query.delay
                && record.path_group == query.path_group
                && record.slack < query.slack_lt
                && endpoints.contains(record.endpoint_name.as_str())
        })?;

        let mut per_endpoint: HashMap<String, usize> = HashMap::new();
        let mut paths = Vec::new();
        for record in candidates {
            if paths.len() >= query.max_paths {
                break;
            }
            let seen = per_endpoint.entry(record.endpoint_name.clone()).or_insert(0);
            if *seen < query.nworst {
                *seen += 1;
                paths.push(record);
            }
        }
        Ok(paths)
    }

    fn write_path_report(
        &self,
        ctx: &ScenarioContext,
        paths: &[TimingPathRecord],
        kind: ReportType,
        dest: &Path,
    ) -> Result<(), QueryError> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = match kind {
            ReportType::Summary => render_summary(ctx, paths),
            ReportType::Verbose => render_verbose(ctx, paths),
        };
        std::fs::write(dest, text)?;
        Ok(())
    }
}

fn report_header(out: &mut String, ctx: &ScenarioContext, kind: &str, count: usize) {
    let _ = writeln!(out, "Report    : {kind}");
    let _ = writeln!(out, "Mode      : {} ({})", ctx.mode, ctx.delay);
    let _ = writeln!(out, "Scenarios : {}", ctx.scenarios.join(" "));
    let _ = writeln!(out, "Paths     : {count}");
    out.push('\n');
}

fn render_summary(ctx: &ScenarioContext, paths: &[TimingPathRecord]) -> String {
    let mut out = String::new();
    report_header(&mut out, ctx, "summary", paths.len());
    let _ = writeln!(
        out,
        "{:<50} {:<50} {:<30} {:>10}",
        "Startpoint", "Endpoint", "Path Group", "Slack"
    );
    let _ = writeln!(out, "{}", "-".repeat(143));
    for p in paths {
        let _ = writeln!(
            out,
            "{:<50} {:<50} {:<30} {:>10.4}",
            p.startpoint_name, p.endpoint_name, p.path_group, p.slack
        );
    }
    out
}

fn render_verbose(ctx: &ScenarioContext, paths: &[TimingPathRecord]) -> String {
    let mut out = String::new();
    report_header(&mut out, ctx, "verbose", paths.len());
    for p in paths {
        let _ = writeln!(
            out,
            "  Startpoint: {} ({:?}, clocked by {})",
            p.startpoint_name,
            p.startpoint_class,
            p.startpoint_clock_label()
        );
        let _ = writeln!(
            out,
            "  Endpoint:   {} ({:?}, clocked by {})",
            p.endpoint_name,
            p.endpoint_class,
            p.endpoint_clock_label()
        );
        let _ = writeln!(out, "  Path Group: {}", p.path_group);
        let verdict = if p.slack < 0.0 { "VIOLATED" } else { "MET" };
        let _ = writeln!(out, "  Slack:      {:.4} ({verdict})", p.slack);
        out.push('\n');
    }
    out
}
