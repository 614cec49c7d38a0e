//! The timing source seam.
//!
//! A [`TimingSource`] stands in for the timing-analysis session: it lists the
//! loaded scenarios, answers bounded path queries, and renders detailed path
//! reports. Every call names its scenarios explicitly through a
//! [`ScenarioContext`]; the source keeps no "current scenario".

use crate::path::TimingPathRecord;
use star_common::DelayType;
use star_config::{PathType, PbaMode, ReportType, TimingSettings};
use std::path::Path;

/// Marker whose presence in a tool log flags the batch as failed.
pub const TOOL_ERROR_MARKER: &str = "Error";

/// The scenarios a query runs against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioContext {
    /// The mode being reported.
    pub mode: String,
    /// The delay type being reported.
    pub delay: DelayType,
    /// Loaded scenarios backing `(mode, delay)`; never empty.
    pub scenarios: Vec<String>,
}

/// Parameters of a batch path query.
#[derive(Clone, Debug, PartialEq)]
pub struct PathQuery {
    /// Check direction.
    pub delay: DelayType,
    /// Keep paths with slack strictly below this value.
    pub slack_lt: f64,
    /// Cap on the number of returned paths.
    pub max_paths: usize,
    /// Path-based analysis mode.
    pub pba_mode: PbaMode,
    /// Start/end types to include.
    pub path_types: Vec<PathType>,
}

impl PathQuery {
    /// Builds the batch query for `delay` from the resolved settings.
    pub fn from_settings(settings: &TimingSettings, delay: DelayType) -> Self {
        let (slack_lt, max_paths) = match delay {
            DelayType::Max => (settings.setup_slack_lt, settings.setup_max_paths),
            DelayType::Min => (settings.hold_slack_lt, settings.hold_max_paths),
        };
        Self {
            delay,
            slack_lt,
            max_paths,
            pba_mode: settings.pba_mode,
            path_types: settings.path_types.clone(),
        }
    }
}

/// Parameters of an n-worst query over an endpoint collection.
#[derive(Clone, Debug, PartialEq)]
pub struct NworstQuery<'a> {
    /// Check direction.
    pub delay: DelayType,
    /// Endpoints to query.
    pub endpoints: Vec<&'a str>,
    /// Restrict to this path group.
    pub path_group: &'a str,
    /// Paths kept per endpoint.
    pub nworst: usize,
    /// Cap on the number of returned paths.
    pub max_paths: usize,
    /// Keep paths with slack strictly below this value.
    pub slack_lt: f64,
    /// Path-based analysis mode.
    pub pba_mode: PbaMode,
}

impl<'a> NworstQuery<'a> {
    /// Builds an n-worst query for the given endpoints from the resolved settings.
    pub fn from_settings(
        settings: &TimingSettings,
        delay: DelayType,
        endpoints: Vec<&'a str>,
        path_group: &'a str,
    ) -> Self {
        let batch = PathQuery::from_settings(settings, delay);
        let nworst = match delay {
            DelayType::Max => settings.setup_nworst,
            DelayType::Min => settings.hold_nworst,
        };
        Self {
            delay,
            endpoints,
            path_group,
            nworst,
            max_paths: batch.max_paths,
            slack_lt: batch.slack_lt,
            pba_mode: batch.pba_mode,
        }
    }
}

/// Errors reported by a timing source.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Reading source data failed.
    #[error("failed to read timing data: {0}")]
    Io(#[from] std::io::Error),

    /// Source data could not be decoded.
    #[error("malformed timing data for scenario '{scenario}': {message}")]
    Parse {
        /// Scenario whose data is malformed.
        scenario: String,
        /// Decoder message.
        message: String,
    },

    /// The tool reported an error while producing the batch.
    #[error("timing tool reported an error in scenario '{scenario}': {message}")]
    ToolReported {
        /// Scenario the error was reported in.
        scenario: String,
        /// The first offending log line.
        message: String,
    },

    /// The scenario is not loaded in the session.
    #[error("scenario '{0}' is not loaded")]
    UnknownScenario(String),
}

/// Checks captured tool output for the error marker.
pub fn check_tool_log(scenario: &str, log: &str) -> Result<(), QueryError> {
    match log.lines().find(|line| line.contains(TOOL_ERROR_MARKER)) {
        Some(line) => Err(QueryError::ToolReported {
            scenario: scenario.to_string(),
            message: line.trim().to_string(),
        }),
        None => Ok(()),
    }
}

/// A timing-analysis session.
pub trait TimingSource {
    /// Names of the scenarios loaded in the session.
    fn scenarios(&self) -> Vec<String>;

    /// Returns the paths matching `query` across the context's scenarios,
    /// worst first, at most `query.max_paths`.
    fn query_paths(
        &self,
        ctx: &ScenarioContext,
        query: &PathQuery,
    ) -> Result<Vec<TimingPathRecord>, QueryError>;

    /// Returns up to `nworst` paths per endpoint, worst first, at most
    /// `query.max_paths` in total.
    fn query_nworst(
        &self,
        ctx: &ScenarioContext,
        query: &NworstQuery<'_>,
    ) -> Result<Vec<TimingPathRecord>, QueryError>;

    /// Renders a detailed report of `paths` to `dest`.
    fn write_path_report(
        &self,
        ctx: &ScenarioContext,
        paths: &[TimingPathRecord],
        kind: ReportType,
        dest: &Path,
    ) -> Result<(), QueryError>;
}
