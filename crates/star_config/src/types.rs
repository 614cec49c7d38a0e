//! Configuration types deserialized from `star.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;

/// Default output directory when `misc.output_dir` is absent.
pub const DEFAULT_OUTPUT_DIR: &str = "star_out";
/// Default path-based analysis mode.
pub const DEFAULT_PBA_MODE: PbaMode = PbaMode::None;
/// Default number of worst paths per endpoint for setup n-worst queries.
pub const DEFAULT_SETUP_NWORST: usize = 1;
/// Default number of worst paths per endpoint for hold n-worst queries.
pub const DEFAULT_HOLD_NWORST: usize = 1;
/// Default slack threshold for setup path queries (paths with slack below it are kept).
pub const DEFAULT_SETUP_SLACK_LT: f64 = 0.0;
/// Default slack threshold for hold path queries.
pub const DEFAULT_HOLD_SLACK_LT: f64 = 0.0;
/// Default cap on the number of setup paths returned by one query.
pub const DEFAULT_SETUP_MAX_PATHS: usize = 10_000;
/// Default cap on the number of hold paths returned by one query.
pub const DEFAULT_HOLD_MAX_PATHS: usize = 10_000;
/// Default cap on the number of paths written into one verbose report.
pub const DEFAULT_VERBOSE_RPT_MAX_PATHS: usize = 100;

/// Hierarchy short names that collide with the fixed classification labels.
pub const RESERVED_HIERARCHY_NAMES: [&str; 4] = ["top", "input", "output", "hm"];

/// Supported tool vendors.
pub const SUPPORTED_VENDORS: [&str; 1] = ["synopsys"];
/// Supported timing tools.
pub const SUPPORTED_TOOLS: [&str; 2] = ["primetime", "pt_shell"];
/// Supported flows.
pub const SUPPORTED_FLOWS: [&str; 2] = ["sta", "signoff"];

/// The top-level configuration parsed from `star.toml`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StarConfig {
    /// Run metadata and output location.
    #[serde(default)]
    pub misc: MiscSettings,
    /// The tool environment the path data comes from.
    #[serde(default)]
    pub environment: EnvironmentConfig,
    /// Hierarchy short name to instance-path prefix.
    #[serde(default)]
    pub hierarchy_map: BTreeMap<String, String>,
    /// Mode group name to the modes reported together.
    #[serde(default)]
    pub mode_groups: BTreeMap<String, Vec<String>>,
    /// Per-mode scenario names backing each delay type.
    #[serde(default)]
    pub scenes: BTreeMap<String, SceneSpec>,
    /// Path query and report settings. Every key is optional.
    #[serde(default)]
    pub timing: RawTimingSettings,
}

/// Run metadata forwarded to the publisher in `miscInfo`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct MiscSettings {
    /// Name of the analyzed design.
    #[serde(default)]
    pub design_name: String,
    /// Tag identifying the STA run.
    #[serde(default)]
    pub build_tag: String,
    /// Output directory; defaults to [`DEFAULT_OUTPUT_DIR`].
    pub output_dir: Option<String>,
    /// External publisher command, run with the output directory as its argument.
    pub publisher: Option<String>,
}

/// The tool environment declared by the user.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct EnvironmentConfig {
    /// Tool vendor (e.g., "synopsys").
    pub vendor: Option<String>,
    /// Tool name (e.g., "primetime").
    pub tool: Option<String>,
    /// Flow name (e.g., "sta").
    pub flow: Option<String>,
}

/// Scenario names backing one mode, per delay type.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SceneSpec {
    /// Scenarios used for setup (max) queries.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub max: Vec<String>,
    /// Scenarios used for hold (min) queries.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub min: Vec<String>,
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Accepts both `max = "func_ss"` and `max = ["func_ss", "func_ss_lv"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a scenario name or a list of scenario names")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Timing settings as written by the user; absent keys are `None`.
///
/// Resolved into [`TimingSettings`] by [`resolve_settings`](crate::resolve_settings),
/// which substitutes documented defaults and warns about each one.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTimingSettings {
    /// Path-based analysis mode.
    pub pba_mode: Option<PbaMode>,
    /// Worst paths per endpoint for setup n-worst queries.
    pub setup_nworst: Option<usize>,
    /// Worst paths per endpoint for hold n-worst queries.
    pub hold_nworst: Option<usize>,
    /// Setup slack threshold.
    pub setup_slack_lt: Option<f64>,
    /// Hold slack threshold.
    pub hold_slack_lt: Option<f64>,
    /// Setup query path cap.
    pub setup_max_paths: Option<usize>,
    /// Hold query path cap.
    pub hold_max_paths: Option<usize>,
    /// Verbose report path cap.
    pub verbose_rpt_max_paths: Option<usize>,
    /// Start/end path types to query.
    pub path_types: Option<Vec<PathType>>,
    /// Detailed report kinds to generate.
    pub rpt_types: Option<Vec<ReportType>>,
}

/// Fully resolved timing settings handed to the aggregation core.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingSettings {
    /// Path-based analysis mode.
    pub pba_mode: PbaMode,
    /// Worst paths per endpoint for setup n-worst queries.
    pub setup_nworst: usize,
    /// Worst paths per endpoint for hold n-worst queries.
    pub hold_nworst: usize,
    /// Setup slack threshold.
    pub setup_slack_lt: f64,
    /// Hold slack threshold.
    pub hold_slack_lt: f64,
    /// Setup query path cap.
    pub setup_max_paths: usize,
    /// Hold query path cap.
    pub hold_max_paths: usize,
    /// Verbose report path cap.
    pub verbose_rpt_max_paths: usize,
    /// Start/end path types to query.
    pub path_types: Vec<PathType>,
    /// Detailed report kinds to generate.
    pub rpt_types: Vec<ReportType>,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            pba_mode: DEFAULT_PBA_MODE,
            setup_nworst: DEFAULT_SETUP_NWORST,
            hold_nworst: DEFAULT_HOLD_NWORST,
            setup_slack_lt: DEFAULT_SETUP_SLACK_LT,
            hold_slack_lt: DEFAULT_HOLD_SLACK_LT,
            setup_max_paths: DEFAULT_SETUP_MAX_PATHS,
            hold_max_paths: DEFAULT_HOLD_MAX_PATHS,
            verbose_rpt_max_paths: DEFAULT_VERBOSE_RPT_MAX_PATHS,
            path_types: PathType::ALL.to_vec(),
            rpt_types: vec![ReportType::Summary],
        }
    }
}

impl TimingSettings {
    /// Returns `true` if verbose detailed reports are requested.
    pub fn verbose_reports(&self) -> bool {
        self.rpt_types.contains(&ReportType::Verbose)
    }
}

/// Path-based analysis mode used for n-worst queries.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PbaMode {
    /// Graph-based slack only.
    #[default]
    None,
    /// Path-based recalculation of the selected paths.
    Path,
    /// Exhaustive path-based recalculation.
    Exhaustive,
}

impl fmt::Display for PbaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PbaMode::None => "none",
            PbaMode::Path => "path",
            PbaMode::Exhaustive => "exhaustive",
        };
        f.write_str(s)
    }
}

/// Start/end classification of a timing path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathType {
    /// Register (pin) to register (pin).
    Reg2Reg,
    /// Input port to register.
    In2Reg,
    /// Register to output port.
    Reg2Out,
    /// Input port to output port.
    In2Out,
}

impl PathType {
    /// Every path type.
    pub const ALL: [PathType; 4] = [
        PathType::Reg2Reg,
        PathType::In2Reg,
        PathType::Reg2Out,
        PathType::In2Out,
    ];

    /// Returns the path type for a start/end pair, given whether each end is a port.
    pub fn from_ends(start_is_port: bool, end_is_port: bool) -> Self {
        match (start_is_port, end_is_port) {
            (false, false) => PathType::Reg2Reg,
            (true, false) => PathType::In2Reg,
            (false, true) => PathType::Reg2Out,
            (true, true) => PathType::In2Out,
        }
    }
}

/// Kind of detailed per-path report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    /// One line per path.
    Summary,
    /// Full point-by-point path listing.
    Verbose,
}
