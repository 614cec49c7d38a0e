//! Settings resolution: environment checks and default substitution.

use crate::error::ConfigError;
use crate::types::{
    EnvironmentConfig, MiscSettings, PathType, RawTimingSettings, ReportType, SceneSpec,
    StarConfig, TimingSettings, DEFAULT_HOLD_MAX_PATHS, DEFAULT_HOLD_NWORST,
    DEFAULT_HOLD_SLACK_LT, DEFAULT_OUTPUT_DIR, DEFAULT_PBA_MODE, DEFAULT_SETUP_MAX_PATHS,
    DEFAULT_SETUP_NWORST, DEFAULT_SETUP_SLACK_LT, DEFAULT_VERBOSE_RPT_MAX_PATHS,
    SUPPORTED_FLOWS, SUPPORTED_TOOLS, SUPPORTED_VENDORS,
};
use star_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::PathBuf;

/// The pre-validated settings object consumed by the reporting core.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Run metadata.
    pub misc: MiscSettings,
    /// Validated tool environment.
    pub environment: ToolEnvironment,
    /// Resolved output directory.
    pub output_dir: PathBuf,
    /// Hierarchy short name to instance-path prefix.
    pub hierarchy_map: BTreeMap<String, String>,
    /// Mode group name to its modes, in declaration order.
    pub mode_groups: BTreeMap<String, Vec<String>>,
    /// Per-mode scenario names.
    pub scenes: BTreeMap<String, SceneSpec>,
    /// Path query and report settings with defaults applied.
    pub timing: TimingSettings,
}

/// The tool environment after validation, with defaults filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolEnvironment {
    /// Tool vendor.
    pub vendor: String,
    /// Tool name.
    pub tool: String,
    /// Flow name.
    pub flow: String,
}

/// Resolves a parsed configuration into [`Settings`].
///
/// The environment is validated first; an unsupported vendor, tool, or flow is
/// returned as [`ConfigError::UnsupportedEnvironment`]. Every absent timing
/// setting is replaced by its documented default and reported to `sink` as a
/// warning.
pub fn resolve_settings(
    config: StarConfig,
    sink: &DiagnosticSink,
) -> Result<Settings, ConfigError> {
    let environment = validate_environment(&config.environment, sink)?;

    let output_dir = match config.misc.output_dir.as_deref() {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            warn_default(sink, "misc.output_dir", &DEFAULT_OUTPUT_DIR);
            PathBuf::from(DEFAULT_OUTPUT_DIR)
        }
    };

    let declared: Vec<&String> = config.mode_groups.values().flatten().collect();
    for mode in config.scenes.keys() {
        if !declared.contains(&mode) {
            sink.emit(
                Diagnostic::note(
                    DiagnosticCode::new(Category::Config, 3),
                    format!("scenes given for undeclared mode '{mode}' are ignored"),
                )
                .with_help("add the mode to a [mode_groups] entry"),
            );
        }
    }

    Ok(Settings {
        timing: resolve_timing(&config.timing, sink),
        misc: config.misc,
        environment,
        output_dir,
        hierarchy_map: config.hierarchy_map,
        mode_groups: config.mode_groups,
        scenes: config.scenes,
    })
}

/// Checks the declared tool environment against the supported set.
///
/// Absent fields default to the first supported value with a warning.
pub fn validate_environment(
    env: &EnvironmentConfig,
    sink: &DiagnosticSink,
) -> Result<ToolEnvironment, ConfigError> {
    Ok(ToolEnvironment {
        vendor: check_supported("vendor", env.vendor.as_deref(), &SUPPORTED_VENDORS, sink)?,
        tool: check_supported("tool", env.tool.as_deref(), &SUPPORTED_TOOLS, sink)?,
        flow: check_supported("flow", env.flow.as_deref(), &SUPPORTED_FLOWS, sink)?,
    })
}

fn check_supported(
    field: &'static str,
    value: Option<&str>,
    supported: &[&str],
    sink: &DiagnosticSink,
) -> Result<String, ConfigError> {
    match value {
        None => {
            warn_default(sink, &format!("environment.{field}"), &supported[0]);
            Ok(supported[0].to_string())
        }
        Some(v) if supported.iter().any(|s| s.eq_ignore_ascii_case(v)) => {
            Ok(v.to_ascii_lowercase())
        }
        Some(v) => Err(ConfigError::UnsupportedEnvironment {
            field,
            value: v.to_string(),
            supported: supported.join(", "),
        }),
    }
}

fn resolve_timing(raw: &RawTimingSettings, sink: &DiagnosticSink) -> TimingSettings {
    TimingSettings {
        pba_mode: setting(raw.pba_mode, "pba_mode", DEFAULT_PBA_MODE, sink),
        setup_nworst: setting(raw.setup_nworst, "setup_nworst", DEFAULT_SETUP_NWORST, sink),
        hold_nworst: setting(raw.hold_nworst, "hold_nworst", DEFAULT_HOLD_NWORST, sink),
        setup_slack_lt: setting(
            raw.setup_slack_lt,
            "setup_slack_lt",
            DEFAULT_SETUP_SLACK_LT,
            sink,
        ),
        hold_slack_lt: setting(raw.hold_slack_lt, "hold_slack_lt", DEFAULT_HOLD_SLACK_LT, sink),
        setup_max_paths: setting(
            raw.setup_max_paths,
            "setup_max_paths",
            DEFAULT_SETUP_MAX_PATHS,
            sink,
        ),
        hold_max_paths: setting(
            raw.hold_max_paths,
            "hold_max_paths",
            DEFAULT_HOLD_MAX_PATHS,
            sink,
        ),
        verbose_rpt_max_paths: setting(
            raw.verbose_rpt_max_paths,
            "verbose_rpt_max_paths",
            DEFAULT_VERBOSE_RPT_MAX_PATHS,
            sink,
        ),
        path_types: setting(
            raw.path_types.clone(),
            "path_types",
            PathType::ALL.to_vec(),
            sink,
        ),
        rpt_types: setting(
            raw.rpt_types.clone(),
            "rpt_types",
            vec![ReportType::Summary],
            sink,
        ),
    }
}

fn setting<T: Debug>(value: Option<T>, key: &str, default: T, sink: &DiagnosticSink) -> T {
    match value {
        Some(v) => v,
        None => {
            warn_default(sink, &format!("timing.{key}"), &default);
            default
        }
    }
}

fn warn_default(sink: &DiagnosticSink, key: &str, default: &dyn Debug) {
    sink.emit(Diagnostic::warning(
        DiagnosticCode::new(Category::Config, 1),
        format!("missing setting {key}; using default {default:?}"),
    ));
}
