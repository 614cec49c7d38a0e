//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{StarConfig, RESERVED_HIERARCHY_NAMES};
use std::collections::BTreeMap;
use std::path::Path;

/// File name looked up when no explicit configuration path is given.
pub const CONFIG_FILE_NAME: &str = "star.toml";

/// Loads and validates a `star.toml` configuration.
///
/// `path` may name the file itself or a directory containing [`CONFIG_FILE_NAME`].
pub fn load_config(path: &Path) -> Result<StarConfig, ConfigError> {
    let config_path = if path.is_dir() {
        path.join(CONFIG_FILE_NAME)
    } else {
        path.to_path_buf()
    };
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `star.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<StarConfig, ConfigError> {
    let config: StarConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates structural invariants that defaults cannot repair.
fn validate_config(config: &StarConfig) -> Result<(), ConfigError> {
    if config.mode_groups.is_empty() {
        return Err(ConfigError::MissingField("mode_groups".to_string()));
    }

    let mut owner: BTreeMap<&str, &str> = BTreeMap::new();
    for (group, modes) in &config.mode_groups {
        if modes.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "mode group '{group}' lists no modes"
            )));
        }
        for mode in modes {
            if let Some(first) = owner.insert(mode, group) {
                return Err(ConfigError::ValidationError(format!(
                    "mode '{mode}' is listed in both '{first}' and '{group}'"
                )));
            }
        }
    }

    for (short, prefix) in &config.hierarchy_map {
        if RESERVED_HIERARCHY_NAMES.contains(&short.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "hierarchy name '{short}' is reserved"
            )));
        }
        if short.is_empty() || short.contains(':') {
            return Err(ConfigError::ValidationError(format!(
                "hierarchy name '{short}' must be non-empty and must not contain ':'"
            )));
        }
        if prefix.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "hierarchy '{short}' has an empty prefix"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PathType, PbaMode, ReportType};

    const MINIMAL: &str = r#"
[mode_groups]
func = ["func1", "func2"]
"#;

    #[test]
    fn parse_minimal_config() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.mode_groups["func"], vec!["func1", "func2"]);
        assert!(config.hierarchy_map.is_empty());
        assert!(config.timing.pba_mode.is_none());
        assert!(config.misc.output_dir.is_none());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[misc]
design_name = "soc_top"
build_tag = "r42"
output_dir = "reports/star"
publisher = "star_pub"

[environment]
vendor = "synopsys"
tool = "primetime"
flow = "sta"

[hierarchy_map]
vpu = "vpuwrap/"
cpu = "cpu_ss/core0/"

[mode_groups]
func = ["func"]
test = ["scan", "bist"]

[scenes.func]
max = "func_ss_125c"
min = ["func_ff_m40c", "func_ff_125c"]

[scenes.scan]
max = ["scan_ss"]

[timing]
pba_mode = "path"
setup_nworst = 3
hold_slack_lt = 0.05
path_types = ["reg2reg", "in2reg"]
rpt_types = ["summary", "verbose"]
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.misc.design_name, "soc_top");
        assert_eq!(config.misc.publisher.as_deref(), Some("star_pub"));
        assert_eq!(config.hierarchy_map["vpu"], "vpuwrap/");
        assert_eq!(config.mode_groups.len(), 2);
        assert_eq!(config.scenes["func"].max, vec!["func_ss_125c"]);
        assert_eq!(config.scenes["func"].min.len(), 2);
        assert!(config.scenes["scan"].min.is_empty());
        assert_eq!(config.timing.pba_mode, Some(PbaMode::Path));
        assert_eq!(config.timing.setup_nworst, Some(3));
        assert_eq!(config.timing.hold_slack_lt, Some(0.05));
        assert_eq!(
            config.timing.path_types,
            Some(vec![PathType::Reg2Reg, PathType::In2Reg])
        );
        assert_eq!(
            config.timing.rpt_types,
            Some(vec![ReportType::Summary, ReportType::Verbose])
        );
    }

    #[test]
    fn missing_mode_groups_errors() {
        let err = load_config_from_str("[hierarchy_map]\nvpu = \"vpuwrap/\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn reserved_hierarchy_name_errors() {
        let toml = r#"
[hierarchy_map]
top = "u_top/"

[mode_groups]
func = ["func"]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(ref m) if m.contains("reserved")));
    }

    #[test]
    fn empty_prefix_errors() {
        let toml = r#"
[hierarchy_map]
vpu = ""

[mode_groups]
func = ["func"]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn mode_in_two_groups_errors() {
        let toml = r#"
[mode_groups]
a = ["func"]
b = ["scan", "func"]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(ref m) if m.contains("func")));
    }

    #[test]
    fn unknown_timing_key_errors() {
        let toml = r#"
[mode_groups]
func = ["func"]

[timing]
setup_nwrost = 2
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn invalid_pba_mode_errors() {
        let toml = r#"
[mode_groups]
func = ["func"]

[timing]
pba_mode = "sometimes"
"#;
        assert!(matches!(
            load_config_from_str(toml).unwrap_err(),
            ConfigError::ParseError(_)
        ));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), MINIMAL).unwrap();
        let config = load_config(dir.path()).unwrap();
        assert!(config.mode_groups.contains_key("func"));
    }

    #[test]
    fn io_error_from_nonexistent_file() {
        let err = load_config(Path::new("/nonexistent/dir/star.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
