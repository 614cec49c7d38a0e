//! Scene map: which loaded scenarios back each `(mode, delay)`.

use crate::source::ScenarioContext;
use star_common::DelayType;
use star_config::Settings;
use star_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use std::collections::BTreeSet;

/// One mode of a mode group with its backing scenarios per delay type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModeScenes {
    /// Mode name.
    pub mode: String,
    /// Loaded scenarios for setup checks.
    pub max: Vec<String>,
    /// Loaded scenarios for hold checks.
    pub min: Vec<String>,
}

impl ModeScenes {
    /// Returns the scenarios backing `delay`.
    pub fn scenarios(&self, delay: DelayType) -> &[String] {
        match delay {
            DelayType::Max => &self.max,
            DelayType::Min => &self.min,
        }
    }

    /// Returns the query context for `delay`, or `None` when no scenario backs it.
    pub fn context(&self, delay: DelayType) -> Option<ScenarioContext> {
        let scenarios = self.scenarios(delay);
        if scenarios.is_empty() {
            return None;
        }
        Some(ScenarioContext {
            mode: self.mode.clone(),
            delay,
            scenarios: scenarios.to_vec(),
        })
    }
}

/// A named group of modes reported together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModeGroup {
    /// Group name.
    pub name: String,
    /// Modes in declaration order.
    pub modes: Vec<ModeScenes>,
}

/// Mode groups with the loaded scenarios backing every mode.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SceneMap {
    /// Groups in configuration order.
    pub groups: Vec<ModeGroup>,
}

impl SceneMap {
    /// Builds the scene map from the settings and the scenarios loaded in the session.
    ///
    /// Configured scenarios that are not loaded are dropped with a warning
    /// (`S002`); a `(mode, delay)` left with no scenario is reported as `S001`
    /// and later receives sentinel statistics.
    pub fn build(settings: &Settings, loaded: &[String], sink: &DiagnosticSink) -> Self {
        let loaded: BTreeSet<&str> = loaded.iter().map(String::as_str).collect();
        let mut groups = Vec::new();

        for (name, modes) in &settings.mode_groups {
            let mut group = ModeGroup {
                name: name.clone(),
                modes: Vec::new(),
            };
            for mode in modes {
                let spec = settings.scenes.get(mode);
                let mut scenes = ModeScenes {
                    mode: mode.clone(),
                    ..ModeScenes::default()
                };
                for delay in DelayType::ALL {
                    let configured = spec.map_or(&[][..], |s| match delay {
                        DelayType::Max => s.max.as_slice(),
                        DelayType::Min => s.min.as_slice(),
                    });
                    let kept = filter_loaded(mode, delay, configured, &loaded, sink);
                    if kept.is_empty() {
                        sink.emit(
                            Diagnostic::warning(
                                DiagnosticCode::new(Category::Scenario, 1),
                                format!("mode '{mode}' has no valid scenario for {delay}"),
                            )
                            .with_note("the mode is reported with empty statistics"),
                        );
                    }
                    match delay {
                        DelayType::Max => scenes.max = kept,
                        DelayType::Min => scenes.min = kept,
                    }
                }
                group.modes.push(scenes);
            }
            groups.push(group);
        }

        Self { groups }
    }

    /// Returns the group with the given name.
    pub fn group(&self, name: &str) -> Option<&ModeGroup> {
        self.groups.iter().find(|g| g.name == name)
    }
}

fn filter_loaded(
    mode: &str,
    delay: DelayType,
    configured: &[String],
    loaded: &BTreeSet<&str>,
    sink: &DiagnosticSink,
) -> Vec<String> {
    let mut kept = Vec::new();
    for scenario in configured {
        if loaded.contains(scenario.as_str()) {
            if !kept.contains(scenario) {
                kept.push(scenario.clone());
            }
        } else {
            sink.emit(Diagnostic::warning(
                DiagnosticCode::new(Category::Scenario, 2),
                format!("scenario '{scenario}' for mode '{mode}' ({delay}) is not loaded"),
            ));
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use star_config::{load_config_from_str, resolve_settings};

    fn settings(toml: &str) -> Settings {
        let sink = DiagnosticSink::new();
        resolve_settings(load_config_from_str(toml).unwrap(), &sink).unwrap()
    }

    const CONFIG: &str = r#"
        [mode_groups]
        func = ["func1", "func2"]
        test = ["scan"]

        [scenes.func1]
        max = ["func1_ss", "func1_ss_cold"]
        min = "func1_ff"

        [scenes.func2]
        max = "func2_ss"
    "#;

    fn loaded() -> Vec<String> {
        ["func1_ss", "func1_ff", "func2_ss"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn keeps_only_loaded_scenarios() {
        let sink = DiagnosticSink::new();
        let map = SceneMap::build(&settings(CONFIG), &loaded(), &sink);
        let func = map.group("func").unwrap();
        assert_eq!(func.modes[0].max, vec!["func1_ss"]);
        assert_eq!(func.modes[0].min, vec!["func1_ff"]);
        assert_eq!(func.modes[1].max, vec!["func2_ss"]);
        assert!(func.modes[1].min.is_empty());
    }

    #[test]
    fn reports_missing_scenarios() {
        let sink = DiagnosticSink::new();
        SceneMap::build(&settings(CONFIG), &loaded(), &sink);
        let codes: Vec<String> = sink
            .diagnostics()
            .iter()
            .map(|d| d.code.to_string())
            .collect();
        // func1_ss_cold not loaded, func2 min, scan max, scan min.
        assert_eq!(codes.iter().filter(|c| *c == "S002").count(), 1);
        assert_eq!(codes.iter().filter(|c| *c == "S001").count(), 3);
        assert!(!sink.has_errors());
    }

    #[test]
    fn context_only_when_backed() {
        let sink = DiagnosticSink::new();
        let map = SceneMap::build(&settings(CONFIG), &loaded(), &sink);
        let func2 = &map.group("func").unwrap().modes[1];
        let ctx = func2.context(DelayType::Max).unwrap();
        assert_eq!(ctx.mode, "func2");
        assert_eq!(ctx.scenarios, vec!["func2_ss"]);
        assert!(func2.context(DelayType::Min).is_none());
    }
}
