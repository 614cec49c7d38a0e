//! The aggregation pass: one path query per `(modeGroup, mode, delay)`.

use crate::category::PathClassifier;
use crate::index::AggregationIndex;
use crate::scene::SceneMap;
use crate::source::{PathQuery, TimingSource};
use star_common::DelayType;
use star_config::TimingSettings;
use star_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};

/// What happened to one batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The query succeeded and returned this many paths.
    Queried(usize),
    /// The query failed; the batch was skipped.
    Failed(String),
    /// No loaded scenario backs the mode for this delay.
    NoScenario,
}

/// Record of one `(modeGroup, mode, delay)` batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchReport {
    /// Mode group of the batch.
    pub mode_group: String,
    /// Mode of the batch.
    pub mode: String,
    /// Delay type of the batch.
    pub delay: DelayType,
    /// Result of the batch.
    pub outcome: BatchOutcome,
}

/// Queries every batch backed by a scenario and classifies the returned paths.
///
/// A failed query is reported to `sink` as `Q001` and the batch is skipped;
/// the remaining batches still run.
pub fn aggregate<S: TimingSource + ?Sized>(
    source: &S,
    scenes: &SceneMap,
    classifier: &PathClassifier,
    settings: &TimingSettings,
    sink: &DiagnosticSink,
) -> (AggregationIndex, Vec<BatchReport>) {
    let mut index = AggregationIndex::new();
    let mut reports = Vec::new();

    for group in &scenes.groups {
        for delay in DelayType::ALL {
            let query = PathQuery::from_settings(settings, delay);
            for mode in &group.modes {
                let outcome = match mode.context(delay) {
                    None => BatchOutcome::NoScenario,
                    Some(ctx) => match source.query_paths(&ctx, &query) {
                        Ok(paths) => {
                            let n = paths.len();
                            index.record_batch(&group.name, &mode.mode, delay);
                            for record in paths {
                                index.classify_and_insert(
                                    classifier,
                                    record,
                                    &group.name,
                                    &mode.mode,
                                    delay,
                                );
                            }
                            BatchOutcome::Queried(n)
                        }
                        Err(e) => {
                            sink.emit(
                                Diagnostic::warning(
                                    DiagnosticCode::new(Category::Query, 1),
                                    format!(
                                        "path query for mode '{}' ({delay}) failed",
                                        mode.mode
                                    ),
                                )
                                .with_note(e.to_string())
                                .with_note("the batch is skipped"),
                            );
                            BatchOutcome::Failed(e.to_string())
                        }
                    },
                };
                reports.push(BatchReport {
                    mode_group: group.name.clone(),
                    mode: mode.mode.clone(),
                    delay,
                    outcome,
                });
            }
        }
    }

    (index, reports)
}
