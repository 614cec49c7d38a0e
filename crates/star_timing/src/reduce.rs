//! The multi-level statistics rollup.
//!
//! For every `(modeGroup, delay)` the reducer fills, for every declared mode:
//!
//! 1. the mode total over all buckets;
//! 2. one entry per main category, all ten always present;
//! 3. one entry per populated `(mainCategory, hierCategory)`;
//! 4. one leaf per populated `(mainCategory, hierCategory, clockPair, clockGroup)`,
//!    with an n-worst query over the bucket's endpoints and links to the
//!    rendered path reports.
//!
//! A mode without paths at a position gets the sentinel statistics, so every
//! declared mode appears at every populated depth.

use crate::category::MainCategory;
use crate::index::{hier_records, pair_records, AggregationIndex, DelayIndex, HierIndex};
use crate::path::TimingPathRecord;
use crate::scene::{ModeGroup, ModeScenes};
use crate::source::{NworstQuery, QueryError, ScenarioContext, TimingSource};
use crate::stats::SlackStats;
use crate::tree::{CategoryTree, ModeStats, NworstStats};
use indexmap::IndexSet;
use star_common::DelayType;
use star_config::{ReportType, TimingSettings};
use star_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use std::path::Path;

/// Directory, relative to the output directory, holding the detailed reports.
pub const REPORT_DIR: &str = "rpts";

/// Walks an [`AggregationIndex`] and builds the [`CategoryTree`].
pub struct StatsReducer<'a, S: TimingSource + ?Sized> {
    source: &'a S,
    settings: &'a TimingSettings,
    output_dir: &'a Path,
    sink: &'a DiagnosticSink,
}

impl<'a, S: TimingSource + ?Sized> StatsReducer<'a, S> {
    /// Creates a reducer that writes detailed reports below `output_dir`.
    pub fn new(
        source: &'a S,
        settings: &'a TimingSettings,
        output_dir: &'a Path,
        sink: &'a DiagnosticSink,
    ) -> Self {
        Self {
            source,
            settings,
            output_dir,
            sink,
        }
    }

    /// Consumes the index and returns the statistics tree for `groups`.
    pub fn reduce(&self, index: AggregationIndex, groups: &[ModeGroup]) -> CategoryTree {
        let mut tree = CategoryTree::new();
        let empty = DelayIndex::default();
        let mut report_seq = 0usize;

        for group in groups {
            for delay in DelayType::ALL {
                let d = index.delay(&group.name, delay).unwrap_or(&empty);
                let base = [group.name.as_str(), delay.as_str()];

                for mode in &group.modes {
                    let stats = SlackStats::of_paths(d.mode_records(&mode.mode));
                    tree.insert_mode_stats(&base, &mode.mode, ModeStats::rollup(stats));
                }

                for main in MainCategory::ALL {
                    let path = [base[0], base[1], main.as_str()];
                    for mode in &group.modes {
                        let stats = d
                            .category(main)
                            .map(|hier| SlackStats::of_paths(hier_records(hier, &mode.mode)))
                            .unwrap_or(SlackStats::EMPTY);
                        tree.insert_mode_stats(&path, &mode.mode, ModeStats::rollup(stats));
                    }
                }

                for (main, hier_index) in d.categories() {
                    self.reduce_category(
                        &mut tree,
                        &mut report_seq,
                        d,
                        [base[0], base[1], main.as_str()],
                        delay,
                        hier_index,
                        &group.modes,
                    );
                }
            }
        }

        tree
    }

    #[allow(clippy::too_many_arguments)]
    fn reduce_category(
        &self,
        tree: &mut CategoryTree,
        report_seq: &mut usize,
        d: &DelayIndex,
        prefix: [&str; 3],
        delay: DelayType,
        hier_index: &HierIndex,
        modes: &[ModeScenes],
    ) {
        for (hier, pairs) in hier_index {
            let hier_path = [prefix[0], prefix[1], prefix[2], hier.as_str()];
            for mode in modes {
                let stats = SlackStats::of_paths(pair_records(pairs, &mode.mode));
                tree.insert_mode_stats(&hier_path, &mode.mode, ModeStats::rollup(stats));
            }

            for (clock_pair, clock_groups) in pairs {
                for (clock_group, buckets) in clock_groups {
                    let leaf_path = [
                        prefix[0],
                        prefix[1],
                        prefix[2],
                        hier.as_str(),
                        clock_pair.as_str(),
                        clock_group.as_str(),
                    ];
                    for mode in modes {
                        let bucket = buckets.get(&mode.mode).map(Vec::as_slice).unwrap_or(&[]);
                        let ctx = if d.has_batch(&mode.mode) {
                            mode.context(delay)
                        } else {
                            None
                        };
                        let leaf = match ctx {
                            Some(ctx) if !bucket.is_empty() => {
                                *report_seq += 1;
                                self.leaf(&ctx, bucket, clock_group, *report_seq)
                            }
                            _ => ModeStats::empty_leaf(),
                        };
                        tree.insert_mode_stats(&leaf_path, &mode.mode, leaf);
                    }
                }
            }
        }
    }

    /// Builds one leaf: bucket statistics, n-worst statistics, and report links.
    fn leaf(
        &self,
        ctx: &ScenarioContext,
        bucket: &[TimingPathRecord],
        clock_group: &str,
        seq: usize,
    ) -> ModeStats {
        let endpoints: IndexSet<&str> = bucket.iter().map(|p| p.endpoint_name.as_str()).collect();
        let query = NworstQuery::from_settings(
            self.settings,
            ctx.delay,
            endpoints.into_iter().collect(),
            clock_group,
        );
        let nworst = match self.source.query_nworst(ctx, &query) {
            Ok(paths) => paths,
            Err(e) => {
                self.query_warning(ctx, 2, "n-worst query", &e);
                Vec::new()
            }
        };

        let stem = format!("{}_{}/{seq:05}", ctx.mode, ctx.delay);
        let summary = self.write_report(ctx, bucket, ReportType::Summary, &stem);
        let verbose = if self.settings.verbose_reports() {
            let n = nworst.len().min(self.settings.verbose_rpt_max_paths);
            self.write_report(ctx, &nworst[..n], ReportType::Verbose, &stem)
        } else {
            None
        };

        ModeStats {
            stats: SlackStats::of_paths(bucket),
            n_worst: Some(NworstStats::of_paths(&nworst)),
            rpt_summary_lnk: summary,
            rpt_verbose_lnk: verbose,
        }
    }

    /// Renders one report and returns its path relative to the output directory.
    fn write_report(
        &self,
        ctx: &ScenarioContext,
        paths: &[TimingPathRecord],
        kind: ReportType,
        stem: &str,
    ) -> Option<String> {
        let suffix = match kind {
            ReportType::Summary => "summary",
            ReportType::Verbose => "verbose",
        };
        let link = format!("{REPORT_DIR}/{stem}.{suffix}.rpt");
        match self
            .source
            .write_path_report(ctx, paths, kind, &self.output_dir.join(&link))
        {
            Ok(()) => Some(link),
            Err(e) => {
                self.query_warning(ctx, 3, "report generation", &e);
                None
            }
        }
    }

    fn query_warning(&self, ctx: &ScenarioContext, n: u16, what: &str, e: &QueryError) {
        self.sink.emit(
            Diagnostic::warning(
                DiagnosticCode::new(Category::Query, n),
                format!("{what} for mode '{}' ({}) failed", ctx.mode, ctx.delay),
            )
            .with_note(e.to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::PathClassifier;
    use crate::dump::{DumpedPath, PathDump, ScenarioDump};
    use crate::hierarchy::HierarchyMap;
    use crate::path::ObjectClass;
    use crate::pipeline::aggregate;
    use crate::scene::SceneMap;
    use crate::source::PathQuery;
    use crate::tree::MODE_STATS;

    fn dumped(start: &str, end: &str, slack: f64) -> DumpedPath {
        DumpedPath {
            delay: DelayType::Max,
            pba_slack: None,
            record: TimingPathRecord {
                startpoint_name: start.into(),
                startpoint_class: ObjectClass::Pin,
                endpoint_name: end.into(),
                endpoint_class: ObjectClass::Pin,
                startpoint_clock: Some("clk".into()),
                endpoint_clock: Some("clk".into()),
                path_group: "clk".into(),
                slack,
            },
        }
    }

    fn scenes() -> SceneMap {
        SceneMap {
            groups: vec![ModeGroup {
                name: "func".into(),
                modes: vec![
                    ModeScenes {
                        mode: "m1".into(),
                        max: vec!["m1_ss".into()],
                        min: vec![],
                    },
                    ModeScenes {
                        mode: "m2".into(),
                        max: vec!["m2_ss".into()],
                        min: vec![],
                    },
                ],
            }],
        }
    }

    fn source() -> PathDump {
        PathDump::from_scenarios([
            (
                "m1_ss".to_string(),
                ScenarioDump {
                    log: String::new(),
                    paths: vec![
                        dumped("cpu/a/CP", "cpu/b/D", -1.5),
                        dumped("cpu/a/CP", "cpu/b/D", 2.0),
                        dumped("x/CP", "y/D", -0.5),
                    ],
                },
            ),
            ("m2_ss".to_string(), ScenarioDump::default()),
        ])
    }

    /// A dump whose n-worst queries or report writes can be made to fail.
    struct FlakySource {
        inner: PathDump,
        fail_nworst: bool,
        fail_reports: bool,
    }

    impl TimingSource for FlakySource {
        fn scenarios(&self) -> Vec<String> {
            self.inner.scenarios()
        }

        fn query_paths(
            &self,
            ctx: &ScenarioContext,
            query: &PathQuery,
        ) -> Result<Vec<TimingPathRecord>, QueryError> {
            self.inner.query_paths(ctx, query)
        }

        fn query_nworst(
            &self,
            ctx: &ScenarioContext,
            query: &NworstQuery<'_>,
        ) -> Result<Vec<TimingPathRecord>, QueryError> {
            if self.fail_nworst {
                return Err(QueryError::ToolReported {
                    scenario: ctx.scenarios[0].clone(),
                    message: "Error: license checkout failed".into(),
                });
            }
            self.inner.query_nworst(ctx, query)
        }

        fn write_path_report(
            &self,
            ctx: &ScenarioContext,
            paths: &[TimingPathRecord],
            kind: ReportType,
            dest: &Path,
        ) -> Result<(), QueryError> {
            if self.fail_reports {
                return Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into());
            }
            self.inner.write_path_report(ctx, paths, kind, dest)
        }
    }

    fn run_with<S: TimingSource>(
        src: &S,
        settings: &TimingSettings,
        out: &Path,
        sink: &DiagnosticSink,
    ) -> CategoryTree {
        let classifier = PathClassifier::new(HierarchyMap::new([("cpu", "cpu/")]));
        let scenes = scenes();
        let settings = TimingSettings {
            setup_slack_lt: 10.0,
            ..settings.clone()
        };
        let (index, _) = aggregate(src, &scenes, &classifier, &settings, sink);
        StatsReducer::new(src, &settings, out, sink).reduce(index, &scenes.groups)
    }

    fn run(settings: &TimingSettings, out: &Path) -> CategoryTree {
        run_with(&source(), settings, out, &DiagnosticSink::new())
    }

    fn count(sink: &DiagnosticSink, number: u16) -> usize {
        let code = DiagnosticCode::new(Category::Query, number);
        sink.diagnostics().iter().filter(|d| d.code == code).count()
    }

    #[test]
    fn mode_level_totals() {
        let dir = tempfile::tempdir().unwrap();
        let tree = run(&TimingSettings::default(), dir.path());
        let node = tree.get(&["func", "max"]).unwrap();
        let m1 = node.mode_stats("m1").unwrap();
        assert_eq!(m1.stats.fep, 3);
        assert_eq!(m1.stats.wns, Some(-1.5));
        assert_eq!(m1.stats.tns, 0.0);
        assert_eq!(node.mode_stats("m2").unwrap().stats, SlackStats::EMPTY);
    }

    #[test]
    fn every_main_category_present() {
        let dir = tempfile::tempdir().unwrap();
        let tree = run(&TimingSettings::default(), dir.path());
        let node = tree.get(&["func", "max"]).unwrap();
        let mains: Vec<_> = node.subdivisions().map(|(k, _)| k).collect();
        assert_eq!(mains.len(), 10);
        let top = tree.get(&["func", "max", "top:top"]).unwrap();
        assert_eq!(top.mode_stats("m1").unwrap().stats.fep, 1);
        assert_eq!(top.mode_stats("m2").unwrap().stats, SlackStats::EMPTY);
        let input = tree.get(&["func", "max", "input:output"]).unwrap();
        assert_eq!(input.mode_stats("m1").unwrap().stats, SlackStats::EMPTY);
    }

    #[test]
    fn leaf_has_nworst_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let settings = TimingSettings {
            rpt_types: vec![ReportType::Summary, ReportType::Verbose],
            ..TimingSettings::default()
        };
        let tree = run(&settings, dir.path());
        let leaf = tree
            .get(&["func", "max", "within_hm", "cpu:cpu", "clk:clk", "clk"])
            .unwrap();
        let m1 = leaf.mode_stats("m1").unwrap();
        assert_eq!(m1.stats.fep, 2);
        assert_eq!(m1.stats.tns, 0.5);
        // nworst = 1 per endpoint
        assert_eq!(
            m1.n_worst,
            Some(NworstStats {
                nvp: 1,
                nwtns: -1.5
            })
        );

        let summary = m1.rpt_summary_lnk.as_deref().unwrap();
        let verbose = m1.rpt_verbose_lnk.as_deref().unwrap();
        assert!(summary.starts_with("rpts/m1_max/"));
        assert!(dir.path().join(summary).is_file());
        assert!(dir.path().join(verbose).is_file());

        let m2 = leaf.mode_stats("m2").unwrap();
        assert_eq!(*m2, ModeStats::empty_leaf());
        assert!(leaf.get(&[MODE_STATS, "m2"]).is_some());
    }

    #[test]
    fn verbose_reports_off_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let tree = run(&TimingSettings::default(), dir.path());
        let leaf = tree
            .get(&["func", "max", "top:top", "none", "clk:clk", "clk"])
            .unwrap();
        let m1 = leaf.mode_stats("m1").unwrap();
        assert!(m1.rpt_summary_lnk.is_some());
        assert!(m1.rpt_verbose_lnk.is_none());
    }

    #[test]
    fn failed_nworst_zeroes_leaf_and_warns() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DiagnosticSink::new();
        let src = FlakySource {
            inner: source(),
            fail_nworst: true,
            fail_reports: false,
        };
        let tree = run_with(&src, &TimingSettings::default(), dir.path(), &sink);

        let leaf = tree
            .get(&["func", "max", "within_hm", "cpu:cpu", "clk:clk", "clk"])
            .unwrap();
        let m1 = leaf.mode_stats("m1").unwrap();
        assert_eq!(m1.stats.fep, 2);
        assert_eq!(
            m1.n_worst,
            Some(NworstStats {
                nvp: 0,
                nwtns: 0.0
            })
        );
        assert!(dir.path().join(m1.rpt_summary_lnk.as_deref().unwrap()).is_file());
        // one per populated m1 leaf
        assert_eq!(count(&sink, 2), 2);
        assert_eq!(count(&sink, 3), 0);
        assert!(!sink.has_errors());
    }

    #[test]
    fn failed_report_drops_link_and_warns() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DiagnosticSink::new();
        let src = FlakySource {
            inner: source(),
            fail_nworst: false,
            fail_reports: true,
        };
        let settings = TimingSettings {
            rpt_types: vec![ReportType::Summary, ReportType::Verbose],
            ..TimingSettings::default()
        };
        let tree = run_with(&src, &settings, dir.path(), &sink);

        let leaf = tree
            .get(&["func", "max", "within_hm", "cpu:cpu", "clk:clk", "clk"])
            .unwrap();
        let m1 = leaf.mode_stats("m1").unwrap();
        assert!(m1.rpt_summary_lnk.is_none());
        assert!(m1.rpt_verbose_lnk.is_none());
        assert_eq!(
            m1.n_worst,
            Some(NworstStats {
                nvp: 1,
                nwtns: -1.5
            })
        );
        // summary and verbose for each of the two populated m1 leaves
        assert_eq!(count(&sink, 3), 4);
        assert_eq!(count(&sink, 2), 0);
        assert!(!dir.path().join(REPORT_DIR).exists());
        let warning = sink
            .diagnostics()
            .into_iter()
            .find(|d| d.code == DiagnosticCode::new(Category::Query, 3))
            .unwrap();
        assert!(warning.message.contains("mode 'm1' (max)"));
    }

    #[test]
    fn group_without_scenarios_gets_sentinels() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DiagnosticSink::new();
        let src = PathDump::default();
        let settings = TimingSettings::default();
        let groups = vec![ModeGroup {
            name: "test".into(),
            modes: vec![ModeScenes {
                mode: "scan".into(),
                ..ModeScenes::default()
            }],
        }];
        let tree = StatsReducer::new(&src, &settings, dir.path(), &sink)
            .reduce(AggregationIndex::new(), &groups);

        for delay in ["max", "min"] {
            let node = tree.get(&["test", delay]).unwrap();
            assert_eq!(node.mode_stats("scan").unwrap().stats, SlackStats::EMPTY);
            for main in MainCategory::ALL {
                let n = tree.get(&["test", delay, main.as_str()]).unwrap();
                assert_eq!(n.mode_stats("scan").unwrap().stats, SlackStats::EMPTY);
            }
        }
        assert!(sink.diagnostics().is_empty());
    }
}
