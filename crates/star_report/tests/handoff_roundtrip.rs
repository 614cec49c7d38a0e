//! Integration tests for the emitted artifacts of a full run.
//!
//! A run is aggregated from in-memory dumps, emitted to a temporary output
//! directory, and the handoff payload is read back and compared with the tree.

use star_common::DelayType;
use star_config::{load_config_from_str, resolve_settings, Settings};
use star_diagnostics::DiagnosticSink;
use star_report::{
    prepare_output_dir, strip_wildcards, tree_from_timing_info, write_indexes, HandoffPayload,
    HandoffValue, HANDOFF_DIR,
};
use star_timing::{
    aggregate, CategoryTree, DumpedPath, HierarchyMap, ObjectClass, PathClassifier, PathDump,
    SceneMap, ScenarioDump, StatsReducer, TimingPathRecord, TimingSource, TreeNode,
};
use std::path::Path;
use tempfile::TempDir;

const CONFIG: &str = r#"
[misc]
design_name = "soc_top"
build_tag = "r42"

[hierarchy_map]
cpu = "cpu_ss/"

[mode_groups]
func = ["func"]
test = ["scan"]

[scenes.func]
max = ["func_ss", "func_ss_lv"]
min = "func_ff"

[timing]
rpt_types = ["summary", "verbose"]
"#;

fn dumped(delay: DelayType, start: &str, end: &str, group: &str, slack: f64) -> DumpedPath {
    DumpedPath {
        delay,
        pba_slack: None,
        record: TimingPathRecord {
            startpoint_name: start.into(),
            startpoint_class: ObjectClass::Pin,
            endpoint_name: end.into(),
            endpoint_class: ObjectClass::Pin,
            startpoint_clock: Some("clk".into()),
            endpoint_clock: None,
            path_group: group.into(),
            slack,
        },
    }
}

fn session() -> PathDump {
    let ss = ScenarioDump {
        log: String::new(),
        paths: vec![
            dumped(DelayType::Max, "cpu_ss/a/CP", "cpu_ss/b/D", "clk", -0.3),
            dumped(DelayType::Max, "cpu_ss/a/CP", "u_top/c/D", "*clk*", -0.2),
            dumped(DelayType::Max, "u_top/x/CP", "cpu_ss/y/D", "**async_default**", -0.1),
        ],
    };
    let lv = ScenarioDump {
        log: String::new(),
        paths: vec![dumped(DelayType::Max, "cpu_ss/a/CP", "cpu_ss/b/D", "clk", -0.4)],
    };
    let ff = ScenarioDump {
        log: String::new(),
        paths: vec![dumped(DelayType::Min, "u_top/x/CP", "u_top/z/D", "clk", -0.05)],
    };
    PathDump::from_scenarios([
        ("func_ss".to_string(), ss),
        ("func_ss_lv".to_string(), lv),
        ("func_ff".to_string(), ff),
    ])
}

struct Emitted {
    tmp: TempDir,
    settings: Settings,
    scenes: SceneMap,
    tree: CategoryTree,
}

impl Emitted {
    fn out(&self) -> &Path {
        &self.settings.output_dir
    }
}

fn emit() -> Emitted {
    let tmp = TempDir::new().unwrap();
    let sink = DiagnosticSink::new();
    let mut settings = resolve_settings(load_config_from_str(CONFIG).unwrap(), &sink).unwrap();
    settings.output_dir = tmp.path().join("star_out");

    let source = session();
    let scenes = SceneMap::build(&settings, &source.scenarios(), &sink);
    let classifier = PathClassifier::new(HierarchyMap::from_config(&settings.hierarchy_map));
    let (index, _) = aggregate(&source, &scenes, &classifier, &settings.timing, &sink);

    prepare_output_dir(&settings.output_dir, &[]).unwrap();
    let tree = StatsReducer::new(&source, &settings.timing, &settings.output_dir, &sink)
        .reduce(index, &scenes.groups);
    write_indexes(&tree, &scenes, &settings.output_dir, settings.timing.verbose_reports()).unwrap();
    HandoffPayload::build(&settings, &scenes, &tree)
        .write(&settings.output_dir)
        .unwrap();

    Emitted {
        tmp,
        settings,
        scenes,
        tree,
    }
}

/// Applies the handoff's clock-group key stripping to a tree.
fn stripped(tree: &CategoryTree) -> CategoryTree {
    fn walk(node: &TreeNode, depth: usize) -> TreeNode {
        match node {
            TreeNode::Leaf(s) => TreeNode::Leaf(s.clone()),
            TreeNode::Branch(children) => TreeNode::Branch(
                children
                    .iter()
                    .map(|(k, child)| {
                        let key = if depth + 1 == 5 { strip_wildcards(k) } else { k.clone() };
                        (key, walk(child, depth + 1))
                    })
                    .collect(),
            ),
        }
    }
    CategoryTree {
        groups: tree
            .groups
            .iter()
            .map(|(k, n)| (k.clone(), walk(n, 0)))
            .collect(),
    }
}

#[test]
fn handoff_round_trip_reproduces_tree() {
    let run = emit();
    let payload = HandoffPayload::read(run.out()).unwrap();
    let back = tree_from_timing_info(&payload.timing_info).unwrap();
    assert_eq!(back, stripped(&run.tree));
    assert_ne!(back, run.tree);
}

#[test]
fn wildcard_stripping_is_lossy() {
    let run = emit();
    // "*clk*" and "clk" differ only in wildcards.
    let original = run
        .tree
        .get(&["func", "max", "hm:top", "cpu:top", "undef:clk"])
        .unwrap();
    let groups: Vec<_> = original.subdivisions().map(|(k, _)| k).collect();
    assert_eq!(groups, vec!["*clk*"]);

    let payload = HandoffPayload::read(run.out()).unwrap();
    let back = tree_from_timing_info(&payload.timing_info).unwrap();
    let node = back
        .get(&["func", "max", "hm:top", "cpu:top", "undef:clk", "clk"])
        .unwrap();
    assert_eq!(node.mode_stats("func").unwrap().stats.fep, 1);
    assert!(back
        .get(&["func", "max", "top:hm", "top:cpu", "undef:clk", "async_default"])
        .is_some());
}

#[test]
fn pvt_info_lists_backing_scenarios() {
    let run = emit();
    let payload = HandoffPayload::read(run.out()).unwrap();
    let func = payload.pvt_info["func"].as_map().unwrap()["func"]
        .as_map()
        .unwrap();
    assert_eq!(
        func["max"],
        HandoffValue::List(vec!["func_ss".into(), "func_ss_lv".into()])
    );
    assert_eq!(func["min"], HandoffValue::List(vec!["func_ff".into()]));
    let scan = payload.pvt_info["test"].as_map().unwrap()["scan"]
        .as_map()
        .unwrap();
    assert_eq!(scan["max"], HandoffValue::List(vec![]));
}

#[test]
fn misc_info_is_flat() {
    let run = emit();
    let payload = HandoffPayload::read(run.out()).unwrap();
    assert_eq!(payload.misc_info["design_name"].as_scalar(), Some("soc_top"));
    assert_eq!(payload.misc_info["build_tag"].as_scalar(), Some("r42"));
    assert_eq!(payload.misc_info["setup_nworst"].as_scalar(), Some("1"));
    assert!(payload
        .misc_info
        .values()
        .all(|v| !matches!(v, HandoffValue::Map(_))));
}

#[test]
fn scenarios_of_one_mode_are_merged() {
    let run = emit();
    let leaf = run
        .tree
        .get(&["func", "max", "within_hm", "cpu:cpu", "undef:clk", "clk"])
        .unwrap()
        .mode_stats("func")
        .unwrap()
        .clone();
    assert_eq!(leaf.stats.fep, 2);
    assert_eq!(leaf.stats.wns, Some(-0.4));
}

#[test]
fn index_and_report_files_written() {
    let run = emit();
    let out = run.out();
    for name in ["func_max.idx", "func_min.idx", "scan_max.idx", "scan_min.idx"] {
        assert!(out.join(name).is_file(), "missing {name}");
    }
    assert!(out.join(HANDOFF_DIR).join("timingInfo.yaml").is_file());

    let index = std::fs::read_to_string(out.join("func_max.idx")).unwrap();
    let link = index
        .lines()
        .filter_map(|l| l.split_whitespace().last())
        .find(|w| w.ends_with(".verbose.rpt"))
        .unwrap();
    assert!(out.join(link).is_file());
    assert!(run.tmp.path().join("star_out").join(link).is_file());
    assert_eq!(run.scenes.groups.len(), 2);
}
