//! `star run`: aggregate the path dumps of a run and emit every artifact.

use std::path::{Path, PathBuf};

use star_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use star_report::{prepare_output_dir, run_publisher, write_indexes, HandoffPayload};
use star_timing::{
    aggregate, BatchOutcome, BatchReport, HierarchyMap, PathClassifier, PathDump, SceneMap,
    StatsReducer, TimingSource,
};

use crate::pipeline::{load_settings, render_diagnostics, resolve_config_path};
use crate::{GlobalArgs, RunArgs};

/// Runs the `star run` command.
///
/// Steps: load and resolve the configuration, open the path dumps, map modes
/// to scenarios, aggregate every batch, clean the output directory (refused
/// when it holds the dumps or the config file), reduce
/// the aggregation into the stats tree while writing per-leaf reports, then
/// write the text indexes and the handoff payload and launch the publisher.
pub fn run(args: &RunArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let sink = DiagnosticSink::new();
    let settings = load_settings(global, &sink);
    render_diagnostics(&sink, global);
    let mut settings = settings?;
    if let Some(ref out) = args.out {
        settings.output_dir = PathBuf::from(out);
    }

    if !global.quiet {
        eprintln!(
            "   Opening path dumps in {} ({} {} {})",
            args.paths,
            settings.environment.vendor,
            settings.environment.tool,
            settings.environment.flow
        );
    }
    let source = PathDump::open(Path::new(&args.paths))?;
    let scenes = SceneMap::build(&settings, &source.scenarios(), &sink);
    render_diagnostics(&sink, global);

    let classifier = PathClassifier::new(HierarchyMap::from_config(&settings.hierarchy_map));
    if !global.quiet {
        eprintln!("   Querying {} mode group(s)", scenes.groups.len());
    }
    let (index, batches) = aggregate(&source, &scenes, &classifier, &settings.timing, &sink);
    if global.verbose {
        for batch in &batches {
            eprintln!("{}", batch_line(batch));
        }
    }
    if !global.quiet {
        eprintln!(
            "   Classified {} path(s) into {} bucket(s)",
            index.record_count(),
            index.bucket_count()
        );
    }
    render_diagnostics(&sink, global);

    let config_path = resolve_config_path(global)?;
    let inputs = [Path::new(&args.paths), config_path.as_path()];
    if let Err(e) = prepare_output_dir(&settings.output_dir, &inputs) {
        sink.emit(
            Diagnostic::error(DiagnosticCode::new(Category::Error, 1), e.to_string())
                .with_help("pass --out with a directory that holds no run inputs"),
        );
        render_diagnostics(&sink, global);
        return Err(e.into());
    }
    if !global.quiet {
        eprintln!("   Reducing into {}", settings.output_dir.display());
    }
    let tree = StatsReducer::new(&source, &settings.timing, &settings.output_dir, &sink)
        .reduce(index, &scenes.groups);
    render_diagnostics(&sink, global);

    let indexes = write_indexes(
        &tree,
        &scenes,
        &settings.output_dir,
        settings.timing.verbose_reports(),
    )?;
    let handoff = HandoffPayload::build(&settings, &scenes, &tree).write(&settings.output_dir)?;
    if !global.quiet {
        eprintln!("   Wrote {} index file(s)", indexes.len());
        eprintln!("   Wrote handoff to {}", handoff.display());
    }

    match settings.misc.publisher.as_deref() {
        Some(command) if !args.no_publish && !command.trim().is_empty() => {
            if !global.quiet {
                eprintln!("   Publishing with `{command}`");
            }
            if let Err(e) = run_publisher(command, &settings.output_dir) {
                sink.emit(
                    Diagnostic::error(DiagnosticCode::new(Category::Error, 2), e.to_string())
                        .with_note("the index and handoff files were written")
                        .with_help("rerun the publisher by hand or pass --no-publish"),
                );
                render_diagnostics(&sink, global);
                return Err(e.into());
            }
        }
        _ => {}
    }

    if !global.quiet {
        eprintln!(
            "    Finished {} ({} query warning(s), {} scenario warning(s))",
            settings.output_dir.display(),
            sink.problem_count(Category::Query),
            sink.problem_count(Category::Scenario)
        );
    }
    Ok(0)
}

/// One progress line for a batch in verbose mode.
fn batch_line(batch: &BatchReport) -> String {
    let status = match &batch.outcome {
        BatchOutcome::Queried(n) => format!("{n} path(s)"),
        BatchOutcome::Failed(reason) => format!("FAILED: {reason}"),
        BatchOutcome::NoScenario => "no scenario".to_string(),
    };
    format!(
        "     {}/{} {}: {status}",
        batch.mode_group, batch.mode, batch.delay
    )
}
