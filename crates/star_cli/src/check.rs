//! `star check`: load and validate the configuration only.

use star_diagnostics::DiagnosticSink;

use crate::pipeline::{load_settings, render_diagnostics};
use crate::GlobalArgs;

/// Runs the `star check` command.
///
/// Returns exit code 0 when the configuration resolves without errors.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let sink = DiagnosticSink::new();
    let settings = load_settings(global, &sink);
    let warnings = sink.warning_count();
    render_diagnostics(&sink, global);
    let settings = settings?;

    if !global.quiet {
        let modes: usize = settings.mode_groups.values().map(Vec::len).sum();
        eprintln!(
            "   Checked {} mode group(s), {} mode(s), {} hierarchy block(s)",
            settings.mode_groups.len(),
            modes,
            settings.hierarchy_map.len()
        );
        eprintln!("   Result: 0 error(s), {warnings} warning(s)");
    }
    Ok(0)
}
