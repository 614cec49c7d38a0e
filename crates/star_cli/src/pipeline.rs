//! Shared helpers for CLI commands: config discovery, settings resolution,
//! and diagnostic rendering.

use std::path::{Path, PathBuf};

use star_config::{load_config, resolve_settings, Settings, CONFIG_FILE_NAME};
use star_diagnostics::{DiagnosticRenderer, DiagnosticSink, TerminalRenderer};

use crate::GlobalArgs;

/// Walks up from `start` looking for the nearest directory containing `star.toml`.
///
/// Returns the path of the config file, or an error if none is found.
pub fn find_config(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE_NAME} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Returns the config path from `--config`, or searches upward from the
/// current directory.
pub fn resolve_config_path(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match global.config {
        Some(ref path) => Ok(PathBuf::from(path)),
        None => find_config(&std::env::current_dir()?),
    }
}

/// Loads, validates, and resolves the run settings.
///
/// Diagnostics produced while resolving (defaulted settings, environment
/// warnings) are left in `sink` for the caller to render.
pub fn load_settings(
    global: &GlobalArgs,
    sink: &DiagnosticSink,
) -> Result<Settings, Box<dyn std::error::Error>> {
    let path = resolve_config_path(global)?;
    if global.verbose {
        eprintln!("   Loading {}", path.display());
    }
    let config = load_config(&path)?;
    Ok(resolve_settings(config, sink)?)
}

/// Renders and drains the diagnostics collected so far to stderr.
///
/// Notes and help entries are shown only with `--verbose`; everything is
/// hidden with `--quiet` except errors. Returns the number rendered.
pub fn render_diagnostics(sink: &DiagnosticSink, global: &GlobalArgs) -> usize {
    let renderer = TerminalRenderer::new(global.color);
    let mut shown = 0;
    for diag in sink.take_all() {
        let visible = if global.quiet {
            diag.severity.is_error()
        } else {
            diag.severity.is_visible(global.verbose)
        };
        if visible {
            eprintln!("{}", renderer.render(&diag));
            shown += 1;
        }
    }
    shown
}
