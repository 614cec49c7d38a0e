//! Launching the external publisher.

use crate::error::EmitError;
use std::path::Path;
use std::process::Command;

/// Runs `command` with `output_dir` as its only argument and waits for it.
///
/// The command line is split on whitespace; the first word is the program.
pub fn run_publisher(command: &str, output_dir: &Path) -> Result<(), EmitError> {
    let mut words = command.split_whitespace();
    let Some(program) = words.next() else {
        return Err(EmitError::Publish {
            command: command.to_string(),
            reason: "empty command".to_string(),
        });
    };
    let status = Command::new(program)
        .args(words)
        .arg(output_dir)
        .status()
        .map_err(|e| EmitError::Publish {
            command: command.to_string(),
            reason: e.to_string(),
        })?;
    if status.success() {
        Ok(())
    } else {
        Err(EmitError::Publish {
            command: command.to_string(),
            reason: status.to_string(),
        })
    }
}
