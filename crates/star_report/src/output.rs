//! Output directory preparation.

use crate::error::EmitError;
use std::path::Path;

/// Removes any previous content of `dir` and recreates it empty.
///
/// `inputs` are the files and directories the run reads from (path dumps,
/// configuration). If `dir` already exists and is, or contains, any of them,
/// nothing is removed and [`EmitError::OverlapsInput`] is returned. Inputs
/// that do not exist are ignored.
pub fn prepare_output_dir(dir: &Path, inputs: &[&Path]) -> Result<(), EmitError> {
    if dir.exists() {
        let canonical = dir.canonicalize().map_err(|e| EmitError::io(dir, e))?;
        for input in inputs {
            let Ok(input) = input.canonicalize() else {
                continue;
            };
            if input.starts_with(&canonical) {
                return Err(EmitError::OverlapsInput {
                    dir: dir.to_path_buf(),
                    input,
                });
            }
        }
        std::fs::remove_dir_all(dir).map_err(|e| EmitError::io(dir, e))?;
    }
    std::fs::create_dir_all(dir).map_err(|e| EmitError::io(dir, e))
}
