//! Hook execution utilities.
//!
//! Provides environment variable building and piped command execution for
//! CSS post-processing hooks.

use std::path::Path;
use std::process::Stdio;

use rustc_hash::FxHashMap;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{Error, Result};

// ============================================================================
// Environment Variables
// ============================================================================

/// Build `$VANILLA_*` environment variables for hook execution
pub fn build_vanilla_vars(root: &Path, minify: bool) -> FxHashMap<String, String> {
    let mut vars = FxHashMap::default();
    vars.insert("VANILLA_ROOT".into(), root.display().to_string());
    vars.insert("VANILLA_MINIFY".into(), minify.to_string());
    vars
}

// ============================================================================
// Command Argument Resolution
// ============================================================================

/// Resolve `$VANILLA_*` variables in command arguments
///
/// Replaces occurrences of `$VANILLA_XXX` with actual values from the vars map
pub fn resolve_args(args: &[String], vars: &FxHashMap<String, String>) -> Vec<String> {
    args.iter()
        .map(|arg| {
            let mut result = arg.clone();
            for (key, value) in vars {
                let pattern = format!("${}", key);
                result = result.replace(&pattern, value);
            }
            result
        })
        .collect()
}

// ============================================================================
// Hook Execution
// ============================================================================

/// Run `command` with `input` on stdin and return its stdout.
///
/// A failed spawn or non-zero exit becomes `PostProcessFailure`; the
/// message carries the command's stderr when it wrote any.
pub async fn run_piped(
    command: &[String],
    cwd: &Path,
    vars: &FxHashMap<String, String>,
    input: String,
) -> Result<String> {
    let resolved = resolve_args(command, vars);
    let Some((program, args)) = resolved.split_first() else {
        return Err(Error::post_process("empty CSS command"));
    };
    let display = resolved.join(" ");

    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .envs(vars)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::post_process(format!("`{display}` failed to start: {e}")))?;

    // stdout must drain while stdin is still being fed
    let stdin = child.stdin.take();
    let feed = async {
        let Some(mut stdin) = stdin else {
            return;
        };
        // a processor may exit without reading everything; its status decides
        if let Err(e) = stdin.write_all(input.as_bytes()).await {
            crate::debug!("css"; "`{}` closed stdin early: {}", display, e);
        }
    };
    let ((), output) = tokio::join!(feed, child.wait_with_output());
    let output = output.map_err(|e| Error::post_process(format!("`{display}` failed: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let message = if stderr.is_empty() {
            format!("`{display}` exited with {}", output.status)
        } else {
            format!("`{display}` exited with {}:\n{stderr}", output.status)
        };
        return Err(Error::post_process(message));
    }

    String::from_utf8(output.stdout)
        .map_err(|_| Error::post_process(format!("`{display}` produced non-UTF-8 output")))
}

// ============================================================================
// Tests
// ============================================================================
