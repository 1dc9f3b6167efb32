//! External command CSS processor.
//!
//! Command line: `command...` with the CSS on stdin; stdout replaces it.
//! `$VANILLA_ROOT` and `$VANILLA_MINIFY` are expanded in arguments and
//! exported to the child environment.

use std::path::PathBuf;
use std::sync::Arc;

use super::ProcessCss;
use crate::host::BoxFuture;

/// Build a [`ProcessCss`] that pipes CSS through `command` run in `cwd`.
pub fn command(command: Vec<String>, cwd: PathBuf, minify: bool) -> ProcessCss {
    let vars = Arc::new(crate::hooks::build_vanilla_vars(&cwd, minify));
    let command = Arc::new(command);
    let cwd = Arc::new(cwd);

    Arc::new(move |css| -> BoxFuture<'static, anyhow::Result<String>> {
        let vars = vars.clone();
        let command = command.clone();
        let cwd = cwd.clone();
        Box::pin(async move {
            crate::debug!("css"; "piping {} bytes through `{}`", css.len(), command.join(" "));
            let out = crate::hooks::run_piped(&command, &cwd, &vars, css).await?;
            Ok(out)
        })
    })
}
