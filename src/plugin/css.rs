//! CSS content loader.

use super::VIRTUAL_NAMESPACE;
use super::resolve::VirtualCssPath;
use super::session::SessionHandle;
use crate::compiler::CssResult;
use crate::error::{Error, Result};
use crate::hooks::css::ProcessCss;
use crate::host::{Filter, LoadResult, Loader, PluginBuild};

pub(super) fn register(
    build: &mut PluginBuild<'_>,
    session: SessionHandle,
    process_css: Option<ProcessCss>,
) {
    build.on_load(Filter::any().namespace(VIRTUAL_NAMESPACE), move |args| {
        let session = session.clone();
        let process_css = process_css.clone();
        Box::pin(async move { load_css(&session, process_css.as_ref(), &args.path).await.map(Some) })
    });
}

/// CSS for a virtual path, post-processed, resolving beside its source.
pub async fn load_css(
    session: &SessionHandle,
    process_css: Option<&ProcessCss>,
    path: &str,
) -> Result<LoadResult> {
    let target = VirtualCssPath::parse(path)?;
    let CssResult {
        css,
        source_file_path,
    } = session.get()?.get_css_for_file(target.root_relative())?;

    let css = match process_css {
        Some(process) => process(css).await.map_err(post_process_error)?,
        None => css,
    };

    crate::debug!("css"; "loaded {} ({} bytes)", target.root_relative(), css.len());
    let mut result = LoadResult::new(css, Loader::Css);
    if let Some(dir) = source_file_path.parent() {
        result = result.with_resolve_dir(dir);
    }
    Ok(result)
}

/// Keep typed errors from our own processors, wrap everything else as is.
fn post_process_error(err: anyhow::Error) -> Error {
    match err.downcast::<Error>() {
        Ok(typed) => typed,
        Err(other) => Error::PostProcessFailure(other),
    }
}
