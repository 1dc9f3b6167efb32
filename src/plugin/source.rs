//! Source rewrite loader.

use std::path::Path;

use super::session::SessionHandle;
use crate::compiler::{ProcessOptions, ProcessedFile};
use crate::error::Result;
use crate::host::{FILE_NAMESPACE, Filter, LoadResult, Loader, PluginBuild};

pub(super) fn register(build: &mut PluginBuild<'_>, session: SessionHandle, output_css: bool) {
    build.on_load(Filter::any().namespace(FILE_NAMESPACE), move |args| {
        let session = session.clone();
        Box::pin(async move { load_source(&session, &args.path, output_css).await })
    });
}

/// Rewritten JS plus watch files, or `None` to let the host load the file.
pub async fn load_source(
    session: &SessionHandle,
    path: &str,
    output_css: bool,
) -> Result<Option<LoadResult>> {
    let processed = session
        .get()?
        .process_file(Path::new(path), ProcessOptions { output_css })
        .await?;

    let Some(ProcessedFile {
        source: Some(source),
        watch_files,
    }) = processed
    else {
        crate::debug!("build"; "pass through: {}", path);
        return Ok(None);
    };

    Ok(Some(
        LoadResult::new(source, Loader::Js).with_watch_files(watch_files.into_iter().collect()),
    ))
}
