//! CSS post-processors.
//!
//! A [`ProcessCss`] receives the compiler's raw CSS for one source file and
//! returns the text the bundler sees. Supported sources:
//! - [`from_fn`]: any async closure
//! - [`command`]: an external program reading stdin, writing stdout

mod command;

pub use command::command;

use std::future::Future;
use std::sync::Arc;

use crate::host::BoxFuture;

/// Caller-supplied asynchronous CSS transform.
pub type ProcessCss = Arc<dyn Fn(String) -> BoxFuture<'static, anyhow::Result<String>> + Send + Sync>;

/// Wrap an async closure as a [`ProcessCss`].
///
/// ```ignore
/// let upper = hooks::css::from_fn(|css| async move { Ok(css.to_uppercase()) });
/// ```
pub fn from_fn<F, Fut>(f: F) -> ProcessCss
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    Arc::new(move |css| -> BoxFuture<'static, anyhow::Result<String>> { Box::pin(f(css)) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_fn_uppercases() {
        let upper = from_fn(|css| async move { Ok(css.to_uppercase()) });
        assert_eq!(upper(".a{color:red}".into()).await.unwrap(), ".A{COLOR:RED}");
    }

    #[tokio::test]
    async fn test_from_fn_propagates_error() {
        let failing = from_fn(|_| async { Err(anyhow::anyhow!("postcss: unknown word")) });
        let err = failing(String::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "postcss: unknown word");
    }
}
