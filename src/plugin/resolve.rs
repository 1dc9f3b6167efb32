//! Virtual CSS resolver and the virtual path grammar.
//!
//! ```text
//! <root-relative source path>.vanilla.css[?query]
//! ```
//!
//! The marker must occur exactly once, at the end of the path part.

use std::sync::LazyLock;

use regex::Regex;

use super::{CSS_MARKER, VIRTUAL_NAMESPACE};
use crate::error::{Error, Result};
use crate::host::{Filter, PluginBuild, ResolveResult};

static MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.vanilla\.css").unwrap());

/// Redirect every marked import into the virtual namespace, untouched.
pub(super) fn register(build: &mut PluginBuild<'_>) {
    build.on_resolve(Filter::new(MARKER.clone()), |args| {
        Box::pin(async move {
            crate::debug!("css"; "virtual: {}", args.path);
            Ok(Some(ResolveResult::new(args.path, VIRTUAL_NAMESPACE)))
        })
    });
}

/// A parsed virtual CSS path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualCssPath<'a> {
    root_relative: &'a str,
    query: Option<&'a str>,
}

impl<'a> VirtualCssPath<'a> {
    /// Split a virtual path, rejecting ambiguous or malformed ones.
    pub fn parse(path: &'a str) -> Result<Self> {
        let invalid = || Error::InvalidVirtualPath(path.to_string());

        if path.matches(CSS_MARKER).count() != 1 {
            return Err(invalid());
        }
        let (body, query) = match path.split_once('?') {
            Some((body, query)) => (body, Some(query)),
            None => (path, None),
        };
        let root_relative = body.strip_suffix(CSS_MARKER).ok_or_else(invalid)?;
        if root_relative.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            root_relative,
            query,
        })
    }

    /// Path of the source file, relative to the session root.
    pub fn root_relative(&self) -> &'a str {
        self.root_relative
    }

    pub fn query(&self) -> Option<&'a str> {
        self.query
    }

    /// Virtual import path for a root-relative source path.
    pub fn format(root_relative: &str) -> String {
        format!("{root_relative}{CSS_MARKER}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let path = VirtualCssPath::parse("src/button.css.ts.vanilla.css").unwrap();
        assert_eq!(path.root_relative(), "src/button.css.ts");
        assert_eq!(path.query(), None);
    }

    #[test]
    fn test_parse_with_query() {
        let path = VirtualCssPath::parse("src/button.css.ts.vanilla.css?source=abc").unwrap();
        assert_eq!(path.root_relative(), "src/button.css.ts");
        assert_eq!(path.query(), Some("source=abc"));
    }

    #[test]
    fn test_format_then_parse_recovers_path() {
        let formatted = VirtualCssPath::format("styles.css.ts");
        assert_eq!(formatted, "styles.css.ts.vanilla.css");
        assert_eq!(
            VirtualCssPath::parse(&formatted).unwrap().root_relative(),
            "styles.css.ts"
        );
    }

    #[test]
    fn test_rejects_duplicate_marker() {
        let err = VirtualCssPath::parse("a.vanilla.css/b.css.ts.vanilla.css").unwrap_err();
        assert!(matches!(err, Error::InvalidVirtualPath(_)));
    }

    #[test]
    fn test_rejects_marker_not_at_end() {
        assert!(VirtualCssPath::parse("src/x.vanilla.css.ts").is_err());
        assert!(VirtualCssPath::parse(".vanilla.css").is_err());
        assert!(VirtualCssPath::parse("src/x.css.ts").is_err());
    }
}
