//! Generated class names.

use serde::{Deserialize, Serialize};

use crate::utils::hash::fingerprint;

/// How generated class names are formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierMode {
    /// `_<hash><n>`, used for minified builds.
    Short,
    /// `<file>_<export>__<hash><n>`, readable in devtools.
    Debug,
}

impl IdentifierMode {
    /// Explicit override, else `Short` when minifying, else `Debug`.
    pub fn select(explicit: Option<Self>, minify: bool) -> Self {
        match explicit {
            Some(mode) => mode,
            None if minify => Self::Short,
            None => Self::Debug,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Debug => "debug",
        }
    }
}

impl std::str::FromStr for IdentifierMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" => Ok(Self::Short),
            "debug" => Ok(Self::Debug),
            other => Err(format!("unknown identifier mode `{other}` (expected short or debug)")),
        }
    }
}

/// Per-file class name generator.
#[derive(Debug)]
pub(crate) struct ClassNamer {
    mode: IdentifierMode,
    file_hash: String,
    debug_file: String,
    count: usize,
}

impl ClassNamer {
    /// `root_relative` seeds the hash, so names are stable across machines.
    pub(crate) fn new(mode: IdentifierMode, root_relative: &str) -> Self {
        Self {
            mode,
            file_hash: fingerprint(root_relative, 6),
            debug_file: debug_file_name(root_relative),
            count: 0,
        }
    }

    /// Next class name for the style exported as `export_name`.
    pub(crate) fn next(&mut self, export_name: &str) -> String {
        let n = self.count;
        self.count += 1;
        match self.mode {
            IdentifierMode::Short => format!("_{}{}", self.file_hash, n),
            IdentifierMode::Debug if self.debug_file.is_empty() => {
                format!("{}__{}{}", export_name, self.file_hash, n)
            }
            IdentifierMode::Debug => {
                format!("{}_{}__{}{}", self.debug_file, export_name, self.file_hash, n)
            }
        }
    }
}

/// `src/button.css.ts` → `button`; sanitized to a CSS identifier fragment.
fn debug_file_name(root_relative: &str) -> String {
    let file = root_relative.rsplit('/').next().unwrap_or(root_relative);
    let stem = file.split(".css.").next().unwrap_or(file);
    stem.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_prefers_explicit() {
        assert_eq!(
            IdentifierMode::select(Some(IdentifierMode::Debug), true),
            IdentifierMode::Debug
        );
        assert_eq!(IdentifierMode::select(None, true), IdentifierMode::Short);
        assert_eq!(IdentifierMode::select(None, false), IdentifierMode::Debug);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("short".parse::<IdentifierMode>(), Ok(IdentifierMode::Short));
        assert!("pretty".parse::<IdentifierMode>().is_err());
    }

    #[test]
    fn test_debug_names() {
        let mut namer = ClassNamer::new(IdentifierMode::Debug, "src/button.css.ts");
        let hash = fingerprint("src/button.css.ts", 6);
        assert_eq!(namer.next("root"), format!("button_root__{hash}0"));
        assert_eq!(namer.next("label"), format!("button_label__{hash}1"));
    }

    #[test]
    fn test_short_names() {
        let mut namer = ClassNamer::new(IdentifierMode::Short, "src/button.css.ts");
        let hash = fingerprint("src/button.css.ts", 6);
        assert_eq!(namer.next("root"), format!("_{hash}0"));
    }

    #[test]
    fn test_debug_file_name() {
        assert_eq!(debug_file_name("src/button.css.ts"), "button");
        assert_eq!(debug_file_name("my app/nav-bar.css.tsx"), "nav-bar");
        assert_eq!(debug_file_name("a.b.css.ts"), "a_b");
    }

    #[test]
    fn test_serde_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: IdentifierMode,
        }
        let parsed: Wrapper = toml::from_str("mode = \"short\"").unwrap();
        assert_eq!(parsed.mode, IdentifierMode::Short);
    }
}
