//! Content hashing using blake3.
//!
//! # Usage
//!
//! ```ignore
//! use crate::utils::hash;
//!
//! let h = hash::ContentHash::of("export const a = 1;");
//! let fp = hash::fingerprint("src/button.css.ts", 6); // -> "1a2b3c"
//! ```

use std::fs;
use std::io;
use std::path::Path;

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash in-memory bytes.
    #[inline]
    pub fn of<T: AsRef<[u8]> + ?Sized>(data: &T) -> Self {
        Self(*blake3::hash(data.as_ref()).as_bytes())
    }

    /// Hash a file's contents.
    pub fn of_file(path: &Path) -> io::Result<Self> {
        fs::read(path).map(|bytes| Self::of(&bytes))
    }

    /// Convert to hex string (for debugging/display).
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

/// First `len` hex characters of the blake3 hash of `value`.
#[inline]
pub fn fingerprint<T: AsRef<[u8]> + ?Sized>(value: &T, len: usize) -> String {
    let mut hex = ContentHash::of(value).to_hex();
    hex.truncate(len);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(ContentHash::of("a"), ContentHash::of("a"));
        assert_ne!(ContentHash::of("a"), ContentHash::of("b"));
    }

    #[test]
    fn test_fingerprint_length() {
        let fp = fingerprint("src/button.css.ts", 6);
        assert_eq!(fp.len(), 6);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp, fingerprint("src/button.css.ts", 6));
    }

    #[test]
    fn test_of_file_matches_of() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("a.css.ts");
        fs::write(&file, "export const a = 1;").unwrap();
        assert_eq!(
            ContentHash::of_file(&file).unwrap(),
            ContentHash::of("export const a = 1;")
        );
    }
}
