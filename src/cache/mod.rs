//! On-disk cache for optimized images.
//!
//! Entries live under `<[build] cache>/images/<blake3 hex>`. The key covers
//! the source bytes and the encoder settings, so changing either misses.

use crate::utils::fs::write_atomic;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash `bytes` together with a settings tag.
    pub fn of(bytes: &[u8], settings: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(settings.as_bytes());
        hasher.update(&[0]);
        hasher.update(bytes);
        Self(*hasher.finalize().as_bytes())
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // first 16 hex chars
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// Image cache rooted at `<cache dir>/images`.
#[derive(Debug, Clone)]
pub struct ImageCache {
    dir: PathBuf,
}

impl ImageCache {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            dir: cache_dir.join("images"),
        }
    }

    fn entry(&self, key: ContentHash) -> PathBuf {
        self.dir.join(key.to_hex())
    }

    /// Cached bytes for `key`, if present.
    pub fn get(&self, key: ContentHash) -> Option<Vec<u8>> {
        fs::read(self.entry(key)).ok()
    }

    pub fn put(&self, key: ContentHash, bytes: &[u8]) -> io::Result<()> {
        write_atomic(&self.entry(key), bytes)
    }
}
