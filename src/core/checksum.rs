// src/core/checksum.rs

use crate::constants::{DIGEST_TRUNCATE_LENGTH, HASH_BLOCK_SIZE};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChecksumError {
    #[error("could not read '{path}' for hashing: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The on-disk identity of a file at hashing time. A cached digest stays
/// valid only while all three fields still match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileIdentity {
    inode: u64,
    size: u64,
    mtime: SystemTime,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    digest: String,
    identity: FileIdentity,
}

/// Memoized content digests for work-unit checksums, keyed by canonical
/// (symlink-resolved) path.
///
/// Contents are streamed through BLAKE3 in fixed-size blocks and the digest
/// is truncated to the protocol's 160-bit width. The cache holds no internal
/// synchronization; concurrent callers need an external lock or per-thread
/// instances.
#[derive(Debug, Default)]
pub struct ContentHashCache {
    entries: HashMap<PathBuf, CacheEntry>,
}

impl ContentHashCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the hex digest of the file's current contents, recomputing
    /// only when the file's identity changed since the last call.
    ///
    /// # Errors
    /// `ChecksumError::Io` if the file cannot be opened or read; the cache
    /// is left untouched in that case.
    pub fn digest(&mut self, path: &Path) -> Result<String, ChecksumError> {
        let realpath = dunce::canonicalize(path).map_err(|source| ChecksumError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let identity = file_identity(&realpath)?;

        let stale = self
            .entries
            .get(&realpath)
            .is_some_and(|entry| entry.identity != identity);
        if stale {
            warn!(
                "File {} changed! Discarding cached digest",
                realpath.display()
            );
            self.entries.remove(&realpath);
        }

        if let Some(entry) = self.entries.get(&realpath) {
            return Ok(entry.digest.clone());
        }

        debug!("Computing digest for file {}", realpath.display());
        let digest = compute_digest(&realpath)?;
        self.entries.insert(
            realpath,
            CacheEntry {
                digest: digest.clone(),
                identity,
            },
        );
        Ok(digest)
    }

    /// Number of memoized entries; exposed for diagnostics and tests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn file_identity(path: &Path) -> Result<FileIdentity, ChecksumError> {
    let metadata = std::fs::metadata(path).map_err(|source| ChecksumError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mtime = metadata.modified().map_err(|source| ChecksumError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(FileIdentity {
        inode: inode_of(&metadata),
        size: metadata.len(),
        mtime,
    })
}

#[cfg(unix)]
fn inode_of(metadata: &std::fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.ino()
}

#[cfg(not(unix))]
fn inode_of(_metadata: &std::fs::Metadata) -> u64 {
    // No stable inode on this platform; size and mtime carry the check.
    0
}

fn compute_digest(path: &Path) -> Result<String, ChecksumError> {
    let io_err = |source| ChecksumError::Io {
        path: path.display().to_string(),
        source,
    };
    let mut file = File::open(path).map_err(io_err)?;
    let mut hasher = blake3::Hasher::new();
    let mut block = vec![0u8; HASH_BLOCK_SIZE];
    loop {
        let read = file.read(&mut block).map_err(io_err)?;
        if read == 0 {
            break;
        }
        hasher.update(&block[..read]);
    }
    let hash = hasher.finalize();
    Ok(hex::encode(&hash.as_bytes()[..DIGEST_TRUNCATE_LENGTH]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_digest_is_truncated_hex() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"hello world").unwrap();
        temp_file.flush().unwrap();

        let mut cache = ContentHashCache::new();
        let digest = cache.digest(temp_file.path()).unwrap();

        assert_eq!(digest.len(), DIGEST_TRUNCATE_LENGTH * 2);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_unchanged_file_hits_the_cache() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"relation data").unwrap();
        temp_file.flush().unwrap();

        let mut cache = ContentHashCache::new();
        let first = cache.digest(temp_file.path()).unwrap();
        let second = cache.digest(temp_file.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changed_content_recomputes() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"first contents").unwrap();
        temp_file.flush().unwrap();

        let mut cache = ContentHashCache::new();
        let first = cache.digest(temp_file.path()).unwrap();

        // Different length forces an identity mismatch even on filesystems
        // with coarse mtime resolution.
        temp_file.write_all(b" plus a second write").unwrap();
        temp_file.flush().unwrap();

        let second = cache.digest(temp_file.path()).unwrap();
        assert_ne!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_file_is_an_error_and_leaves_cache_alone() {
        let mut cache = ContentHashCache::new();
        let result = cache.digest(Path::new("no_such_file_for_digest.tmp"));
        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
