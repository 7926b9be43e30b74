//! TTL-bounded article cache: one JSON file per URL.
//!
//! File names are the SHA-256 of the article URL, so lookups never touch the
//! URL text on disk. Entries older than [`CACHE_TTL_SECS`] are never returned;
//! reading one deletes it. Every read-side failure is a miss, not an error the
//! caller has to handle.
//!
//! Writes go through a randomly suffixed temp file and a rename, so a process
//! killed mid-write leaves either the old entry or the new one. Concurrent
//! writers to the same key race; the last rename wins.

use crate::article::Article;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Maximum age of a usable entry, in seconds.
pub const CACHE_TTL_SECS: i64 = 60 * 60;

pub fn cache_ttl() -> Duration {
    Duration::seconds(CACHE_TTL_SECS)
}

const ENTRY_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CacheError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// On-disk shape of a cache file.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntry {
    pub cached_at: DateTime<Utc>,
    pub article: Article,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.cached_at > cache_ttl()
    }
}

#[derive(Debug, Clone)]
pub struct ArticleCache {
    dir: PathBuf,
}

impl ArticleCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing the entry for `url`.
    pub fn entry_path(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        let mut name = String::with_capacity(digest.len() * 2 + 5);
        for byte in digest {
            name.push_str(&format!("{byte:02x}"));
        }
        self.dir.join(name).with_extension(ENTRY_EXTENSION)
    }

    /// Fresh article for `url`, or `None` on any kind of miss.
    pub fn load(&self, url: &str) -> Option<Article> {
        self.load_at(url, Utc::now())
    }

    /// [`load`](Self::load) against an explicit clock.
    pub fn load_at(&self, url: &str, now: DateTime<Utc>) -> Option<Article> {
        let path = self.entry_path(url);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Cache read failed");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Ignoring corrupt cache entry");
                return None;
            }
        };

        if entry.is_expired(now) {
            if let Err(e) = fs::remove_file(&path) {
                tracing::debug!(path = %path.display(), error = %e, "Failed to remove expired entry");
            }
            return None;
        }

        Some(entry.article)
    }

    /// Stores `article` under its own URL, stamped now.
    pub fn save(&self, article: &Article) -> Result<(), CacheError> {
        self.save_at(article, Utc::now())
    }

    /// [`save`](Self::save) with an explicit timestamp.
    pub fn save_at(&self, article: &Article, cached_at: DateTime<Utc>) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;

        let mut article = article.clone();
        article.debug_artifact_path = None;
        let entry = CacheEntry { cached_at, article };
        let bytes = serde_json::to_vec(&entry)?;

        let path = self.entry_path(&entry.article.url);
        write_atomic(&path, &bytes)
    }

    /// Deletes expired and unreadable entries; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(dir = %self.dir.display(), error = %e, "Cache sweep skipped");
                }
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION)
            {
                continue;
            }

            let stale = match fs::read(&path)
                .ok()
                .and_then(|bytes| serde_json::from_slice::<CacheEntry>(&bytes).ok())
            {
                Some(entry) => entry.is_expired(now),
                None => true,
            };

            if stale {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        tracing::debug!(path = %path.display(), error = %e, "Failed to purge entry")
                    }
                }
            }
        }

        if removed > 0 {
            tracing::debug!(removed, "Purged cache entries");
        }
        removed
    }
}

/// Write-to-temp-then-rename with owner-only permissions.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    use std::time::{SystemTime, UNIX_EPOCH};
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{:016x}.{}", suffix, std::process::id()));

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let result = options
        .open(&temp_path)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&temp_path, path));

    result.map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        CacheError::io(path, e)
    })
}
