//! On-disk response cache keyed by request URL.
//!
//! Entries are write-once: a key is only ever written with the response for
//! its URL, so concurrent writers racing on one key produce identical
//! contents and either may win. There is no expiry; wiping the directory is
//! the way to refresh.

use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::warn;

pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    pub fn new(dir: PathBuf) -> Self {
        std::fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// Cache file path for a URL (SHA-256 hex of the URL).
    pub fn entry_path(&self, url: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        self.dir.join(format!("{}.xml", hex::encode(hasher.finalize())))
    }

    /// Read a cached response, `None` on a miss.
    pub async fn load(&self, url: &str) -> Result<Option<Vec<u8>>, std::io::Error> {
        let path = self.entry_path(url);
        match fs::read(&path).await {
            Ok(body) => Ok(Some(body)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Persist a response body. Failures are logged and swallowed: a dead
    /// cache degrades to refetching, it must not fail the lookup that
    /// already succeeded.
    pub async fn store(&self, url: &str, body: &[u8]) {
        let path = self.entry_path(url);
        if let Err(err) = fs::write(&path, body).await {
            warn!(path = %path.display(), error = %err, "cache write failed");
        }
    }
}
