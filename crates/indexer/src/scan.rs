use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::handlers::{
    FileHandler, ImageHandler, IndexContext, IndexError, Indexed, MusicHandler, VideoHandler,
};
use crate::walk;

/// Extension-to-handler registry plus the scan entry point.
pub struct Indexer {
    handlers: HashMap<String, Arc<dyn FileHandler>>,
}

impl Indexer {
    /// Registry with the built-in video, image and music handlers.
    pub fn new() -> Self {
        let mut handlers: HashMap<String, Arc<dyn FileHandler>> = HashMap::new();

        let video: Arc<dyn FileHandler> = Arc::new(VideoHandler);
        for ext in ["avi", "m4v", "mkv", "mov", "mp4", "mpg", "mpeg", "ogm", "wmv"] {
            handlers.insert(ext.to_string(), Arc::clone(&video));
        }

        let image: Arc<dyn FileHandler> = Arc::new(ImageHandler);
        for ext in ["jpg", "jpeg", "png"] {
            handlers.insert(ext.to_string(), Arc::clone(&image));
        }

        let music: Arc<dyn FileHandler> = Arc::new(MusicHandler);
        for ext in ["mp3", "ogg"] {
            handlers.insert(ext.to_string(), Arc::clone(&music));
        }

        Self { handlers }
    }

    /// Extensions with a registered handler, sorted.
    pub fn supported_filetypes(&self) -> Vec<String> {
        let mut exts: Vec<String> = self.handlers.keys().cloned().collect();
        exts.sort();
        exts
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        self.handler_for(path).is_some()
    }

    /// Handler registered for the path's extension, matched
    /// case-insensitively.
    pub fn handler_for(&self, path: &Path) -> Option<&Arc<dyn FileHandler>> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        self.handlers.get(&ext)
    }

    /// Walk `root` and run every supported file through its handler.
    ///
    /// Per-file futures run concurrently and the scan joins on all of
    /// them; one file failing never aborts the others, it only shows up
    /// in that file's outcome.
    pub async fn scan(&self, ctx: &IndexContext, root: &Path) -> ScanReport {
        let files = walk::walk_media_dir(root);
        let files_found = files.len();

        let mut unsupported = 0usize;
        let mut dispatched = Vec::new();
        for path in files {
            match self.handler_for(&path) {
                Some(handler) => {
                    debug!(path = %path.display(), kind = %handler.kind(), "dispatching file");
                    dispatched.push((path, Arc::clone(handler)));
                }
                None => {
                    debug!(path = %path.display(), "no handler for extension");
                    unsupported += 1;
                }
            }
        }

        let outcomes = join_all(dispatched.into_iter().map(|(path, handler)| {
            let ctx = ctx.clone();
            async move {
                let result = handler.handle(&ctx, &path).await;
                if let Err(err) = &result {
                    warn!(
                        path = %path.display(),
                        kind = %err.kind(),
                        error = %err,
                        "indexing failed"
                    );
                }
                FileOutcome { path, result }
            }
        }))
        .await;

        let report = ScanReport {
            outcomes,
            unsupported,
        };
        info!(
            root = %root.display(),
            files_found,
            indexed = report.indexed(),
            skipped = report.skipped(),
            failed = report.failed(),
            unsupported = report.unsupported,
            "scan finished"
        );
        report
    }
}

impl Default for Indexer {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one dispatched file.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<Indexed, IndexError>,
}

/// Per-file outcomes plus the count of files nothing was registered for.
#[derive(Debug)]
pub struct ScanReport {
    pub outcomes: Vec<FileOutcome>,
    pub unsupported: usize,
}

impl ScanReport {
    /// Files that produced or refreshed a stored row.
    pub fn indexed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, Ok(Indexed::Episode(_)) | Ok(Indexed::Photo(_))))
            .count()
    }

    /// Files a handler recognized and intentionally left alone.
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, Ok(Indexed::Skipped(_))))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }
}
