use std::path::Path;
use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{debug, info};

use marquee_catalog::client::CatalogClient;
use marquee_catalog::CatalogError;
use marquee_core::error::FailureKind;
use marquee_core::types::MediaKind;
use marquee_db::repo::episodes::{self, EpisodeRow, EpisodeUpsert};
use marquee_db::repo::photos::{self, PhotoRow};
use marquee_db::repo::{seasons, shows};

use crate::parser;

/// Shared resources handed to every handler call. Handlers keep no state
/// of their own.
#[derive(Clone)]
pub struct IndexContext {
    pub db: SqlitePool,
    pub catalog: Arc<CatalogClient>,
}

/// What indexing one file produced.
#[derive(Debug)]
pub enum Indexed {
    Episode(EpisodeRow),
    Photo(PhotoRow),
    Skipped(Skip),
}

/// Recognized files that finish without touching the catalog or the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// Video without series markers. Movie resolution is an extension
    /// point that currently completes as a no-op.
    Movie,
    /// Tag extraction lives outside this pipeline.
    Music,
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error(transparent)]
    Resolution(#[from] CatalogError),
    #[error("store error: {0}")]
    Db(#[from] sqlx::Error),
}

impl IndexError {
    /// Failure class reported in the scan outcome for this file.
    pub fn kind(&self) -> FailureKind {
        match self {
            IndexError::Resolution(err) => err.kind(),
            IndexError::Db(_) => FailureKind::ResolutionFailed,
        }
    }
}

/// One media class's indexing strategy. `handle` resolves or fails exactly
/// once per file.
#[async_trait::async_trait]
pub trait FileHandler: Send + Sync {
    /// Media class this handler covers.
    fn kind(&self) -> MediaKind;

    async fn handle(&self, ctx: &IndexContext, path: &Path) -> Result<Indexed, IndexError>;
}

/// Resolves series, season and episode for a video file, persisting each
/// step as soon as it completes. Rows written before a later step fails
/// are kept, so a rescan picks up where resolution stopped.
pub struct VideoHandler;

#[async_trait::async_trait]
impl FileHandler for VideoHandler {
    fn kind(&self) -> MediaKind {
        MediaKind::Video
    }

    async fn handle(&self, ctx: &IndexContext, path: &Path) -> Result<Indexed, IndexError> {
        let path_str = path.to_string_lossy();
        let info = parser::parse_path(&path_str);

        if info.season == 0 {
            debug!(path = %path.display(), title = %info.title, "no series markers, treating as movie");
            return Ok(Indexed::Skipped(Skip::Movie));
        }

        // A show already stored under this title skips the remote search.
        // Titles collate case-insensitively in the store.
        let show = match shows::find_by_title(&ctx.db, &info.title).await? {
            Some(row) => row,
            None => {
                let series = ctx.catalog.get_series(&info.title).await?;
                shows::upsert_show(
                    &ctx.db,
                    series.id,
                    series.title.as_deref().unwrap_or(&info.title),
                    series.description.as_deref(),
                    series.genre.as_deref(),
                    series.rating,
                    series.cover.as_deref(),
                    series.backdrop.as_deref(),
                )
                .await?
            }
        };

        let season = ctx
            .catalog
            .get_season(show.series_id, info.season as i64)
            .await?;
        let season_row = seasons::upsert_season(
            &ctx.db,
            &show.id,
            season.number,
            season.poster().map(|b| b.path.as_str()),
        )
        .await?;

        let episode = ctx
            .catalog
            .get_episode(show.series_id, info.season as i64, info.episode as i64)
            .await?;
        let row = episodes::upsert_episode(
            &ctx.db,
            &season_row.id,
            &EpisodeUpsert {
                episode_number: episode.episode_number,
                path: &path_str,
                title: episode.title.as_deref(),
                overview: episode.overview.as_deref(),
                rating: episode.rating,
                writer: episode.writer.as_deref(),
                director: episode.director.as_deref(),
                guest_stars: episode.guest_stars.as_deref(),
                image: episode.image.as_deref(),
                lastupdated: episode.lastupdated,
            },
        )
        .await?;

        info!(
            path = %path.display(),
            show = %show.title,
            season = info.season,
            episode = info.episode,
            "indexed episode"
        );
        Ok(Indexed::Episode(row))
    }
}

/// Photos get a row keyed by path and nothing else.
pub struct ImageHandler;

#[async_trait::async_trait]
impl FileHandler for ImageHandler {
    fn kind(&self) -> MediaKind {
        MediaKind::Image
    }

    async fn handle(&self, ctx: &IndexContext, path: &Path) -> Result<Indexed, IndexError> {
        // TODO: pull capture time and camera tags out of EXIF once a
        // reader is wired in
        let row = photos::upsert_photo(&ctx.db, &path.to_string_lossy()).await?;
        Ok(Indexed::Photo(row))
    }
}

/// Music is recognized so it does not count as unsupported; tag reading
/// lives in a separate collaborator.
pub struct MusicHandler;

#[async_trait::async_trait]
impl FileHandler for MusicHandler {
    fn kind(&self) -> MediaKind {
        MediaKind::Music
    }

    async fn handle(&self, _ctx: &IndexContext, _path: &Path) -> Result<Indexed, IndexError> {
        Ok(Indexed::Skipped(Skip::Music))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kinds_follow_the_inner_error() {
        let not_found = IndexError::Resolution(CatalogError::NotFound);
        assert_eq!(not_found.kind(), FailureKind::NotFound);

        let db = IndexError::Db(sqlx::Error::RowNotFound);
        assert_eq!(db.kind(), FailureKind::ResolutionFailed);
    }
}
