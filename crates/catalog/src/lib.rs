pub mod cache;
pub mod client;
pub mod transport;
pub mod xml;

use marquee_core::error::FailureKind;
use thiserror::Error;

use crate::transport::TransportError;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("not found")]
    NotFound,
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// Failure class for outcome reporting. By the time a transport error
    /// escapes the client its retry budget is already spent, so it reports
    /// as a terminal resolution failure rather than a transient one.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound => FailureKind::NotFound,
            Self::Malformed(_) => FailureKind::MalformedResponse,
            Self::Transport(_) | Self::Io(_) => FailureKind::ResolutionFailed,
        }
    }
}

/// Series-level fields consumed by the indexing pipeline.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SeriesRecord {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub rating: Option<f64>,
    pub cover: Option<String>,
    pub backdrop: Option<String>,
}

/// A season is not a remote object of its own: it is the series id, the
/// season number, and the banners the catalog lists for that season.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SeasonRecord {
    pub series_id: i64,
    pub number: i64,
    pub banners: Vec<Banner>,
}

impl SeasonRecord {
    /// First banner for this season in catalog response order.
    pub fn poster(&self) -> Option<&Banner> {
        self.banners.first()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EpisodeRecord {
    pub id: i64,
    pub season_number: i64,
    pub episode_number: i64,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub rating: Option<f64>,
    pub writer: Option<String>,
    pub director: Option<String>,
    pub guest_stars: Option<String>,
    pub image: Option<String>,
    pub first_aired: Option<String>,
    pub lastupdated: i64,
}

/// One entry from the catalog's banner listing. A banner without a season
/// number is a series-level banner.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Banner {
    pub id: i64,
    pub path: String,
    pub kind: Option<String>,
    pub season: Option<i64>,
}

impl Banner {
    /// First banner of the given type in response order; no secondary sort.
    pub fn first_of_kind<'a>(banners: &'a [Banner], kind: &str) -> Option<&'a Banner> {
        banners.iter().find(|b| b.kind.as_deref() == Some(kind))
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MovieRecord {
    pub id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub released: Option<String>,
    pub rating: Option<f64>,
    pub cover: Option<String>,
    pub backdrop: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LanguageRecord {
    pub id: i64,
    pub name: String,
    pub abbreviation: String,
}
