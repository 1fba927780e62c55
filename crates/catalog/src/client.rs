//! Catalog client: cached, retrying lookups against a hierarchical XML
//! catalog (series → season → episode, plus movie search, banners and
//! languages).

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cache::ResponseCache;
use crate::transport::{HttpTransport, Transport, TransportError};
use crate::xml::{child_field_maps, FieldMap};
use crate::{
    Banner, CatalogError, EpisodeRecord, LanguageRecord, MovieRecord, SeasonRecord, SeriesRecord,
};

pub const DEFAULT_BASE_URL: &str = "http://www.thetvdb.com";
pub const DEFAULT_RETRY_LIMIT: u32 = 3;

/// Client configuration. Directory locations are supplied by the caller,
/// never computed here.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub api_key: String,
    pub language: String,
    pub cache_dir: PathBuf,
    /// Maximum number of re-issues after a transient failure.
    pub retry_limit: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            language: "en".to_string(),
            cache_dir: PathBuf::new(),
            retry_limit: DEFAULT_RETRY_LIMIT,
        }
    }
}

pub struct CatalogClient {
    config: CatalogConfig,
    cache: ResponseCache,
    transport: Box<dyn Transport>,
}

impl CatalogClient {
    pub fn new(config: CatalogConfig) -> Self {
        Self::with_transport(config, Box::new(HttpTransport::default()))
    }

    /// Build a client over a custom transport. Tests script failures through
    /// this seam.
    pub fn with_transport(config: CatalogConfig, transport: Box<dyn Transport>) -> Self {
        let cache = ResponseCache::new(config.cache_dir.clone());
        Self {
            config,
            cache,
            transport,
        }
    }

    /// Resolve a series by name. The search response yields candidate
    /// records; the first candidate's id is then resolved through
    /// [`get_series_by_id`](Self::get_series_by_id), so the two stages cache
    /// independently.
    pub async fn get_series(&self, title: &str) -> Result<SeriesRecord, CatalogError> {
        let url = format!(
            "{}/api/GetSeries.php?seriesname={}",
            self.config.base_url,
            title.replace(' ', "+")
        );
        let body = self.request(&url).await?;
        let records = child_field_maps(&body)?;

        let Some((_, fields)) = records.first() else {
            return Err(CatalogError::NotFound);
        };
        let id = fields
            .int("id")
            .ok_or_else(|| CatalogError::Malformed("search record missing id".to_string()))?;

        self.get_series_by_id(id).await
    }

    pub async fn get_series_by_id(&self, series_id: i64) -> Result<SeriesRecord, CatalogError> {
        let url = format!(
            "{}/series/{}/{}.xml",
            self.api_url(),
            series_id,
            self.config.language
        );
        let body = self.request(&url).await?;
        let records = child_field_maps(&body)?;
        let fields = find_record(&records, "series").ok_or(CatalogError::NotFound)?;
        parse_series_record(fields)
    }

    /// Full banner listing for a series. Records without a season number are
    /// series-level banners.
    pub async fn get_banners(&self, series_id: i64) -> Result<Vec<Banner>, CatalogError> {
        let url = format!("{}/series/{}/banners.xml", self.api_url(), series_id);
        let body = self.request(&url).await?;
        let records = child_field_maps(&body)?;
        Ok(records
            .iter()
            .filter_map(|(_, fields)| parse_banner(fields))
            .collect())
    }

    /// A season's banner view. Nothing else is fetched here: episodes stay
    /// unresolved until asked for explicitly.
    pub async fn get_season(
        &self,
        series_id: i64,
        season_number: i64,
    ) -> Result<SeasonRecord, CatalogError> {
        let banners = self.get_banners(series_id).await?;
        Ok(SeasonRecord {
            series_id,
            number: season_number,
            banners: banners
                .into_iter()
                .filter(|b| b.season == Some(season_number))
                .collect(),
        })
    }

    pub async fn get_episode(
        &self,
        series_id: i64,
        season_number: i64,
        episode_number: i64,
    ) -> Result<EpisodeRecord, CatalogError> {
        let url = format!(
            "{}/series/{}/default/{}/{}/{}.xml",
            self.api_url(),
            series_id,
            season_number,
            episode_number,
            self.config.language
        );
        let body = self.request(&url).await?;
        let records = child_field_maps(&body)?;
        let fields = find_record(&records, "episode").ok_or(CatalogError::NotFound)?;
        parse_episode_record(fields)
    }

    /// Movie search. The match is the first result whose name equals the
    /// query case-insensitively; anything looser is not a match.
    pub async fn get_movie(&self, title: &str) -> Result<MovieRecord, CatalogError> {
        let url = format!(
            "{}/api/GetMovie.php?moviename={}",
            self.config.base_url,
            title.replace(' ', "+")
        );
        let body = self.request(&url).await?;
        let records = child_field_maps(&body)?;

        let fields = records
            .iter()
            .map(|(_, fields)| fields)
            .find(|f| {
                f.text("name")
                    .is_some_and(|name| name.eq_ignore_ascii_case(title))
            })
            .ok_or(CatalogError::NotFound)?;
        parse_movie_record(fields)
    }

    /// Languages the catalog can serve.
    pub async fn get_languages(&self) -> Result<Vec<LanguageRecord>, CatalogError> {
        let url = format!("{}/languages.xml", self.api_url());
        let body = self.request(&url).await?;
        let records = child_field_maps(&body)?;
        Ok(records
            .iter()
            .filter_map(|(_, fields)| parse_language(fields))
            .collect())
    }

    /// Fetch a banner image into `destination`. Same retry discipline as API
    /// calls, but image bytes skip the response cache.
    pub async fn download_banner(
        &self,
        banner: &Banner,
        destination: &Path,
    ) -> Result<(), CatalogError> {
        let url = format!("{}/banners/{}", self.config.base_url, banner.path);
        let body = self.fetch_with_retry(&url).await?;
        tokio::fs::write(destination, &body).await?;
        Ok(())
    }

    fn api_url(&self) -> String {
        format!("{}/api/{}", self.config.base_url, self.config.api_key)
    }

    /// Read-through cache in front of the transport. The raw body is cached
    /// before any parsing, so a hit never touches the network again.
    async fn request(&self, url: &str) -> Result<Vec<u8>, CatalogError> {
        if let Some(body) = self.cache.load(url).await? {
            debug!(url = %url, "cache hit");
            return Ok(body);
        }

        let body = self.fetch_with_retry(url).await?;
        self.cache.store(url, &body).await;
        Ok(body)
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<Vec<u8>, CatalogError> {
        let mut attempt = 0u32;
        loop {
            debug!(url = %url, attempt, "catalog request");
            match self.transport.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_transient() && attempt < self.config.retry_limit => {
                    debug!(url = %url, attempt, error = %err, "transient failure, retrying");
                    attempt += 1;
                }
                Err(TransportError::Status(404)) => return Err(CatalogError::NotFound),
                Err(err) => return Err(CatalogError::Transport(err)),
            }
        }
    }
}

fn find_record<'a>(records: &'a [(String, FieldMap)], tag: &str) -> Option<&'a FieldMap> {
    records.iter().find(|(t, _)| t == tag).map(|(_, f)| f)
}

fn parse_series_record(fields: &FieldMap) -> Result<SeriesRecord, CatalogError> {
    let id = fields
        .int("id")
        .ok_or_else(|| CatalogError::Malformed("series record missing id".to_string()))?;

    Ok(SeriesRecord {
        id,
        title: fields.string("seriesname"),
        description: fields.string("overview"),
        genre: fields.string("genre"),
        rating: fields.float("rating"),
        cover: fields.string("poster"),
        backdrop: fields.string("fanart"),
    })
}

fn parse_episode_record(fields: &FieldMap) -> Result<EpisodeRecord, CatalogError> {
    let id = fields
        .int("id")
        .ok_or_else(|| CatalogError::Malformed("episode record missing id".to_string()))?;

    Ok(EpisodeRecord {
        id,
        season_number: fields.int("seasonnumber").unwrap_or(0),
        episode_number: fields.int("episodenumber").unwrap_or(0),
        title: fields.string("episodename"),
        overview: fields.string("overview"),
        rating: fields.float("rating"),
        writer: fields.string("writer"),
        director: fields.string("director"),
        guest_stars: fields.string("gueststars"),
        image: fields.string("filename"),
        first_aired: fields.string("firstaired"),
        lastupdated: fields.int("lastupdated").unwrap_or(0),
    })
}

fn parse_banner(fields: &FieldMap) -> Option<Banner> {
    Some(Banner {
        id: fields.int("id").unwrap_or(0),
        path: fields.string("bannerpath")?,
        kind: fields.string("bannertype"),
        season: fields.int("season"),
    })
}

fn parse_movie_record(fields: &FieldMap) -> Result<MovieRecord, CatalogError> {
    let id = fields
        .int("id")
        .ok_or_else(|| CatalogError::Malformed("movie record missing id".to_string()))?;

    Ok(MovieRecord {
        id,
        title: fields.string("name").unwrap_or_default(),
        overview: fields.string("overview"),
        released: fields.string("released"),
        rating: fields.float("rating"),
        cover: fields.string("poster"),
        backdrop: fields.string("fanart"),
    })
}

fn parse_language(fields: &FieldMap) -> Option<LanguageRecord> {
    Some(LanguageRecord {
        id: fields.int("id").unwrap_or(0),
        name: fields.string("name")?,
        abbreviation: fields.string("abbreviation")?,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use marquee_core::error::FailureKind;

    use super::*;

    const SEARCH_XML: &[u8] = br#"<Data>
  <Series>
    <id>73871</id>
    <SeriesName>Futurama</SeriesName>
  </Series>
  <Series>
    <id>99999</id>
    <SeriesName>Futurama: The Lost Adventures</SeriesName>
  </Series>
</Data>"#;

    const SERIES_XML: &[u8] = br#"<Data>
  <Series>
    <id>73871</id>
    <SeriesName>Futurama</SeriesName>
    <Overview>Fry wakes up in the year 3000.</Overview>
    <Genre>|Animation|Comedy|</Genre>
    <Rating>8.9</Rating>
    <poster>posters/73871-1.jpg</poster>
    <fanart>fanart/73871-1.jpg</fanart>
  </Series>
</Data>"#;

    const EPISODE_XML: &[u8] = br#"<Data>
  <Episode>
    <id>55452</id>
    <SeasonNumber>2</SeasonNumber>
    <EpisodeNumber>5</EpisodeNumber>
    <EpisodeName>I Second That Emotion</EpisodeName>
    <Overview>Bender meets the sewer mutants.</Overview>
    <Rating>8.1</Rating>
    <Writer>Patric M. Verrone</Writer>
    <Director>Mark Ervin</Director>
    <GuestStars>|Nancy Cartwright|</GuestStars>
    <filename>episodes/73871/55452.jpg</filename>
    <FirstAired>2000-04-02</FirstAired>
    <lastupdated>1203923090</lastupdated>
  </Episode>
</Data>"#;

    const BANNERS_XML: &[u8] = br#"<Data>
  <Banner>
    <id>1</id>
    <BannerPath>graphical/73871-g.jpg</BannerPath>
    <BannerType>series</BannerType>
  </Banner>
  <Banner>
    <id>2</id>
    <BannerPath>seasons/73871-2-1.jpg</BannerPath>
    <BannerType>season</BannerType>
    <Season>2</Season>
  </Banner>
  <Banner>
    <id>3</id>
    <BannerPath>seasons/73871-2-2.jpg</BannerPath>
    <BannerType>season</BannerType>
    <Season>2</Season>
  </Banner>
  <Banner>
    <id>4</id>
    <BannerPath>seasons/73871-3-1.jpg</BannerPath>
    <BannerType>season</BannerType>
    <Season>3</Season>
  </Banner>
</Data>"#;

    const MOVIES_XML: &[u8] = br#"<Data>
  <Movie>
    <id>550</id>
    <name>Fight Club</name>
    <released>1999-10-15</released>
    <Rating>8.8</Rating>
  </Movie>
  <Movie>
    <id>551</id>
    <name>Fight Club 2</name>
  </Movie>
</Data>"#;

    const LANGUAGES_XML: &[u8] = br#"<Data>
  <Language>
    <name>English</name>
    <abbreviation>en</abbreviation>
    <id>7</id>
  </Language>
  <Language>
    <name>Dansk</name>
    <abbreviation>da</abbreviation>
    <id>10</id>
  </Language>
</Data>"#;

    #[derive(Clone)]
    struct FakeTransport {
        responses: Arc<Mutex<VecDeque<Result<Vec<u8>, TransportError>>>>,
        fetches: Arc<AtomicUsize>,
    }

    impl FakeTransport {
        fn new(responses: Vec<Result<Vec<u8>, TransportError>>) -> Self {
            Self {
                responses: Arc::new(Mutex::new(responses.into_iter().collect())),
                fetches: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Transport for FakeTransport {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, TransportError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected fetch")
        }
    }

    fn test_config(cache_dir: &Path) -> CatalogConfig {
        CatalogConfig {
            base_url: "http://catalog.test".to_string(),
            api_key: "test-key".to_string(),
            language: "en".to_string(),
            cache_dir: cache_dir.to_path_buf(),
            retry_limit: 3,
        }
    }

    fn test_client(
        cache_dir: &Path,
        responses: Vec<Result<Vec<u8>, TransportError>>,
    ) -> (CatalogClient, FakeTransport) {
        let transport = FakeTransport::new(responses);
        let client =
            CatalogClient::with_transport(test_config(cache_dir), Box::new(transport.clone()));
        (client, transport)
    }

    #[tokio::test]
    async fn series_search_resolves_through_detail_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let (client, transport) = test_client(
            dir.path(),
            vec![Ok(SEARCH_XML.to_vec()), Ok(SERIES_XML.to_vec())],
        );

        let series = client.get_series("Futurama").await.unwrap();
        assert_eq!(series.id, 73871);
        assert_eq!(series.title.as_deref(), Some("Futurama"));
        assert_eq!(
            series.description.as_deref(),
            Some("Fry wakes up in the year 3000.")
        );
        assert!((series.rating.unwrap() - 8.9).abs() < 0.01);
        assert_eq!(series.cover.as_deref(), Some("posters/73871-1.jpg"));
        assert_eq!(series.backdrop.as_deref(), Some("fanart/73871-1.jpg"));
        // Search stage plus detail stage.
        assert_eq!(transport.fetch_count(), 2);
    }

    #[tokio::test]
    async fn repeated_lookup_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let (client, transport) = test_client(dir.path(), vec![Ok(EPISODE_XML.to_vec())]);

        let first = client.get_episode(73871, 2, 5).await.unwrap();
        assert_eq!(first.id, 55452);
        assert_eq!(first.title.as_deref(), Some("I Second That Emotion"));
        assert_eq!(first.writer.as_deref(), Some("Patric M. Verrone"));
        assert_eq!(first.image.as_deref(), Some("episodes/73871/55452.jpg"));
        assert_eq!(first.lastupdated, 1203923090);

        let second = client.get_episode(73871, 2, 5).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(transport.fetch_count(), 1);
    }

    #[tokio::test]
    async fn retry_budget_allows_limit_failures() {
        let dir = tempfile::tempdir().unwrap();
        let (client, transport) = test_client(
            dir.path(),
            vec![
                Err(TransportError::Timeout),
                Err(TransportError::Connect("refused".into())),
                Err(TransportError::Timeout),
                Ok(EPISODE_XML.to_vec()),
            ],
        );

        // retry_limit = 3: three transient failures then success stays Ok.
        let episode = client.get_episode(73871, 2, 5).await.unwrap();
        assert_eq!(episode.episode_number, 5);
        assert_eq!(transport.fetch_count(), 4);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_the_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (client, transport) = test_client(
            dir.path(),
            vec![
                Err(TransportError::Timeout),
                Err(TransportError::Timeout),
                Err(TransportError::Timeout),
                Err(TransportError::Timeout),
            ],
        );

        let err = client.get_episode(73871, 2, 5).await.unwrap_err();
        assert!(matches!(err, CatalogError::Transport(_)));
        assert_eq!(err.kind(), FailureKind::ResolutionFailed);
        // Initial attempt plus the full retry budget, nothing more.
        assert_eq!(transport.fetch_count(), 4);
    }

    #[tokio::test]
    async fn http_404_is_not_found_and_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let (client, transport) =
            test_client(dir.path(), vec![Err(TransportError::Status(404))]);

        let err = client.get_series_by_id(12345).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound));
        assert_eq!(transport.fetch_count(), 1);
    }

    #[tokio::test]
    async fn malformed_body_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let (client, transport) =
            test_client(dir.path(), vec![Ok(b"this is not xml".to_vec())]);

        let err = client.get_episode(73871, 2, 5).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::MalformedResponse);
        assert_eq!(transport.fetch_count(), 1);
    }

    #[tokio::test]
    async fn empty_search_response_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (client, transport) = test_client(dir.path(), vec![Ok(b"<Data/>".to_vec())]);

        let err = client.get_series("Unknown Show").await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound));
        assert_eq!(transport.fetch_count(), 1);
    }

    #[tokio::test]
    async fn missing_series_element_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _transport) = test_client(
            dir.path(),
            vec![Ok(b"<Data><Something><id>1</id></Something></Data>".to_vec())],
        );

        let err = client.get_series_by_id(73871).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound));
    }

    #[tokio::test]
    async fn season_keeps_only_its_own_banners() {
        let dir = tempfile::tempdir().unwrap();
        let (client, transport) = test_client(dir.path(), vec![Ok(BANNERS_XML.to_vec())]);

        let season = client.get_season(73871, 2).await.unwrap();
        assert_eq!(season.number, 2);
        assert_eq!(season.banners.len(), 2);
        assert_eq!(season.poster().unwrap().path, "seasons/73871-2-1.jpg");

        // Same listing URL: the full banner query hits the cache.
        let all = client.get_banners(73871).await.unwrap();
        assert_eq!(all.len(), 4);
        assert!(all[0].season.is_none());
        assert_eq!(Banner::first_of_kind(&all, "season").unwrap().id, 2);
        assert!(Banner::first_of_kind(&all, "fanart").is_none());
        assert_eq!(transport.fetch_count(), 1);
    }

    #[tokio::test]
    async fn movie_match_requires_name_equality() {
        let dir = tempfile::tempdir().unwrap();
        let (client, transport) = test_client(
            dir.path(),
            vec![Ok(MOVIES_XML.to_vec()), Ok(MOVIES_XML.to_vec())],
        );

        let movie = client.get_movie("fight club").await.unwrap();
        assert_eq!(movie.id, 550);
        assert_eq!(movie.title, "Fight Club");
        assert_eq!(movie.released.as_deref(), Some("1999-10-15"));

        // A substring is not a match.
        let err = client.get_movie("club").await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound));
        assert_eq!(transport.fetch_count(), 2);
    }

    #[tokio::test]
    async fn languages_parse_into_records() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _transport) = test_client(dir.path(), vec![Ok(LANGUAGES_XML.to_vec())]);

        let langs = client.get_languages().await.unwrap();
        assert_eq!(langs.len(), 2);
        assert_eq!(langs[0].name, "English");
        assert_eq!(langs[0].abbreviation, "en");
        assert_eq!(langs[0].id, 7);
    }

    #[tokio::test]
    async fn banner_download_skips_the_response_cache() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = b"\x89PNG fake image".to_vec();
        let (client, transport) = test_client(
            dir.path(),
            vec![Ok(bytes.clone()), Ok(bytes.clone())],
        );

        let banner = Banner {
            id: 1,
            path: "graphical/73871-g.jpg".to_string(),
            kind: Some("series".to_string()),
            season: None,
        };
        let dest = dir.path().join("cover.jpg");

        client.download_banner(&banner, &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), bytes);

        // Image bytes are never cached, so downloading again refetches.
        client.download_banner(&banner, &dest).await.unwrap();
        assert_eq!(transport.fetch_count(), 2);
    }
}
