use sqlx::SqlitePool;

#[derive(Debug, Clone, serde::Serialize)]
pub struct EpisodeRow {
    pub id: String,
    pub season_id: String,
    pub episode_number: i64,
    pub path: String,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub rating: Option<f64>,
    pub writer: Option<String>,
    pub director: Option<String>,
    pub guest_stars: Option<String>,
    pub image: Option<String>,
    pub lastupdated: i64,
    pub created_ts: i64,
    pub updated_ts: i64,
}

/// Catalog-sourced fields for one episode write.
#[derive(Debug, Clone)]
pub struct EpisodeUpsert<'a> {
    pub episode_number: i64,
    pub path: &'a str,
    pub title: Option<&'a str>,
    pub overview: Option<&'a str>,
    pub rating: Option<f64>,
    pub writer: Option<&'a str>,
    pub director: Option<&'a str>,
    pub guest_stars: Option<&'a str>,
    pub image: Option<&'a str>,
    pub lastupdated: i64,
}

/// Insert or update one episode under its season.
///
/// `path` always tracks the most recent write. The descriptive fields only
/// move forward: they are replaced when the incoming `lastupdated` stamp is
/// strictly newer than the stored one, so under concurrent writes a stale
/// response can never clobber data from a fresher one.
pub async fn upsert_episode(
    pool: &SqlitePool,
    season_id: &str,
    ep: &EpisodeUpsert<'_>,
) -> Result<EpisodeRow, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO episode (id, season_id, episode_number, path, title, overview, rating, \
         writer, director, guest_stars, image, lastupdated, created_ts, updated_ts) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(season_id, episode_number) DO UPDATE SET \
           path = excluded.path, \
           title = CASE WHEN excluded.lastupdated > episode.lastupdated \
             THEN excluded.title ELSE episode.title END, \
           overview = CASE WHEN excluded.lastupdated > episode.lastupdated \
             THEN excluded.overview ELSE episode.overview END, \
           rating = CASE WHEN excluded.lastupdated > episode.lastupdated \
             THEN excluded.rating ELSE episode.rating END, \
           writer = CASE WHEN excluded.lastupdated > episode.lastupdated \
             THEN excluded.writer ELSE episode.writer END, \
           director = CASE WHEN excluded.lastupdated > episode.lastupdated \
             THEN excluded.director ELSE episode.director END, \
           guest_stars = CASE WHEN excluded.lastupdated > episode.lastupdated \
             THEN excluded.guest_stars ELSE episode.guest_stars END, \
           image = CASE WHEN excluded.lastupdated > episode.lastupdated \
             THEN excluded.image ELSE episode.image END, \
           lastupdated = MAX(episode.lastupdated, excluded.lastupdated), \
           updated_ts = excluded.updated_ts",
    )
    .bind(&id)
    .bind(season_id)
    .bind(ep.episode_number)
    .bind(ep.path)
    .bind(ep.title)
    .bind(ep.overview)
    .bind(ep.rating)
    .bind(ep.writer)
    .bind(ep.director)
    .bind(ep.guest_stars)
    .bind(ep.image)
    .bind(ep.lastupdated)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let row: (
        String,
        String,
        i64,
        String,
        Option<String>,
        Option<String>,
        Option<f64>,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        "SELECT id, season_id, episode_number, path, title, overview, rating, writer, \
         director, guest_stars, image, lastupdated, created_ts, updated_ts \
         FROM episode WHERE season_id = ? AND episode_number = ?",
    )
    .bind(season_id)
    .bind(ep.episode_number)
    .fetch_one(pool)
    .await?;

    Ok(row_to_episode(row))
}

pub async fn get_episodes(
    pool: &SqlitePool,
    season_id: &str,
) -> Result<Vec<EpisodeRow>, sqlx::Error> {
    let rows: Vec<(
        String,
        String,
        i64,
        String,
        Option<String>,
        Option<String>,
        Option<f64>,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        i64,
        i64,
        i64,
    )> = sqlx::query_as(
        "SELECT id, season_id, episode_number, path, title, overview, rating, writer, \
         director, guest_stars, image, lastupdated, created_ts, updated_ts \
         FROM episode WHERE season_id = ? ORDER BY episode_number",
    )
    .bind(season_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_to_episode).collect())
}

fn row_to_episode(
    r: (
        String,
        String,
        i64,
        String,
        Option<String>,
        Option<String>,
        Option<f64>,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        i64,
        i64,
        i64,
    ),
) -> EpisodeRow {
    EpisodeRow {
        id: r.0,
        season_id: r.1,
        episode_number: r.2,
        path: r.3,
        title: r.4,
        overview: r.5,
        rating: r.6,
        writer: r.7,
        director: r.8,
        guest_stars: r.9,
        image: r.10,
        lastupdated: r.11,
        created_ts: r.12,
        updated_ts: r.13,
    }
}
