use sqlx::SqlitePool;

#[derive(Debug, Clone, serde::Serialize)]
pub struct ShowRow {
    pub id: String,
    pub series_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub rating: Option<f64>,
    pub cover: Option<String>,
    pub backdrop: Option<String>,
    pub created_ts: i64,
    pub updated_ts: i64,
}

/// Insert a show keyed by its catalog series id, or refresh its descriptive
/// fields if that id is already present.
///
/// The stored title is written once and never replaced: folder-derived
/// lookups match against it, and rewriting it on refresh would break those
/// lookups for every file indexed afterwards.
pub async fn upsert_show(
    pool: &SqlitePool,
    series_id: i64,
    title: &str,
    description: Option<&str>,
    genre: Option<&str>,
    rating: Option<f64>,
    cover: Option<&str>,
    backdrop: Option<&str>,
) -> Result<ShowRow, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO show (id, series_id, title, description, genre, rating, cover, backdrop, \
         created_ts, updated_ts) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(series_id) DO UPDATE SET \
           description = excluded.description, \
           genre = excluded.genre, \
           rating = excluded.rating, \
           cover = excluded.cover, \
           backdrop = excluded.backdrop, \
           updated_ts = excluded.updated_ts",
    )
    .bind(&id)
    .bind(series_id)
    .bind(title)
    .bind(description)
    .bind(genre)
    .bind(rating)
    .bind(cover)
    .bind(backdrop)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let row: (
        String,
        i64,
        String,
        Option<String>,
        Option<String>,
        Option<f64>,
        Option<String>,
        Option<String>,
        i64,
        i64,
    ) = sqlx::query_as(
        "SELECT id, series_id, title, description, genre, rating, cover, backdrop, \
         created_ts, updated_ts FROM show WHERE series_id = ?",
    )
    .bind(series_id)
    .fetch_one(pool)
    .await?;

    Ok(row_to_show(row))
}

/// Title lookup; case-insensitive via the column's NOCASE collation.
pub async fn find_by_title(
    pool: &SqlitePool,
    title: &str,
) -> Result<Option<ShowRow>, sqlx::Error> {
    let row: Option<(
        String,
        i64,
        String,
        Option<String>,
        Option<String>,
        Option<f64>,
        Option<String>,
        Option<String>,
        i64,
        i64,
    )> = sqlx::query_as(
        "SELECT id, series_id, title, description, genre, rating, cover, backdrop, \
         created_ts, updated_ts FROM show WHERE title = ?",
    )
    .bind(title)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_to_show))
}

pub async fn find_by_series_id(
    pool: &SqlitePool,
    series_id: i64,
) -> Result<Option<ShowRow>, sqlx::Error> {
    let row: Option<(
        String,
        i64,
        String,
        Option<String>,
        Option<String>,
        Option<f64>,
        Option<String>,
        Option<String>,
        i64,
        i64,
    )> = sqlx::query_as(
        "SELECT id, series_id, title, description, genre, rating, cover, backdrop, \
         created_ts, updated_ts FROM show WHERE series_id = ?",
    )
    .bind(series_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_to_show))
}

pub async fn list_shows(pool: &SqlitePool) -> Result<Vec<ShowRow>, sqlx::Error> {
    let rows: Vec<(
        String,
        i64,
        String,
        Option<String>,
        Option<String>,
        Option<f64>,
        Option<String>,
        Option<String>,
        i64,
        i64,
    )> = sqlx::query_as(
        "SELECT id, series_id, title, description, genre, rating, cover, backdrop, \
         created_ts, updated_ts FROM show ORDER BY title",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_to_show).collect())
}

fn row_to_show(
    r: (
        String,
        i64,
        String,
        Option<String>,
        Option<String>,
        Option<f64>,
        Option<String>,
        Option<String>,
        i64,
        i64,
    ),
) -> ShowRow {
    ShowRow {
        id: r.0,
        series_id: r.1,
        title: r.2,
        description: r.3,
        genre: r.4,
        rating: r.5,
        cover: r.6,
        backdrop: r.7,
        created_ts: r.8,
        updated_ts: r.9,
    }
}
