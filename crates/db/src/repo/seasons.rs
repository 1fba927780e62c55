use sqlx::SqlitePool;

#[derive(Debug, Clone, serde::Serialize)]
pub struct SeasonRow {
    pub id: String,
    pub show_id: String,
    pub season_number: i64,
    pub banner: Option<String>,
    pub created_ts: i64,
    pub updated_ts: i64,
}

/// Insert or refresh a season under its show. An incoming NULL banner never
/// clears one recorded earlier.
pub async fn upsert_season(
    pool: &SqlitePool,
    show_id: &str,
    season_number: i64,
    banner: Option<&str>,
) -> Result<SeasonRow, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO season (id, show_id, season_number, banner, created_ts, updated_ts) \
         VALUES (?, ?, ?, ?, ?, ?) \
         ON CONFLICT(show_id, season_number) DO UPDATE SET \
           banner = COALESCE(excluded.banner, banner), \
           updated_ts = excluded.updated_ts",
    )
    .bind(&id)
    .bind(show_id)
    .bind(season_number)
    .bind(banner)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let row: (String, String, i64, Option<String>, i64, i64) = sqlx::query_as(
        "SELECT id, show_id, season_number, banner, created_ts, updated_ts \
         FROM season WHERE show_id = ? AND season_number = ?",
    )
    .bind(show_id)
    .bind(season_number)
    .fetch_one(pool)
    .await?;

    Ok(row_to_season(row))
}

pub async fn get_seasons(pool: &SqlitePool, show_id: &str) -> Result<Vec<SeasonRow>, sqlx::Error> {
    let rows: Vec<(String, String, i64, Option<String>, i64, i64)> = sqlx::query_as(
        "SELECT id, show_id, season_number, banner, created_ts, updated_ts \
         FROM season WHERE show_id = ? ORDER BY season_number",
    )
    .bind(show_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_to_season).collect())
}

fn row_to_season(r: (String, String, i64, Option<String>, i64, i64)) -> SeasonRow {
    SeasonRow {
        id: r.0,
        show_id: r.1,
        season_number: r.2,
        banner: r.3,
        created_ts: r.4,
        updated_ts: r.5,
    }
}
