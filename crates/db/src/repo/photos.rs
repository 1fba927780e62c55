use sqlx::SqlitePool;

#[derive(Debug, Clone, serde::Serialize)]
pub struct PhotoRow {
    pub id: String,
    pub path: String,
    pub created_ts: i64,
}

/// Record a photo by path. Re-registering an existing path returns the
/// original row untouched.
pub async fn upsert_photo(pool: &SqlitePool, path: &str) -> Result<PhotoRow, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();

    sqlx::query("INSERT INTO photo (id, path, created_ts) VALUES (?, ?, ?) ON CONFLICT(path) DO NOTHING")
        .bind(&id)
        .bind(path)
        .bind(now)
        .execute(pool)
        .await?;

    let row: (String, String, i64) =
        sqlx::query_as("SELECT id, path, created_ts FROM photo WHERE path = ?")
            .bind(path)
            .fetch_one(pool)
            .await?;

    Ok(PhotoRow {
        id: row.0,
        path: row.1,
        created_ts: row.2,
    })
}

pub async fn list_photos(pool: &SqlitePool) -> Result<Vec<PhotoRow>, sqlx::Error> {
    let rows: Vec<(String, String, i64)> =
        sqlx::query_as("SELECT id, path, created_ts FROM photo ORDER BY path")
            .fetch_all(pool)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(id, path, created_ts)| PhotoRow {
            id,
            path,
            created_ts,
        })
        .collect())
}
