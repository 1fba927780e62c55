use marquee_db::repo::episodes::{self, EpisodeUpsert};
use marquee_db::repo::{photos, seasons, shows};
use sqlx::SqlitePool;

/// Fresh in-memory database with the full schema applied.
async fn test_pool() -> SqlitePool {
    let pool = marquee_db::connect(":memory:").await.unwrap();
    marquee_db::migrate::run(&pool).await.unwrap();
    pool
}

#[tokio::test]
async fn show_upsert_is_keyed_by_series_id() {
    let pool = test_pool().await;

    let first = shows::upsert_show(
        &pool,
        73871,
        "Futurama",
        Some("Delivery company antics"),
        None,
        Some(8.9),
        None,
        None,
    )
    .await
    .unwrap();

    let second = shows::upsert_show(
        &pool,
        73871,
        "Futurama (1999)",
        Some("Refreshed synopsis"),
        Some("Animation"),
        Some(9.0),
        Some("covers/73871.jpg"),
        None,
    )
    .await
    .unwrap();

    // One row, stable surrogate id, refreshed descriptive fields.
    assert_eq!(second.id, first.id);
    assert_eq!(second.description.as_deref(), Some("Refreshed synopsis"));
    assert_eq!(second.genre.as_deref(), Some("Animation"));
    assert_eq!(second.cover.as_deref(), Some("covers/73871.jpg"));
    // Title stays as first written so folder lookups keep matching.
    assert_eq!(second.title, "Futurama");

    let all = shows::list_shows(&pool).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn find_by_title_is_case_insensitive() {
    let pool = test_pool().await;

    shows::upsert_show(&pool, 73871, "Futurama", None, None, None, None, None)
        .await
        .unwrap();

    assert!(shows::find_by_title(&pool, "futurama")
        .await
        .unwrap()
        .is_some());
    assert!(shows::find_by_title(&pool, "FUTURAMA")
        .await
        .unwrap()
        .is_some());
    assert!(shows::find_by_title(&pool, "Red Dwarf")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn season_upsert_keeps_existing_banner() {
    let pool = test_pool().await;

    let show = shows::upsert_show(&pool, 73871, "Futurama", None, None, None, None, None)
        .await
        .unwrap();

    let created = seasons::upsert_season(&pool, &show.id, 2, Some("banners/s2.jpg"))
        .await
        .unwrap();
    let refreshed = seasons::upsert_season(&pool, &show.id, 2, None).await.unwrap();

    assert_eq!(refreshed.id, created.id);
    assert_eq!(refreshed.banner.as_deref(), Some("banners/s2.jpg"));
    assert_eq!(seasons::get_seasons(&pool, &show.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn episode_merge_only_moves_forward() {
    let pool = test_pool().await;

    let show = shows::upsert_show(&pool, 73871, "Futurama", None, None, None, None, None)
        .await
        .unwrap();
    let season = seasons::upsert_season(&pool, &show.id, 2, None).await.unwrap();

    let fresh = episodes::upsert_episode(
        &pool,
        &season.id,
        &EpisodeUpsert {
            episode_number: 5,
            path: "/videos/Futurama/s02e05.avi",
            title: Some("I Second That Emotion"),
            overview: Some("Bender meets the sewer mutants."),
            rating: Some(8.1),
            writer: None,
            director: None,
            guest_stars: None,
            image: None,
            lastupdated: 200,
        },
    )
    .await
    .unwrap();

    // A stale write updates the path but none of the descriptive fields.
    let stale = episodes::upsert_episode(
        &pool,
        &season.id,
        &EpisodeUpsert {
            episode_number: 5,
            path: "/mnt/media/Futurama/s02e05.avi",
            title: Some("Old Title"),
            overview: None,
            rating: None,
            writer: Some("Stale Writer"),
            director: None,
            guest_stars: None,
            image: None,
            lastupdated: 100,
        },
    )
    .await
    .unwrap();

    assert_eq!(stale.id, fresh.id);
    assert_eq!(stale.path, "/mnt/media/Futurama/s02e05.avi");
    assert_eq!(stale.title.as_deref(), Some("I Second That Emotion"));
    assert_eq!(stale.writer, None);
    assert_eq!(stale.lastupdated, 200);

    // A newer write replaces them.
    let newer = episodes::upsert_episode(
        &pool,
        &season.id,
        &EpisodeUpsert {
            episode_number: 5,
            path: "/mnt/media/Futurama/s02e05.avi",
            title: Some("I Second That Emotion (revised)"),
            overview: Some("Revised overview."),
            rating: Some(8.3),
            writer: Some("Patric M. Verrone"),
            director: None,
            guest_stars: None,
            image: None,
            lastupdated: 300,
        },
    )
    .await
    .unwrap();

    assert_eq!(
        newer.title.as_deref(),
        Some("I Second That Emotion (revised)")
    );
    assert_eq!(newer.writer.as_deref(), Some("Patric M. Verrone"));
    assert_eq!(newer.lastupdated, 300);

    let eps = episodes::get_episodes(&pool, &season.id).await.unwrap();
    assert_eq!(eps.len(), 1);
}

#[tokio::test]
async fn photo_reinsert_returns_original_row() {
    let pool = test_pool().await;

    let first = photos::upsert_photo(&pool, "/photos/holiday/beach.jpg")
        .await
        .unwrap();
    let second = photos::upsert_photo(&pool, "/photos/holiday/beach.jpg")
        .await
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.created_ts, first.created_ts);
    assert_eq!(photos::list_photos(&pool).await.unwrap().len(), 1);
}
