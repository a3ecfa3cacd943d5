use crate::types::{ImageLikesRow, LikeCount};
use sqlx::PgPool;

/// Get the like counter row for an image
pub async fn get(pool: &PgPool, id: &str) -> Result<Option<ImageLikesRow>, sqlx::Error> {
    sqlx::query_as::<_, ImageLikesRow>(
        "SELECT id, likes, created_at, updated_at FROM images WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Create the counter with zero likes (no-op if it already exists)
pub async fn init(pool: &PgPool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO images (id, likes) VALUES ($1, 0) ON CONFLICT (id) DO NOTHING")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Add one like, creating the counter at 1 if absent. Returns the new count.
pub async fn increment_likes(pool: &PgPool, id: &str) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO images (id, likes)
        VALUES ($1, 1)
        ON CONFLICT (id) DO UPDATE SET
            likes = images.likes + 1,
            updated_at = NOW()
        RETURNING likes
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// Most-liked images, highest first
pub async fn top_liked(pool: &PgPool, limit: i64) -> Result<Vec<LikeCount>, sqlx::Error> {
    sqlx::query_as::<_, LikeCount>(
        "SELECT id, likes FROM images ORDER BY likes DESC, id ASC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Number of like counters
pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM images")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

/// Delete every like counter, returning how many were removed
pub async fn delete_all(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM images").execute(pool).await?;
    Ok(result.rows_affected())
}
