/// Token pair storage.
///
/// Rows are deleted, never flagged: a missing row is what makes a refresh
/// token dead, so every invalidation path is a DELETE.
use crate::models::{NewTokenPair, TokenPair};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert_pair(pool: &PgPool, pair: &NewTokenPair) -> Result<TokenPair, sqlx::Error> {
    sqlx::query_as::<_, TokenPair>(
        r#"
        INSERT INTO token_pairs (id, researcher_id, access_token_hash, refresh_token_hash, created_at)
        VALUES (gen_random_uuid(), $1, $2, $3, CURRENT_TIMESTAMP)
        RETURNING *
        "#,
    )
    .bind(pair.researcher_id)
    .bind(&pair.access_token_hash)
    .bind(&pair.refresh_token_hash)
    .fetch_one(pool)
    .await
}

pub async fn find_by_refresh_hash(
    pool: &PgPool,
    refresh_hash: &str,
) -> Result<Option<TokenPair>, sqlx::Error> {
    sqlx::query_as::<_, TokenPair>("SELECT * FROM token_pairs WHERE refresh_token_hash = $1")
        .bind(refresh_hash)
        .fetch_optional(pool)
        .await
}

/// Single-use exchange: remove the presented pair row and insert its
/// replacement in one transaction. Returns false when the row was already
/// gone, meaning a concurrent request spent the token first.
pub async fn rotate_pair(
    pool: &PgPool,
    old_refresh_hash: &str,
    replacement: &NewTokenPair,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM token_pairs WHERE refresh_token_hash = $1")
        .bind(old_refresh_hash)
        .execute(&mut *tx)
        .await?;

    if deleted.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query(
        r#"
        INSERT INTO token_pairs (id, researcher_id, access_token_hash, refresh_token_hash, created_at)
        VALUES (gen_random_uuid(), $1, $2, $3, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(replacement.researcher_id)
    .bind(&replacement.access_token_hash)
    .bind(&replacement.refresh_token_hash)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(true)
}

pub async fn delete_by_refresh_hash(
    pool: &PgPool,
    refresh_hash: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM token_pairs WHERE refresh_token_hash = $1")
        .bind(refresh_hash)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Drop every live session for an account. Used when a login arrives with
/// no refresh cookie, so stale sessions cannot pile up.
pub async fn delete_all_for_researcher(
    pool: &PgPool,
    researcher_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM token_pairs WHERE researcher_id = $1")
        .bind(researcher_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
