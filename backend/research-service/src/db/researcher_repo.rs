/// Researcher account database operations
use crate::models::researcher::MAX_LOGIN_ATTEMPTS;
use crate::models::{NewResearcher, Researcher};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn find_by_id(
    pool: &PgPool,
    researcher_id: Uuid,
) -> Result<Option<Researcher>, sqlx::Error> {
    sqlx::query_as::<_, Researcher>("SELECT * FROM researchers WHERE id = $1")
        .bind(researcher_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Researcher>, sqlx::Error> {
    sqlx::query_as::<_, Researcher>("SELECT * FROM researchers WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn create_researcher(
    pool: &PgPool,
    account: &NewResearcher,
) -> Result<Researcher, sqlx::Error> {
    sqlx::query_as::<_, Researcher>(
        r#"
        INSERT INTO researchers (id, email, username, password_hash, name, institution, remaining_login_attempts, created_at, updated_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        RETURNING *
        "#,
    )
    .bind(&account.email)
    .bind(&account.username)
    .bind(&account.password_hash)
    .bind(&account.name)
    .bind(&account.institution)
    .bind(MAX_LOGIN_ATTEMPTS)
    .fetch_one(pool)
    .await
}

/// Check if email is already registered
pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM researchers WHERE email = $1)")
        .bind(email)
        .fetch_one(pool)
        .await
}

/// Check if username is already taken
pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM researchers WHERE username = $1)")
        .bind(username)
        .fetch_one(pool)
        .await
}

/// Record a failed login attempt. One atomic decrement, floored at zero;
/// the returned row carries the post-decrement counter.
pub async fn record_failed_login(
    pool: &PgPool,
    researcher_id: Uuid,
) -> Result<Researcher, sqlx::Error> {
    sqlx::query_as::<_, Researcher>(
        r#"
        UPDATE researchers
        SET remaining_login_attempts = GREATEST(remaining_login_attempts - 1, 0),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(researcher_id)
    .fetch_one(pool)
    .await
}

/// Refill the attempt budget after a successful login, so only
/// consecutive failures can lock an account.
pub async fn reset_login_attempts(pool: &PgPool, researcher_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE researchers
        SET remaining_login_attempts = $2,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        "#,
    )
    .bind(researcher_id)
    .bind(MAX_LOGIN_ATTEMPTS)
    .execute(pool)
    .await?;

    Ok(())
}
