use uuid::Uuid;

use crate::{models::Application, PGPool};

pub async fn create(
    user_id: Uuid,
    content: &str,
    pool: &PGPool,
) -> Result<Application, sqlx::Error> {
    sqlx::query_as::<_, Application>(
        "INSERT INTO applications (id, user_id, content)
        VALUES ($1, $2, $3)
        RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(content)
    .fetch_one(pool)
    .await
}

pub async fn get_all(pool: &PGPool) -> Result<Vec<Application>, sqlx::Error> {
    sqlx::query_as::<_, Application>("SELECT * FROM applications ORDER BY created_at")
        .fetch_all(pool)
        .await
}

pub async fn for_user(user_id: Uuid, pool: &PGPool) -> Result<Vec<Application>, sqlx::Error> {
    sqlx::query_as::<_, Application>(
        "SELECT * FROM applications WHERE user_id = $1 ORDER BY created_at",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<Option<Application>, sqlx::Error> {
    sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn set_status(
    id: Uuid,
    status: &str,
    pool: &PGPool,
) -> Result<Option<Application>, sqlx::Error> {
    sqlx::query_as::<_, Application>(
        "UPDATE applications SET status = $1 WHERE id = $2 RETURNING *",
    )
    .bind(status)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn clear(pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM applications").execute(pool).await;
    match res {
        Ok(done) => Ok(done.rows_affected()),
        Err(err) => Err(err),
    }
}

pub async fn count(pool: &PGPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM applications")
        .fetch_one(pool)
        .await
}
