use uuid::Uuid;

use crate::{models::AllowedUser, PGPool};

pub async fn any(pool: &PGPool) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM allowed_users)")
        .fetch_one(pool)
        .await
}

/// Flips used = false -> true in one statement, so a record is consumed
/// exactly once even under concurrent attempts.
pub async fn consume(
    full_name: &str,
    group_name: &str,
    pool: &PGPool,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        "UPDATE allowed_users SET used = TRUE
        WHERE full_name = $1 AND group_name = $2 AND used = FALSE",
    )
    .bind(full_name)
    .bind(group_name)
    .execute(pool)
    .await;
    match res {
        Ok(done) => Ok(done.rows_affected()),
        Err(err) => Err(err),
    }
}

pub async fn insert(
    full_name: &str,
    group_name: &str,
    pool: &PGPool,
) -> Result<AllowedUser, sqlx::Error> {
    sqlx::query_as::<_, AllowedUser>(
        "INSERT INTO allowed_users (id, full_name, group_name)
        VALUES ($1, $2, $3)
        RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(full_name)
    .bind(group_name)
    .fetch_one(pool)
    .await
}
