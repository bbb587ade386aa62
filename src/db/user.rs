use uuid::Uuid;

use crate::{models::User, PGPool};

pub async fn create(
    telegram_id: i64,
    full_name: &str,
    group_id: Uuid,
    pool: &PGPool,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (id, telegram_id, full_name, role, group_id)
        VALUES ($1, $2, $3, 'student', $4)
        RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(telegram_id)
    .bind(full_name)
    .bind(group_id)
    .fetch_one(pool)
    .await
}

pub async fn get_by_telegram(telegram_id: i64, pool: &PGPool) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE telegram_id = $1")
        .bind(telegram_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_all(limit: i64, pool: &PGPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY full_name LIMIT $1")
        .bind(limit)
        .fetch_all(pool)
        .await
}

/// Search by name substring, exact group name or numeric external id.
pub async fn search(query: &str, limit: i64, pool: &PGPool) -> Result<Vec<User>, sqlx::Error> {
    let as_id: Option<i64> = query.trim().parse().ok();
    sqlx::query_as::<_, User>(
        "SELECT u.* FROM users u
        LEFT JOIN groups g ON g.id = u.group_id
        WHERE u.full_name ILIKE $1 OR g.name = $2 OR u.telegram_id = $3
        ORDER BY u.full_name LIMIT $4",
    )
    .bind(format!("%{}%", query.trim()))
    .bind(query.trim().to_uppercase())
    .bind(as_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn set_role(telegram_id: i64, role: &str, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE users SET role = $1 WHERE telegram_id = $2")
        .bind(role)
        .bind(telegram_id)
        .execute(pool)
        .await;
    match res {
        Ok(done) => Ok(done.rows_affected()),
        Err(err) => Err(err),
    }
}

/// The cascade to applications and participations is explicit: the rows
/// reference the user without ON DELETE actions.
pub async fn delete_cascading(id: Uuid, pool: &PGPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM applications WHERE user_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM event_participants WHERE user_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

pub async fn count(pool: &PGPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
}
