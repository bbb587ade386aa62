use uuid::Uuid;

use crate::{models::{Event, EventParticipant}, PGPool};

pub async fn create(
    title: &str,
    description: &str,
    requirements: &str,
    pool: &PGPool,
) -> Result<Event, sqlx::Error> {
    sqlx::query_as::<_, Event>(
        "INSERT INTO events (id, title, description, requirements)
        VALUES ($1, $2, $3, $4)
        RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(description)
    .bind(requirements)
    .fetch_one(pool)
    .await
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<Option<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_active(pool: &PGPool) -> Result<Vec<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(
        "SELECT * FROM events WHERE is_active ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await
}

pub async fn get_all(pool: &PGPool) -> Result<Vec<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

/// Soft delete: the row stays, only the flag flips.
pub async fn deactivate(id: Uuid, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE events SET is_active = FALSE WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await;
    match res {
        Ok(done) => Ok(done.rows_affected()),
        Err(err) => Err(err),
    }
}

/// ON CONFLICT DO NOTHING turns a duplicate pair into zero affected rows.
pub async fn register_participant(
    event_id: Uuid,
    user_id: Uuid,
    pool: &PGPool,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        "INSERT INTO event_participants (event_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (event_id, user_id) DO NOTHING",
    )
    .bind(event_id)
    .bind(user_id)
    .execute(pool)
    .await;
    match res {
        Ok(done) => Ok(done.rows_affected()),
        Err(err) => Err(err),
    }
}

pub async fn is_participant(
    event_id: Uuid,
    user_id: Uuid,
    pool: &PGPool,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM event_participants WHERE event_id = $1 AND user_id = $2)",
    )
    .bind(event_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn participants(
    event_id: Uuid,
    pool: &PGPool,
) -> Result<Vec<EventParticipant>, sqlx::Error> {
    sqlx::query_as::<_, EventParticipant>(
        "SELECT * FROM event_participants WHERE event_id = $1 ORDER BY registered_at",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await
}

pub async fn counts(pool: &PGPool) -> Result<(i64, i64), sqlx::Error> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events")
        .fetch_one(pool)
        .await?;
    let active = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events WHERE is_active")
        .fetch_one(pool)
        .await?;
    Ok((total, active))
}
