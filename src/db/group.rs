use uuid::Uuid;

use crate::{models::Group, PGPool};

pub async fn find_by_name(name: &str, pool: &PGPool) -> Result<Option<Group>, sqlx::Error> {
    sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<Option<Group>, sqlx::Error> {
    sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Find-or-create in two statements; the unique constraint on the name
/// makes the insert a no-op when another session won the race.
pub async fn find_or_create(name: &str, pool: &PGPool) -> Result<Group, sqlx::Error> {
    sqlx::query("INSERT INTO groups (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
        .bind(Uuid::new_v4())
        .bind(name)
        .execute(pool)
        .await?;
    sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await
}
