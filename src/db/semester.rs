use chrono::NaiveDate;
use uuid::Uuid;

use crate::{dto::NewSemester, models::Semester, PGPool};

pub async fn insert(semester: NewSemester, pool: &PGPool) -> Result<Semester, sqlx::Error> {
    sqlx::query_as::<_, Semester>(
        "INSERT INTO semesters (id, number, group_name, start_date, end_date)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(semester.number)
    .bind(semester.group_name)
    .bind(semester.start_date)
    .bind(semester.end_date)
    .fetch_one(pool)
    .await
}

/// The group's current semester is the one whose date range contains today.
pub async fn current(
    group_name: &str,
    today: NaiveDate,
    pool: &PGPool,
) -> Result<Option<Semester>, sqlx::Error> {
    sqlx::query_as::<_, Semester>(
        "SELECT * FROM semesters
        WHERE group_name = $1 AND start_date <= $2 AND end_date >= $2
        ORDER BY number DESC LIMIT 1",
    )
    .bind(group_name)
    .bind(today)
    .fetch_optional(pool)
    .await
}
