use uuid::Uuid;

use crate::{dto::NewScheduleRow, models::Schedule, PGPool};

pub async fn for_day(
    group_id: Uuid,
    day_token: &str,
    week: i16,
    pool: &PGPool,
) -> Result<Vec<Schedule>, sqlx::Error> {
    sqlx::query_as::<_, Schedule>(
        "SELECT * FROM schedule
        WHERE group_id = $1 AND day_of_week = $2 AND week = $3
        ORDER BY lesson_time",
    )
    .bind(group_id)
    .bind(day_token)
    .bind(week)
    .fetch_all(pool)
    .await
}

pub async fn for_group(group_id: Uuid, pool: &PGPool) -> Result<Vec<Schedule>, sqlx::Error> {
    sqlx::query_as::<_, Schedule>("SELECT * FROM schedule WHERE group_id = $1")
        .bind(group_id)
        .fetch_all(pool)
        .await
}

pub async fn insert(row: NewScheduleRow, pool: &PGPool) -> Result<Schedule, sqlx::Error> {
    sqlx::query_as::<_, Schedule>(
        "INSERT INTO schedule (id, group_id, subject, teacher, day_of_week, lesson_time, auditorium, week)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(row.group_id)
    .bind(row.subject)
    .bind(row.teacher)
    .bind(row.day_of_week.token())
    .bind(row.lesson_time)
    .bind(row.auditorium)
    .bind(row.week.number())
    .fetch_one(pool)
    .await
}
