use chrono::Utc;
use uuid::Uuid;

use crate::{models::Notification, PGPool};

pub async fn create(
   recipient: i64,
   content: &str,
   pool: &PGPool,
) -> Result<Notification, sqlx::Error> {
   sqlx::query_as::<_, Notification>(
      "INSERT INTO notifications (id, recipient, content)
      VALUES ($1, $2, $3)
      RETURNING *",
   )
   .bind(Uuid::new_v4())
   .bind(recipient)
   .bind(content)
   .fetch_one(pool)
   .await
}

pub async fn mark_sent(id: Uuid, pool: &PGPool) -> Result<(), sqlx::Error> {
   let res = sqlx::query(
      "UPDATE notifications
      SET sent_at = $1
      WHERE id = $2",
   )
   .bind(Utc::now())
   .bind(id)
   .execute(pool)
   .await;
   match res {
      Ok(_) => Ok(()),
      Err(err) => Err(err),
   }
}
