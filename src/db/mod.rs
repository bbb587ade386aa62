pub mod allowed;
pub mod application;
pub mod event;
pub mod group;
pub mod notifications;
pub mod schedule;
pub mod semester;
pub mod user;

#[cfg(test)]
pub mod store_mock;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{error, info};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::dto::{NewScheduleRow, NewSemester};
use crate::errors::BotError;
use crate::models::{
    AllowedUser, Application, ApplicationStatus, Event, EventParticipant, Group, Notification,
    Role, Schedule, Semester, User, Weekday, WeekParity,
};
use crate::PGPool;

pub async fn init_db_pool(db_url: &str) -> Result<PGPool, sqlx::Error> {
    let pool: PGPool = PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("connected to postgresql");
    Ok(pool)
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

fn storage(err: sqlx::Error) -> BotError {
    error!("storage failure: {:?}", err);
    BotError::Persistence
}

/// The relational store behind the bot. The production implementation is
/// [PgStore]; tests use the in-memory mock from [store_mock].
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_group(&self, name: &str) -> Result<Option<Group>, BotError>;
    async fn group_by_id(&self, id: Uuid) -> Result<Option<Group>, BotError>;
    async fn find_or_create_group(&self, name: &str) -> Result<Group, BotError>;

    async fn create_user(
        &self,
        telegram_id: i64,
        full_name: &str,
        group_id: Uuid,
    ) -> Result<User, BotError>;
    async fn user_by_telegram(&self, telegram_id: i64) -> Result<Option<User>, BotError>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, BotError>;
    async fn all_users(&self, limit: i64) -> Result<Vec<User>, BotError>;
    async fn search_users(&self, query: &str, limit: i64) -> Result<Vec<User>, BotError>;
    /// Returns false when no user with that external id exists.
    async fn set_role(&self, telegram_id: i64, role: Role) -> Result<bool, BotError>;
    /// Deletes the user together with their applications and event
    /// participations, in one transaction.
    async fn delete_user(&self, id: Uuid) -> Result<(), BotError>;
    async fn count_users(&self) -> Result<i64, BotError>;

    async fn schedule_for_day(
        &self,
        group_id: Uuid,
        day: Weekday,
        week: WeekParity,
    ) -> Result<Vec<Schedule>, BotError>;
    async fn schedule_for_group(&self, group_id: Uuid) -> Result<Vec<Schedule>, BotError>;
    async fn insert_schedule_row(&self, row: NewScheduleRow) -> Result<Schedule, BotError>;

    async fn insert_semester(&self, semester: NewSemester) -> Result<Semester, BotError>;
    async fn current_semester(
        &self,
        group_name: &str,
        today: NaiveDate,
    ) -> Result<Option<Semester>, BotError>;

    async fn create_application(&self, user_id: Uuid, content: &str)
        -> Result<Application, BotError>;
    async fn applications_all(&self) -> Result<Vec<Application>, BotError>;
    async fn applications_for_user(&self, user_id: Uuid) -> Result<Vec<Application>, BotError>;
    async fn application_by_id(&self, id: Uuid) -> Result<Option<Application>, BotError>;
    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application, BotError>;
    async fn clear_applications(&self) -> Result<u64, BotError>;
    async fn count_applications(&self) -> Result<i64, BotError>;

    async fn create_event(
        &self,
        title: &str,
        description: &str,
        requirements: &str,
    ) -> Result<Event, BotError>;
    async fn active_events(&self) -> Result<Vec<Event>, BotError>;
    async fn all_events(&self) -> Result<Vec<Event>, BotError>;
    async fn event_by_id(&self, id: Uuid) -> Result<Option<Event>, BotError>;
    async fn deactivate_event(&self, id: Uuid) -> Result<bool, BotError>;
    /// Returns false when the (event, user) pair is already registered;
    /// the storage-level key makes this safe under concurrent attempts.
    async fn register_participant(&self, event_id: Uuid, user_id: Uuid)
        -> Result<bool, BotError>;
    async fn is_participant(&self, event_id: Uuid, user_id: Uuid) -> Result<bool, BotError>;
    async fn participants(&self, event_id: Uuid) -> Result<Vec<EventParticipant>, BotError>;
    /// (total, active) event counts.
    async fn count_events(&self) -> Result<(i64, i64), BotError>;

    /// The allow-list gate is configured iff the table has any rows.
    async fn allowlist_enabled(&self) -> Result<bool, BotError>;
    /// Consumes one unused (name, group) record; returns false when no
    /// unused record matches.
    async fn consume_allowed(&self, full_name: &str, group_name: &str)
        -> Result<bool, BotError>;
    async fn insert_allowed(&self, full_name: &str, group_name: &str)
        -> Result<AllowedUser, BotError>;

    async fn create_notification(
        &self,
        recipient: i64,
        content: &str,
    ) -> Result<Notification, BotError>;
    async fn mark_notification_sent(&self, id: Uuid) -> Result<(), BotError>;
}

pub struct PgStore {
    pool: PGPool,
}

impl PgStore {
    pub fn new(pool: PGPool) -> PgStore {
        PgStore { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_group(&self, name: &str) -> Result<Option<Group>, BotError> {
        group::find_by_name(name, &self.pool).await.map_err(storage)
    }

    async fn group_by_id(&self, id: Uuid) -> Result<Option<Group>, BotError> {
        group::get_by_id(id, &self.pool).await.map_err(storage)
    }

    async fn find_or_create_group(&self, name: &str) -> Result<Group, BotError> {
        group::find_or_create(name, &self.pool).await.map_err(storage)
    }

    async fn create_user(
        &self,
        telegram_id: i64,
        full_name: &str,
        group_id: Uuid,
    ) -> Result<User, BotError> {
        let res = user::create(telegram_id, full_name, group_id, &self.pool).await;
        match res {
            Ok(created) => Ok(created),
            Err(err) if is_unique_violation(&err) => Err(BotError::Duplicate),
            Err(err) => Err(storage(err)),
        }
    }

    async fn user_by_telegram(&self, telegram_id: i64) -> Result<Option<User>, BotError> {
        user::get_by_telegram(telegram_id, &self.pool)
            .await
            .map_err(storage)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, BotError> {
        user::get_by_id(id, &self.pool).await.map_err(storage)
    }

    async fn all_users(&self, limit: i64) -> Result<Vec<User>, BotError> {
        user::get_all(limit, &self.pool).await.map_err(storage)
    }

    async fn search_users(&self, query: &str, limit: i64) -> Result<Vec<User>, BotError> {
        user::search(query, limit, &self.pool).await.map_err(storage)
    }

    async fn set_role(&self, telegram_id: i64, role: Role) -> Result<bool, BotError> {
        let res = user::set_role(telegram_id, role.as_db(), &self.pool).await;
        match res {
            Ok(rows) => Ok(rows > 0),
            Err(err) => Err(storage(err)),
        }
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), BotError> {
        user::delete_cascading(id, &self.pool).await.map_err(storage)
    }

    async fn count_users(&self) -> Result<i64, BotError> {
        user::count(&self.pool).await.map_err(storage)
    }

    async fn schedule_for_day(
        &self,
        group_id: Uuid,
        day: Weekday,
        week: WeekParity,
    ) -> Result<Vec<Schedule>, BotError> {
        schedule::for_day(group_id, day.token(), week.number(), &self.pool)
            .await
            .map_err(storage)
    }

    async fn schedule_for_group(&self, group_id: Uuid) -> Result<Vec<Schedule>, BotError> {
        schedule::for_group(group_id, &self.pool).await.map_err(storage)
    }

    async fn insert_schedule_row(&self, row: NewScheduleRow) -> Result<Schedule, BotError> {
        schedule::insert(row, &self.pool).await.map_err(storage)
    }

    async fn insert_semester(&self, semester: NewSemester) -> Result<Semester, BotError> {
        semester::insert(semester, &self.pool).await.map_err(storage)
    }

    async fn current_semester(
        &self,
        group_name: &str,
        today: NaiveDate,
    ) -> Result<Option<Semester>, BotError> {
        semester::current(group_name, today, &self.pool)
            .await
            .map_err(storage)
    }

    async fn create_application(
        &self,
        user_id: Uuid,
        content: &str,
    ) -> Result<Application, BotError> {
        application::create(user_id, content, &self.pool)
            .await
            .map_err(storage)
    }

    async fn applications_all(&self) -> Result<Vec<Application>, BotError> {
        application::get_all(&self.pool).await.map_err(storage)
    }

    async fn applications_for_user(&self, user_id: Uuid) -> Result<Vec<Application>, BotError> {
        application::for_user(user_id, &self.pool).await.map_err(storage)
    }

    async fn application_by_id(&self, id: Uuid) -> Result<Option<Application>, BotError> {
        application::get_by_id(id, &self.pool).await.map_err(storage)
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application, BotError> {
        let res = application::set_status(id, status.as_db(), &self.pool).await;
        match res {
            Ok(Some(updated)) => Ok(updated),
            Ok(None) => Err(BotError::NotFound),
            Err(err) => Err(storage(err)),
        }
    }

    async fn clear_applications(&self) -> Result<u64, BotError> {
        application::clear(&self.pool).await.map_err(storage)
    }

    async fn count_applications(&self) -> Result<i64, BotError> {
        application::count(&self.pool).await.map_err(storage)
    }

    async fn create_event(
        &self,
        title: &str,
        description: &str,
        requirements: &str,
    ) -> Result<Event, BotError> {
        event::create(title, description, requirements, &self.pool)
            .await
            .map_err(storage)
    }

    async fn active_events(&self) -> Result<Vec<Event>, BotError> {
        event::get_active(&self.pool).await.map_err(storage)
    }

    async fn all_events(&self) -> Result<Vec<Event>, BotError> {
        event::get_all(&self.pool).await.map_err(storage)
    }

    async fn event_by_id(&self, id: Uuid) -> Result<Option<Event>, BotError> {
        event::get_by_id(id, &self.pool).await.map_err(storage)
    }

    async fn deactivate_event(&self, id: Uuid) -> Result<bool, BotError> {
        let res = event::deactivate(id, &self.pool).await;
        match res {
            Ok(rows) => Ok(rows > 0),
            Err(err) => Err(storage(err)),
        }
    }

    async fn register_participant(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, BotError> {
        let res = event::register_participant(event_id, user_id, &self.pool).await;
        match res {
            Ok(rows) => Ok(rows > 0),
            // the pair key closes the race between pre-check and insert
            Err(err) if is_unique_violation(&err) => Ok(false),
            Err(err) => Err(storage(err)),
        }
    }

    async fn is_participant(&self, event_id: Uuid, user_id: Uuid) -> Result<bool, BotError> {
        event::is_participant(event_id, user_id, &self.pool)
            .await
            .map_err(storage)
    }

    async fn participants(&self, event_id: Uuid) -> Result<Vec<EventParticipant>, BotError> {
        event::participants(event_id, &self.pool).await.map_err(storage)
    }

    async fn count_events(&self) -> Result<(i64, i64), BotError> {
        event::counts(&self.pool).await.map_err(storage)
    }

    async fn allowlist_enabled(&self) -> Result<bool, BotError> {
        allowed::any(&self.pool).await.map_err(storage)
    }

    async fn consume_allowed(
        &self,
        full_name: &str,
        group_name: &str,
    ) -> Result<bool, BotError> {
        let res = allowed::consume(full_name, group_name, &self.pool).await;
        match res {
            Ok(rows) => Ok(rows > 0),
            Err(err) => Err(storage(err)),
        }
    }

    async fn insert_allowed(
        &self,
        full_name: &str,
        group_name: &str,
    ) -> Result<AllowedUser, BotError> {
        allowed::insert(full_name, group_name, &self.pool)
            .await
            .map_err(storage)
    }

    async fn create_notification(
        &self,
        recipient: i64,
        content: &str,
    ) -> Result<Notification, BotError> {
        notifications::create(recipient, content, &self.pool)
            .await
            .map_err(storage)
    }

    async fn mark_notification_sent(&self, id: Uuid) -> Result<(), BotError> {
        notifications::mark_sent(id, &self.pool).await.map_err(storage)
    }
}
