use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::Store;
use crate::dto::{NewScheduleRow, NewSemester};
use crate::errors::BotError;
use crate::models::{
    AllowedUser, Application, ApplicationStatus, Event, EventParticipant, Group, Notification,
    Role, Schedule, Semester, User, Weekday, WeekParity,
};

/// A mock [Store] implementation for tests.
///
/// The simulated database is the [StoreMockData] structure with vectors of
/// entities, which tests can inspect and modify directly. The interface
/// methods do no privilege checking; setting `next_error` makes the next
/// call return that error instead.
#[derive(Default)]
pub struct StoreMock {
    pub data: Mutex<StoreMockData>,
}

#[derive(Default)]
pub struct StoreMockData {
    pub groups: Vec<Group>,
    pub users: Vec<User>,
    pub schedule: Vec<Schedule>,
    pub semesters: Vec<Semester>,
    pub applications: Vec<Application>,
    pub events: Vec<Event>,
    pub participants: Vec<EventParticipant>,
    pub allowed: Vec<AllowedUser>,
    pub notifications: Vec<Notification>,
    /// If set, the next store call returns this error.
    pub next_error: Option<BotError>,
}

impl StoreMock {
    fn lock(&self) -> Result<MutexGuard<'_, StoreMockData>, BotError> {
        let mut data = self.data.lock().expect("Error while locking mutex.");
        if let Some(err) = data.next_error.take() {
            return Err(err);
        }
        Ok(data)
    }
}

#[async_trait]
impl Store for StoreMock {
    async fn find_group(&self, name: &str) -> Result<Option<Group>, BotError> {
        let data = self.lock()?;
        Ok(data.groups.iter().find(|g| g.name == name).cloned())
    }

    async fn group_by_id(&self, id: Uuid) -> Result<Option<Group>, BotError> {
        let data = self.lock()?;
        Ok(data.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn find_or_create_group(&self, name: &str) -> Result<Group, BotError> {
        let mut data = self.lock()?;
        if let Some(existing) = data.groups.iter().find(|g| g.name == name) {
            return Ok(existing.clone());
        }
        let group = Group {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        data.groups.push(group.clone());
        Ok(group)
    }

    async fn create_user(
        &self,
        telegram_id: i64,
        full_name: &str,
        group_id: Uuid,
    ) -> Result<User, BotError> {
        let mut data = self.lock()?;
        if data.users.iter().any(|u| u.telegram_id == telegram_id) {
            return Err(BotError::Duplicate);
        }
        let user = User {
            id: Uuid::new_v4(),
            telegram_id,
            full_name: full_name.to_string(),
            role: Role::Student.as_db().to_string(),
            group_id: Some(group_id),
        };
        data.users.push(user.clone());
        Ok(user)
    }

    async fn user_by_telegram(&self, telegram_id: i64) -> Result<Option<User>, BotError> {
        let data = self.lock()?;
        Ok(data
            .users
            .iter()
            .find(|u| u.telegram_id == telegram_id)
            .cloned())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, BotError> {
        let data = self.lock()?;
        Ok(data.users.iter().find(|u| u.id == id).cloned())
    }

    async fn all_users(&self, limit: i64) -> Result<Vec<User>, BotError> {
        let data = self.lock()?;
        let mut users = data.users.clone();
        users.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        users.truncate(limit as usize);
        Ok(users)
    }

    async fn search_users(&self, query: &str, limit: i64) -> Result<Vec<User>, BotError> {
        let data = self.lock()?;
        let needle = query.trim().to_lowercase();
        let group_name = query.trim().to_uppercase();
        let as_id: Option<i64> = query.trim().parse().ok();
        let mut found: Vec<User> = data
            .users
            .iter()
            .filter(|u| {
                let in_group = u
                    .group_id
                    .and_then(|gid| data.groups.iter().find(|g| g.id == gid))
                    .map(|g| g.name == group_name)
                    .unwrap_or(false);
                u.full_name.to_lowercase().contains(&needle)
                    || in_group
                    || Some(u.telegram_id) == as_id
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn set_role(&self, telegram_id: i64, role: Role) -> Result<bool, BotError> {
        let mut data = self.lock()?;
        match data.users.iter_mut().find(|u| u.telegram_id == telegram_id) {
            Some(user) => {
                user.role = role.as_db().to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), BotError> {
        let mut data = self.lock()?;
        data.applications.retain(|a| a.user_id != id);
        data.participants.retain(|p| p.user_id != id);
        data.users.retain(|u| u.id != id);
        Ok(())
    }

    async fn count_users(&self) -> Result<i64, BotError> {
        let data = self.lock()?;
        Ok(data.users.len() as i64)
    }

    async fn schedule_for_day(
        &self,
        group_id: Uuid,
        day: Weekday,
        week: WeekParity,
    ) -> Result<Vec<Schedule>, BotError> {
        let data = self.lock()?;
        let mut rows: Vec<Schedule> = data
            .schedule
            .iter()
            .filter(|s| {
                s.group_id == group_id && s.day_of_week == day.token() && s.week == week.number()
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.lesson_time.cmp(&b.lesson_time));
        Ok(rows)
    }

    async fn schedule_for_group(&self, group_id: Uuid) -> Result<Vec<Schedule>, BotError> {
        let data = self.lock()?;
        Ok(data
            .schedule
            .iter()
            .filter(|s| s.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn insert_schedule_row(&self, row: NewScheduleRow) -> Result<Schedule, BotError> {
        let mut data = self.lock()?;
        let entry = Schedule {
            id: Uuid::new_v4(),
            group_id: row.group_id,
            subject: row.subject,
            teacher: row.teacher,
            day_of_week: row.day_of_week.token().to_string(),
            lesson_time: row.lesson_time,
            auditorium: row.auditorium,
            week: row.week.number(),
        };
        data.schedule.push(entry.clone());
        Ok(entry)
    }

    async fn insert_semester(&self, semester: NewSemester) -> Result<Semester, BotError> {
        let mut data = self.lock()?;
        let entry = Semester {
            id: Uuid::new_v4(),
            number: semester.number,
            group_name: semester.group_name,
            start_date: semester.start_date,
            end_date: semester.end_date,
        };
        data.semesters.push(entry.clone());
        Ok(entry)
    }

    async fn current_semester(
        &self,
        group_name: &str,
        today: NaiveDate,
    ) -> Result<Option<Semester>, BotError> {
        let data = self.lock()?;
        Ok(data
            .semesters
            .iter()
            .filter(|s| s.group_name == group_name && s.start_date <= today && s.end_date >= today)
            .max_by_key(|s| s.number)
            .cloned())
    }

    async fn create_application(
        &self,
        user_id: Uuid,
        content: &str,
    ) -> Result<Application, BotError> {
        let mut data = self.lock()?;
        let app = Application {
            id: Uuid::new_v4(),
            user_id,
            content: content.to_string(),
            status: ApplicationStatus::New.as_db().to_string(),
            created_at: Utc::now(),
        };
        data.applications.push(app.clone());
        Ok(app)
    }

    async fn applications_all(&self) -> Result<Vec<Application>, BotError> {
        let data = self.lock()?;
        let mut apps = data.applications.clone();
        apps.sort_by_key(|a| a.created_at);
        Ok(apps)
    }

    async fn applications_for_user(&self, user_id: Uuid) -> Result<Vec<Application>, BotError> {
        let data = self.lock()?;
        let mut apps: Vec<Application> = data
            .applications
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        apps.sort_by_key(|a| a.created_at);
        Ok(apps)
    }

    async fn application_by_id(&self, id: Uuid) -> Result<Option<Application>, BotError> {
        let data = self.lock()?;
        Ok(data.applications.iter().find(|a| a.id == id).cloned())
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application, BotError> {
        let mut data = self.lock()?;
        match data.applications.iter_mut().find(|a| a.id == id) {
            Some(app) => {
                app.status = status.as_db().to_string();
                Ok(app.clone())
            }
            None => Err(BotError::NotFound),
        }
    }

    async fn clear_applications(&self) -> Result<u64, BotError> {
        let mut data = self.lock()?;
        let deleted = data.applications.len() as u64;
        data.applications.clear();
        Ok(deleted)
    }

    async fn count_applications(&self) -> Result<i64, BotError> {
        let data = self.lock()?;
        Ok(data.applications.len() as i64)
    }

    async fn create_event(
        &self,
        title: &str,
        description: &str,
        requirements: &str,
    ) -> Result<Event, BotError> {
        let mut data = self.lock()?;
        let event = Event {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.to_string(),
            requirements: requirements.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        data.events.push(event.clone());
        Ok(event)
    }

    async fn active_events(&self) -> Result<Vec<Event>, BotError> {
        let data = self.lock()?;
        let mut events: Vec<Event> = data.events.iter().filter(|e| e.is_active).cloned().collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn all_events(&self) -> Result<Vec<Event>, BotError> {
        let data = self.lock()?;
        let mut events = data.events.clone();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn event_by_id(&self, id: Uuid) -> Result<Option<Event>, BotError> {
        let data = self.lock()?;
        Ok(data.events.iter().find(|e| e.id == id).cloned())
    }

    async fn deactivate_event(&self, id: Uuid) -> Result<bool, BotError> {
        let mut data = self.lock()?;
        match data.events.iter_mut().find(|e| e.id == id) {
            Some(event) => {
                event.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn register_participant(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, BotError> {
        // check and insert under one lock, like the storage-level pair key
        let mut data = self.lock()?;
        if data
            .participants
            .iter()
            .any(|p| p.event_id == event_id && p.user_id == user_id)
        {
            return Ok(false);
        }
        data.participants.push(EventParticipant {
            event_id,
            user_id,
            registered_at: Utc::now(),
        });
        Ok(true)
    }

    async fn is_participant(&self, event_id: Uuid, user_id: Uuid) -> Result<bool, BotError> {
        let data = self.lock()?;
        Ok(data
            .participants
            .iter()
            .any(|p| p.event_id == event_id && p.user_id == user_id))
    }

    async fn participants(&self, event_id: Uuid) -> Result<Vec<EventParticipant>, BotError> {
        let data = self.lock()?;
        let mut rows: Vec<EventParticipant> = data
            .participants
            .iter()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.registered_at);
        Ok(rows)
    }

    async fn count_events(&self) -> Result<(i64, i64), BotError> {
        let data = self.lock()?;
        let total = data.events.len() as i64;
        let active = data.events.iter().filter(|e| e.is_active).count() as i64;
        Ok((total, active))
    }

    async fn allowlist_enabled(&self) -> Result<bool, BotError> {
        let data = self.lock()?;
        Ok(!data.allowed.is_empty())
    }

    async fn consume_allowed(
        &self,
        full_name: &str,
        group_name: &str,
    ) -> Result<bool, BotError> {
        let mut data = self.lock()?;
        match data
            .allowed
            .iter_mut()
            .find(|a| a.full_name == full_name && a.group_name == group_name && !a.used)
        {
            Some(entry) => {
                entry.used = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_allowed(
        &self,
        full_name: &str,
        group_name: &str,
    ) -> Result<AllowedUser, BotError> {
        let mut data = self.lock()?;
        let entry = AllowedUser {
            id: Uuid::new_v4(),
            full_name: full_name.to_string(),
            group_name: group_name.to_string(),
            used: false,
        };
        data.allowed.push(entry.clone());
        Ok(entry)
    }

    async fn create_notification(
        &self,
        recipient: i64,
        content: &str,
    ) -> Result<Notification, BotError> {
        let mut data = self.lock()?;
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient,
            content: content.to_string(),
            created_at: Utc::now(),
            sent_at: None,
        };
        data.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn mark_notification_sent(&self, id: Uuid) -> Result<(), BotError> {
        let mut data = self.lock()?;
        if let Some(notification) = data.notifications.iter_mut().find(|n| n.id == id) {
            notification.sent_at = Some(Utc::now());
        }
        Ok(())
    }
}
