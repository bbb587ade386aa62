use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, serde::Serialize, serde::Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, FromRow, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub id: Uuid,
    pub telegram_id: i64,
    pub full_name: String,
    pub role: String,
    pub group_id: Option<Uuid>,
}

impl User {
    pub fn role(&self) -> Role {
        Role::from_db(&self.role)
    }
}

#[derive(Debug, Clone, FromRow, serde::Serialize, serde::Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub group_id: Uuid,
    pub subject: String,
    pub teacher: String,
    pub day_of_week: String,
    pub lesson_time: String,
    pub auditorium: String,
    pub week: i16,
}

impl Schedule {
    pub fn weekday(&self) -> Option<Weekday> {
        Weekday::from_token(&self.day_of_week)
    }

    pub fn parity(&self) -> WeekParity {
        WeekParity::from_number(self.week).unwrap_or(WeekParity::First)
    }
}

#[derive(Debug, Clone, FromRow, serde::Serialize, serde::Deserialize)]
pub struct Semester {
    pub id: Uuid,
    pub number: i32,
    pub group_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, FromRow, serde::Serialize, serde::Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Application {
    pub fn status(&self) -> ApplicationStatus {
        ApplicationStatus::from_db(&self.status).unwrap_or(ApplicationStatus::New)
    }
}

#[derive(Debug, Clone, FromRow, serde::Serialize, serde::Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, serde::Serialize, serde::Deserialize)]
pub struct EventParticipant {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, serde::Serialize, serde::Deserialize)]
pub struct AllowedUser {
    pub id: Uuid,
    pub full_name: String,
    pub group_name: String,
    pub used: bool,
}

#[derive(Debug, Clone, FromRow, serde::Serialize, serde::Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Role {
    Student,
    Dean,
    Admin,
}

impl Role {
    /// Unknown or missing role strings degrade to the student role.
    pub fn from_db(raw: &str) -> Role {
        match raw {
            "dean" => Role::Dean,
            "admin" => Role::Admin,
            _ => Role::Student,
        }
    }

    pub fn from_input(raw: &str) -> Option<Role> {
        match raw.trim().to_lowercase().as_str() {
            "student" | "студент" => Some(Role::Student),
            "dean" | "декан" | "деканат" => Some(Role::Dean),
            "admin" | "админ" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Dean => "dean",
            Role::Admin => "admin",
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Dean | Role::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ApplicationStatus {
    New,
    InProgress,
    Accepted,
    Rejected,
    Done,
}

impl ApplicationStatus {
    pub fn from_db(raw: &str) -> Option<ApplicationStatus> {
        match raw {
            "new" => Some(ApplicationStatus::New),
            "in_progress" => Some(ApplicationStatus::InProgress),
            "accepted" => Some(ApplicationStatus::Accepted),
            "rejected" => Some(ApplicationStatus::Rejected),
            "done" => Some(ApplicationStatus::Done),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            ApplicationStatus::New => "new",
            ApplicationStatus::InProgress => "in_progress",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Done => "done",
        }
    }

    /// Action tokens carried in the staff status-change intents.
    pub fn from_action(action: &str) -> Option<ApplicationStatus> {
        match action {
            "accept" => Some(ApplicationStatus::Accepted),
            "process" => Some(ApplicationStatus::InProgress),
            "reject" => Some(ApplicationStatus::Rejected),
            "done" => Some(ApplicationStatus::Done),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ApplicationStatus::New => "Новая",
            ApplicationStatus::InProgress => "В процессе",
            ApplicationStatus::Accepted => "Принята",
            ApplicationStatus::Rejected => "Отклонена",
            ApplicationStatus::Done => "Выполнена",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn from_token(token: &str) -> Option<Weekday> {
        match token {
            "MONDAY" => Some(Weekday::Monday),
            "TUESDAY" => Some(Weekday::Tuesday),
            "WEDNESDAY" => Some(Weekday::Wednesday),
            "THURSDAY" => Some(Weekday::Thursday),
            "FRIDAY" => Some(Weekday::Friday),
            "SATURDAY" => Some(Weekday::Saturday),
            "SUNDAY" => Some(Weekday::Sunday),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Weekday::Monday => "MONDAY",
            Weekday::Tuesday => "TUESDAY",
            Weekday::Wednesday => "WEDNESDAY",
            Weekday::Thursday => "THURSDAY",
            Weekday::Friday => "FRIDAY",
            Weekday::Saturday => "SATURDAY",
            Weekday::Sunday => "SUNDAY",
        }
    }

    pub fn name_ru(&self) -> &'static str {
        match self {
            Weekday::Monday => "Понедельник",
            Weekday::Tuesday => "Вторник",
            Weekday::Wednesday => "Среда",
            Weekday::Thursday => "Четверг",
            Weekday::Friday => "Пятница",
            Weekday::Saturday => "Суббота",
            Weekday::Sunday => "Воскресенье",
        }
    }

    pub fn from_chrono(day: chrono::Weekday) -> Weekday {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum WeekParity {
    First,
    Second,
}

impl WeekParity {
    /// Fixed two-cycle over the ISO calendar week: odd week number is
    /// the first week, even the second.
    pub fn of(date: NaiveDate) -> WeekParity {
        if date.iso_week().week() % 2 == 1 {
            WeekParity::First
        } else {
            WeekParity::Second
        }
    }

    pub fn from_number(n: i16) -> Option<WeekParity> {
        match n {
            1 => Some(WeekParity::First),
            2 => Some(WeekParity::Second),
            _ => None,
        }
    }

    pub fn number(&self) -> i16 {
        match self {
            WeekParity::First => 1,
            WeekParity::Second => 2,
        }
    }

    pub fn label_ru(&self) -> &'static str {
        match self {
            WeekParity::First => "Неделя 1",
            WeekParity::Second => "Неделя 2",
        }
    }
}
