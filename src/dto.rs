use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Weekday, WeekParity};

/// One inbound event from the chat transport: either free text typed by
/// the user or a named intent selected from a choice keyboard.
#[derive(Debug, Deserialize, Clone)]
pub struct InboundUpdate {
    pub sender_id: i64,
    pub chat_id: i64,
    pub text: Option<String>,
    pub intent: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub intent: String,
}

impl Choice {
    pub fn new(label: &str, intent: impl Into<String>) -> Choice {
        Choice {
            label: label.to_string(),
            intent: intent.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplyAction {
    DeleteMessage,
    EditMessage,
}

/// Rendering-agnostic outbound payload; the transport decides how to
/// deliver text, keyboards and terminal actions.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Reply {
    pub chat_id: i64,
    pub text: String,
    pub choices: Vec<Choice>,
    pub action: Option<ReplyAction>,
}

impl Reply {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Reply {
        Reply {
            chat_id,
            text: text.into(),
            choices: Vec::new(),
            action: None,
        }
    }

    /// Reply that rewrites the message the user interacted with.
    pub fn edit(chat_id: i64, text: impl Into<String>) -> Reply {
        Reply {
            chat_id,
            text: text.into(),
            choices: Vec::new(),
            action: Some(ReplyAction::EditMessage),
        }
    }

    /// Terminal action asking the transport to remove the message the
    /// user interacted with.
    pub fn delete(chat_id: i64) -> Reply {
        Reply {
            chat_id,
            text: String::new(),
            choices: Vec::new(),
            action: Some(ReplyAction::DeleteMessage),
        }
    }

    pub fn with_choices(mut self, choices: Vec<Choice>) -> Reply {
        self.choices = choices;
        self
    }
}

/// Schedule row as delivered by the bulk import job.
#[derive(Debug, Deserialize, Clone)]
pub struct NewScheduleRow {
    pub group_id: Uuid,
    pub subject: String,
    pub teacher: String,
    pub day_of_week: Weekday,
    pub lesson_time: String,
    pub auditorium: String,
    pub week: WeekParity,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewSemester {
    pub number: i32,
    pub group_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
