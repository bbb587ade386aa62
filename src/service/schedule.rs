use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use log::warn;

use crate::{
    db::Store,
    errors::BotError,
    models::{Schedule, Weekday, WeekParity},
};

/// Chat messages above this size are delivered in several parts.
pub const MESSAGE_LIMIT: usize = 4000;

/// parity -> weekday -> periods, ordered Monday..Sunday within a week.
pub type TwoWeeksPlan = BTreeMap<WeekParity, BTreeMap<Weekday, Vec<Schedule>>>;

/// Periods of the given date for the group, resolved through the fixed
/// weekday/parity vocabulary. An empty list means "no classes" and is
/// distinct from an unknown group, which is a not-found error.
pub async fn today(
    store: &dyn Store,
    group_name: &str,
    date: NaiveDate,
) -> Result<Vec<Schedule>, BotError> {
    let group = match store.find_group(group_name).await? {
        Some(group) => group,
        None => return Err(BotError::NotFound),
    };
    let day = Weekday::from_chrono(date.weekday());
    let parity = WeekParity::of(date);
    store.schedule_for_day(group.id, day, parity).await
}

pub async fn two_weeks(store: &dyn Store, group_name: &str) -> Result<TwoWeeksPlan, BotError> {
    let group = match store.find_group(group_name).await? {
        Some(group) => group,
        None => return Err(BotError::NotFound),
    };
    let rows = store.schedule_for_group(group.id).await?;
    Ok(bucket_two_weeks(rows))
}

/// Buckets raw rows by (parity, weekday); weekday order inside a week is
/// Monday(1)..Sunday(7) no matter how storage returned the rows.
pub fn bucket_two_weeks(rows: Vec<Schedule>) -> TwoWeeksPlan {
    let mut plan: TwoWeeksPlan = BTreeMap::new();
    for row in rows {
        let day = match row.weekday() {
            Some(day) => day,
            None => {
                warn!("schedule row {} has unknown day token {}", row.id, row.day_of_week);
                continue;
            }
        };
        plan.entry(row.parity())
            .or_default()
            .entry(day)
            .or_default()
            .push(row);
    }
    for days in plan.values_mut() {
        for periods in days.values_mut() {
            periods.sort_by(|a, b| a.lesson_time.cmp(&b.lesson_time));
        }
    }
    plan
}

fn render_period(row: &Schedule) -> String {
    format!(
        "🕒 {} - {}\n   🏫 {} | 👨‍🏫 {}\n",
        row.lesson_time, row.subject, row.auditorium, row.teacher
    )
}

pub fn render_day(rows: &[Schedule]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&render_period(row));
    }
    out
}

pub fn render_two_weeks(plan: &TwoWeeksPlan) -> String {
    let mut out = String::new();
    for (parity, days) in plan {
        out.push_str(&format!("\n📌 {}:\n", parity.label_ru()));
        for (day, periods) in days {
            out.push_str(&format!("\n📅 {}:\n", day.name_ru()));
            for row in periods {
                out.push_str(&render_period(row));
            }
        }
    }
    out
}

/// Splits text into parts of at most `limit` characters, preferring line
/// boundaries; a single overlong line is split by characters.
pub fn chunk_message(text: &str, limit: usize) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > limit && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len > limit {
            for ch in line.chars() {
                if current_len == limit {
                    parts.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                current.push(ch);
                current_len += 1;
            }
        } else {
            current.push_str(line);
            current_len += line_len;
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}
