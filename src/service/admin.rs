use log::{info, warn};
use uuid::Uuid;

use crate::{
    db::Store,
    errors::BotError,
    models::{Role, User},
};

pub async fn stats_text(store: &dyn Store) -> Result<String, BotError> {
    let users = store.count_users().await?;
    let applications = store.count_applications().await?;
    let (events, active_events) = store.count_events().await?;
    Ok(format!(
        "📊 <b>Статистика проекта</b>\n\n👨‍🎓 Зарегистрировано студентов: <b>{}</b>\n✉ Подано заявок: <b>{}</b>\n🎉 Всего мероприятий: <b>{}</b>\n🟢 Активных мероприятий: <b>{}</b>",
        users, applications, events, active_events
    ))
}

pub async fn clear_applications(store: &dyn Store) -> Result<u64, BotError> {
    store.clear_applications().await
}

/// Deletes a user together with their applications and participations.
pub async fn delete_user(store: &dyn Store, id: Uuid) -> Result<User, BotError> {
    let user = match store.user_by_id(id).await? {
        Some(user) => user,
        None => return Err(BotError::NotFound),
    };
    store.delete_user(id).await?;
    Ok(user)
}

pub async fn find_students(
    store: &dyn Store,
    query: &str,
    limit: i64,
) -> Result<Vec<User>, BotError> {
    store.search_users(query, limit).await
}

/// Target is a numeric external id, the role one of the closed set;
/// anything else is a format error for the caller to report.
pub async fn assign_role(
    store: &dyn Store,
    target: &str,
    role_input: &str,
) -> Result<(i64, Role), BotError> {
    let telegram_id: i64 = target.trim().parse().map_err(|_| BotError::Format)?;
    let role = match Role::from_input(role_input) {
        Some(role) => role,
        None => return Err(BotError::Format),
    };
    if store.set_role(telegram_id, role).await? {
        Ok((telegram_id, role))
    } else {
        Err(BotError::NotFound)
    }
}

/// Startup seeding of staff roles from the environment id lists. Users
/// not registered yet are skipped; they get the role once seeded again
/// on the next start.
pub async fn seed_roles(store: &dyn Store, admin_ids: &[i64], dean_ids: &[i64]) {
    for id in dean_ids {
        match store.set_role(*id, Role::Dean).await {
            Ok(true) => info!("seeded dean role for {}", id),
            Ok(false) => {}
            Err(err) => warn!("failed to seed dean role for {}: {}", id, err),
        }
    }
    for id in admin_ids {
        match store.set_role(*id, Role::Admin).await {
            Ok(true) => info!("seeded admin role for {}", id),
            Ok(false) => {}
            Err(err) => warn!("failed to seed admin role for {}: {}", id, err),
        }
    }
}
