use log::warn;
use uuid::Uuid;

use crate::{
    db::Store,
    dto::Reply,
    errors::BotError,
    models::{Application, ApplicationStatus},
};

pub async fn submit(
    store: &dyn Store,
    telegram_id: i64,
    subject: &str,
    description: Option<&str>,
) -> Result<Application, BotError> {
    let user = match store.user_by_telegram(telegram_id).await? {
        Some(user) => user,
        None => return Err(BotError::NotFound),
    };
    let group_label = match user.group_id {
        Some(group_id) => store
            .group_by_id(group_id)
            .await?
            .map(|g| g.name)
            .unwrap_or_else(|| "Группа не указана".to_string()),
        None => "Группа не указана".to_string(),
    };
    let content = format!(
        "📩 <b>Новая заявка от студента</b>\n👤 <b>ФИО:</b> {}\n🏫 <b>Группа:</b> {}\n\n📌 <b>Тема:</b> {}\n📝 <b>Описание:</b> {}",
        user.full_name,
        group_label,
        subject,
        description.unwrap_or("—")
    );
    store.create_application(user.id, &content).await
}

/// Relabels the application and notifies its owner. The notification is
/// fire-and-forget: a failure to persist or address it never rolls back
/// the status change.
pub async fn set_status(
    store: &dyn Store,
    id: Uuid,
    status: ApplicationStatus,
) -> Result<(Application, Option<Reply>), BotError> {
    let app = store.set_application_status(id, status).await?;
    let notification = notify_owner(store, &app, status).await;
    Ok((app, notification))
}

async fn notify_owner(
    store: &dyn Store,
    app: &Application,
    status: ApplicationStatus,
) -> Option<Reply> {
    let owner = match store.user_by_id(app.user_id).await {
        Ok(Some(owner)) => owner,
        Ok(None) => return None,
        Err(err) => {
            warn!("owner lookup failed for application {}: {}", app.id, err);
            return None;
        }
    };
    let text = format!(
        "📢 Ваша заявка обновлена!\n\n{}\n\n📊 Новый статус: <b>{}</b>",
        app.content, status
    );
    match store.create_notification(owner.telegram_id, &text).await {
        Ok(notification) => {
            if let Err(err) = store.mark_notification_sent(notification.id).await {
                warn!("failed to mark notification {} sent: {}", notification.id, err);
            }
        }
        Err(err) => {
            warn!(
                "failed to persist notification for {}: {}",
                owner.telegram_id, err
            );
        }
    }
    Some(Reply::text(owner.telegram_id, text))
}
