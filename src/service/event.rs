use uuid::Uuid;

use crate::{
   db::Store,
   errors::BotError,
   models::{Event, EventParticipant, User},
};

pub async fn create(
   store: &dyn Store,
   title: &str,
   description: &str,
   requirements: Option<&str>,
) -> Result<Event, BotError> {
   store
      .create_event(title, description, requirements.unwrap_or("—"))
      .await
}

/// Soft delete: the active flag flips off, participant history stays.
pub async fn soft_delete(store: &dyn Store, event_id: Uuid) -> Result<(), BotError> {
   if store.deactivate_event(event_id).await? {
      Ok(())
   } else {
      Err(BotError::NotFound)
   }
}

/// Returns false when the user is already registered for the event. The
/// pre-check is advisory; the storage-level pair key decides under
/// concurrent attempts.
pub async fn register(
   store: &dyn Store,
   telegram_id: i64,
   event_id: Uuid,
) -> Result<bool, BotError> {
   let user = match store.user_by_telegram(telegram_id).await? {
      Some(user) => user,
      None => return Err(BotError::NotFound),
   };
   let event = match store.event_by_id(event_id).await? {
      Some(event) => event,
      None => return Err(BotError::NotFound),
   };
   if !event.is_active {
      return Err(BotError::NotFound);
   }
   if store.is_participant(event_id, user.id).await? {
      return Ok(false);
   }
   store.register_participant(event_id, user.id).await
}

pub async fn participants(
   store: &dyn Store,
   event_id: Uuid,
) -> Result<(Event, Vec<(EventParticipant, User)>), BotError> {
   let event = match store.event_by_id(event_id).await? {
      Some(event) => event,
      None => return Err(BotError::NotFound),
   };
   let mut rows = Vec::new();
   for participant in store.participants(event_id).await? {
      if let Some(member) = store.user_by_id(participant.user_id).await? {
         rows.push((participant, member));
      }
   }
   Ok((event, rows))
}
