use crate::{db::Store, errors::BotError, models::User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIdentity {
    pub full_name: String,
    pub group_name: String,
}

/// Splits free text into a three-token full name and the remaining
/// tokens joined as the group name (multi-token group codes supported).
pub fn parse_identity(text: &str) -> Result<ParsedIdentity, BotError> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(BotError::Format);
    }
    Ok(ParsedIdentity {
        full_name: parts[..3].join(" "),
        group_name: parts[3..].join(" "),
    })
}

/// Group names are case-insensitively unique; the canonical form is
/// upper-case.
pub fn normalize_group_name(raw: &str) -> String {
    raw.to_uppercase()
}

pub async fn register(
    store: &dyn Store,
    telegram_id: i64,
    text: &str,
) -> Result<User, BotError> {
    let parsed = parse_identity(text)?;
    // an already registered identity fails distinctly from the allow-list
    if store.user_by_telegram(telegram_id).await?.is_some() {
        return Err(BotError::Duplicate);
    }
    let group_name = normalize_group_name(&parsed.group_name);
    if store.allowlist_enabled().await? {
        if !store.consume_allowed(&parsed.full_name, &group_name).await? {
            return Err(BotError::NotAllowed);
        }
    }
    let group = store.find_or_create_group(&group_name).await?;
    let user = store
        .create_user(telegram_id, &parsed.full_name, group.id)
        .await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store_mock::StoreMock;

    #[test]
    fn parses_name_and_group() {
        let parsed = parse_identity("Иванов Иван Иванович 21-СПО-ИСиП-02").unwrap();
        assert_eq!(parsed.full_name, "Иванов Иван Иванович");
        assert_eq!(parsed.group_name, "21-СПО-ИСиП-02");
    }

    #[test]
    fn supports_multi_token_group_codes() {
        let parsed = parse_identity("Петров Пётр Петрович 21 СПО 02").unwrap();
        assert_eq!(parsed.full_name, "Петров Пётр Петрович");
        assert_eq!(parsed.group_name, "21 СПО 02");
    }

    #[test]
    fn rejects_short_input() {
        assert!(matches!(
            parse_identity("Иванов Иван Иванович"),
            Err(BotError::Format)
        ));
        assert!(matches!(parse_identity(""), Err(BotError::Format)));
    }

    #[actix_rt::test]
    async fn registers_and_links_group() {
        let store = StoreMock::default();
        let user = register(&store, 100, "Иванов Иван Иванович 21-СПО-ИСиП-02")
            .await
            .unwrap();
        assert_eq!(user.full_name, "Иванов Иван Иванович");

        let data = store.data.lock().unwrap();
        assert_eq!(data.groups.len(), 1);
        // stored group name is the normalized upper-case form
        assert_eq!(data.groups[0].name, "21-СПО-ИСИП-02");
        assert_eq!(data.users[0].group_id, Some(data.groups[0].id));
    }

    #[actix_rt::test]
    async fn second_registration_is_a_duplicate() {
        let store = StoreMock::default();
        register(&store, 100, "Иванов Иван Иванович 21-СПО-ИСиП-02")
            .await
            .unwrap();
        let second = register(&store, 100, "Иванов Иван Иванович 21-СПО-ИСиП-02").await;
        assert!(matches!(second, Err(BotError::Duplicate)));
        assert_eq!(store.data.lock().unwrap().users.len(), 1);
    }

    #[actix_rt::test]
    async fn group_names_are_case_insensitively_unique() {
        let store = StoreMock::default();
        register(&store, 100, "Иванов Иван Иванович 21-спо").await.unwrap();
        register(&store, 200, "Петров Пётр Петрович 21-СПО").await.unwrap();
        assert_eq!(store.data.lock().unwrap().groups.len(), 1);
    }

    #[actix_rt::test]
    async fn allow_list_entry_is_consumed_exactly_once() {
        let store = StoreMock::default();
        store
            .insert_allowed("Иванов Иван Иванович", "21-СПО")
            .await
            .unwrap();

        register(&store, 100, "Иванов Иван Иванович 21-СПО")
            .await
            .unwrap();
        assert!(store.data.lock().unwrap().allowed[0].used);

        // the record is already consumed, so a different identity with the
        // same name fails with the allow-list rejection
        let again = register(&store, 200, "Иванов Иван Иванович 21-СПО").await;
        assert!(matches!(again, Err(BotError::NotAllowed)));
    }

    #[actix_rt::test]
    async fn unlisted_identity_is_rejected_when_gate_is_on() {
        let store = StoreMock::default();
        store
            .insert_allowed("Иванов Иван Иванович", "21-СПО")
            .await
            .unwrap();
        let res = register(&store, 300, "Сидоров Сидор Сидорович 21-СПО").await;
        assert!(matches!(res, Err(BotError::NotAllowed)));
        assert!(store.data.lock().unwrap().users.is_empty());
    }
}
