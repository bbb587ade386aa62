use std::sync::Arc;

use chrono::Local;
use uuid::Uuid;

use crate::{
    db::Store,
    dto::{Choice, InboundUpdate, Reply},
    errors::BotError,
    models::{ApplicationStatus, Role, User},
    service::{
        admin, application, event,
        forms::{Advance, FlowKind, FormState, SessionStore},
        registration, schedule,
    },
};

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: SessionStore,
}

/// Entry point for one inbound event. Never fails outward: every error
/// is folded into a user-facing reply, isolating the failure to this
/// single event.
pub async fn dispatch(state: &AppState, update: InboundUpdate) -> Vec<Reply> {
    let chat_id = update.chat_id;
    match route(state, &update).await {
        Ok(replies) => replies,
        Err(err) => vec![Reply::text(chat_id, error_text(&err))],
    }
}

fn error_text(err: &BotError) -> &'static str {
    match err {
        BotError::Format => "❌ Неверный формат ввода. Попробуйте ещё раз.",
        BotError::NotAllowed => "❌ Вас нет в списке допущенных к регистрации. Обратитесь в деканат.",
        BotError::Duplicate => "❌ Запись уже существует.",
        BotError::NotFound => "❌ Не найдено.",
        BotError::Persistence => "❌ Произошла ошибка. Попробуйте позже.",
    }
}

async fn route(state: &AppState, update: &InboundUpdate) -> Result<Vec<Reply>, BotError> {
    if let Some(intent) = update.intent.as_deref() {
        return on_intent(state, update, intent).await;
    }
    if let Some(text) = update.text.as_deref() {
        let text = text.trim();
        if text == "/start" {
            return on_start(state, update).await;
        }
        if text == "/admin" {
            return on_intent(state, update, "admin_panel").await;
        }
        return on_text(state, update, text).await;
    }
    Ok(Vec::new())
}

fn student_menu(chat_id: i64) -> Reply {
    Reply::text(chat_id, "📋 Главное меню").with_choices(vec![
        Choice::new("📅 Сегодня", "today_schedule"),
        Choice::new("📅 Расписание на 2 недели", "two_weeks_schedule"),
        Choice::new("🎉 Мероприятия", "view_events"),
        Choice::new("✉ Заявка в деканат", "dean_application"),
        Choice::new("📥 Мои заявки", "my_requests"),
        Choice::new("🗑 Удалить аккаунт", "delete_account"),
    ])
}

fn staff_menu(chat_id: i64) -> Reply {
    Reply::text(chat_id, "📋 Главное меню (Деканат)").with_choices(vec![
        Choice::new("📥 Заявки студентов", "view_requests"),
        Choice::new("📣 Добавить мероприятие", "add_event"),
        Choice::new("🎉 Мероприятия", "admin_events"),
    ])
}

fn admin_menu(chat_id: i64) -> Reply {
    Reply::text(chat_id, "🛠 <b>Админ-панель</b>").with_choices(vec![
        Choice::new("📋 Пользователи", "admin_users"),
        Choice::new("🔍 Поиск студента", "admin_find_user"),
        Choice::new("🎓 Назначить роль", "assign_role"),
        Choice::new("📊 Отчёты", "admin_stats"),
        Choice::new("🧹 Очистить заявки", "admin_clear_apps"),
    ])
}

/// Role-routed menu selection: a pure, side-effect-free branch on the
/// stored role, re-evaluated on every session start.
pub fn menu_for(role: Role, chat_id: i64) -> Reply {
    match role {
        Role::Student => student_menu(chat_id),
        Role::Dean => staff_menu(chat_id),
        Role::Admin => {
            let mut menu = staff_menu(chat_id);
            menu.choices.push(Choice::new("🛠 Админ-панель", "admin_panel"));
            menu
        }
    }
}

async fn on_start(state: &AppState, update: &InboundUpdate) -> Result<Vec<Reply>, BotError> {
    // a session start always discards an in-flight form
    state.sessions.clear(update.sender_id);
    match state.store.user_by_telegram(update.sender_id).await? {
        Some(user) => Ok(vec![
            Reply::text(update.chat_id, format!("С возвращением, {}!", user.full_name)),
            menu_for(user.role(), update.chat_id),
        ]),
        None => Ok(vec![Reply::text(
            update.chat_id,
            "Введите ваше <b>ФИО и группу</b> в формате:\n<i>Иванов Иван Иванович 21-СПО-ИСиП-02</i>",
        )]),
    }
}

async fn on_text(
    state: &AppState,
    update: &InboundUpdate,
    text: &str,
) -> Result<Vec<Reply>, BotError> {
    if state.sessions.in_flight(update.sender_id).is_some() {
        return on_form_input(state, update, text).await;
    }
    match state.store.user_by_telegram(update.sender_id).await? {
        // stray text outside any flow is ignored
        Some(_) => Ok(Vec::new()),
        None => on_register(state, update, text).await,
    }
}

async fn on_register(
    state: &AppState,
    update: &InboundUpdate,
    text: &str,
) -> Result<Vec<Reply>, BotError> {
    let chat_id = update.chat_id;
    match registration::register(state.store.as_ref(), update.sender_id, text).await {
        Ok(user) => {
            let group_label = group_label(state.store.as_ref(), &user).await?;
            Ok(vec![
                Reply::text(
                    chat_id,
                    format!(
                        "✅ Регистрация успешна!\nФИО: {}\nГруппа: {}",
                        user.full_name, group_label
                    ),
                ),
                student_menu(chat_id),
            ])
        }
        Err(BotError::Format) => Ok(vec![Reply::text(
            chat_id,
            "❌ Неверный формат. Введите ФИО и группу.\n\nПример:\n<b>Иванов Иван Иванович 21-СПО-ИСиП-02</b>",
        )]),
        Err(BotError::Duplicate) => Ok(vec![Reply::text(
            chat_id,
            "❌ Ошибка регистрации. Возможно, вы уже зарегистрированы.",
        )]),
        Err(err) => Err(err),
    }
}

async fn on_form_input(
    state: &AppState,
    update: &InboundUpdate,
    text: &str,
) -> Result<Vec<Reply>, BotError> {
    match state.sessions.advance(update.sender_id, text) {
        Some(Advance::Prompt(prompt)) => Ok(vec![Reply::text(update.chat_id, prompt)]),
        Some(Advance::Complete(form)) => commit_form(state, update, form).await,
        None => Ok(Vec::new()),
    }
}

async fn commit_form(
    state: &AppState,
    update: &InboundUpdate,
    form: FormState,
) -> Result<Vec<Reply>, BotError> {
    let store = state.store.as_ref();
    let chat_id = update.chat_id;
    match form.flow {
        FlowKind::Application => {
            application::submit(
                store,
                update.sender_id,
                form.required("subject"),
                form.value("description"),
            )
            .await?;
            Ok(vec![
                Reply::text(chat_id, "✅ Ваша заявка была отправлена в деканат."),
                student_menu(chat_id),
            ])
        }
        FlowKind::EventCreation => {
            event::create(
                store,
                form.required("title"),
                form.required("description"),
                form.value("requirements"),
            )
            .await?;
            let menu = sender_menu(state, update).await?;
            Ok(vec![
                Reply::text(chat_id, "✅ Мероприятие успешно создано и доступно студентам."),
                menu,
            ])
        }
        FlowKind::RoleAssign => {
            match admin::assign_role(store, form.required("target"), form.required("role")).await {
                Ok((telegram_id, role)) => Ok(vec![Reply::text(
                    chat_id,
                    format!("✅ Роль пользователя {} обновлена: {}", telegram_id, role.as_db()),
                )]),
                Err(BotError::Format) => Ok(vec![Reply::text(
                    chat_id,
                    "❌ Неверный формат. Нужен числовой Telegram ID и роль student / dean / admin.",
                )]),
                Err(BotError::NotFound) => {
                    Ok(vec![Reply::text(chat_id, "❌ Пользователь не найден.")])
                }
                Err(err) => Err(err),
            }
        }
        FlowKind::FindStudent => {
            let found = admin::find_students(store, form.required("query"), 10).await?;
            if found.is_empty() {
                return Ok(vec![Reply::text(chat_id, "❌ Пользователь не найден.")]);
            }
            let mut replies = Vec::new();
            for user in &found {
                replies.push(user_card(store, user, chat_id).await?);
            }
            Ok(replies)
        }
    }
}

async fn sender_menu(state: &AppState, update: &InboundUpdate) -> Result<Reply, BotError> {
    Ok(match state.store.user_by_telegram(update.sender_id).await? {
        Some(user) => menu_for(user.role(), update.chat_id),
        None => student_menu(update.chat_id),
    })
}

async fn on_intent(
    state: &AppState,
    update: &InboundUpdate,
    intent: &str,
) -> Result<Vec<Reply>, BotError> {
    let store = state.store.as_ref();
    let sender = update.sender_id;
    let chat_id = update.chat_id;
    // every top-level command discards a stale in-flight form
    state.sessions.clear(sender);

    if intent == "start" {
        return on_start(state, update).await;
    }

    let user = match store.user_by_telegram(sender).await? {
        Some(user) => user,
        None => {
            return Ok(vec![Reply::text(
                chat_id,
                "❌ Сначала зарегистрируйтесь: отправьте /start.",
            )])
        }
    };
    let role = user.role();

    match intent {
        "today_schedule" => on_today(state, &user, chat_id).await,
        "two_weeks_schedule" => on_two_weeks(state, &user, chat_id).await,
        "view_events" => on_view_events(state, &user, chat_id).await,
        "dean_application" => Ok(vec![Reply::edit(
            chat_id,
            state.sessions.begin(sender, FlowKind::Application),
        )]),
        "my_requests" => on_my_requests(state, &user, chat_id).await,
        "delete_account" => Ok(vec![Reply::edit(
            chat_id,
            "Вы уверены, что хотите удалить аккаунт?",
        )
        .with_choices(vec![
            Choice::new("✅ Подтвердить", "confirm_delete"),
            Choice::new("❌ Отмена", "cancel_delete"),
        ])]),
        "confirm_delete" => {
            store.delete_user(user.id).await?;
            Ok(vec![Reply::edit(chat_id, "✅ Ваш аккаунт был удалён.")])
        }
        "cancel_delete" => Ok(vec![
            Reply::edit(chat_id, "❌ Удаление отменено."),
            menu_for(role, chat_id),
        ]),
        "view_requests" => {
            if !role.is_staff() {
                return Ok(denied(chat_id));
            }
            on_view_requests(state, &user, chat_id).await
        }
        "add_event" => {
            if !role.is_staff() {
                return Ok(denied(chat_id));
            }
            Ok(vec![Reply::edit(
                chat_id,
                state.sessions.begin(sender, FlowKind::EventCreation),
            )])
        }
        "admin_events" => {
            if !role.is_staff() {
                return Ok(denied(chat_id));
            }
            on_admin_events(state, &user, chat_id).await
        }
        "admin_panel" => {
            if role != Role::Admin {
                return Ok(denied(chat_id));
            }
            Ok(vec![admin_menu(chat_id)])
        }
        "assign_role" => {
            if role != Role::Admin {
                return Ok(denied(chat_id));
            }
            Ok(vec![Reply::edit(
                chat_id,
                state.sessions.begin(sender, FlowKind::RoleAssign),
            )])
        }
        "admin_users" => {
            if role != Role::Admin {
                return Ok(denied(chat_id));
            }
            on_admin_users(state, chat_id).await
        }
        "admin_find_user" => {
            if role != Role::Admin {
                return Ok(denied(chat_id));
            }
            Ok(vec![Reply::edit(
                chat_id,
                state.sessions.begin(sender, FlowKind::FindStudent),
            )])
        }
        "admin_stats" => {
            if role != Role::Admin {
                return Ok(denied(chat_id));
            }
            Ok(vec![Reply::text(chat_id, admin::stats_text(store).await?)])
        }
        "admin_clear_apps" => {
            if role != Role::Admin {
                return Ok(denied(chat_id));
            }
            Ok(vec![Reply::text(
                chat_id,
                "⚠ Вы действительно хотите удалить <b>ВСЕ</b> заявки?",
            )
            .with_choices(vec![
                Choice::new("✅ Подтвердить", "admin_clear_confirm"),
                Choice::new("❌ Отмена", "admin_clear_cancel"),
            ])])
        }
        "admin_clear_confirm" => {
            if role != Role::Admin {
                return Ok(denied(chat_id));
            }
            let deleted = admin::clear_applications(store).await?;
            Ok(vec![
                Reply::text(chat_id, format!("✅ Удалено заявок: {}", deleted)),
                admin_menu(chat_id),
            ])
        }
        "admin_clear_cancel" => {
            if role != Role::Admin {
                return Ok(denied(chat_id));
            }
            Ok(vec![
                Reply::text(chat_id, "Очистка отменена."),
                admin_menu(chat_id),
            ])
        }
        _ => on_parameterized(state, &user, chat_id, intent).await,
    }
}

async fn on_parameterized(
    state: &AppState,
    user: &User,
    chat_id: i64,
    intent: &str,
) -> Result<Vec<Reply>, BotError> {
    let store = state.store.as_ref();
    let role = user.role();
    if let Some(rest) = intent.strip_prefix("status_") {
        if !role.is_staff() {
            return Ok(denied(chat_id));
        }
        let (action, raw_id) = match rest.split_once('_') {
            Some(parts) => parts,
            None => return Err(BotError::Format),
        };
        let status = match ApplicationStatus::from_action(action) {
            Some(status) => status,
            None => return Err(BotError::Format),
        };
        let (app, notification) = application::set_status(store, parse_id(raw_id)?, status).await?;
        let mut replies = vec![Reply::text(
            chat_id,
            format!("✅ Статус изменён на «{}»", app.status()),
        )];
        replies.extend(notification);
        return Ok(replies);
    }
    if let Some(raw_id) = intent.strip_prefix("register_event_") {
        return match event::register(store, user.telegram_id, parse_id(raw_id)?).await? {
            true => Ok(vec![Reply::text(chat_id, "✅ Вы успешно записались!")]),
            false => Ok(vec![Reply::text(chat_id, "Вы уже записаны на это мероприятие.")]),
        };
    }
    if let Some(raw_id) = intent.strip_prefix("delete_event_") {
        if !role.is_staff() {
            return Ok(denied(chat_id));
        }
        event::soft_delete(store, parse_id(raw_id)?).await?;
        return Ok(vec![Reply::text(chat_id, "✅ Мероприятие завершено (удалено).")]);
    }
    if let Some(raw_id) = intent.strip_prefix("event_participants_") {
        if !role.is_staff() {
            return Ok(denied(chat_id));
        }
        return on_participants(state, chat_id, parse_id(raw_id)?).await;
    }
    if let Some(raw_id) = intent.strip_prefix("admin_delete_user_") {
        if role != Role::Admin {
            return Ok(denied(chat_id));
        }
        let deleted = admin::delete_user(store, parse_id(raw_id)?).await?;
        return Ok(vec![Reply::edit(
            chat_id,
            format!("❌ Пользователь {} удалён.", deleted.full_name),
        )]);
    }
    Ok(vec![Reply::text(chat_id, "❌ Неизвестная команда.")])
}

fn parse_id(raw: &str) -> Result<Uuid, BotError> {
    Uuid::parse_str(raw).map_err(|_| BotError::Format)
}

fn denied(chat_id: i64) -> Vec<Reply> {
    vec![Reply::text(chat_id, "❌ Недостаточно прав.")]
}

async fn group_label(store: &dyn Store, user: &User) -> Result<String, BotError> {
    Ok(match user.group_id {
        Some(group_id) => store
            .group_by_id(group_id)
            .await?
            .map(|g| g.name)
            .unwrap_or_else(|| "—".to_string()),
        None => "—".to_string(),
    })
}

async fn user_card(store: &dyn Store, user: &User, chat_id: i64) -> Result<Reply, BotError> {
    let label = group_label(store, user).await?;
    Ok(Reply::text(
        chat_id,
        format!(
            "👤 <b>{}</b>\n🏫 Группа: {}\n🆔 Telegram ID: <code>{}</code>",
            user.full_name, label, user.telegram_id
        ),
    )
    .with_choices(vec![Choice::new(
        "❌ Удалить",
        format!("admin_delete_user_{}", user.id),
    )]))
}

async fn on_today(state: &AppState, user: &User, chat_id: i64) -> Result<Vec<Reply>, BotError> {
    let group_name = group_label(state.store.as_ref(), user).await?;
    if group_name == "—" {
        return Ok(vec![
            Reply::edit(chat_id, "❌ Вы не привязаны к группе."),
            menu_for(user.role(), chat_id),
        ]);
    }
    let date = Local::now().date_naive();
    let rows = schedule::today(state.store.as_ref(), &group_name, date).await?;
    let reply = if rows.is_empty() {
        Reply::edit(chat_id, "❌ На сегодня нет занятий.")
    } else {
        Reply::edit(
            chat_id,
            format!(
                "📅 <b>Расписание на сегодня:</b>\n{}",
                schedule::render_day(&rows)
            ),
        )
    };
    Ok(vec![reply, menu_for(user.role(), chat_id)])
}

async fn on_two_weeks(state: &AppState, user: &User, chat_id: i64) -> Result<Vec<Reply>, BotError> {
    let group_name = group_label(state.store.as_ref(), user).await?;
    if group_name == "—" {
        return Ok(vec![
            Reply::edit(chat_id, "❌ Вы не привязаны к группе."),
            menu_for(user.role(), chat_id),
        ]);
    }
    let plan = schedule::two_weeks(state.store.as_ref(), &group_name).await?;
    if plan.is_empty() {
        return Ok(vec![
            Reply::edit(chat_id, "❌ Расписание на две недели не найдено."),
            menu_for(user.role(), chat_id),
        ]);
    }
    let rendered = format!(
        "📅 <b>Расписание на 2 недели:</b>\n{}",
        schedule::render_two_weeks(&plan)
    );
    let mut replies: Vec<Reply> = schedule::chunk_message(&rendered, schedule::MESSAGE_LIMIT)
        .into_iter()
        .map(|part| Reply::text(chat_id, part))
        .collect();
    replies.push(menu_for(user.role(), chat_id));
    Ok(replies)
}

async fn on_view_events(
    state: &AppState,
    user: &User,
    chat_id: i64,
) -> Result<Vec<Reply>, BotError> {
    let store = state.store.as_ref();
    let events = store.active_events().await?;
    if events.is_empty() {
        return Ok(vec![
            Reply::edit(chat_id, "❌ Сейчас нет активных мероприятий."),
            menu_for(user.role(), chat_id),
        ]);
    }
    let mut replies = vec![Reply::delete(chat_id)];
    for item in &events {
        let registered = store.is_participant(item.id, user.id).await?;
        let mut reply = Reply::text(
            chat_id,
            format!(
                "🎉 <b>{}</b>\n📝 <b>Описание:</b> {}\n📎 <b>Требования:</b> {}",
                item.title, item.description, item.requirements
            ),
        );
        if !registered {
            reply = reply.with_choices(vec![Choice::new(
                "📥 Записаться",
                format!("register_event_{}", item.id),
            )]);
        }
        replies.push(reply);
    }
    replies.push(menu_for(user.role(), chat_id));
    Ok(replies)
}

async fn on_my_requests(
    state: &AppState,
    user: &User,
    chat_id: i64,
) -> Result<Vec<Reply>, BotError> {
    let apps = state.store.applications_for_user(user.id).await?;
    if apps.is_empty() {
        return Ok(vec![
            Reply::edit(chat_id, "❌ У вас пока нет заявок."),
            menu_for(user.role(), chat_id),
        ]);
    }
    let mut replies = Vec::new();
    for app in &apps {
        replies.push(Reply::text(
            chat_id,
            format!(
                "📄 Заявка: {}\n📅 Дата: {}\n📊 Статус: {}",
                app.content,
                app.created_at.format("%Y-%m-%d %H:%M:%S"),
                app.status()
            ),
        ));
    }
    replies.push(menu_for(user.role(), chat_id));
    Ok(replies)
}

fn status_choices(app_id: Uuid) -> Vec<Choice> {
    vec![
        Choice::new("✅ Принята", format!("status_accept_{}", app_id)),
        Choice::new("🚧 В процессе", format!("status_process_{}", app_id)),
        Choice::new("❌ Отклонена", format!("status_reject_{}", app_id)),
        Choice::new("✅ Выполнена", format!("status_done_{}", app_id)),
    ]
}

async fn on_view_requests(
    state: &AppState,
    user: &User,
    chat_id: i64,
) -> Result<Vec<Reply>, BotError> {
    let store = state.store.as_ref();
    let apps = store.applications_all().await?;
    if apps.is_empty() {
        return Ok(vec![
            Reply::edit(chat_id, "❌ Нет заявок."),
            menu_for(user.role(), chat_id),
        ]);
    }
    let mut replies = Vec::new();
    for app in &apps {
        let owner_line = match store.user_by_id(app.user_id).await? {
            Some(owner) => format!("👤 <b>{}</b> — id {}\n", owner.full_name, owner.telegram_id),
            None => String::new(),
        };
        replies.push(
            Reply::text(
                chat_id,
                format!(
                    "{}📄 Заявка: {}\n📅 Дата: {}\n📊 Статус: {}",
                    owner_line,
                    app.content,
                    app.created_at.format("%Y-%m-%d %H:%M:%S"),
                    app.status()
                ),
            )
            .with_choices(status_choices(app.id)),
        );
    }
    replies.push(menu_for(user.role(), chat_id));
    Ok(replies)
}

async fn on_admin_events(
    state: &AppState,
    user: &User,
    chat_id: i64,
) -> Result<Vec<Reply>, BotError> {
    let events = state.store.all_events().await?;
    if events.is_empty() {
        return Ok(vec![
            Reply::edit(chat_id, "❌ Мероприятий нет."),
            menu_for(user.role(), chat_id),
        ]);
    }
    let mut replies = vec![Reply::delete(chat_id)];
    for item in &events {
        let status = if item.is_active { "🟢 Активно" } else { "⚪ Завершено" };
        let mut choices = vec![Choice::new(
            "📋 Участники",
            format!("event_participants_{}", item.id),
        )];
        if item.is_active {
            choices.push(Choice::new("🗑 Удалить", format!("delete_event_{}", item.id)));
        }
        replies.push(
            Reply::text(
                chat_id,
                format!(
                    "🎉 <b>{}</b>\n📝 <b>Описание:</b> {}\n📎 <b>Требования:</b> {}\n📅 <b>Создано:</b> {}\n{}",
                    item.title,
                    item.description,
                    item.requirements,
                    item.created_at.format("%Y-%m-%d %H:%M:%S"),
                    status
                ),
            )
            .with_choices(choices),
        );
    }
    replies.push(menu_for(user.role(), chat_id));
    Ok(replies)
}

async fn on_participants(
    state: &AppState,
    chat_id: i64,
    event_id: Uuid,
) -> Result<Vec<Reply>, BotError> {
    let store = state.store.as_ref();
    let (item, rows) = event::participants(store, event_id).await?;
    if rows.is_empty() {
        return Ok(vec![Reply::text(chat_id, "❌ Пока никто не записался.")]);
    }
    let mut replies = vec![Reply::text(
        chat_id,
        format!("👥 Участники мероприятия: <b>{}</b>", item.title),
    )];
    for (participant, member) in &rows {
        let label = group_label(store, member).await?;
        replies.push(Reply::text(
            chat_id,
            format!(
                "👤 <b>{}</b>\n🏫 Группа: {}\n📅 Записан: {}",
                member.full_name,
                label,
                participant.registered_at.format("%Y-%m-%d %H:%M:%S")
            ),
        ));
    }
    Ok(replies)
}

async fn on_admin_users(state: &AppState, chat_id: i64) -> Result<Vec<Reply>, BotError> {
    let store = state.store.as_ref();
    let users = store.all_users(50).await?;
    if users.is_empty() {
        return Ok(vec![Reply::text(chat_id, "Пользователи не найдены.")]);
    }
    let mut replies = Vec::new();
    for user in &users {
        replies.push(user_card(store, user, chat_id).await?);
    }
    replies.push(Reply::text(chat_id, "✅ Список пользователей отправлен."));
    Ok(replies)
}
