use std::collections::HashMap;
use std::sync::Mutex;

/// The multi-step flows driven by the generic form engine. Registration
/// is not one of them: it is a single free-text message parsed in one
/// shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Application,
    EventCreation,
    RoleAssign,
    FindStudent,
}

pub struct StepSpec {
    pub field: &'static str,
    pub prompt: &'static str,
    pub optional: bool,
}

impl FlowKind {
    pub fn steps(&self) -> &'static [StepSpec] {
        match self {
            FlowKind::Application => &[
                StepSpec {
                    field: "subject",
                    prompt: "📝 Введите <b>тему</b> вашей заявки:",
                    optional: false,
                },
                StepSpec {
                    field: "description",
                    prompt: "✏ Теперь введите <b>описание</b> вашей заявки или напишите «-», если без описания:",
                    optional: true,
                },
            ],
            FlowKind::EventCreation => &[
                StepSpec {
                    field: "title",
                    prompt: "📌 Введите <b>тему мероприятия</b>:",
                    optional: false,
                },
                StepSpec {
                    field: "description",
                    prompt: "✏ Введите <b>описание мероприятия</b>:",
                    optional: false,
                },
                StepSpec {
                    field: "requirements",
                    prompt: "📎 Введите <b>требования</b> или '-' если их нет:",
                    optional: true,
                },
            ],
            FlowKind::RoleAssign => &[
                StepSpec {
                    field: "target",
                    prompt: "🔎 Введите Telegram ID пользователя:",
                    optional: false,
                },
                StepSpec {
                    field: "role",
                    prompt: "🎓 Введите новую роль (student / dean / admin):",
                    optional: false,
                },
            ],
            FlowKind::FindStudent => &[StepSpec {
                field: "query",
                prompt: "🔎 Введите ФИО, группу или Telegram ID для поиска:",
                optional: false,
            }],
        }
    }
}

/// Accumulator of one user's in-flight flow: flow id, current step and
/// the captured fields. An optional field answered with the "-" sentinel
/// is stored as the explicit no-value marker.
#[derive(Debug, Clone)]
pub struct FormState {
    pub flow: FlowKind,
    pub step: usize,
    pub fields: HashMap<&'static str, Option<String>>,
}

impl FormState {
    pub fn value(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_deref())
    }

    /// Required fields are always present once the flow completed; an
    /// empty string is returned rather than panicking if one is not.
    pub fn required(&self, field: &str) -> &str {
        self.value(field).unwrap_or("")
    }
}

pub enum Advance {
    /// The flow moved to the next step; prompt the user for it.
    Prompt(&'static str),
    /// The terminal step was answered; the accumulator is already
    /// cleared and handed over for the commit.
    Complete(FormState),
}

/// Per-user session store for in-flight forms. Keyed by the external
/// user identity; injected into the dispatcher rather than being a
/// process-wide global.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<i64, FormState>>,
}

impl SessionStore {
    /// Starts a flow for the user, discarding any stale accumulator so
    /// old half-entered data can never leak into the new flow.
    pub fn begin(&self, user: i64, flow: FlowKind) -> &'static str {
        let mut sessions = self.sessions.lock().expect("Error while locking mutex.");
        sessions.insert(
            user,
            FormState {
                flow,
                step: 0,
                fields: HashMap::new(),
            },
        );
        flow.steps()[0].prompt
    }

    pub fn clear(&self, user: i64) {
        let mut sessions = self.sessions.lock().expect("Error while locking mutex.");
        sessions.remove(&user);
    }

    pub fn in_flight(&self, user: i64) -> Option<FlowKind> {
        let sessions = self.sessions.lock().expect("Error while locking mutex.");
        sessions.get(&user).map(|state| state.flow)
    }

    /// Feeds one inbound message into the user's flow. Returns None when
    /// no flow is in flight for that user.
    pub fn advance(&self, user: i64, input: &str) -> Option<Advance> {
        let mut sessions = self.sessions.lock().expect("Error while locking mutex.");
        let state = sessions.get_mut(&user)?;
        let steps = state.flow.steps();
        let spec = &steps[state.step];
        let value = if spec.optional && input.trim() == "-" {
            None
        } else {
            Some(input.to_string())
        };
        state.fields.insert(spec.field, value);
        state.step += 1;
        if state.step == steps.len() {
            // terminal step: the commit happens in the caller, the
            // accumulator is gone either way
            sessions.remove(&user).map(Advance::Complete)
        } else {
            Some(Advance::Prompt(steps[state.step].prompt))
        }
    }
}
