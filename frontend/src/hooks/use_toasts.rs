use gloo::timers::callback::Timeout;
use log::error;
use mentor_match_domain::error::ServiceError;
use std::rc::Rc;
use uuid::Uuid;
use yew::prelude::*;

/// Oldest toasts are dropped beyond this many
pub const MAX_VISIBLE_TOASTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl ToastKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            ToastKind::Success => "toast toast-success",
            ToastKind::Error => "toast toast-error",
            ToastKind::Info => "toast toast-info",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: Uuid,
    pub kind: ToastKind,
    pub message: String,
}

pub enum ToastAction {
    Push(Toast),
    Dismiss(Uuid),
}

#[derive(Debug, Default, PartialEq)]
pub struct ToastList {
    pub toasts: Vec<Toast>,
}

impl Reducible for ToastList {
    type Action = ToastAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut toasts = self.toasts.clone();
        match action {
            ToastAction::Push(toast) => {
                toasts.push(toast);
                if toasts.len() > MAX_VISIBLE_TOASTS {
                    let overflow = toasts.len() - MAX_VISIBLE_TOASTS;
                    toasts.drain(..overflow);
                }
            }
            ToastAction::Dismiss(id) => toasts.retain(|toast| toast.id != id),
        }
        Rc::new(ToastList { toasts })
    }
}

/// Cloneable handle views use to raise toasts
#[derive(Clone, PartialEq)]
pub struct ToastHandle {
    dispatcher: UseReducerDispatcher<ToastList>,
    duration_ms: u32,
}

impl ToastHandle {
    pub fn success(&self, message: impl Into<String>) {
        self.show(ToastKind::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(ToastKind::Error, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.show(ToastKind::Info, message.into());
    }

    /// Log a failed call and show its user-facing message
    pub fn failure(&self, context: &str, err: &ServiceError, fallback: &str) {
        error!("{}: {}", context, err);
        self.error(err.user_message(fallback));
    }

    pub fn dismiss(&self, id: Uuid) {
        self.dispatcher.dispatch(ToastAction::Dismiss(id));
    }

    fn show(&self, kind: ToastKind, message: String) {
        let id = Uuid::new_v4();
        self.dispatcher
            .dispatch(ToastAction::Push(Toast { id, kind, message }));

        let dispatcher = self.dispatcher.clone();
        Timeout::new(self.duration_ms, move || {
            dispatcher.dispatch(ToastAction::Dismiss(id));
        })
        .forget();
    }
}

pub struct UseToastsResult {
    pub toasts: Vec<Toast>,
    pub handle: ToastHandle,
}

#[hook]
pub fn use_toasts(duration_ms: u32) -> UseToastsResult {
    let list = use_reducer(ToastList::default);
    UseToastsResult {
        toasts: list.toasts.clone(),
        handle: ToastHandle {
            dispatcher: list.dispatcher(),
            duration_ms,
        },
    }
}
