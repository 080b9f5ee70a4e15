use std::{
    any::Any,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::widgets::Popup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(u64);

impl WidgetId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        WidgetId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A payload addressed to one widget. Delivered only while that widget is
/// still mounted.
pub struct AppEvent {
    target: WidgetId,
    payload: Box<dyn Any + Send>,
}

impl AppEvent {
    pub fn target(&self) -> WidgetId {
        self.target
    }

    pub fn payload<T: 'static>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub title: Option<String>,
    pub message: String,
    pub kind: ToastKind,
    pub duration: Duration,
}

impl Toast {
    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            title: None,
            message: message.into(),
            kind,
            duration: Duration::from_secs(4),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

pub enum Message {
    // Invalidate the current frame and request a redraw
    Invalidate,
    SetPopup(Box<dyn Popup>),
    DismissPopup,
    ShowToast(Toast),
    Emit(AppEvent),
}

pub struct Env {
    tx: UnboundedSender<Message>,
    rx: UnboundedReceiver<Message>,
}

impl Env {
    pub fn new() -> Self {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Message>();
        Env { tx, rx }
    }

    pub fn ctx(&self, id: WidgetId) -> WidgetCtx {
        WidgetCtx {
            tx: self.tx.clone(),
            id,
        }
    }

    pub fn rx(&mut self) -> &mut UnboundedReceiver<Message> {
        &mut self.rx
    }
}

/// Handle a widget uses to talk to the app. Cheap to clone and safe to move
/// into background tasks.
#[derive(Clone)]
pub struct WidgetCtx {
    tx: UnboundedSender<Message>,
    id: WidgetId,
}

impl WidgetCtx {
    fn send(&self, msg: Message) {
        // the receiver only goes away when the app is shutting down
        let _ = self.tx.send(msg);
    }

    pub fn invalidate(&self) {
        self.send(Message::Invalidate);
    }

    pub fn set_popup(&self, popup: Box<dyn Popup>) {
        self.send(Message::SetPopup(popup));
    }

    pub fn dismiss_popup(&self) {
        self.send(Message::DismissPopup);
    }

    pub fn show_toast(&self, toast: Toast) {
        self.send(Message::ShowToast(toast));
    }

    pub fn emit_self<T: Any + Send>(&self, payload: T) {
        self.emit_to(self.id, payload);
    }

    pub fn emit_to<T: Any + Send>(&self, target: WidgetId, payload: T) {
        self.send(Message::Emit(AppEvent {
            target,
            payload: Box::new(payload),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping(u32);

    #[test]
    fn events_keep_their_target_and_payload() {
        let mut env = Env::new();
        let id = WidgetId::next();
        let ctx = env.ctx(id);
        ctx.emit_self(Ping(7));
        let Ok(Message::Emit(event)) = env.rx().try_recv() else {
            panic!("expected an emitted event");
        };
        assert_eq!(event.target(), id);
        assert_eq!(event.payload::<Ping>().map(|p| p.0), Some(7));
        assert!(event.payload::<String>().is_none());
    }

    #[test]
    fn widget_ids_are_unique() {
        assert_ne!(WidgetId::next(), WidgetId::next());
    }
}
