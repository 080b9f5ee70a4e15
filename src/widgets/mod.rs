use crossterm::event::Event;
use ratatui::{Frame, layout::Rect};
use theme::Theme;

mod contact;
mod grades;
mod stack_filter;
mod students;
pub mod theme;
pub mod toast;

pub use students::StudentsWidget;

use crate::{
    env::{AppEvent, WidgetCtx, WidgetId},
    help,
};

/// Identity shared by every widget: its id, the widget that opened it, and a
/// type name for logs.
pub struct WidgetInner {
    id: WidgetId,
    parent: Option<WidgetId>,
    name: &'static str,
}

impl WidgetInner {
    pub fn new<W: ?Sized>(parent: Option<WidgetId>) -> Self {
        let name = std::any::type_name::<W>()
            .rsplit("::")
            .next()
            .unwrap_or("widget");
        Self {
            id: WidgetId::next(),
            parent,
            name,
        }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn parent(&self) -> Option<WidgetId> {
        self.parent
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

pub trait Widget: Send {
    fn inner(&self) -> &WidgetInner;

    fn id(&self) -> WidgetId {
        self.inner().id()
    }

    /// Start any background work. Called once, right after the widget is mounted.
    fn start(&self, _ctx: WidgetCtx) {}

    /// Render the widget's content.
    fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme);

    /// Handle input events. Returns true if the event was handled.
    fn handle_event(&self, _ctx: WidgetCtx, _event: &Event) -> bool {
        false
    }

    /// Events this widget (or a popup it opened) emitted for itself.
    fn on_self_event(&self, _ctx: WidgetCtx, _event: &AppEvent) {}

    /// Called when the widget is unmounted.
    fn on_close(&self) {}

    /// Advance animations.
    fn tick(&self) {}

    /// Optional help to display at the bottom while this widget is active
    fn help(&self) -> Option<&[help::Entry<'_>]> {
        None
    }
}

pub trait Popup: Widget {
    fn rect(&self, area: Rect) -> Rect;
}

/// A rectangle of `width` x `height` centered in `area`, shrunk to fit.
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(2)).max(1);
    let height = height.min(area.height.saturating_sub(2)).max(1);
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    }
}
