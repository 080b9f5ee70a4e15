use std::cell::{Cell, RefCell};

use crossterm::event::{Event, KeyCode};
use ratatui::{
    Frame,
    layout::{Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Clear, Paragraph},
};

use mentorboard::records::StackFilter;

use crate::{
    env::{WidgetCtx, WidgetId},
    help,
    util::{fill_bg, pad},
    widgets::{Popup, WidgetInner, centered_rect, theme::Theme},
};

/// Sent to the table when the user applies a new stack selection.
pub struct StackFilterChanged(pub StackFilter);

/// Multi-select over the known stack categories. Changes stay local until
/// applied with enter.
pub struct StackFilterPopup {
    inner: WidgetInner,
    filter: RefCell<StackFilter>,
    cursor: Cell<usize>,
}

impl StackFilterPopup {
    const HELP: &'static [help::Entry<'static>] = &[
        help::Entry::new("j/k/↑/↓", "move", "Move between stacks"),
        help::Entry::new("space", "toggle", "Select or unselect a stack"),
        help::Entry::new("⏎", "apply", "Apply the filter"),
        help::Entry::new("r", "reset", "Clear the selection"),
        help::Entry::new("esc", "cancel", "Close without applying"),
    ];

    pub fn new(current: StackFilter, parent: WidgetId) -> Self {
        Self {
            inner: WidgetInner::new::<Self>(Some(parent)),
            filter: RefCell::new(current),
            cursor: Cell::new(0),
        }
    }

    fn move_cursor(&self, down: bool) {
        let last = StackFilter::options().len().saturating_sub(1);
        let cursor = self.cursor.get();
        let next = if down {
            (cursor + 1).min(last)
        } else {
            cursor.saturating_sub(1)
        };
        self.cursor.set(next);
    }

    fn toggle_current(&self) {
        if let Some(value) = StackFilter::options().get(self.cursor.get()) {
            self.filter.borrow_mut().toggle(value);
        }
    }

    fn apply(&self, ctx: &WidgetCtx) {
        if let Some(parent) = self.inner.parent() {
            ctx.emit_to(parent, StackFilterChanged(self.filter.borrow().clone()));
        }
        ctx.dismiss_popup();
    }
}

impl crate::widgets::Widget for StackFilterPopup {
    fn inner(&self) -> &WidgetInner {
        &self.inner
    }

    fn help(&self) -> Option<&[help::Entry<'_>]> {
        Some(Self::HELP)
    }

    fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        frame.render_widget(Clear, area);
        fill_bg(frame.buffer_mut(), area, theme.panel_bg());
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(
                Line::styled(
                    pad("Filter Stack", 1),
                    Style::default()
                        .fg(theme.accent())
                        .add_modifier(Modifier::BOLD),
                )
                .centered(),
            )
            .border_style(Style::default().fg(theme.border()))
            .style(Style::default().bg(theme.panel_bg()).fg(theme.text()));

        let filter = self.filter.borrow();
        let lines: Vec<Line> = StackFilter::options()
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let mark = if filter.is_selected(value) { "[x]" } else { "[ ]" };
                let style = if index == self.cursor.get() {
                    Style::default()
                        .bg(theme.selection_bg())
                        .fg(theme.selection_fg())
                } else {
                    Style::default().fg(theme.text())
                };
                Line::from(vec![
                    Span::styled(mark, style.add_modifier(Modifier::BOLD)),
                    Span::styled(format!(" {value}"), style),
                ])
            })
            .collect();
        let inner = block.inner(area).inner(Margin::new(1, 0));
        frame.render_widget(block, area);
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn handle_event(&self, ctx: WidgetCtx, event: &Event) -> bool {
        let Some(key) = event.as_key_press_event() else {
            return true;
        };
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(true),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(false),
            KeyCode::Char(' ') => self.toggle_current(),
            KeyCode::Char('r') | KeyCode::Backspace => self.filter.borrow_mut().clear(),
            KeyCode::Enter => self.apply(&ctx),
            KeyCode::Esc => ctx.dismiss_popup(),
            _ => {}
        }
        true
    }
}

impl Popup for StackFilterPopup {
    fn rect(&self, area: Rect) -> Rect {
        centered_rect(area, 28, StackFilter::options().len() as u16 + 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        env::{Env, Message},
        widgets::Widget,
    };

    fn press(popup: &StackFilterPopup, ctx: &WidgetCtx, code: KeyCode) {
        popup.handle_event(ctx.clone(), &Event::Key(code.into()));
    }

    #[test]
    fn apply_sends_selection_to_parent() {
        let parent = WidgetId::next();
        let popup = StackFilterPopup::new(StackFilter::default(), parent);
        let mut env = Env::new();
        let ctx = env.ctx(popup.id());

        // MERN, then SERVERLESS toggled on and off again, then LAMP
        press(&popup, &ctx, KeyCode::Char(' '));
        press(&popup, &ctx, KeyCode::Down);
        press(&popup, &ctx, KeyCode::Char(' '));
        press(&popup, &ctx, KeyCode::Char(' '));
        press(&popup, &ctx, KeyCode::Char('j'));
        press(&popup, &ctx, KeyCode::Char(' '));
        press(&popup, &ctx, KeyCode::Enter);

        let Ok(Message::Emit(event)) = env.rx().try_recv() else {
            panic!("expected the filter event");
        };
        assert_eq!(event.target(), parent);
        let Some(StackFilterChanged(filter)) = event.payload::<StackFilterChanged>() else {
            panic!("wrong payload");
        };
        assert_eq!(filter.selected().collect::<Vec<_>>(), vec!["LAMP", "MERN"]);
        assert!(matches!(env.rx().try_recv(), Ok(Message::DismissPopup)));
    }

    #[test]
    fn escape_discards_changes() {
        let popup = StackFilterPopup::new(StackFilter::default(), WidgetId::next());
        let mut env = Env::new();
        let ctx = env.ctx(popup.id());
        press(&popup, &ctx, KeyCode::Char(' '));
        press(&popup, &ctx, KeyCode::Esc);
        assert!(matches!(env.rx().try_recv(), Ok(Message::DismissPopup)));
        assert!(env.rx().try_recv().is_err());
    }

    #[test]
    fn reset_clears_selection() {
        let current: StackFilter = ["MEAN"].into_iter().collect();
        let popup = StackFilterPopup::new(current, WidgetId::next());
        let env = Env::new();
        let ctx = env.ctx(popup.id());
        press(&popup, &ctx, KeyCode::Char('r'));
        assert!(!popup.filter.borrow().is_active());
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let popup = StackFilterPopup::new(StackFilter::default(), WidgetId::next());
        let env = Env::new();
        let ctx = env.ctx(popup.id());
        press(&popup, &ctx, KeyCode::Up);
        assert_eq!(popup.cursor.get(), 0);
        for _ in 0..10 {
            press(&popup, &ctx, KeyCode::Down);
        }
        assert_eq!(popup.cursor.get(), StackFilter::options().len() - 1);
    }
}
