use std::cell::Cell;

use crossterm::event::{Event, KeyCode};
use ratatui::{
    Frame,
    layout::{Constraint, Margin, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, BorderType, Cell as TableCell, Clear, Row, Table},
};

use mentorboard::records::ContactLink;

use crate::{
    env::{Toast, ToastKind, WidgetCtx, WidgetId},
    help,
    util::{copy_to_clipboard, fill_bg, open_url, pad},
    widgets::{Popup, WidgetInner, centered_rect, theme::Theme},
};

/// The five contact links of one student; each opens on its own.
pub struct ContactPopup {
    inner: WidgetInner,
    title: String,
    links: [ContactLink; 5],
    cursor: Cell<usize>,
}

impl ContactPopup {
    const HELP: &'static [help::Entry<'static>] = &[
        help::Entry::new("j/k/↑/↓", "move", "Move between links"),
        help::Entry::new("⏎", "open", "Open the link"),
        help::Entry::new("y", "copy", "Copy the link to the clipboard"),
        help::Entry::new("esc", "close", "Close"),
    ];

    pub fn new(name: &str, links: [ContactLink; 5], parent: WidgetId) -> Self {
        Self {
            inner: WidgetInner::new::<Self>(Some(parent)),
            title: format!("Contact - {name}"),
            links,
            cursor: Cell::new(0),
        }
    }

    fn current(&self) -> &ContactLink {
        &self.links[self.cursor.get().min(self.links.len() - 1)]
    }

    fn open_current(&self, ctx: &WidgetCtx) {
        let link = self.current();
        if link.is_empty {
            ctx.show_toast(Toast::new(
                ToastKind::Warning,
                format!("No {} on record", link.kind.label()),
            ));
            return;
        }
        if let Err(err) = open_url(&link.target) {
            tracing::warn!(link = %link.target, error = %err, "failed to open link");
            ctx.show_toast(Toast::new(
                ToastKind::Error,
                format!("Could not open {}: {err}", link.kind.label()),
            ));
        }
    }

    fn copy_current(&self, ctx: &WidgetCtx) {
        let link = self.current();
        if link.is_empty {
            ctx.show_toast(Toast::new(
                ToastKind::Warning,
                format!("No {} on record", link.kind.label()),
            ));
            return;
        }
        match copy_to_clipboard(&link.target) {
            Ok(()) => ctx.show_toast(Toast::new(
                ToastKind::Info,
                format!("Copied {}", link.kind.label()),
            )),
            Err(err) => {
                tracing::warn!(error = %err, "clipboard unavailable");
                ctx.show_toast(Toast::new(
                    ToastKind::Error,
                    format!("Could not copy: {err}"),
                ));
            }
        }
    }
}

impl crate::widgets::Widget for ContactPopup {
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
                    pad(self.title.as_str(), 1),
                    Style::default()
                        .fg(theme.accent())
                        .add_modifier(Modifier::BOLD),
                )
                .centered(),
            )
            .border_style(Style::default().fg(theme.border()))
            .style(Style::default().bg(theme.panel_bg()).fg(theme.text()));
        let inner = block.inner(area).inner(Margin::new(1, 0));
        frame.render_widget(block, area);

        let rows = self.links.iter().enumerate().map(|(index, link)| {
            let mut style = if link.is_empty {
                Style::default().fg(theme.text_muted())
            } else {
                Style::default().fg(theme.text())
            };
            if index == self.cursor.get() {
                style = style.bg(theme.selection_bg()).fg(theme.selection_fg());
            }
            let target = if link.is_empty {
                "(empty)".to_string()
            } else {
                link.target.clone()
            };
            Row::new(vec![
                TableCell::from(link.kind.glyph()),
                TableCell::from(link.kind.label()),
                TableCell::from(target),
            ])
            .style(style)
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(2),
                Constraint::Length(8),
                Constraint::Fill(1),
            ],
        );
        frame.render_widget(table, inner);
    }

    fn handle_event(&self, ctx: WidgetCtx, event: &Event) -> bool {
        let Some(key) = event.as_key_press_event() else {
            return true;
        };
        let last = self.links.len() - 1;
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.cursor.set((self.cursor.get() + 1).min(last)),
            KeyCode::Char('k') | KeyCode::Up => self.cursor.set(self.cursor.get().saturating_sub(1)),
            KeyCode::Enter => self.open_current(&ctx),
            KeyCode::Char('y') => self.copy_current(&ctx),
            KeyCode::Esc | KeyCode::Char('c') => ctx.dismiss_popup(),
            _ => {}
        }
        true
    }
}

impl Popup for ContactPopup {
    fn rect(&self, area: Rect) -> Rect {
        let widest = self
            .links
            .iter()
            .map(|link| link.target.chars().count())
            .max()
            .unwrap_or(0) as u16;
        centered_rect(area, (widest + 18).clamp(40, 80), self.links.len() as u16 + 2)
    }
}
