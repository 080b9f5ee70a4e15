use crossterm::event::{Event, KeyCode};
use ratatui::{
    Frame,
    layout::{Constraint, Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Clear, Padding, Row, Table},
};

use crate::{
    env::{WidgetCtx, WidgetId},
    help::Entry,
    util::{fill_bg, pad},
    widgets::{Popup, WidgetInner, centered_rect, theme::Theme},
};

/// Full key reference for the widget that opened it.
pub struct Widget {
    inner: WidgetInner,
    entries: Vec<Entry<'static>>,
}

impl Widget {
    pub fn new(entries: &[Entry<'_>], parent: WidgetId) -> Self {
        Self {
            inner: WidgetInner::new::<Self>(Some(parent)),
            entries: entries.iter().map(Entry::to_owned_entry).collect(),
        }
    }
}

impl crate::widgets::Widget for Widget {
    fn inner(&self) -> &WidgetInner {
        &self.inner
    }

    fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        frame.render_widget(Clear, area);
        let buf = frame.buffer_mut();
        fill_bg(buf, area, theme.panel_bg());
        let title = Line::styled(
            pad("Help", 2),
            Style::default()
                .fg(theme.accent())
                .add_modifier(Modifier::BOLD),
        )
        .centered();
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(title)
            .title_bottom(Line::styled(" esc to close ", Style::default().fg(theme.text_muted())).centered())
            .border_style(Style::default().fg(theme.border()))
            .style(Style::default().bg(theme.panel_bg()).fg(theme.text()))
            .padding(Padding::new(2, 2, 1, 1));

        let inner = area.inner(Margin::new(1, 1));

        let visible: Vec<_> = self
            .entries
            .iter()
            .filter(|entry| !entry.keys.is_empty())
            .collect();

        let rows: Vec<_> = visible
            .chunks(2)
            .map(|chunk| {
                let cell = |index: usize| {
                    chunk
                        .get(index)
                        .map(|entry| {
                            (
                                make_display_key(entry, theme),
                                Span::styled(entry.long.to_string(), Style::default().fg(theme.text())),
                            )
                        })
                        .unwrap_or_default()
                };
                let (left_key, left_desc) = cell(0);
                let (right_key, right_desc) = cell(1);
                Row::new(vec![
                    Line::from(left_key),
                    Line::from(left_desc),
                    Line::from(right_key),
                    Line::from(right_desc),
                ])
            })
            .collect();

        let widths = &[
            Constraint::Length(12),
            Constraint::Fill(1),
            Constraint::Length(12),
            Constraint::Fill(1),
        ];
        let table = Table::new(rows, widths)
            .block(block)
            .style(Style::default().fg(theme.text()));

        ratatui::widgets::Widget::render(table, inner, buf);
    }

    fn handle_event(&self, ctx: WidgetCtx, event: &Event) -> bool {
        if let Some(key) = event.as_key_press_event()
            && matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Enter)
        {
            ctx.dismiss_popup();
        }
        // modal: swallow everything else
        true
    }
}

impl Popup for Widget {
    fn rect(&self, area: Rect) -> Rect {
        let rows = self.entries.len().div_ceil(2) as u16;
        centered_rect(area, (area.width * 2 / 3).max(60), rows + 6)
    }
}

fn make_display_key(entry: &Entry<'_>, theme: &Theme) -> Span<'static> {
    Span::styled(
        format!("[{}]", entry.keys),
        Style::default()
            .fg(theme.accent_alt())
            .add_modifier(Modifier::BOLD),
    )
}
