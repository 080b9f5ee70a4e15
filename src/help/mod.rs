use std::borrow::Cow;

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

mod widget;

pub use widget::Widget;

use crate::widgets::theme::Theme;

#[derive(Clone)]
pub struct Entry<'a> {
    pub keys: Cow<'a, str>,
    pub short: Cow<'a, str>,
    pub long: Cow<'a, str>,
}

impl Entry<'static> {
    pub const fn new(keys: &'static str, short: &'static str, long: &'static str) -> Self {
        Self {
            keys: Cow::Borrowed(keys),
            short: Cow::Borrowed(short),
            long: Cow::Borrowed(long),
        }
    }
}

impl Entry<'_> {
    fn to_owned_entry(&self) -> Entry<'static> {
        Entry {
            keys: Cow::Owned(self.keys.as_ref().to_owned()),
            short: Cow::Owned(self.short.as_ref().to_owned()),
            long: Cow::Owned(self.long.as_ref().to_owned()),
        }
    }
}

fn make_spans<'a>(entries: &'a [Entry<'a>], theme: &Theme) -> Vec<Span<'a>> {
    let mut spans: Vec<_> = entries
        .iter()
        .filter(|entry| !entry.keys.is_empty())
        .flat_map(|entry| {
            [
                Span::styled(
                    format!("[{}]", entry.keys),
                    Style::default()
                        .fg(theme.accent_alt())
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                Span::styled(entry.short.as_ref(), Style::default().fg(theme.text())),
                Span::styled(" • ", Style::default().fg(theme.text_muted())),
            ]
        })
        .collect();
    // drop the trailing separator
    spans.pop();
    spans
}

/// Rows needed to show `entries` on one wrapped line in `area`.
pub fn height(entries: &[Entry<'_>], area: Rect, theme: &Theme) -> u16 {
    let total_width: usize = make_spans(entries, theme)
        .iter()
        .map(|s| s.content.width())
        .sum();
    let available_width = (area.width as usize).max(1);
    total_width.div_ceil(available_width) as u16
}

pub fn render(entries: &[Entry<'_>], frame: &mut Frame, area: Rect, theme: &Theme) {
    let spans = make_spans(entries, theme);
    let footer = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTRIES: &[Entry<'static>] = &[
        Entry::new("q", "quit", "Quit"),
        Entry::new("", "hidden", "Not shown"),
        Entry::new("?", "help", "Show help"),
    ];

    #[test]
    fn spans_skip_entries_without_keys() {
        let theme = Theme::dark();
        let text: String = make_spans(ENTRIES, &theme)
            .iter()
            .map(|span| span.content.as_ref())
            .collect();
        assert_eq!(text, "[q] quit • [?] help");
    }

    #[test]
    fn height_wraps_to_the_area() {
        let theme = Theme::dark();
        // "[q] quit • [?] help" is 19 columns wide
        assert_eq!(height(ENTRIES, Rect::new(0, 0, 80, 1), &theme), 1);
        assert_eq!(height(ENTRIES, Rect::new(0, 0, 10, 1), &theme), 2);
    }
}
