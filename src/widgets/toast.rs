use std::time::Instant;

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Clear, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    env::{Toast, ToastKind},
    widgets::theme::Theme,
};

const MAX_WIDTH: u16 = 48;

/// The toast currently on screen and when it goes away.
pub struct ActiveToast {
    toast: Toast,
    expires_at: Instant,
}

impl ActiveToast {
    pub fn new(toast: Toast, now: Instant) -> Self {
        let expires_at = now + toast.duration;
        Self { toast, expires_at }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Bottom-right corner of `area`, sized to the message.
    pub fn rect(&self, area: Rect) -> Rect {
        let title_width = self.toast.title.as_deref().map_or(0, UnicodeWidthStr::width);
        let message_width = u16::try_from(self.toast.message.width()).unwrap_or(u16::MAX);
        let text_width = u16::try_from(title_width).unwrap_or(u16::MAX).max(message_width);
        let width = text_width.saturating_add(4).min(MAX_WIDTH).min(area.width);
        let inner_width = width.saturating_sub(4).max(1);
        let lines = message_width.div_ceil(inner_width).max(1);
        let height = lines
            .saturating_add(2 + u16::from(self.toast.title.is_some()))
            .min(area.height);
        Rect {
            x: area.x + area.width - width,
            y: area.y + area.height - height,
            width,
            height,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let rect = self.rect(area);
        let color = match self.toast.kind {
            ToastKind::Info => theme.accent(),
            ToastKind::Warning => theme.warning(),
            ToastKind::Error => theme.error(),
        };
        let mut lines = Vec::new();
        if let Some(title) = self.toast.title.as_deref() {
            lines.push(Line::from(Span::styled(
                title.to_string(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
        }
        lines.push(Line::from(Span::styled(
            self.toast.message.clone(),
            Style::default().fg(theme.text()),
        )));
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(color))
            .style(Style::default().bg(theme.panel_bg()));
        let body = Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(Clear, rect);
        frame.render_widget(body, rect);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn expires_after_its_duration() {
        let now = Instant::now();
        let toast = ActiveToast::new(Toast::new(ToastKind::Info, "hi"), now);
        assert!(!toast.is_expired(now));
        assert!(toast.is_expired(now + Duration::from_secs(5)));
    }

    #[test]
    fn sits_in_the_bottom_right_corner() {
        let toast = ActiveToast::new(
            Toast::new(ToastKind::Error, "No data available.").with_title("Fetching Error"),
            Instant::now(),
        );
        let area = Rect::new(0, 0, 100, 30);
        let rect = toast.rect(area);
        assert_eq!(rect.right(), 100);
        assert_eq!(rect.bottom(), 30);
        // 18 columns of text plus borders and padding; title and message rows
        assert_eq!(rect.width, 22);
        assert_eq!(rect.height, 4);
    }

    #[test]
    fn huge_messages_stay_inside_the_area() {
        let toast = ActiveToast::new(
            Toast::new(ToastKind::Error, "x".repeat(100_000)).with_title("Fetching Error"),
            Instant::now(),
        );
        let area = Rect::new(0, 0, 80, 24);
        let rect = toast.rect(area);
        assert_eq!(rect.width, MAX_WIDTH);
        assert_eq!(rect.height, 24);
        assert!(area.contains(rect.as_position()));
    }
}
