use crossterm::event::{Event, KeyCode};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Clear, Gauge, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use mentorboard::{
    records::GradeTone,
    viewer::{GradeChip, GradeDetail},
};

use crate::{
    env::{WidgetCtx, WidgetId},
    help,
    util::{fill_bg, pad},
    widgets::{Popup, WidgetInner, centered_rect, theme::Theme},
};

const WIDTH: u16 = 60;
const OK_BUTTON: &str = "[ OK ]";
const CHIP_GAP: usize = 1;

/// Per-period scores and the aggregate of one student.
pub struct GradesPopup {
    inner: WidgetInner,
    detail: GradeDetail,
}

impl GradesPopup {
    const HELP: &'static [help::Entry<'static>] = &[
        help::Entry::new("⏎", "ok", "Close grades"),
        help::Entry::new("esc", "close", "Close grades"),
    ];

    pub fn new(detail: GradeDetail, parent: WidgetId) -> Self {
        Self {
            inner: WidgetInner::new::<Self>(Some(parent)),
            detail,
        }
    }
}

fn chip_text(chip: &GradeChip) -> String {
    pad(format!("{} {}", chip.label, chip.score), 1)
}

/// Greedy wrap of the chips into rows no wider than `width` columns.
fn wrap_chips(chips: &[GradeChip], width: usize) -> Vec<Vec<&GradeChip>> {
    let mut rows: Vec<Vec<&GradeChip>> = Vec::new();
    let mut used = 0;
    for chip in chips {
        let chip_width = chip_text(chip).width();
        match rows.last_mut() {
            Some(row) if used + CHIP_GAP + chip_width <= width => {
                row.push(chip);
                used += CHIP_GAP + chip_width;
            }
            _ => {
                rows.push(vec![chip]);
                used = chip_width;
            }
        }
    }
    rows
}

fn chip_style(tone: GradeTone, theme: &Theme) -> Style {
    let bg = match tone {
        GradeTone::Positive => theme.chip_positive(),
        GradeTone::Negative => theme.chip_negative(),
    };
    Style::default().bg(bg).fg(theme.chip_fg())
}

impl crate::widgets::Widget for GradesPopup {
    fn inner(&self) -> &WidgetInner {
        &self.inner
    }

    fn help(&self) -> Option<&[help::Entry<'_>]> {
        Some(Self::HELP)
    }

    fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        frame.render_widget(Clear, area);
        fill_bg(frame.buffer_mut(), area, theme.panel_bg());
        let title = Line::styled(
            pad(self.detail.title.as_str(), 1),
            Style::default()
                .fg(theme.accent())
                .add_modifier(Modifier::BOLD),
        )
        .centered();
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(title)
            .border_style(Style::default().fg(theme.border()))
            .style(Style::default().bg(theme.panel_bg()).fg(theme.text()));
        frame.render_widget(block.clone(), area);

        let inner = block.inner(area).inner(Margin::new(1, 1));
        let chip_rows = wrap_chips(&self.detail.chips, inner.width as usize);
        let layout = Layout::vertical([
            Constraint::Length(chip_rows.len().max(1) as u16),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ]);
        let [chips_area, _, gauge_area, _, button_area] = inner.layout(&layout);

        let lines: Vec<Line> = if chip_rows.is_empty() {
            vec![Line::styled("No grades recorded", Style::default().fg(theme.text_muted()))]
        } else {
            chip_rows
                .iter()
                .map(|row| {
                    let mut spans = Vec::new();
                    for (index, chip) in row.iter().enumerate() {
                        if index > 0 {
                            spans.push(Span::raw(" ".repeat(CHIP_GAP)));
                        }
                        spans.push(Span::styled(chip_text(chip), chip_style(chip.tone, theme)));
                    }
                    Line::from(spans)
                })
                .collect()
        };
        frame.render_widget(Paragraph::new(lines), chips_area);

        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(theme.accent_alt()).bg(theme.panel_bg_alt()))
            .percent(self.detail.fill_percent())
            .label(Span::styled(
                format!("Total {}", self.detail.aggregate),
                Style::default()
                    .fg(theme.text())
                    .add_modifier(Modifier::BOLD),
            ));
        frame.render_widget(gauge, gauge_area);

        let button = Line::from(Span::styled(
            OK_BUTTON,
            Style::default()
                .bg(theme.button_bg())
                .fg(theme.chip_fg())
                .add_modifier(Modifier::BOLD),
        ))
        .right_aligned();
        frame.render_widget(Paragraph::new(button), button_area);
    }

    fn handle_event(&self, ctx: WidgetCtx, event: &Event) -> bool {
        if let Some(key) = event.as_key_press_event()
            && matches!(key.code, KeyCode::Enter | KeyCode::Esc)
        {
            ctx.dismiss_popup();
        }
        true
    }
}

impl Popup for GradesPopup {
    fn rect(&self, area: Rect) -> Rect {
        // borders and margin take 4 columns
        let chip_width = WIDTH.min(area.width.saturating_sub(2)).saturating_sub(4);
        let rows = wrap_chips(&self.detail.chips, chip_width as usize).len().max(1) as u16;
        centered_rect(area, WIDTH, rows + 8)
    }
}

#[cfg(test)]
mod tests {
    use mentorboard::records::StudentRecord;
    use ratatui::{Terminal, backend::TestBackend};
    use serde_json::json;

    use super::*;
    use crate::{
        env::{Env, Message},
        widgets::Widget,
    };

    fn ezra() -> GradeDetail {
        let record: StudentRecord = serde_json::from_value(json!({
            "id": "s1",
            "name": "Ezra",
            "batch": 3,
            "stack": "MERN",
            "grades": {
                "w0102": 10, "w0304": 5, "week0506": -2,
                "week0708": 20, "week0910": 0, "week1112": 12
            }
        }))
        .unwrap();
        GradeDetail::for_record(&record)
    }

    #[test]
    fn chips_wrap_to_width() {
        let detail = ezra();
        // " Test2 10 " is 10 columns wide
        assert_eq!(wrap_chips(&detail.chips, 200).len(), 1);
        let rows = wrap_chips(&detail.chips, 24);
        assert!(rows.len() > 1);
        for row in &rows {
            let width: usize = row.iter().map(|chip| chip_text(chip).width()).sum::<usize>()
                + CHIP_GAP * (row.len() - 1);
            assert!(width <= 24);
        }
        let total: usize = rows.iter().map(Vec::len).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn renders_title_chips_and_raw_total() {
        let popup = GradesPopup::new(ezra(), WidgetId::next());
        let area = Rect::new(0, 0, 80, 20);
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|frame| popup.render(frame, popup.rect(area), &Theme::dark()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let text: String = (0..buffer.area.height)
            .flat_map(|y| (0..buffer.area.width).map(move |x| (x, y)))
            .map(|pos| buffer[pos].symbol().to_string())
            .collect();
        assert!(text.contains("Mentoring Grades - Ezra"));
        assert!(text.contains("Test05 -2"));
        assert!(text.contains("Total 45"));
        assert!(text.contains(OK_BUTTON));
    }

    #[test]
    fn enter_dismisses() {
        let popup = GradesPopup::new(ezra(), WidgetId::next());
        let mut env = Env::new();
        let ctx = env.ctx(popup.id());
        assert!(popup.handle_event(ctx, &Event::Key(KeyCode::Enter.into())));
        assert!(matches!(env.rx().try_recv(), Ok(Message::DismissPopup)));
    }
}
