use std::{cell::RefCell, sync::Arc};

use crossterm::event::{Event, KeyCode};
use humansize::{BINARY, format_size};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, BorderType, Cell, HighlightSpacing, Paragraph, Row, StatefulWidget, Table,
        TableState,
    },
};
use throbber_widgets_tui::{BRAILLE_SIX, Throbber, ThrobberState, WhichUse};

use mentorboard::{
    records::{Column, StudentRecord, Tag, certificate_tags, contact_links, format_ordinal_date, stack_tag},
    store::RecordSource,
    viewer::{
        FetchOutcome, FetchState, FetchTicket, GradeDetail, RecordViewer, fetch_students,
    },
};

use crate::{
    env::{AppEvent, Toast, ToastKind, WidgetCtx},
    help,
    util::pad,
    widgets::{
        WidgetInner,
        contact::ContactPopup,
        grades::GradesPopup,
        stack_filter::{StackFilterChanged, StackFilterPopup},
        theme::Theme,
    },
};

const BRAND: &str = "CodeCrafters Labs";
const TABLE_TITLE: &str = "Mentoring Program - Students Grades";
const GRADES_BUTTON: &str = "[ VIEW GRADES ]";

/// Result of the background read, addressed back to the widget that started it.
struct StudentsLoaded {
    ticket: FetchTicket,
    outcome: FetchOutcome,
}

#[derive(Default)]
struct ViewState {
    table: TableState,
    throbber: ThrobberState,
    last_render_capacity: usize,
}

/// The students table: loads once on mount, then sorts, filters and opens
/// per-row popups over the loaded records.
pub struct StudentsWidget {
    inner: WidgetInner,
    source: Arc<dyn RecordSource>,
    path: String,
    viewer: RefCell<RecordViewer>,
    view: RefCell<ViewState>,
}

impl StudentsWidget {
    const HELP: &'static [help::Entry<'static>] = &[
        help::Entry::new("j/k/↑/↓/PgUp/PgDn", "move", "Move selection"),
        help::Entry::new("⏎/g", "grades", "View grades of the selected student"),
        help::Entry::new("s", "sort batch", "Cycle batch sort: none, ascending, descending"),
        help::Entry::new("f", "filter stack", "Filter rows by stack"),
        help::Entry::new("c", "contact", "Open the contact links of the selected student"),
        help::Entry::new("?", "help", "Show this help"),
        help::Entry::new("q/esc", "quit", "Quit"),
    ];

    pub fn new(source: Arc<dyn RecordSource>, path: impl Into<String>) -> Self {
        Self {
            inner: WidgetInner::new::<Self>(None),
            source,
            path: path.into(),
            viewer: RefCell::new(RecordViewer::new()),
            view: RefCell::new(ViewState::default()),
        }
    }

    fn load(&self, ctx: WidgetCtx) {
        let ticket = self.viewer.borrow_mut().begin_fetch();
        ctx.invalidate();
        let source = Arc::clone(&self.source);
        let path = self.path.clone();
        tokio::spawn(async move {
            let outcome = fetch_students(source.as_ref(), &path).await;
            ctx.emit_self(StudentsLoaded { ticket, outcome });
        });
    }

    fn row_count(&self) -> usize {
        self.viewer.borrow().rows().len()
    }

    fn selected_record(&self) -> Option<StudentRecord> {
        let index = self.view.borrow().table.selected()?;
        self.viewer.borrow().rows().get(index).map(|record| (*record).clone())
    }

    fn clamp_selection(&self) {
        let total = self.row_count();
        let mut view = self.view.borrow_mut();
        match view.table.selected() {
            _ if total == 0 => view.table.select(None),
            Some(index) if index >= total => view.table.select(Some(total - 1)),
            None => view.table.select(Some(0)),
            Some(_) => {}
        }
    }

    fn select_next(&self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let mut view = self.view.borrow_mut();
        let next = match view.table.selected() {
            Some(index) => (index + 1).min(len - 1),
            None => 0,
        };
        view.table.select(Some(next));
    }

    fn select_previous(&self) {
        if self.row_count() == 0 {
            return;
        }
        let mut view = self.view.borrow_mut();
        let next = view.table.selected().map_or(0, |index| index.saturating_sub(1));
        view.table.select(Some(next));
    }

    fn page_down(&self) {
        let total = self.row_count();
        if total == 0 {
            return;
        }
        let mut view = self.view.borrow_mut();
        let page = view.last_render_capacity.max(1);
        let selected = view.table.selected().unwrap_or(0);
        view.table.select(Some((selected + page).min(total - 1)));
    }

    fn page_up(&self) {
        if self.row_count() == 0 {
            return;
        }
        let mut view = self.view.borrow_mut();
        let page = view.last_render_capacity.max(1);
        let selected = view.table.selected().unwrap_or(0);
        view.table.select(Some(selected.saturating_sub(page)));
    }

    fn select_edge(&self, last: bool) {
        let total = self.row_count();
        if total == 0 {
            return;
        }
        let index = if last { total - 1 } else { 0 };
        self.view.borrow_mut().table.select(Some(index));
    }

    fn open_grades(&self, ctx: &WidgetCtx) -> bool {
        let Some(record) = self.selected_record() else {
            return false;
        };
        tracing::debug!(student = %record.id, "opening grades");
        let detail = GradeDetail::for_record(&record);
        ctx.set_popup(Box::new(GradesPopup::new(detail, self.inner.id())));
        true
    }

    fn open_contact(&self, ctx: &WidgetCtx) -> bool {
        let Some(record) = self.selected_record() else {
            return false;
        };
        ctx.set_popup(Box::new(ContactPopup::new(
            &record.name,
            contact_links(&record),
            self.inner.id(),
        )));
        true
    }

    fn open_stack_filter(&self, ctx: &WidgetCtx) {
        let current = self.viewer.borrow().stack_filter().clone();
        ctx.set_popup(Box::new(StackFilterPopup::new(current, self.inner.id())));
    }

    fn cycle_sort(&self) {
        let order = self.viewer.borrow_mut().cycle_batch_sort();
        tracing::debug!(order = ?order, "batch sort changed");
    }

    fn render_banner(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let banner = Paragraph::new(Line::from(vec![
            Span::styled(
                pad(BRAND, 1),
                Style::default()
                    .fg(theme.header_fg())
                    .add_modifier(Modifier::BOLD),
            ),
        ]))
        .style(Style::default().bg(theme.header_bg()));
        frame.render_widget(banner, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let today = chrono::Local::now().date_naive();
        let text = format!("{BRAND} Mentoring Program - {}", format_ordinal_date(&today));
        let footer = Paragraph::new(Line::from(text).centered())
            .style(Style::default().bg(theme.footer_bg()).fg(theme.footer_fg()));
        frame.render_widget(footer, area);
    }

    fn render_table(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let viewer = self.viewer.borrow();
        let mut view = self.view.borrow_mut();
        let rows = viewer.rows();

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title_top(Line::styled(
                pad(TABLE_TITLE, 1),
                Style::default()
                    .fg(theme.accent())
                    .add_modifier(Modifier::BOLD),
            ))
            .title_bottom(Line::styled(
                pad(status_label(&viewer, rows.len()), 1),
                Style::default().fg(theme.text_muted()),
            ))
            .border_style(Style::default().fg(theme.border()))
            .style(Style::default().bg(theme.panel_bg()).fg(theme.text()));
        let inner = block.inner(area);

        if viewer.is_loading() {
            frame.render_widget(block, area);
            let throbber = Throbber::default()
                .label("Loading students...")
                .style(Style::default().fg(theme.warning()))
                .throbber_style(Style::default().fg(theme.accent()))
                .throbber_set(BRAILLE_SIX)
                .use_type(WhichUse::Spin);
            let line = Rect { height: 1.min(inner.height), ..inner };
            frame.render_stateful_widget(throbber, line, &mut view.throbber);
            return;
        }

        if rows.is_empty() {
            let message = match viewer.state() {
                FetchState::TransportError(err) => Line::styled(
                    format!("Could not load students: {err}"),
                    Style::default().fg(theme.error()),
                ),
                _ => Line::styled("No students", Style::default().fg(theme.text_muted())),
            };
            frame.render_widget(Paragraph::new(message).block(block), area);
            return;
        }

        let header = Row::new(Column::ALL.iter().map(|column| {
            let title = match column {
                Column::Batch => format!("{}{}", column.title(), viewer.sort_order().indicator()),
                Column::Stack if viewer.stack_filter().is_active() => {
                    let selected: Vec<_> = viewer.stack_filter().selected().collect();
                    format!("{} [{}]", column.title(), selected.join(","))
                }
                _ => column.title().to_string(),
            };
            Cell::from(title)
        }))
        .style(
            Style::default()
                .fg(theme.text_muted())
                .add_modifier(Modifier::BOLD),
        );

        let table_rows: Vec<Row> = rows
            .iter()
            .map(|record| student_row(record, theme))
            .collect();

        let table = Table::new(
            table_rows,
            [
                Constraint::Length(8),
                Constraint::Fill(1),
                Constraint::Length(14),
                Constraint::Length(14),
                Constraint::Fill(2),
                Constraint::Length(GRADES_BUTTON.len() as u16),
            ],
        )
        .block(block)
        .header(header)
        .column_spacing(2)
        .highlight_spacing(HighlightSpacing::Always)
        .highlight_symbol("> ")
        .row_highlight_style(
            Style::default()
                .bg(theme.selection_bg())
                .fg(theme.selection_fg()),
        );

        view.last_render_capacity = inner.height.saturating_sub(1) as usize;
        StatefulWidget::render(table, area, frame.buffer_mut(), &mut view.table);
    }
}

fn status_label(viewer: &RecordViewer, shown: usize) -> String {
    match viewer.state() {
        FetchState::Idle | FetchState::Fetching => "loading".to_string(),
        FetchState::Empty => "no data".to_string(),
        FetchState::TransportError(_) => "error".to_string(),
        FetchState::Populated => {
            let total = viewer.records().len();
            let size = format_size(viewer.size_bytes(), BINARY);
            if shown == total {
                format!("{total} students · {size}")
            } else {
                format!("{shown} of {total} students · {size}")
            }
        }
    }
}

fn tag_span(tag: &Tag, theme: &Theme) -> Span<'static> {
    let style = theme.tag(tag.color);
    Span::styled(pad(&tag.label, 1), Style::default().bg(style.bg).fg(style.fg))
}

fn student_row(record: &StudentRecord, theme: &Theme) -> Row<'static> {
    let contact: Vec<Span> = contact_links(record)
        .iter()
        .flat_map(|link| {
            let style = if link.is_empty {
                Style::default()
                    .fg(theme.text_muted())
                    .add_modifier(Modifier::DIM)
            } else {
                Style::default().fg(theme.accent())
            };
            [Span::styled(link.kind.glyph(), style), Span::raw(" ")]
        })
        .collect();

    let mut certificates = Vec::new();
    for tag in certificate_tags(record) {
        if !certificates.is_empty() {
            certificates.push(Span::raw(" "));
        }
        certificates.push(tag_span(&tag, theme));
    }

    let button = Span::styled(
        GRADES_BUTTON,
        Style::default()
            .bg(theme.button_bg())
            .fg(theme.chip_fg())
            .add_modifier(Modifier::BOLD),
    );

    Row::new(vec![
        Cell::from(record.batch.to_string()),
        Cell::from(record.name.clone()),
        Cell::from(Line::from(contact)),
        Cell::from(Line::from(tag_span(&stack_tag(record), theme))),
        Cell::from(Line::from(certificates)),
        Cell::from(Line::from(button)),
    ])
}

impl crate::widgets::Widget for StudentsWidget {
    fn inner(&self) -> &WidgetInner {
        &self.inner
    }

    fn start(&self, ctx: WidgetCtx) {
        self.load(ctx);
    }

    fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let layout = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ]);
        let [banner_area, table_area, footer_area] = area.layout(&layout);
        self.render_banner(frame, banner_area, theme);
        self.render_table(frame, table_area, theme);
        self.render_footer(frame, footer_area, theme);
    }

    fn on_self_event(&self, ctx: WidgetCtx, event: &AppEvent) {
        if let Some(loaded) = event.payload::<StudentsLoaded>() {
            let notification = self
                .viewer
                .borrow_mut()
                .settle(loaded.ticket, loaded.outcome.clone());
            self.clamp_selection();
            if let Some(notification) = notification {
                ctx.show_toast(
                    Toast::new(ToastKind::Error, notification.description)
                        .with_title(notification.title),
                );
            }
            ctx.invalidate();
            return;
        }

        if let Some(StackFilterChanged(filter)) = event.payload::<StackFilterChanged>() {
            tracing::debug!(
                stacks = ?filter.selected().collect::<Vec<_>>(),
                "stack filter changed"
            );
            self.viewer.borrow_mut().set_stack_filter(filter.clone());
            self.clamp_selection();
            ctx.invalidate();
        }
    }

    fn handle_event(&self, ctx: WidgetCtx, event: &Event) -> bool {
        let Some(key) = event.as_key_press_event() else {
            return false;
        };
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home => self.select_edge(false),
            KeyCode::End => self.select_edge(true),
            KeyCode::Enter | KeyCode::Char('g') => return self.open_grades(&ctx),
            KeyCode::Char('c') => return self.open_contact(&ctx),
            KeyCode::Char('s') => {
                self.cycle_sort();
                self.clamp_selection();
            }
            KeyCode::Char('f') => self.open_stack_filter(&ctx),
            KeyCode::Char('?') => {
                ctx.set_popup(Box::new(help::Widget::new(Self::HELP, self.inner.id())));
            }
            _ => return false,
        }
        true
    }

    fn on_close(&self) {
        self.viewer.borrow_mut().close();
    }

    fn tick(&self) {
        if self.viewer.borrow().is_loading() {
            self.view.borrow_mut().throbber.calc_next();
        }
    }

    fn help(&self) -> Option<&[help::Entry<'_>]> {
        Some(Self::HELP)
    }
}
