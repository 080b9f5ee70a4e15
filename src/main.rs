use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use color_eyre::{
    Result,
    eyre::{WrapErr, eyre},
};
use crossterm::event::{Event, EventStream, KeyCode, KeyModifiers};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Layout},
    style::Style,
};
use tokio_stream::StreamExt;

use mentorboard::{config::Config, firebase, store::RecordSource};

mod env;
mod help;
mod logging;
mod subcommands;
mod util;
mod widgets;

use env::{Env, Message};
use widgets::{Popup, StudentsWidget, Widget, theme::Theme, toast::ActiveToast};

#[derive(clap::Parser)]
#[command(
    name = "mentorboard",
    version,
    about = "Mentoring program dashboard: student grades and certifications",
    long_about = None
)]
struct Cli {
    /// Increase output verbosity (-v, -vv, etc.)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Realtime Database URL, e.g. https://<project>-default-rtdb.firebaseio.com
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Database path holding the student records
    #[arg(long, global = true)]
    path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Print the student records sorted by batch and exit
    List {
        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        return Err(eyre!("A TLS crypto provider was already installed"));
    }

    let cli = <Cli as clap::Parser>::parse();
    let target = match cli.command {
        Some(_) => logging::LogTarget::Stderr,
        None => logging::LogTarget::File,
    };
    if let Some(path) = logging::init(cli.verbose, target)? {
        tracing::debug!(path = %path.display(), "logging to file");
    }

    let mut config = Config::load(cli.config.as_deref()).wrap_err("Failed to load configuration")?;
    if let Some(url) = cli.database_url {
        config.database_url = Some(url);
    }
    if let Some(path) = cli.path {
        config.path = path;
    }
    let source: Arc<dyn RecordSource> = Arc::new(firebase::new_source(&config)?);

    match cli.command {
        Some(Commands::List { json }) => {
            let options = subcommands::list::Options { json };
            subcommands::list::command(source.as_ref(), &config.path, options).await
        }
        None => {
            let theme = Theme::detect(config.theme);
            let root = StudentsWidget::new(source, config.path);
            App::new(theme).run_tui(Box::new(root)).await
        }
    }
}

enum Step {
    Draw,
    Tick,
    Input(Event),
    Message(Message),
    Quit,
}

struct App {
    should_quit: bool,
    widgets: Vec<Box<dyn Widget>>,
    popup: Option<Box<dyn Popup>>,
    toast: Option<ActiveToast>,
    theme: Theme,
    env: Env,
}

impl App {
    const FRAMES_PER_SECOND: f32 = 30.0;
    const TICK: Duration = Duration::from_millis(100);

    fn new(theme: Theme) -> Self {
        Self {
            should_quit: false,
            widgets: Vec::new(),
            popup: None,
            toast: None,
            theme,
            env: Env::new(),
        }
    }

    async fn run_tui(self, root: Box<dyn Widget>) -> Result<()> {
        let terminal = ratatui::init();
        let app_result = self.run(terminal, root).await;
        ratatui::restore();
        app_result
    }

    async fn run(mut self, mut terminal: DefaultTerminal, root: Box<dyn Widget>) -> Result<()> {
        self.push_widget(root);

        let period = Duration::from_secs_f32(1.0 / Self::FRAMES_PER_SECOND);
        let mut frames = tokio::time::interval(period);
        let mut ticks = tokio::time::interval(Self::TICK);
        let mut events = EventStream::new();

        while !self.should_quit {
            let step = tokio::select! {
                _ = frames.tick() => Step::Draw,
                _ = ticks.tick() => Step::Tick,
                Some(Ok(event)) = events.next() => Step::Input(event),
                Some(msg) = self.env.rx().recv() => Step::Message(msg),
                _ = tokio::signal::ctrl_c() => Step::Quit,
            };
            match step {
                Step::Draw => {
                    if self
                        .toast
                        .as_ref()
                        .is_some_and(|toast| toast.is_expired(Instant::now()))
                    {
                        self.toast = None;
                    }
                    terminal.draw(|frame| self.render(frame))?;
                }
                Step::Tick => {
                    if let Some(widget) = self.widgets.last() {
                        widget.tick();
                    }
                }
                Step::Input(event) => self.handle_event(&event),
                Step::Message(msg) => self.handle_message(msg),
                Step::Quit => self.should_quit = true,
            }
        }

        while let Some(widget) = self.widgets.pop() {
            widget.on_close();
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(
            ratatui::widgets::Block::default().style(Style::default().bg(self.theme.bg())),
            area,
        );

        let help_entries = self
            .popup
            .as_ref()
            .and_then(|popup| popup.help())
            .or_else(|| self.widgets.last().and_then(|widget| widget.help()));
        let help_height = help_entries.map_or(0, |entries| help::height(entries, area, &self.theme));
        let layout = Layout::vertical([Constraint::Fill(1), Constraint::Length(help_height)]);
        let [body_area, help_area] = area.layout(&layout);

        if let Some(widget) = self.widgets.last() {
            widget.render(frame, body_area, &self.theme);
        }
        if let Some(popup) = self.popup.as_ref() {
            popup.render(frame, popup.rect(body_area), &self.theme);
        }
        if let Some(entries) = help_entries {
            help::render(entries, frame, help_area, &self.theme);
        }
        if let Some(toast) = self.toast.as_ref() {
            toast.render(frame, body_area, &self.theme);
        }
    }

    fn handle_event(&mut self, event: &Event) {
        if let Some(key) = event.as_key_press_event()
            && key.code == KeyCode::Char('c')
            && key.modifiers.contains(KeyModifiers::CONTROL)
        {
            self.should_quit = true;
            return;
        }
        if let Some(popup) = self.popup.as_ref() {
            popup.handle_event(self.env.ctx(popup.id()), event);
            return;
        }
        if let Some(widget) = self.widgets.last()
            && widget.handle_event(self.env.ctx(widget.id()), event)
        {
            return;
        }
        if let Some(key) = event.as_key_press_event()
            && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
        {
            self.should_quit = true;
        }
    }

    fn handle_message(&mut self, msg: Message) {
        match msg {
            // every frame is redrawn anyway
            Message::Invalidate => {}
            Message::SetPopup(popup) => {
                if let Some(previous) = self.popup.take() {
                    previous.on_close();
                }
                popup.start(self.env.ctx(popup.id()));
                self.popup = Some(popup);
            }
            Message::DismissPopup => {
                if let Some(popup) = self.popup.take() {
                    popup.on_close();
                }
            }
            Message::ShowToast(toast) => {
                self.toast = Some(ActiveToast::new(toast, Instant::now()));
            }
            Message::Emit(event) => {
                let target = event.target();
                let ctx = self.env.ctx(target);
                if let Some(popup) = self.popup.as_ref().filter(|popup| popup.id() == target) {
                    popup.on_self_event(ctx, &event);
                } else if let Some(widget) = self.widgets.iter().find(|widget| widget.id() == target) {
                    widget.on_self_event(ctx, &event);
                } else {
                    tracing::debug!(target_id = %target, "dropping event for unmounted widget");
                }
            }
        }
    }

    fn push_widget(&mut self, widget: Box<dyn Widget>) {
        tracing::debug!(widget = widget.inner().name(), id = %widget.id(), "pushed");
        widget.start(self.env.ctx(widget.id()));
        self.widgets.push(widget);
    }
}
