//! batmon panel
//!
//! A terminal control panel hosting one battery widget. The widget renders
//! into an in-memory surface; each frame is drawn from that surface.

use anyhow::{Context, Result};
use batmon_widget::{
    BatteryWidget, Element, LedColor, MemorySurface, Surface, TargetIds, UNAVAILABLE,
    WidgetConfig,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;

/// Log file name, created in the temp directory
const LOG_FILE: &str = "batmon-panel.log";

/// Everything one frame needs, copied out of the surface
#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    nav_visible: bool,
    primary: String,
    led: Option<LedColor>,
    rows: [(&'static str, String); 5],
}

impl Snapshot {
    fn capture(surface: &MemorySurface, targets: &TargetIds) -> Self {
        let text = |id: &str| surface.text(id).unwrap_or(UNAVAILABLE).to_string();

        Self {
            nav_visible: surface.is_visible(&targets.nav_item),
            primary: text(&targets.text),
            led: surface.class(&targets.led).and_then(LedColor::from_class),
            rows: [
                ("Percent", text(&targets.percent)),
                ("Voltage", text(&targets.voltage)),
                ("Status", text(&targets.status)),
                ("Rate", text(&targets.rate)),
                ("Time left", text(&targets.eta)),
            ],
        }
    }
}

/// Application state
struct App {
    /// Battery widget rendering into the in-memory surface
    widget: BatteryWidget<MemorySurface>,

    /// Display target identifiers
    targets: TargetIds,

    /// Monitor endpoint shown in the header
    endpoint: String,

    /// Status message
    status: String,

    /// Should quit
    should_quit: bool,
}

impl App {
    fn new(config: &WidgetConfig) -> Result<Self> {
        let surface = MemorySurface::with_targets(config.targets.ids());
        let widget =
            BatteryWidget::new(config, surface).context("Failed to create battery widget")?;

        Ok(Self {
            widget,
            targets: config.targets.clone(),
            endpoint: config.endpoint.clone(),
            status: "Starting".to_string(),
            should_quit: false,
        })
    }

    fn handle_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('r') => {
                self.widget.start();
                self.status = "Polling restarted".to_string();
            }
            KeyCode::Char('h') => {
                let visible = self.toggle_nav_item();
                self.status = if visible { "Shown" } else { "Hidden" }.to_string();
            }
            KeyCode::Esc | KeyCode::Char('q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    /// Flip the nav entry's visibility, returning the new state.
    /// The next successful render shows it again.
    fn toggle_nav_item(&mut self) -> bool {
        let id = self.targets.nav_item.clone();
        self.widget.with_surface(|surface| {
            let visible = !surface.is_visible(&id);
            if let Some(nav) = surface.element(&id) {
                nav.set_visible(visible);
            }
            visible
        })
    }

    fn snapshot(&self) -> Snapshot {
        self.widget
            .with_surface(|surface| Snapshot::capture(surface, &self.targets))
    }
}

fn led_color(led: Option<LedColor>) -> Color {
    match led {
        Some(LedColor::Green) => Color::Green,
        Some(LedColor::Yellow) => Color::Yellow,
        Some(LedColor::Red) => Color::Red,
        Some(LedColor::Gray) | None => Color::DarkGray,
    }
}

/// Draw the UI
fn draw_ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Nav entry
            Constraint::Min(0),    // Details
            Constraint::Length(3), // Footer
        ])
        .split(frame.size());

    let snapshot = app.snapshot();

    draw_header(frame, chunks[0], app);
    draw_nav_entry(frame, chunks[1], &snapshot);
    draw_details(frame, chunks[2], &snapshot);
    draw_footer(frame, chunks[3], app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let header = Paragraph::new(format!("batmon - {}", app.endpoint))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

fn draw_nav_entry(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let line = if snapshot.nav_visible {
        Line::from(vec![
            Span::styled("● ", Style::default().fg(led_color(snapshot.led))),
            Span::styled(
                snapshot.primary.as_str(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(Span::styled(
            "(battery hidden)",
            Style::default().fg(Color::DarkGray),
        ))
    };

    let nav = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Battery"));
    frame.render_widget(nav, area);
}

fn draw_details(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let lines: Vec<Line> = snapshot
        .rows
        .iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(
                    format!("{:<10}", format!("{}:", label)),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(value.as_str()),
            ])
        })
        .collect();

    let details = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Details"));
    frame.render_widget(details, area);
}

fn draw_footer(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let help = Paragraph::new("[R] Restart polling  [H] Hide/show  [Q] Quit")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));

    let running = if app.widget.is_running() { "polling" } else { "stopped" };
    let status = Paragraph::new(format!("{} ({})", app.status, running))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(help, chunks[0]);
    frame.render_widget(status, chunks[1]);
}

/// Setup logging to a file; the terminal belongs to the UI
fn setup_logging() -> Result<PathBuf> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let path = std::env::temp_dir().join(LOG_FILE);
    let file = File::create(&path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();

    Ok(path)
}

fn load_config() -> Result<WidgetConfig> {
    match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => WidgetConfig::load(&path)
            .with_context(|| format!("Failed to load {}", path.display())),
        None => WidgetConfig::load_default().context("Failed to load widget configuration"),
    }
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| draw_ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.handle_input(key.code);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn main() -> Result<()> {
    let log_path = setup_logging()?;
    info!("batmon panel starting, logging to {}", log_path.display());

    let config = load_config()?;

    // Polling runs on the runtime's workers while the UI loop blocks here
    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let _guard = runtime.enter();

    let mut app = App::new(&config)?;
    app.widget.start();
    app.status = "Polling".to_string();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.widget.stop();
    info!("batmon panel exiting");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_surface(targets: &TargetIds) -> MemorySurface {
        let mut surface = MemorySurface::with_targets(targets.ids());
        let mut set = |id: &str, text: &str| {
            surface.element(id).unwrap().set_text(text);
        };
        set(&targets.text, "42%");
        set(&targets.percent, "42.3%");
        set(&targets.voltage, "12.10V");
        set(&targets.status, "Discharging");
        set(&targets.rate, "-1.20%/h");
        set(&targets.eta, "5h 30m");
        surface
            .element(&targets.led)
            .unwrap()
            .set_class("led-battery led-battery-medium led-yellow");
        surface.element(&targets.nav_item).unwrap().set_visible(true);
        surface
    }

    #[test]
    fn test_snapshot_reads_every_target() {
        let targets = TargetIds::default();
        let snapshot = Snapshot::capture(&sample_surface(&targets), &targets);

        assert!(snapshot.nav_visible);
        assert_eq!(snapshot.primary, "42%");
        assert_eq!(snapshot.led, Some(LedColor::Yellow));
        assert_eq!(snapshot.rows[0], ("Percent", "42.3%".to_string()));
        assert_eq!(snapshot.rows[4], ("Time left", "5h 30m".to_string()));
    }

    #[test]
    fn test_snapshot_of_blank_surface() {
        let targets = TargetIds::default();
        let surface = MemorySurface::with_targets(targets.ids());
        let snapshot = Snapshot::capture(&surface, &targets);

        assert_eq!(snapshot.led, None);
        assert!(snapshot.rows.iter().all(|(_, value)| value.is_empty()));
    }

    #[test]
    fn test_led_color() {
        assert_eq!(led_color(Some(LedColor::Green)), Color::Green);
        assert_eq!(led_color(Some(LedColor::Red)), Color::Red);
        assert_eq!(led_color(Some(LedColor::Gray)), Color::DarkGray);
        assert_eq!(led_color(None), Color::DarkGray);
    }
}
