use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use propmap::app::App;
use propmap::config::{Cli, Settings};
use propmap::{loader, ui};
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tokio::runtime::{self, Runtime};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let settings = Settings::resolve(Cli::parse())?;
    init_logging(&settings.log_file)?;

    let runtime = runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &runtime, &settings);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Log to a file; stdout belongs to the terminal UI
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {e}"))
}

/// Fresh app with its base map and a dataset load in flight
fn start(settings: &Settings, runtime: &Runtime, width: u16, height: u16) -> App {
    let mut app = App::new(settings, width, height);
    if let Some(path) = &settings.coastlines {
        if let Err(e) = app.basemap.load_coastlines(path) {
            warn!(error = ?e, "base map unavailable");
        }
    }
    info!(path = %settings.data_path.display(), "loading dataset");
    app.attach_loader(loader::spawn_load(runtime.handle(), settings.data_path.clone()));
    app
}

/// Handle mouse events: hover, controls, panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Moved => app.set_mouse_pos(mouse.column, mouse.row),
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => app.press(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
            app.set_mouse_pos(mouse.column, mouse.row);
        }
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, runtime: &Runtime, settings: &Settings) -> Result<()> {
    let size = terminal.size()?;
    let mut app = start(settings, runtime, size.width, size.height);

    loop {
        app.poll_load();

        terminal.draw(|frame| ui::render(frame, &app))?;

        // ~60fps
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                    // Attribute sequence
                    KeyCode::Char(']') | KeyCode::Char('.') | KeyCode::Char('n') => app.forward(),
                    KeyCode::Char('[') | KeyCode::Char(',') | KeyCode::Char('p') => app.reverse(),
                    KeyCode::Char(c @ '1'..='9') => {
                        let slot = c.to_digit(10).unwrap_or(1) as usize;
                        app.set_index(slot - 1);
                    }

                    // Pan with hjkl or arrow keys
                    KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                    KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                    KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                    KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                    KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                    KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                    KeyCode::Char('g') | KeyCode::Char('G') => app.basemap.toggle_graticule(),
                    KeyCode::Char('c') | KeyCode::Char('C') => app.basemap.toggle_coastlines(),
                    KeyCode::Char('i') | KeyCode::Char('I') => app.toggle_inspector(),

                    KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

                    _ => {}
                },
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    info!("quit");
    Ok(())
}
