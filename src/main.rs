use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;

use rightmenu::app::{persisted_theme, App};
use rightmenu::config::{self, Config, DeviceMode};
use rightmenu::core::NotifyLevel;
use rightmenu::infrastructure::runtime::RuntimeBridge;
use rightmenu::infrastructure::SystemEnvironment;
use rightmenu::logging;
use rightmenu::menu::DeviceCapabilities;
use rightmenu::page::loader::{build_document, demo_page, load_page};
use rightmenu::page::{Page, Viewport};
use rightmenu::ui::{self, layout};

/// Rows moved per wheel notch
const WHEEL_ROWS: i32 = 3;

#[derive(Debug, Parser)]
#[command(
    name = "rightmenu",
    version,
    about = "View a page in the terminal with a contextual right-click menu"
)]
struct Args {
    /// Page description (TOML). Shows the built-in demo page when omitted.
    page: Option<PathBuf>,

    /// Treat the terminal as a touch device (long-press opens the menu)
    #[arg(long, conflicts_with = "pointer")]
    touch: bool,

    /// Treat the terminal as a pointer device (right click opens the menu)
    #[arg(long)]
    pointer: bool,

    /// Classify the device from this user-agent string
    #[arg(long)]
    user_agent: Option<String>,

    /// Config file (defaults to ~/.config/rightmenu/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug, trace
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = match args.config.as_deref() {
        Some(path) => config::load_from(path)?,
        None => config::load(),
    };
    apply_device_args(&args, &mut config);

    let level = logging::parse_level(args.log_level.as_deref().or(config.log.level.as_deref()));
    if let Some(path) = config.log.file.clone().or_else(config::log_path) {
        logging::init(&path, level);
    }

    let spec = match args.page.as_deref() {
        Some(path) => load_page(path)?,
        None => demo_page()?,
    };
    let capabilities = DeviceCapabilities::from_config(&config.device);
    log::info!("viewing {} as {capabilities:?}", spec.url);

    let download_dir = config
        .downloads
        .dir
        .clone()
        .unwrap_or_else(config::default_download_dir);
    let env = Arc::new(SystemEnvironment::new(download_dir));
    let runtime =
        RuntimeBridge::new(env, config.messages.clone()).context("start runtime worker")?;

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let page_area = layout::areas(size).page;
    let viewport = Viewport {
        width: page_area.width as u32,
        height: page_area.height as u32,
    };
    let document = build_document(&spec, viewport, &config.dom);
    let theme_file = config::data_dir().map(|dir| dir.join("theme"));
    let saved_theme = theme_file.as_deref().and_then(persisted_theme);

    let mut app = App::new(&config, document, capabilities, theme_file);
    if let (None, Some(theme)) = (spec.theme.as_ref(), saved_theme) {
        app.set_theme(theme);
    }

    let res = run_app(&mut terminal, app, &runtime);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("{err:?}");
        eprintln!("{err:?}");
    }

    Ok(())
}

fn apply_device_args(args: &Args, config: &mut Config) {
    if args.touch {
        config.device.mode = DeviceMode::Touch;
    } else if args.pointer {
        config.device.mode = DeviceMode::Pointer;
    } else if let Some(user_agent) = args.user_agent.clone() {
        config.device.mode = DeviceMode::Auto;
        config.device.user_agent = Some(user_agent);
    }
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    runtime: &RuntimeBridge,
) -> Result<()> {
    // Short ticks keep long-press timing close to the configured hold time
    let tick_rate = Duration::from_millis(40);
    let mut last_tick = Instant::now();

    loop {
        pump_background(&mut app, runtime);
        terminal.draw(|f| ui::draw(f, &app))?;
        if app.should_quit {
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            let areas = layout::areas(terminal.size()?);
            match event::read()? {
                Event::Key(key) => handle_key(&mut app, key),
                Event::Mouse(mouse) => handle_mouse(&mut app, &areas, mouse),
                Event::Resize(width, height) => {
                    let page = layout::areas(Rect::new(0, 0, width, height)).page;
                    app.resize(page.width as u32, page.height as u32);
                }
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick(Instant::now());
            last_tick = Instant::now();
        }

        pump_background(&mut app, runtime);
    }
}

/// Hand queued tasks to the runtime and apply finished results
fn pump_background(app: &mut App, runtime: &RuntimeBridge) {
    for task in app.take_tasks() {
        if let Err(err) = runtime.run(task) {
            app.set_status(format!("{err:#}"), NotifyLevel::Error);
        }
    }
    for event in runtime.poll_events() {
        app.apply_runtime_event(event);
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true
        }
        KeyCode::Esc => app.dismiss_menu(),
        KeyCode::Char('t') => app.toggle_theme(),
        KeyCode::Down | KeyCode::Char('j') => app.scroll(1),
        KeyCode::Up | KeyCode::Char('k') => app.scroll(-1),
        KeyCode::PageDown => app.scroll(page_rows(app)),
        KeyCode::PageUp => app.scroll(-page_rows(app)),
        _ => {}
    }
}

fn page_rows(app: &App) -> i32 {
    (app.document.viewport().height as i32 - 1).max(1)
}

fn handle_mouse(app: &mut App, areas: &layout::UiAreas, mouse: MouseEvent) {
    let position = layout::to_page(areas, mouse.column, mouse.row);
    app.hover = position;
    let Some((x, y)) = position else {
        return;
    };
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Right) => {
            let bypass = mouse.modifiers.contains(KeyModifiers::CONTROL);
            app.secondary_click(x, y, bypass);
        }
        MouseEventKind::Down(MouseButton::Left) => app.pointer_down(x, y, Instant::now()),
        MouseEventKind::Drag(MouseButton::Left) => app.pointer_drag(x, y),
        MouseEventKind::Up(MouseButton::Left) => app.pointer_up(x, y),
        MouseEventKind::ScrollDown => app.scroll(WHEEL_ROWS),
        MouseEventKind::ScrollUp => app.scroll(-WHEEL_ROWS),
        _ => {}
    }
}
