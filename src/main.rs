mod api;
mod app;
mod config;
mod logging;
mod report;
mod ui;
mod upload;
mod watch;

use anyhow::{Context, Result};
use api::{AnalysisBackend, AnalysisClient};
use app::{expand_paths, App, Focus, InputMode};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use report::ResultView;
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{mpsc, Arc};
use std::time::Duration;
use watch::{DirWatcher, WatchEvent};

/// Terminal client for AI portfolio screenshot analysis
#[derive(Parser)]
#[command(name = "linia", version, about)]
struct Cli {
    /// Screenshot paths or glob patterns (PNG/JPEG, up to 5)
    paths: Vec<String>,

    /// Analysis service base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Analyze and print the report to stdout instead of opening the TUI
    #[arg(long)]
    print: bool,

    /// Fetch the service's sample report instead of uploading
    #[arg(long)]
    sample: bool,

    /// Log to stderr in --print mode
    #[arg(short, long)]
    verbose: bool,
}

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Page size for PgUp/PgDn in the result pane
const PAGE: i32 = 10;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_result = if cli.print {
        if cli.verbose {
            logging::init_logging(logging::LogSink::Stderr)
        } else {
            Ok(())
        }
    } else {
        match logging::default_log_path() {
            Some(path) => logging::init_logging(logging::LogSink::File(&path)),
            None => Ok(()),
        }
    };
    if let Err(e) = log_result {
        // Not fatal: run without a log
        eprintln!("linia: logging disabled: {:#}", e);
    }

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let mut config = config::load_config(&cwd);
    config.apply_env(|key| std::env::var(key).ok());
    if let Some(url) = cli.api_url.clone() {
        config.api.base_url = url;
    }
    if let Some(secs) = cli.timeout {
        config.api.timeout_secs = secs;
    }
    log::info!("service {} (timeout {:?})", config.api.base_url, config.timeout());

    let client = AnalysisClient::new(config.api.base_url.clone(), config.timeout())?;
    let backend: Arc<dyn AnalysisBackend> = Arc::new(client);
    let paths = expand_paths(&cli.paths);

    if cli.print {
        return Ok(run_headless(App::new(config, backend.clone()), backend.as_ref(), &paths, cli.sample));
    }

    let mut app = App::new(config, backend);
    if !paths.is_empty() {
        app.select_paths(&paths);
    }
    if cli.sample {
        app.start_sample();
    }

    let mut highlighter = ui::highlight::Highlighter::new();

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &mut highlighter);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {:?}", err);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// `--print`: validate, analyze (or fetch the sample), print, exit.
fn run_headless(mut app: App, backend: &dyn AnalysisBackend, paths: &[PathBuf], sample: bool) -> ExitCode {
    if sample {
        let ticket = app.session.begin_sample();
        let outcome = backend.sample();
        app.session.finish_analysis(ticket.id, outcome);
    } else {
        app.select_paths(paths);
        if let Some(error) = app.session.upload().error.clone() {
            eprintln!("linia: {}", error);
            return ExitCode::FAILURE;
        }
        app.session.analyze_with(backend);
    }

    if let Some(message) = app.session.analysis().error() {
        eprintln!("linia: {}", message);
        return ExitCode::FAILURE;
    }
    let Some(result) = app.session.analysis().data() else {
        let message = app.session.upload().error.as_deref().unwrap_or(app::session::MSG_SELECT_FILES);
        eprintln!("linia: {}", message);
        return ExitCode::FAILURE;
    };

    let width = crossterm::terminal::size().map(|(w, _)| w).unwrap_or(100);
    let text = ui::render_plain(result, &app.config.display, width);
    let mut out = io::stdout().lock();
    if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
        log::warn!("stdout: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run_app(terminal: &mut Term, app: &mut App, hl: &mut ui::highlight::Highlighter) -> Result<()> {
    // Channel for browser directory changes
    let (watch_tx, watch_rx) = mpsc::channel::<WatchEvent>();
    let mut _watcher: Option<DirWatcher> = None;
    let mut watched: Option<PathBuf> = None;

    loop {
        terminal.draw(|f| ui::draw(f, app, hl))?;

        // Poll with a timeout so worker results and watch events get through
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if app.overlay.is_some() {
                        handle_overlay_input(app, key);
                    } else {
                        match app.input_mode {
                            InputMode::PathInput => handle_path_input(app, key),
                            InputMode::Normal => handle_normal_input(app, key),
                        }
                    }
                }
            }
        }

        app.poll_worker();

        // The watcher follows whatever directory the browser shows
        let wanted = app.browser_dir().map(Path::to_path_buf);
        if wanted != watched {
            _watcher = wanted.as_deref().and_then(|dir| match DirWatcher::new(dir, 300, watch_tx.clone()) {
                Ok(w) => Some(w),
                Err(e) => {
                    log::warn!("{:#}", e);
                    None
                }
            });
            watched = wanted;
        }
        while let Ok(WatchEvent::DirChanged(dir)) = watch_rx.try_recv() {
            if app.browser_dir() == Some(dir.as_path()) {
                app.refresh_browser();
            }
        }

        // Tick: spinner and notification expiry
        app.tick();

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_overlay_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.overlay_next(),
        KeyCode::Char('k') | KeyCode::Up => app.overlay_prev(),
        KeyCode::Enter | KeyCode::Char(' ') => app.overlay_select(),
        KeyCode::Char('a') => app.overlay_confirm(),
        KeyCode::Backspace | KeyCode::Char('h') => app.overlay_go_up(),
        KeyCode::Esc | KeyCode::Char('q') => app.overlay_close(),
        _ => {}
    }
}

fn handle_path_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_path_input(),
        KeyCode::Esc => app.cancel_path_input(),
        KeyCode::Backspace => {
            app.input_buffer.pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => app.input_buffer.push(c),
        _ => {}
    }
}

fn handle_normal_input(app: &mut App, key: KeyEvent) {
    // ── Global keys ──
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
            return;
        }
        KeyCode::Tab => {
            app.toggle_focus();
            return;
        }
        KeyCode::Char('R') => {
            app.reset();
            return;
        }
        KeyCode::Char('a') => {
            app.open_file_browser();
            return;
        }
        KeyCode::Char('i') => {
            app.start_path_input();
            return;
        }
        KeyCode::Char('s') => {
            app.start_sample();
            return;
        }
        KeyCode::Char('r') => {
            app.start_analysis();
            return;
        }
        _ => {}
    }

    match app.focus {
        Focus::Files => handle_files_input(app, key),
        Focus::Result => handle_result_input(app, key),
    }
}

fn handle_files_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.next_file(),
        KeyCode::Char('k') | KeyCode::Up => app.prev_file(),
        KeyCode::Char('x') | KeyCode::Delete => app.remove_selected_file(),
        KeyCode::Enter => app.start_analysis(),
        _ => {}
    }
}

fn handle_result_input(app: &mut App, key: KeyEvent) {
    let Some(view) = app.result_view.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::PageDown => view.scroll_by(PAGE),
        KeyCode::PageUp => view.scroll_by(-PAGE),
        _ => {}
    }
    match view {
        ResultView::Markdown(markdown) => match key.code {
            KeyCode::Char('j') | KeyCode::Down => markdown.scroll = markdown.scroll.saturating_add(1),
            KeyCode::Char('k') | KeyCode::Up => markdown.scroll = markdown.scroll.saturating_sub(1),
            KeyCode::Char('g') | KeyCode::Home => markdown.scroll = 0,
            _ => {}
        },
        ResultView::Tabbed(report) => match key.code {
            KeyCode::Char(c @ '1'..='9') => report.select_tab(c as usize - '1' as usize),
            KeyCode::Char(']') => report.next_tab(),
            KeyCode::Char('[') => report.prev_tab(),
            KeyCode::Char('j') | KeyCode::Down => report.cursor_down(),
            KeyCode::Char('k') | KeyCode::Up => report.cursor_up(),
            KeyCode::Char('l') | KeyCode::Right => report.column_right(),
            KeyCode::Char('h') | KeyCode::Left => report.column_left(),
            KeyCode::Enter | KeyCode::Char(' ') => report.activate(),
            _ => {}
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::report::AnalysisResult;
    use crate::upload::ImageFile;

    struct Offline;

    impl AnalysisBackend for Offline {
        fn analyze(&self, _files: &[ImageFile]) -> std::result::Result<AnalysisResult, ApiError> {
            Err(ApiError::Network("offline".into()))
        }

        fn sample(&self) -> std::result::Result<AnalysisResult, ApiError> {
            Err(ApiError::Network("offline".into()))
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_normal_input(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn shift_r_resets_with_one_notice() {
        let mut app = App::new(config::LiniaConfig::default(), Arc::new(Offline));
        app.toggle_focus();
        press(&mut app, KeyCode::Char('R'));
        assert_eq!(app.focus, Focus::Files);
        assert_eq!(app.notification.as_deref(), Some("초기화되었습니다"));
        assert!(!app.should_quit);
    }

    #[test]
    fn q_quits() {
        let mut app = App::new(config::LiniaConfig::default(), Arc::new(Offline));
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
