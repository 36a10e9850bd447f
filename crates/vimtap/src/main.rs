use std::env;
use std::fs::File;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::event::{self, Event, KeyCode as TermKey, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use vimtap::config::{self, Config};
use vimtap::keys::{logical_name, KeyCode, Keystroke, Modifiers};
use vimtap::vim::Mode;
use vimtap::{Engine, EngineHandle, TextField};

const SAMPLE_TEXT: &str = "the quick brown fox\njumps over the lazy dog\n";

/// How often the UI redraws while idle.
const FRAME: Duration = Duration::from_millis(16);

fn print_version() {
    println!("vimtap {}", env!("CARGO_PKG_VERSION"));
}

fn print_usage() {
    eprintln!("vimtap - vim-style modal editing for plain text fields");
    eprintln!();
    eprintln!("Usage: vimtap [OPTIONS] [TEXT]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [TEXT]                Initial contents of the text field");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -h, --help            Print this help message");
    eprintln!("  -V, --version         Print version information");
    eprintln!("      --config <PATH>   Load configuration from PATH");
    eprintln!("      --no-introspection");
    eprintln!("                        Hide the field's text from the engine");
    eprintln!("                        (word motions use native combos)");
    eprintln!("      --log <PATH>      Write logs to PATH");
    eprintln!();
    eprintln!("Environment Variables:");
    eprintln!("  VIMTAP_LOG            Log filter (default: info)");
    eprintln!("  VIMTAP_CONFIG_DIR     Override the config directory");
    eprintln!();
    eprintln!("Configuration:");
    if let Some(path) = config::config_path() {
        eprintln!("  Config file: {}", path.display());
    }
    eprintln!();
    eprintln!("Press Ctrl+C to quit.");
}

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    log: Option<PathBuf>,
    no_introspection: bool,
    text: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args::default();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config requires a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--log" => {
                let path = iter.next().context("--log requires a path")?;
                parsed.log = Some(PathBuf::from(path));
            }
            "--no-introspection" => parsed.no_introspection = true,
            other if other.starts_with('-') => bail!("unknown option: {other}"),
            other => parsed.text = Some(other.to_string()),
        }
    }
    Ok(parsed)
}

fn init_logging(path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| env::temp_dir().join("vimtap.log"));
    let file = File::create(&path)
        .with_context(|| format!("Failed to create log file: {}", path.display()))?;
    let filter = EnvFilter::try_from_env("VIMTAP_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;
    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let mut cfg = match &args.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config().unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {e:#}");
            eprintln!("Warning: Failed to load config: {e:#}");
            Config::default()
        }),
    };
    if let Err(e) = config::validate(&cfg) {
        tracing::warn!("Invalid config, using defaults: {e:#}");
        cfg = Config::default();
    }
    if args.no_introspection {
        cfg.field.introspection = false;
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return Ok(());
    }

    if args.iter().any(|a| a == "-V" || a == "--version") {
        print_version();
        return Ok(());
    }

    let args = parse_args(&args)?;
    init_logging(args.log.clone())?;
    let cfg = load_config(&args)?;

    let text = args.text.as_deref().unwrap_or(SAMPLE_TEXT);
    let field = Arc::new(Mutex::new(
        TextField::new(text).with_introspection(cfg.field.introspection),
    ));

    let rt = Runtime::new().context("failed to initialize tokio runtime")?;
    let engine = Engine::new(&cfg, Arc::clone(&field));
    let (handle, task) = EngineHandle::spawn(rt.handle(), engine, cfg.timing.reply_timeout());

    let mut terminal =
        init_terminal().context("failed to initialize terminal; are you running in a real TTY?")?;

    let res = run(&mut terminal, &handle, &field);

    handle.terminate_blocking();
    drop(task);
    restore_terminal(terminal)?;

    res
}

fn lock(field: &Mutex<TextField>) -> MutexGuard<'_, TextField> {
    field.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Translate a terminal key into the capture layer's view of it: the
/// logical key name, its physical code, and the keystroke that performs it
/// when it passes through.
///
/// Terminals never report Command, so Control stands in for it.
fn capture(key: event::KeyEvent) -> Option<(String, Keystroke)> {
    let mut modifiers = Modifiers::empty();
    if key.modifiers.contains(KeyModifiers::SHIFT) {
        modifiers |= Modifiers::SHIFT;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        modifiers |= Modifiers::COMMAND;
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        modifiers |= Modifiers::OPTION;
    }

    let stroke = match key.code {
        TermKey::Char(c) => {
            let typed = Keystroke::for_char(c)?;
            if modifiers.intersects(Modifiers::COMMAND | Modifiers::OPTION) {
                let code = Keystroke::for_char(c.to_ascii_lowercase())?.code;
                return Some((c.to_string(), Keystroke::new(code, modifiers - Modifiers::SHIFT)));
            }
            return Some((c.to_string(), typed));
        }
        TermKey::Esc => Keystroke::plain(KeyCode::ESCAPE),
        TermKey::Enter => Keystroke::plain(KeyCode::RETURN),
        TermKey::Tab => Keystroke::plain(KeyCode::TAB),
        TermKey::Backspace => Keystroke::new(KeyCode::BACKSPACE, modifiers),
        TermKey::Delete => Keystroke::new(KeyCode::FORWARD_DELETE, modifiers),
        TermKey::Left => Keystroke::new(KeyCode::LEFT, modifiers),
        TermKey::Right => Keystroke::new(KeyCode::RIGHT, modifiers),
        TermKey::Up => Keystroke::new(KeyCode::UP, modifiers),
        TermKey::Down => Keystroke::new(KeyCode::DOWN, modifiers),
        TermKey::Home => Keystroke::new(KeyCode::LEFT, modifiers | Modifiers::COMMAND),
        TermKey::End => Keystroke::new(KeyCode::RIGHT, modifiers | Modifiers::COMMAND),
        _ => return None,
    };
    let name = logical_name(stroke.code, false)?;
    Some((name, stroke))
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    handle: &EngineHandle,
    field: &Mutex<TextField>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, handle.mode(), &lock(field)))?;

        if !event::poll(FRAME)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if key.code == TermKey::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            tracing::info!("quit requested");
            return Ok(());
        }

        let Some((name, stroke)) = capture(key) else {
            continue;
        };
        if !handle.on_physical_key(&name, stroke.code) {
            lock(field).press(stroke);
        }
    }
}

fn field_lines(field: &TextField) -> Vec<Line<'static>> {
    let text: Vec<char> = field.text().chars().collect();
    let selection = field.selection();
    let (start, end, style) = if selection.is_empty() {
        let caret = Style::default().add_modifier(Modifier::UNDERLINED | Modifier::BOLD);
        (selection.offset, selection.offset + 1, caret)
    } else {
        let block = Style::default().add_modifier(Modifier::REVERSED);
        (selection.offset, selection.end(), block)
    };

    let mut lines = Vec::new();
    let mut spans = Vec::new();
    for (i, &c) in text.iter().enumerate() {
        let highlighted = (start..end).contains(&i);
        if c == '\n' {
            if highlighted {
                spans.push(Span::styled(" ", style));
            }
            lines.push(Line::from(std::mem::take(&mut spans)));
            continue;
        }
        if highlighted {
            spans.push(Span::styled(c.to_string(), style));
        } else {
            spans.push(Span::raw(c.to_string()));
        }
    }
    if start >= text.len() {
        spans.push(Span::styled(" ", style));
    }
    lines.push(Line::from(spans));
    lines
}

fn draw(frame: &mut Frame, mode: Mode, field: &TextField) {
    let [body, status, help] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let editor = Paragraph::new(field_lines(field))
        .block(Block::default().borders(Borders::ALL).title(" vimtap "))
        .wrap(Wrap { trim: false });
    frame.render_widget(editor, body);

    let recent: Vec<String> = field
        .recent_keys()
        .rev()
        .take(6)
        .map(ToString::to_string)
        .collect();
    let status_line = Line::from(vec![
        Span::raw(format!(" {} ", mode.label())).reversed().bold(),
        Span::raw("  injected: "),
        Span::raw(recent.join(" ")).dim(),
    ]);
    frame.render_widget(Paragraph::new(status_line), status);

    let hint = Line::from(" jk: normal   i/a/o: insert   v/V: visual   Ctrl+C: quit ").dim();
    frame.render_widget(Paragraph::new(hint), help);
}

fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
