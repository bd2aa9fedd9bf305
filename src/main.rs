use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use tracing_subscriber::EnvFilter;

use majordrill::app::{App, AppScreen};
use majordrill::config::{Config, Overrides};
use majordrill::engine::range::RangeSpec;
use majordrill::event::{AppEvent, EventHandler};
use majordrill::session::sequence::CheckKind;
use majordrill::store::json_store::{self, JsonStore};
use majordrill::ui;
use majordrill::ui::components::number_display::NumberDisplay;
use majordrill::ui::components::score_view::ScoreView;
use majordrill::ui::components::word_table::{EditField, WordTable};
use majordrill::ui::layout::{AppLayout, pack_hint_lines};
use majordrill::ui::line_input::{InputResult, LineInput};
use majordrill::words::WordMap;

const LOG_ENV: &str = "MAJORDRILL_LOG";
const FLASH_SPEED_STEP_MS: i64 = 250;

#[derive(Parser)]
#[command(name = "majordrill", version, about = "Major system number memory trainer")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Sequence range (ALL, 0-9, 00-09, 10-19 .. 90-99)")]
    range: Option<RangeSpec>,

    #[arg(short, long, help = "Numbers per sequence")]
    count: Option<usize>,

    #[arg(long, help = "Seconds between numbers")]
    pause: Option<f64>,

    #[arg(long, help = "Seconds each number stays visible")]
    flash: Option<f64>,

    #[arg(long, help = "Draw without repeats until the range is exhausted")]
    no_repeats: bool,

    #[arg(long, help = "Load the word dataset from this JSON file")]
    words: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Write the current words as JSON and exit")]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = Config::load().unwrap_or_else(|err| {
        tracing::warn!(%err, "config unreadable, using defaults");
        Config::default()
    });
    let overrides = cli.overrides();

    let store = match JsonStore::new() {
        Ok(store) => Some(store),
        Err(err) => {
            tracing::warn!(%err, "word edits will not be saved");
            None
        }
    };
    let words = load_words(&config, cli.words.as_deref(), store.as_ref())?;

    if let Some(path) = cli.export {
        json_store::export_words(&words, &path)?;
        println!("Exported {} entries to {}", words.len(), path.display());
        return Ok(());
    }

    let mut app = App::new(config, &overrides, words, store);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(25));

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(%err, "exited with error");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

/// Log to a file in the data dir; the terminal belongs to the TUI.
fn init_logging() {
    let dir = json_store::data_dir();
    let file = fs::create_dir_all(&dir).and_then(|_| File::create(dir.join("majordrill.log")));
    let Ok(file) = file else {
        return;
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            theme: self.theme.clone(),
            range: self.range,
            count: self.count,
            pause_secs: self.pause,
            flash_secs: self.flash,
            no_repeats: self.no_repeats,
        }
    }
}

/// Dataset (bundled, or a replacement file) with saved edits on top.
fn load_words(config: &Config, cli_path: Option<&Path>, store: Option<&JsonStore>) -> Result<WordMap> {
    let path = cli_path
        .map(Path::to_path_buf)
        .or_else(|| config.words_path.as_ref().map(PathBuf::from));
    let base = match path {
        Some(path) => json_store::load_dataset(&path)
            .with_context(|| format!("loading word dataset {}", path.display()))?,
        None => WordMap::bundled(),
    };
    tracing::info!(entries = base.len(), "word dataset loaded");
    Ok(match store {
        Some(store) => store.merged_words(base),
        None => base,
    })
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        let now = Instant::now();
        match events.next_timeout(app.poll_interval(now))? {
            AppEvent::Key(key) => handle_key(app, key, Instant::now()),
            AppEvent::Tick | AppEvent::Resize => {}
        }
        app.on_tick(Instant::now());

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent, now: Instant) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit();
        return;
    }

    match app.screen {
        AppScreen::Menu => handle_menu_key(app, key),
        AppScreen::Sequence => handle_sequence_key(app, key, now),
        AppScreen::Flash => handle_flash_key(app, key, now),
        AppScreen::Words => handle_words_key(app, key),
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.quit(),
        KeyCode::Up | KeyCode::Char('k') => app.menu.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.menu.next(),
        KeyCode::Enter => app.activate(app.menu.selected_action()),
        KeyCode::Char(ch) => {
            if let Some(action) = app.menu.action_for(ch) {
                app.activate(action);
            }
        }
        _ => {}
    }
}

fn handle_sequence_key(app: &mut App, key: KeyEvent, now: Instant) {
    if let Some((_, ref mut input)) = app.trainer.answer {
        match input.handle(key) {
            InputResult::Submit => app.submit_answer(),
            InputResult::Cancel => app.cancel_answer(),
            InputResult::Continue => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_to_menu(),
        KeyCode::Enter | KeyCode::Char(' ') => {
            if app.trainer.awaiting_ready {
                app.confirm_ready(now);
            } else {
                app.request_start(now);
            }
        }
        KeyCode::Char('f') => app.open_answer(CheckKind::Forward),
        KeyCode::Char('b') => app.open_answer(CheckKind::Backward),
        KeyCode::Char('p') => app.open_answer(app.partial_kind(false)),
        KeyCode::Char('P') => app.open_answer(app.partial_kind(true)),
        KeyCode::Char('c') => app.clear_history(),
        KeyCode::Right | KeyCode::Char('l') => app.cycle_sequence_range(true),
        KeyCode::Left | KeyCode::Char('h') => app.cycle_sequence_range(false),
        KeyCode::Up | KeyCode::Char('k') => app.adjust_count(1),
        KeyCode::Down | KeyCode::Char('j') => app.adjust_count(-1),
        KeyCode::Char(']') => app.adjust_partial_count(1),
        KeyCode::Char('[') => app.adjust_partial_count(-1),
        KeyCode::Char('=') => app.adjust_pause(0.5),
        KeyCode::Char('-') => app.adjust_pause(-0.5),
        KeyCode::Char('+') => app.adjust_flash_secs(0.5),
        KeyCode::Char('_') => app.adjust_flash_secs(-0.5),
        KeyCode::Char('n') => app.toggle_sequence_no_repeats(),
        KeyCode::Char('m') => app.toggle_manual_start(),
        KeyCode::Char('v') => app.toggle_voice(),
        _ => {}
    }
}

fn handle_flash_key(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_to_menu(),
        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_flash(now),
        KeyCode::Right | KeyCode::Char('l') => app.cycle_flash_range(true),
        KeyCode::Left | KeyCode::Char('h') => app.cycle_flash_range(false),
        // up is faster
        KeyCode::Up | KeyCode::Char('k') => app.adjust_flash_speed(-FLASH_SPEED_STEP_MS, now),
        KeyCode::Down | KeyCode::Char('j') => app.adjust_flash_speed(FLASH_SPEED_STEP_MS, now),
        KeyCode::Char('n') => app.toggle_flash_no_repeats(),
        KeyCode::Char('v') => app.toggle_voice(),
        _ => {}
    }
}

fn handle_words_key(app: &mut App, key: KeyEvent) {
    if let Some((_, ref mut input)) = app.editor.editing {
        match input.handle(key) {
            InputResult::Submit => app.commit_edit(),
            InputResult::Cancel => app.cancel_edit(),
            InputResult::Continue => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_to_menu(),
        KeyCode::Down | KeyCode::Char('j') => app.editor_move(1, 0),
        KeyCode::Up | KeyCode::Char('k') => app.editor_move(-1, 0),
        KeyCode::Right | KeyCode::Tab | KeyCode::Char('l') => app.editor_move(0, 1),
        KeyCode::Left | KeyCode::BackTab | KeyCode::Char('h') => app.editor_move(0, -1),
        KeyCode::Enter | KeyCode::Char('e') => app.begin_edit(EditField::Word),
        KeyCode::Char('s') => app.begin_edit(EditField::Suggestions),
        KeyCode::Char('x') => app.export_words(),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Menu => render_menu(frame, app),
        AppScreen::Sequence => render_sequence(frame, app),
        AppScreen::Flash => render_flash(frame, app),
        AppScreen::Words => render_words(frame, app),
    }
}

fn header_line<'a>(app: &App, title: &'a str, info: String) -> Paragraph<'a> {
    let colors = &app.theme.colors;
    Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {title} "),
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info,
            Style::default().fg(colors.text_muted()).bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()))
}

fn render_status(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let Some(ref status) = app.status else {
        return;
    };
    let colors = &app.theme.colors;
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!(" {status}"),
            Style::default().fg(colors.accent()),
        )),
        area,
    );
}

fn render_footer(frame: &mut ratatui::Frame, app: &App, area: Rect, lines: Vec<String>) {
    let colors = &app.theme.colors;
    let lines: Vec<Line> = lines
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.text_muted()))))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

fn render_menu(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let hints = pack_hint_lines(
        &["[1-3] Open", "[j/k] Move", "[Enter] Select", "[q] Quit"],
        area.width as usize,
    );
    let layout = AppLayout::new(area, hints.len() as u16);

    let info = format!(" {} words", app.words.len());
    frame.render_widget(header_line(app, "majordrill", info), layout.header);

    let menu_area = ui::layout::centered_rect(50, 80, layout.main);
    frame.render_widget(&app.menu, menu_area);

    render_status(frame, app, layout.status);
    render_footer(frame, app, layout.footer, hints);
}

fn render_sequence(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let seq = &app.config.sequence;
    let hints = pack_hint_lines(
        &[
            "[Space] Start",
            "[f/b] Check forward/backward",
            "[p/P] Partial",
            "[c] Clear history",
            "[h/l] Range",
            "[j/k] Count",
            "[ [/] ] Partial count",
            "[-/=] Pause",
            "[_/+] Flash",
            "[n] No repeats",
            "[m] Manual start",
            "[v] Voice",
            "[q] Back",
        ],
        area.width as usize,
    );
    let layout = AppLayout::new(area, hints.len() as u16);

    let info = format!(
        " {} | count {} | pause {:.1}s | flash {:.1}s | partial {} | no repeats {} | manual {} | voice {} | history {}",
        App::range_label(&seq.range),
        seq.count,
        seq.pause_secs,
        seq.flash_secs,
        seq.partial_count,
        on_off(seq.no_repeats),
        on_off(seq.manual_start),
        on_off(app.config.voice),
        app.sequence.history().len(),
    );
    frame.render_widget(header_line(app, "Sequence", info), layout.header);

    let input_height = if app.trainer.answer.is_some() { 3 } else { 0 };
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Length(input_height),
            Constraint::Min(3),
        ])
        .split(layout.main);

    let shown = app.trainer.display.as_ref().map(|k| k.as_str());
    let title = if app.revealing() { "Watch" } else { "Sequence" };
    frame.render_widget(
        NumberDisplay::new(title, shown, app.theme),
        ui::layout::centered_rect(30, 100, main[0]),
    );

    if let Some((kind, ref input)) = app.trainer.answer {
        render_input(frame, app, main[1], kind.label(), input);
    }

    frame.render_widget(ScoreView::new(&app.trainer.outcomes, app.theme), main[2]);

    render_status(frame, app, layout.status);
    render_footer(frame, app, layout.footer, hints);
}

fn render_input(frame: &mut ratatui::Frame, app: &App, area: Rect, label: &str, input: &LineInput) {
    let colors = &app.theme.colors;
    let (before, cursor, after) = input.render_parts();
    let line = Line::from(vec![
        Span::styled(before.to_string(), Style::default().fg(colors.fg())),
        Span::styled(
            cursor.map(String::from).unwrap_or_else(|| " ".to_string()),
            Style::default().fg(colors.bg()).bg(colors.accent()),
        ),
        Span::styled(after.to_string(), Style::default().fg(colors.fg())),
    ]);
    let block = Block::bordered()
        .title(format!(" {label}: type the digits, Enter to check "))
        .border_style(Style::default().fg(colors.border_focused()));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_flash(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let flash = &app.config.flash;
    let toggle_hint = if app.flash_state.running() {
        "[Space] Stop"
    } else {
        "[Space] Start"
    };
    let hints = pack_hint_lines(
        &[
            toggle_hint,
            "[h/l] Range",
            "[j/k] Slower/faster",
            "[n] No repeats",
            "[v] Voice",
            "[q] Back",
        ],
        area.width as usize,
    );
    let layout = AppLayout::new(area, hints.len() as u16);

    let info = format!(
        " {} | every {}ms | no repeats {} | voice {}",
        App::range_label(&flash.range),
        flash.speed_ms,
        on_off(flash.no_repeats),
        on_off(app.config.voice),
    );
    frame.render_widget(header_line(app, "Flash", info), layout.header);

    let frame_data = app.flash.current();
    let number = frame_data.map(|f| f.key.as_str());
    let word = frame_data.map(|f| f.word.as_str());
    frame.render_widget(
        NumberDisplay::new("Flash", number, app.theme).word(word),
        ui::layout::centered_rect(40, 60, layout.main),
    );

    render_status(frame, app, layout.status);
    render_footer(frame, app, layout.footer, hints);
}

fn render_words(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let hints: &[&str] = if app.editor.editing.is_some() {
        &["[Enter] Save", "[Tab] Next suggestion", "[Esc] Cancel"]
    } else {
        &[
            "[j/k] Number",
            "[h/l] Group",
            "[e] Edit word",
            "[s] Edit suggestions",
            "[x] Export",
            "[q] Back",
        ]
    };
    let hints = pack_hint_lines(hints, area.width as usize);
    let layout = AppLayout::new(area, hints.len() as u16);

    let info = format!(" export to {}", app.config.export_path);
    frame.render_widget(header_line(app, "Words", info), layout.header);

    let editing = app.editor.editing.as_ref().map(|(field, input)| (*field, input));
    frame.render_widget(
        WordTable::new(
            &app.editor.groups,
            app.editor.group,
            app.editor.row,
            &app.words,
            app.theme,
        )
        .editing(editing),
        layout.main,
    );

    render_status(frame, app, layout.status);
    render_footer(frame, app, layout.footer, hints);
}
