pub mod celebration;
pub mod language;
pub mod stats;
pub mod thok;
pub mod ui;
pub mod util;
pub mod word_generator;

// Keep the old lang module name for compatibility
pub use language as lang;

use crate::{
    lang::Language,
    thok::Thok,
    word_generator::{WordGenConfig, WordGenerator},
};
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    sync::mpsc,
    thread,
    time::Duration,
};
use webbrowser::Browser;

const TICK_RATE_MS: u64 = 100;

/// sleek typing tui with visualized results and intelligent practice
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A sleek typing TUI with intelligent word selection that adapts to your weaknesses, detailed performance analytics, and historical progress tracking."
)]
pub struct Cli {
    /// number of words to use in test
    #[clap(short = 'w', long, default_value_t = 15)]
    number_of_words: usize,

    /// number of sentences to use in test
    #[clap(short = 'f', long = "full-sentences")]
    number_of_sentences: Option<usize>,

    /// number of seconds to run test
    #[clap(short = 's', long)]
    number_of_secs: Option<usize>,

    /// custom prompt to use
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// language to pull words from
    #[clap(short = 'l', long, value_enum, default_value_t = SupportedLanguage::English)]
    supported_language: SupportedLanguage,

    /// use random word selection instead of intelligent character-based selection (default: intelligent selection that targets your weakest characters)
    #[clap(long)]
    random_words: bool,

    /// enable capitalization, punctuation, and commas for realistic typing practice
    #[clap(long)]
    capitalize: bool,

    /// enable strict mode: stop on errors and require correction before proceeding
    #[clap(long)]
    strict: bool,

    /// include symbols and special characters for comprehensive typing practice
    #[clap(long)]
    symbols: bool,

    /// enable character substitution mode: create "almost English" words by replacing characters with ones that need most practice
    #[clap(long)]
    substitute: bool,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
pub enum SupportedLanguage {
    English,
    English1k,
    English10k,
}

impl SupportedLanguage {
    fn as_lang(&self) -> Language {
        Language::new(self.to_string().to_lowercase())
    }
}

impl Cli {
    /// Convert CLI arguments to word generation configuration
    fn to_word_gen_config(&self, custom_prompt: Option<String>) -> WordGenConfig {
        WordGenConfig {
            number_of_words: self.number_of_words,
            number_of_sentences: self.number_of_sentences,
            custom_prompt,
            language: self.supported_language,
            random_words: self.random_words,
            substitute: self.substitute,
            capitalize: self.capitalize,
            symbols: self.symbols,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Typing,
    Results,
    CharacterStats,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortBy {
    Character,
    AvgTime,
    MissRate,
    Attempts,
}

#[derive(Debug)]
pub struct CharStatsState {
    pub scroll_offset: usize,
    pub sort_by: SortBy,
    pub sort_ascending: bool,
}

impl Default for CharStatsState {
    fn default() -> Self {
        Self {
            scroll_offset: 0,
            sort_by: SortBy::Character,
            sort_ascending: true,
        }
    }
}

#[derive(Debug)]
pub struct App {
    pub cli: Option<Cli>,
    pub thok: Thok,
    pub state: AppState,
    pub char_stats_state: CharStatsState,
}

impl App {
    pub fn new(cli: Cli) -> Self {
        let config = cli.to_word_gen_config(cli.prompt.clone());
        let generator = WordGenerator::new(config);
        let (prompt, word_count) = generator.generate_prompt();

        Self {
            thok: Thok::new(
                prompt,
                word_count,
                cli.number_of_secs.map(|ns| ns as f64),
                cli.strict,
            ),
            cli: Some(cli),
            state: AppState::Typing,
            char_stats_state: CharStatsState::default(),
        }
    }

    pub fn reset(&mut self, new_prompt: Option<String>) {
        let cli = self.cli.clone().unwrap();
        let config = cli.to_word_gen_config(new_prompt);
        let generator = WordGenerator::new(config);
        let (prompt, word_count) = generator.generate_prompt();

        self.thok = Thok::new(
            prompt,
            word_count,
            cli.number_of_secs.map(|ns| ns as f64),
            cli.strict,
        );
        self.state = AppState::Typing;
        self.char_stats_state = CharStatsState::default();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(cli);
    start_tui(&mut terminal, &mut app)?;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    Ok(())
}

#[derive(Debug)]
enum ExitType {
    Restart,
    New,
    Quit,
}
fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: &mut App,
) -> Result<(), Box<dyn Error>> {
    // Always enable ticking for celebration animations and timed sessions
    let should_tick = true;

    let thok_events = get_thok_events(should_tick);

    loop {
        let mut exit_type: ExitType = ExitType::Quit;
        terminal.draw(|f| ui(app, f))?;

        loop {
            let app = &mut app;

            match thok_events.recv()? {
                ThokEvent::Tick => {
                    if app.thok.has_started() && !app.thok.has_finished() {
                        app.thok.on_tick();

                        if app.thok.has_finished() {
                            app.thok.calc_results();
                            // Get terminal size for celebration
                            let size = terminal.size().unwrap_or_default();
                            app.thok
                                .start_celebration_if_perfect(size.width, size.height);
                            app.state = AppState::Results;
                        }
                    }

                    // Always update celebration animation if active
                    app.thok.update_celebration();

                    // Draw on every tick if there's active animation or during typing
                    if app.thok.celebration.is_active
                        || (app.thok.has_started() && !app.thok.has_finished())
                    {
                        terminal.draw(|f| ui(app, f))?;
                    }
                }
                ThokEvent::Resize => {
                    terminal.draw(|f| ui(app, f))?;
                }
                ThokEvent::Key(key) => {
                    match key.code {
                        KeyCode::Esc => {
                            break;
                        }
                        KeyCode::Backspace => {
                            if app.state == AppState::Typing && !app.thok.has_finished() {
                                app.thok.backspace();
                            }
                        }
                        KeyCode::Left => {
                            exit_type = ExitType::Restart;
                            break;
                        }
                        KeyCode::Right => {
                            exit_type = ExitType::New;
                            break;
                        }
                        KeyCode::Char(c) => {
                            if key.modifiers.contains(KeyModifiers::CONTROL)
                                && key.code == KeyCode::Char('c')
                            // ctrl+c to quit
                            {
                                break;
                            }

                            match app.state {
                                AppState::Typing => {
                                    if !app.thok.has_finished() {
                                        // Remove the immediate on_keypress_start() call
                                        // The write() method will now use inter-keystroke timing
                                        app.thok.write(c);
                                        if app.thok.has_finished() {
                                            app.thok.calc_results();
                                            // Get terminal size for celebration
                                            let size = terminal.size().unwrap_or_default();
                                            app.thok.start_celebration_if_perfect(
                                                size.width,
                                                size.height,
                                            );
                                            app.state = AppState::Results;
                                        }
                                    }
                                }
                                AppState::Results => match key.code {
                                    KeyCode::Char('t') => {
                                        if Browser::is_available() {
                                            webbrowser::open(&format!("https://twitter.com/intent/tweet?text={}%20wpm%20%2F%20{}%25%20acc%20%2F%20{:.2}%20sd%0A%0Ahttps%3A%2F%2Fgithub.com%thatvegandev%2Fthokr", app.thok.wpm, app.thok.accuracy, app.thok.std_dev))
                                        .unwrap_or_default();
                                        }
                                    }
                                    KeyCode::Char('r') => {
                                        exit_type = ExitType::Restart;
                                        break;
                                    }
                                    KeyCode::Char('n') => {
                                        exit_type = ExitType::New;
                                        break;
                                    }
                                    KeyCode::Char('s') => {
                                        app.state = AppState::CharacterStats;
                                    }
                                    _ => {}
                                },
                                AppState::CharacterStats => match key.code {
                                    KeyCode::Char('r') => {
                                        exit_type = ExitType::Restart;
                                        break;
                                    }
                                    KeyCode::Char('n') => {
                                        exit_type = ExitType::New;
                                        break;
                                    }
                                    KeyCode::Char('b') | KeyCode::Backspace => {
                                        app.state = AppState::Results;
                                    }
                                    KeyCode::Up => {
                                        if app.char_stats_state.scroll_offset > 0 {
                                            app.char_stats_state.scroll_offset -= 1;
                                        }
                                    }
                                    KeyCode::Down => {
                                        // Will check max scroll in render function
                                        app.char_stats_state.scroll_offset += 1;
                                    }
                                    KeyCode::PageUp => {
                                        app.char_stats_state.scroll_offset =
                                            app.char_stats_state.scroll_offset.saturating_sub(10);
                                    }
                                    KeyCode::PageDown => {
                                        app.char_stats_state.scroll_offset += 10;
                                    }
                                    KeyCode::Home => {
                                        app.char_stats_state.scroll_offset = 0;
                                    }
                                    KeyCode::Char('1') => {
                                        app.char_stats_state.sort_by = SortBy::Character;
                                        app.char_stats_state.scroll_offset = 0;
                                    }
                                    KeyCode::Char('2') => {
                                        app.char_stats_state.sort_by = SortBy::AvgTime;
                                        app.char_stats_state.scroll_offset = 0;
                                    }
                                    KeyCode::Char('3') => {
                                        app.char_stats_state.sort_by = SortBy::MissRate;
                                        app.char_stats_state.scroll_offset = 0;
                                    }
                                    KeyCode::Char('4') => {
                                        app.char_stats_state.sort_by = SortBy::Attempts;
                                        app.char_stats_state.scroll_offset = 0;
                                    }
                                    KeyCode::Char(' ') => {
                                        // Toggle sort direction
                                        app.char_stats_state.sort_ascending =
                                            !app.char_stats_state.sort_ascending;
                                        app.char_stats_state.scroll_offset = 0;
                                    }
                                    _ => {}
                                },
                            }
                        }
                        _ => {}
                    }
                    terminal.draw(|f| ui(app, f))?;
                }
            }
        }

        match exit_type {
            ExitType::Restart => {
                app.reset(Some(app.thok.prompt.clone()));
            }
            ExitType::New => {
                app.reset(None);
            }
            ExitType::Quit => {
                break;
            }
        }
    }

    Ok(())
}

#[derive(Clone)]
enum ThokEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

fn get_thok_events(should_tick: bool) -> mpsc::Receiver<ThokEvent> {
    let (tx, rx) = mpsc::channel();

    if should_tick {
        let tick_x = tx.clone();
        thread::spawn(move || loop {
            if tick_x.send(ThokEvent::Tick).is_err() {
                break;
            }

            thread::sleep(Duration::from_millis(TICK_RATE_MS))
        });
    }

    thread::spawn(move || loop {
        let evt = match event::read().unwrap() {
            Event::Key(key) => Some(ThokEvent::Key(key)),
            Event::Resize(_, _) => Some(ThokEvent::Resize),
            _ => None,
        };

        if evt.is_some() && tx.send(evt.unwrap()).is_err() {
            break;
        }
    });

    rx
}

fn render_character_stats(app: &mut App, f: &mut Frame) {
    use ratatui::{
        layout::{Alignment, Constraint, Direction, Layout},
        style::{Color, Modifier, Style},
        widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    };

    let area = f.area();

    // Create layout
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Stats table
            Constraint::Length(4), // Instructions
        ])
        .split(area);

    // Title with sort indicator
    let sort_direction = if app.char_stats_state.sort_ascending {
        "↑"
    } else {
        "↓"
    };
    let sort_by_text = match app.char_stats_state.sort_by {
        SortBy::Character => "Character",
        SortBy::AvgTime => "Avg Time",
        SortBy::MissRate => "Miss Rate",
        SortBy::Attempts => "Attempts",
    };
    let title_text = format!(
        "Character Statistics (Sort: {} {})",
        sort_by_text, sort_direction
    );

    let title = Paragraph::new(title_text)
        .block(Block::default().borders(Borders::ALL).title("Stats"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    // Get character statistics with session deltas
    if let Some(mut summary) = app.thok.get_char_summary_with_deltas() {
        // Sort the data based on current sort criteria
        match app.char_stats_state.sort_by {
            SortBy::Character => {
                summary.sort_by(|a, b| {
                    let cmp = a.0.cmp(&b.0);
                    if app.char_stats_state.sort_ascending {
                        cmp
                    } else {
                        cmp.reverse()
                    }
                });
            }
            SortBy::AvgTime => {
                summary.sort_by(|a, b| {
                    let cmp = a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal);
                    if app.char_stats_state.sort_ascending {
                        cmp
                    } else {
                        cmp.reverse()
                    }
                });
            }
            SortBy::MissRate => {
                summary.sort_by(|a, b| {
                    let cmp = a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal);
                    if app.char_stats_state.sort_ascending {
                        cmp
                    } else {
                        cmp.reverse()
                    }
                });
            }
            SortBy::Attempts => {
                summary.sort_by(|a, b| {
                    let cmp = a.3.cmp(&b.3);
                    if app.char_stats_state.sort_ascending {
                        cmp
                    } else {
                        cmp.reverse()
                    }
                });
            }
        }

        // Calculate scrolling bounds
        let table_height = chunks[1].height.saturating_sub(3) as usize; // Account for borders and header
        let total_rows = summary.len();
        let max_scroll = total_rows.saturating_sub(table_height);

        // Clamp scroll offset
        if app.char_stats_state.scroll_offset > max_scroll {
            app.char_stats_state.scroll_offset = max_scroll;
        }

        // Create header with sort indicators
        let char_indicator = if matches!(app.char_stats_state.sort_by, SortBy::Character) {
            sort_direction
        } else {
            ""
        };
        let time_indicator = if matches!(app.char_stats_state.sort_by, SortBy::AvgTime) {
            sort_direction
        } else {
            ""
        };
        let miss_indicator = if matches!(app.char_stats_state.sort_by, SortBy::MissRate) {
            sort_direction
        } else {
            ""
        };
        let attempts_indicator = if matches!(app.char_stats_state.sort_by, SortBy::Attempts) {
            sort_direction
        } else {
            ""
        };

        let header = Row::new(vec![
            Cell::from(format!("Char {}", char_indicator)),
            Cell::from(format!("Avg Time (ms) {}", time_indicator)),
            Cell::from(format!("Miss Rate (%) {}", miss_indicator)),
            Cell::from(format!("Attempts {}", attempts_indicator)),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        // Get visible rows based on scroll offset
        let visible_rows: Vec<Row> = summary
            .iter()
            .skip(app.char_stats_state.scroll_offset)
            .take(table_height)
            .map(
                |(
                    character,
                    avg_time,
                    miss_rate,
                    attempts,
                    time_delta,
                    miss_delta,
                    session_attempts,
                )| {
                    let char_display = if *character == ' ' {
                        "SPACE".to_string()
                    } else {
                        character.to_string()
                    };

                    let time_color = if *avg_time < 150.0 {
                        Color::Green
                    } else if *avg_time < 250.0 {
                        Color::Yellow
                    } else {
                        Color::Red
                    };

                    let miss_color = if *miss_rate == 0.0 {
                        Color::Green
                    } else if *miss_rate < 10.0 {
                        Color::Yellow
                    } else {
                        Color::Red
                    };

                    // Format time with delta
                    let time_display = if let Some(delta) = time_delta {
                        if delta.abs() < 1.0 {
                            format!("{:.1}", avg_time)
                        } else if *delta < 0.0 {
                            format!("{:.1} ↓{:.0}", avg_time, delta.abs())
                        } else {
                            format!("{:.1} ↑{:.0}", avg_time, delta)
                        }
                    } else {
                        format!("{:.1}", avg_time)
                    };

                    // Format miss rate with delta
                    let miss_display = if let Some(delta) = miss_delta {
                        if delta.abs() < 0.5 {
                            format!("{:.1}", miss_rate)
                        } else if *delta < 0.0 {
                            format!("{:.1} ↓{:.1}", miss_rate, delta.abs())
                        } else {
                            format!("{:.1} ↑{:.1}", miss_rate, delta)
                        }
                    } else {
                        format!("{:.1}", miss_rate)
                    };

                    // Format attempts with session info
                    let attempts_display = if *session_attempts > 0 {
                        format!("{} (+{})", attempts, session_attempts)
                    } else {
                        attempts.to_string()
                    };

                    // Color deltas: green for improvement, red for regression
                    let time_style = if let Some(delta) = time_delta {
                        if *delta < -5.0 {
                            Style::default().fg(Color::Green)
                        } else if *delta > 5.0 {
                            Style::default().fg(Color::Red)
                        } else {
                            Style::default().fg(time_color)
                        }
                    } else {
                        Style::default().fg(time_color)
                    };

                    let miss_style = if let Some(delta) = miss_delta {
                        if *delta < -2.0 {
                            Style::default().fg(Color::Green)
                        } else if *delta > 2.0 {
                            Style::default().fg(Color::Red)
                        } else {
                            Style::default().fg(miss_color)
                        }
                    } else {
                        Style::default().fg(miss_color)
                    };

                    Row::new(vec![
                        Cell::from(char_display),
                        Cell::from(time_display).style(time_style),
                        Cell::from(miss_display).style(miss_style),
                        Cell::from(attempts_display),
                    ])
                },
            )
            .collect();

        // Show scroll position in title if there are more rows than visible
        let scroll_info = if total_rows > table_height {
            format!(
                " ({}/{} rows)",
                app.char_stats_state.scroll_offset + visible_rows.len().min(table_height),
                total_rows
            )
        } else {
            String::new()
        };

        let table = Table::new(
            visible_rows,
            &[
                Constraint::Length(8),  // Character
                Constraint::Length(22), // Avg Time with delta (expanded)
                Constraint::Length(22), // Miss Rate with delta (expanded)
                Constraint::Length(16), // Attempts with session info (expanded)
            ],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Performance by Character{}", scroll_info)),
        )
        .row_highlight_style(Style::default().bg(Color::DarkGray));

        f.render_widget(table, chunks[1]);
    } else {
        let no_data = Paragraph::new(
            "No character statistics available.\nComplete a typing test to see your stats!",
        )
        .block(Block::default().borders(Borders::ALL).title("No Data"))
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
        f.render_widget(no_data, chunks[1]);
    }

    // Instructions
    let instructions = Paragraph::new("Historical stats with session deltas: ↓=improvement ↑=regression (+n)=session attempts\nSort: (1)Char (2)Time (3)Miss (4)Attempts | (Space)Toggle | ↑/↓ PgUp/PgDn | (b)ack (esc)ape")
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center);
    f.render_widget(instructions, chunks[2]);
}

fn ui(app: &mut App, f: &mut Frame) {
    match app.state {
        AppState::Typing | AppState::Results => {
            f.render_widget(&app.thok, f.area());
        }
        AppState::CharacterStats => {
            render_character_stats(app, f);
        }
    }
}
