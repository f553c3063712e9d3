use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Terminal;

use crate::cli::{self, TuiCommand, SESSION_HELP};
use crate::core::event::{classify_log_line, LogLevel};
use crate::core::{ConversionHandle, ConversionOutcome, ConversionRequest, RunEvent, RunState, Runner};
use crate::error::AppError;

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self, AppError> {
        enable_raw_mode()?;
        io::stdout().execute(EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = stdout.execute(LeaveAlternateScreen);
    }
}

struct AppState {
    runner: Runner,
    input: String,
    history: Vec<String>,
    state: RunState,
    percent: Option<u8>,
    conversion: Option<ConversionHandle>,
    last_engine_line: Option<String>,
    engine_line_counter: u64,
    should_quit: bool,
    scroll_offset: usize,
    view_lines: usize,
    tick: u64,
}

const DIVIDER_MARKER: &str = "<divider>";

impl AppState {
    fn new(runner: Runner) -> Self {
        Self {
            runner,
            input: String::new(),
            history: vec!["Welcome to ffconvert. Type 'help' for commands.".to_string()],
            state: RunState::Idle,
            percent: None,
            conversion: None,
            last_engine_line: None,
            engine_line_counter: 0,
            should_quit: false,
            scroll_offset: 0,
            view_lines: 1,
            tick: 0,
        }
    }

    fn is_running(&self) -> bool {
        self.conversion.is_some()
    }

    fn push_history(&mut self, line: impl Into<String>) {
        const MAX_LINES: usize = 500;
        if self.history.len() >= MAX_LINES {
            let drain_count = self.history.len().saturating_sub(MAX_LINES - 1);
            self.history.drain(0..drain_count);
        }
        self.history.push(line.into());
        self.clamp_scroll();
    }

    fn start_conversion(&mut self, request: ConversionRequest) {
        if self.is_running() {
            self.push_history("A conversion is already running. Please wait for it to finish.");
            return;
        }
        self.state = RunState::Validating;
        self.percent = None;
        self.last_engine_line = None;
        self.engine_line_counter = 0;
        self.conversion = Some(self.runner.start(request));
    }

    /// ffmpeg has no cancel path; leaving mid-run would orphan it.
    fn request_quit(&mut self) {
        if self.is_running() {
            self.push_history("A conversion is still running. Quit once it has finished.");
            return;
        }
        self.should_quit = true;
    }

    /// Pulls worker events onto the UI thread.
    fn poll_conversion(&mut self) {
        let Some(conversion) = self.conversion.take() else {
            return;
        };

        let finished = conversion.is_finished();
        let events: Vec<RunEvent> = conversion.events().try_iter().collect();
        for event in events {
            self.apply_event(event);
        }

        if finished {
            let outcome = conversion.join();
            self.finish(outcome);
        } else {
            self.conversion = Some(conversion);
        }
    }

    fn apply_event(&mut self, event: RunEvent) {
        match event {
            RunEvent::State(state) => {
                self.state = state;
                if state == RunState::Running {
                    self.push_history("ffmpeg started.");
                }
            }
            RunEvent::Log(line) => match classify_log_line(&line) {
                LogLevel::Progress => {
                    self.engine_line_counter = self.engine_line_counter.wrapping_add(1);
                    if self.engine_line_counter % 25 == 0 {
                        self.push_history(line.clone());
                    }
                    self.last_engine_line = Some(line);
                }
                LogLevel::Noise => {}
                _ => self.push_history(line),
            },
            RunEvent::Progress(progress) => {
                self.percent = Some(progress.percent);
                self.push_history(format!("[{:>3}%] {}", progress.percent, progress.message));
            }
        }
    }

    fn finish(&mut self, outcome: ConversionOutcome) {
        self.percent = Some(outcome.percent());
        // A panicking worker never sends its terminal event.
        if let ConversionOutcome::Failure { reason, detail } = &outcome {
            if !self.state.is_terminal() {
                self.push_history(format!("error ({reason:?}): {detail}"));
            }
        }
        self.state = if outcome.is_success() {
            RunState::Succeeded
        } else {
            RunState::Failed
        };
    }

    fn set_view_lines(&mut self, lines: usize) {
        self.view_lines = lines.max(1);
        self.clamp_scroll();
    }

    fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.max_scroll();
        self.scroll_offset = (self.scroll_offset + lines).min(max_scroll);
    }

    fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    fn scroll_top(&mut self) {
        self.scroll_offset = self.max_scroll();
    }

    fn scroll_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    fn max_scroll(&self) -> usize {
        self.history.len().saturating_sub(self.view_lines)
    }

    fn clamp_scroll(&mut self) {
        let max_scroll = self.max_scroll();
        if self.scroll_offset > max_scroll {
            self.scroll_offset = max_scroll;
        }
    }
}

pub fn run(runner: Runner) -> Result<(), AppError> {
    let _guard = TerminalGuard::enter()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let mut app = AppState::new(runner);

    loop {
        app.poll_conversion();

        let size = terminal.size()?;
        let history_height = size.height.saturating_sub(7).max(3) as usize;
        app.set_view_lines(history_height.saturating_sub(2).max(1));
        app.tick = app.tick.wrapping_add(1);

        terminal.draw(|frame| {
            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(4),
                    Constraint::Min(3),
                    Constraint::Length(3),
                ])
                .split(frame.size());

            frame.render_widget(render_header(&app, layout[0].width as usize), layout[0]);
            frame.render_widget(
                render_history(&app, layout[1].height as usize, layout[1].width as usize),
                layout[1],
            );

            let input = Paragraph::new(app.input.as_str())
                .block(Block::default().title("Command").borders(Borders::ALL))
                .wrap(Wrap { trim: false });
            frame.render_widget(input, layout[2]);
            frame.set_cursor(layout[2].x + 1 + app.input.len() as u16, layout[2].y + 1);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(&mut app, key.code, key.modifiers);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_key(app: &mut AppState, code: KeyCode, modifiers: KeyModifiers) {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => app.request_quit(),
        KeyCode::Char(ch) => app.input.push(ch),
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Enter => {
            let line = app.input.trim().to_string();
            app.input.clear();
            if !line.is_empty() {
                handle_line(app, &line);
            }
        }
        KeyCode::PageUp => {
            let step = app.view_lines.saturating_sub(1).max(1);
            app.scroll_up(step);
        }
        KeyCode::PageDown => {
            let step = app.view_lines.saturating_sub(1).max(1);
            app.scroll_down(step);
        }
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::Home => app.scroll_top(),
        KeyCode::End => app.scroll_bottom(),
        KeyCode::Esc => app.request_quit(),
        _ => {}
    }
}

fn handle_line(app: &mut AppState, line: &str) {
    if !app.history.is_empty() {
        app.push_history(DIVIDER_MARKER);
    }
    app.push_history(format!(">> {line}"));

    match cli::parse_line(line) {
        Ok(TuiCommand::Convert(request)) => app.start_conversion(request),
        Ok(TuiCommand::Engine) => {
            for line in cli::engine_lines(app.runner.locator()) {
                app.push_history(line);
            }
        }
        Ok(TuiCommand::Help) => {
            for line in SESSION_HELP {
                app.push_history(line);
            }
        }
        Ok(TuiCommand::Clear) => {
            app.history.clear();
            app.scroll_bottom();
        }
        Ok(TuiCommand::Exit) => app.request_quit(),
        Err(err) => app.push_history(format!("error: {err}")),
    }
}

fn render_header(app: &AppState, width: usize) -> Paragraph<'static> {
    let bar_width = width.saturating_sub(30).clamp(10, 40);
    let progress_bar = render_progress_bar(app, bar_width);
    let detail = match (&app.last_engine_line, app.percent) {
        (_, Some(percent)) => format!("{percent}%"),
        (Some(line), None) => line.clone(),
        (None, None) => String::new(),
    };

    let text = vec![
        Line::from(vec![Span::raw("Status: "), Span::raw(app.state.to_string())]),
        Line::from(vec![
            Span::raw(progress_bar),
            Span::raw(" "),
            Span::raw(detail),
        ]),
    ];

    Paragraph::new(text)
        .block(Block::default().title("ffconvert").borders(Borders::ALL))
        .wrap(Wrap { trim: true })
}

fn render_progress_bar(app: &AppState, width: usize) -> String {
    let width = width.max(10);
    let mut bar = String::with_capacity(width + 2);
    bar.push('[');

    if app.is_running() {
        // No percentage is known mid-run; animate instead.
        let pos = (app.tick as usize) % width;
        for idx in 0..width {
            if idx == pos {
                bar.push('>');
            } else if idx < pos {
                bar.push('=');
            } else {
                bar.push(' ');
            }
        }
    } else {
        let fill = if app.percent == Some(100) { '=' } else { ' ' };
        for _ in 0..width {
            bar.push(fill);
        }
    }

    bar.push(']');
    bar
}

fn render_history(app: &AppState, height: usize, width: usize) -> Paragraph<'static> {
    let max_lines = height.saturating_sub(2).max(1);
    let end = app.history.len().saturating_sub(app.scroll_offset);
    let start = end.saturating_sub(max_lines);
    let divider = "─".repeat(width.saturating_sub(2).max(1));
    let lines: Vec<Line> = app.history[start..end]
        .iter()
        .map(|line| {
            if line == DIVIDER_MARKER {
                Line::from(Span::raw(divider.clone()))
            } else {
                Line::from(line.clone())
            }
        })
        .collect();

    Paragraph::new(lines)
        .block(Block::default().title("Session").borders(Borders::ALL))
        .wrap(Wrap { trim: false })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::core::outcome::ProgressEvent;
    use crate::core::Locator;

    fn app() -> AppState {
        AppState::new(Runner::new(
            Locator::new().with_engine("/definitely/not/here/ffmpeg"),
        ))
    }

    #[test]
    fn events_update_state_and_session() {
        let mut app = app();
        app.apply_event(RunEvent::State(RunState::Running));
        app.apply_event(RunEvent::Log("ffmpeg version 6.1".to_string()));
        app.apply_event(RunEvent::Log("in.mkv: Invalid data found when processing input".to_string()));
        app.apply_event(RunEvent::Progress(ProgressEvent::failed("ffmpeg exited with code 1")));

        assert_eq!(app.state, RunState::Running);
        assert_eq!(app.percent, Some(0));
        assert!(!app.history.iter().any(|line| line.contains("ffmpeg version")));
        assert!(app.history.iter().any(|line| line.contains("Invalid data")));
        assert_eq!(app.history.last().unwrap(), "[  0%] ffmpeg exited with code 1");
    }

    #[test]
    fn history_is_bounded() {
        let mut app = app();
        for idx in 0..600 {
            app.push_history(format!("line {idx}"));
        }
        assert_eq!(app.history.len(), 500);
        assert_eq!(app.history.last().unwrap(), "line 599");
    }

    #[test]
    fn invalid_request_finishes_through_worker() {
        let mut app = app();
        handle_line(&mut app, "convert \"\" out.mp4");
        assert!(app.is_running() || app.state == RunState::Failed);

        let handle = app.conversion.take().unwrap();
        let outcome_events: Vec<RunEvent> = handle.events().iter().collect();
        for event in outcome_events {
            app.apply_event(event);
        }
        app.finish(handle.join());

        assert_eq!(app.state, RunState::Failed);
        assert_eq!(app.percent, Some(0));
        assert!(app.history.iter().any(|line| line.starts_with("[  0%] invalid request")));
    }

    #[test]
    fn second_conversion_is_rejected_while_running() {
        let mut app = app();
        app.start_conversion(ConversionRequest::new("", ""));
        app.start_conversion(ConversionRequest::new("", ""));
        assert!(app
            .history
            .iter()
            .any(|line| line.contains("already running")));
        if let Some(handle) = app.conversion.take() {
            handle.join();
        }
    }

    #[test]
    fn quitting_is_refused_while_converting() {
        let mut app = app();
        app.start_conversion(ConversionRequest::new("", ""));

        handle_line(&mut app, "exit");
        handle_key(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        handle_key(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(!app.should_quit);
        assert!(app
            .history
            .iter()
            .any(|line| line.contains("still running")));

        while app.is_running() {
            app.poll_conversion();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(app.state, RunState::Failed);

        handle_line(&mut app, "quit");
        assert!(app.should_quit);
    }

    #[test]
    fn progress_bar_full_only_after_success() {
        let mut app = app();
        app.percent = Some(100);
        assert_eq!(render_progress_bar(&app, 10), "[==========]");
        app.percent = Some(0);
        assert_eq!(render_progress_bar(&app, 10), "[          ]");
    }
}
