use std::{
    io::{self, Stdout},
    sync::mpsc::{self, Receiver},
    thread,
    time::{Duration, Instant},
};

use crate::plot::Plot;
use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{self, Event as CEvent, KeyCode, KeyEvent},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::error;
use tui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Span, Spans},
    widgets::{Axis, Block, BorderType, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame, Terminal,
};

const SERIES_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::Red,
    Color::Blue,
];

enum Event<I> {
    Input(I),
    Tick,
}

/// Raw mode on the alternate screen, left again when dropped.
struct RawScreen;

impl RawScreen {
    fn enter() -> Result<RawScreen> {
        terminal::enable_raw_mode().context("unable to go to raw mode")?;
        let screen = RawScreen;
        execute!(io::stdout(), EnterAlternateScreen).context("unable to enter alternate screen")?;
        Ok(screen)
    }

    fn leave() -> Result<()> {
        terminal::disable_raw_mode()?;
        execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)?;
        Ok(())
    }
}

impl Drop for RawScreen {
    fn drop(&mut self) {
        if let Err(e) = RawScreen::leave() {
            error!("unable to restore terminal: {:#}", e);
        }
    }
}

pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    receiver: Receiver<Event<KeyEvent>>,
    _screen: RawScreen,
}

impl Tui {
    pub fn new() -> Result<Tui> {
        let screen = RawScreen::enter()?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend).context("unable to set up terminal")?;
        terminal.clear()?;

        let (tx, rx) = mpsc::channel();
        let tick_rate = Duration::from_millis(200);
        // Setup event loop for catching key input
        thread::spawn(move || {
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or_else(|| Duration::from_secs(0));

                match event::poll(timeout) {
                    Ok(true) => {
                        if let Ok(CEvent::Key(key)) = event::read() {
                            if tx.send(Event::Input(key)).is_err() {
                                return;
                            }
                        }
                    }
                    Ok(false) => {}
                    Err(_) => return,
                }

                if last_tick.elapsed() >= tick_rate {
                    if tx.send(Event::Tick).is_err() {
                        return;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Ok(Tui {
            terminal,
            receiver: rx,
            _screen: screen,
        })
    }

    fn axis_title(title: &str) -> Span<'_> {
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD))
    }

    fn render_chart(frame: &mut Frame<CrosstermBackend<Stdout>>, rect: Rect, plot: &Plot) {
        let datasets = plot
            .series
            .iter()
            .zip(SERIES_COLORS.iter().cycle())
            .map(|(series, color)| {
                Dataset::default()
                    .name(series.name.as_str())
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(*color))
                    .data(&series.points)
            })
            .collect::<Vec<_>>();

        let chart = Chart::new(datasets)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::White))
                    .title(plot.title.as_str())
                    .border_type(BorderType::Plain),
            )
            .x_axis(
                Axis::default()
                    .title(Tui::axis_title(&plot.x_label))
                    .style(Style::default().fg(Color::Gray))
                    .bounds(plot.x_bounds)
                    .labels(plot.x_labels.iter().map(|l| Span::raw(l.as_str())).collect()),
            )
            .y_axis(
                Axis::default()
                    .title(Tui::axis_title(&plot.y_label))
                    .style(Style::default().fg(Color::Gray))
                    .bounds(plot.y_bounds)
                    .labels(plot.y_labels.iter().map(|l| Span::raw(l.as_str())).collect()),
            )
            .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)));

        frame.render_widget(chart, rect)
    }

    fn render_message_box(
        frame: &mut Frame<CrosstermBackend<Stdout>>,
        rect: Rect,
        lines: &[String],
    ) {
        let text = lines
            .iter()
            .map(|line| Spans::from(line.as_str()))
            .collect::<Vec<_>>();
        let message = Paragraph::new(text)
            .style(Style::default().fg(Color::LightCyan))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::White))
                    .title("Message")
                    .border_type(BorderType::Plain),
            );
        frame.render_widget(message, rect);
    }

    /// Draws the plot once and handles one event. Returns `true` once the
    /// user asked to quit.
    pub fn display(&mut self, plot: &Plot) -> Result<bool> {
        let mut lines = plot.summary();
        lines.push("Press `q` to quit".to_string());
        let message_height = lines.len() as u16 + 2;

        self.terminal
            .draw(|frame| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints(
                        [Constraint::Min(8), Constraint::Length(message_height)].as_ref(),
                    )
                    .split(frame.size());

                Tui::render_chart(frame, chunks[0], plot);
                Tui::render_message_box(frame, chunks[1], &lines);
            })
            .context("unable to draw tui")?;

        match self.receiver.recv()? {
            Event::Input(event) => match event.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
                _ => {}
            },
            Event::Tick => {}
        };
        Ok(false)
    }

    pub fn run(mut self, plot: &Plot) -> Result<()> {
        while !self.display(plot)? {}
        Ok(())
    }
}
