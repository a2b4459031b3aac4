//! Live container status table, redrawn in place on every poll

use crossterm::{
    cursor::MoveToPreviousLine,
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use hubdev_core::PollObserver;
use hubdev_provider::{group_by, Container, GroupKey, HealthStatus};
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const NAME_WIDTH: usize = 36;
const DEFAULT_COLUMNS: u16 = 80;

/// Get status symbol for a container
fn status_symbol(status: &HealthStatus) -> &'static str {
    match status {
        HealthStatus::Starting => "❏",
        HealthStatus::Healthy => "✓",
        HealthStatus::Unhealthy => "✗",
        HealthStatus::Restarting => "✗",
        HealthStatus::Unknown => "·",
    }
}

/// Get color for a status
fn status_color(status: &HealthStatus) -> Color {
    match status {
        HealthStatus::Starting => Color::Yellow,
        HealthStatus::Healthy => Color::Green,
        HealthStatus::Unhealthy => Color::Red,
        HealthStatus::Restarting => Color::DarkRed,
        HealthStatus::Unknown => Color::DarkGrey,
    }
}

/// One logical line of the table
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub color: Option<Color>,
    pub text: String,
}

/// Format a snapshot as a header plus one row per container, grouped by name
pub fn format_rows(containers: &[Container]) -> Vec<Line> {
    let mut lines = vec![Line {
        color: None,
        text: format!("  {:<NAME_WIDTH$} STATUS", "NAME"),
    }];

    for group in group_by(containers, GroupKey::Name).values() {
        for container in group {
            lines.push(Line {
                color: Some(status_color(&container.status)),
                text: format!(
                    "{} {:<NAME_WIDTH$} {}",
                    status_symbol(&container.status),
                    container.name,
                    container.status_text
                ),
            });
        }
    }

    lines
}

/// Set whenever a log line is written to the terminal the table draws on.
/// A repaint that follows log output starts a fresh block below it instead
/// of moving up over the log lines.
#[derive(Debug, Clone, Default)]
pub struct LogActivity(Arc<AtomicBool>);

impl LogActivity {
    pub fn mark(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::Relaxed)
    }
}

/// Terminal rows `text` occupies at `columns` wide
fn physical_lines(text: &str, columns: u16) -> usize {
    let width = text.chars().count();
    let columns = usize::from(columns.max(1));
    width.div_ceil(columns).max(1)
}

/// Rewrites the previously drawn block on each paint
struct Repainter<W: Write> {
    out: W,
    columns: u16,
    redraw: bool,
    last_lines: u16,
    logs: LogActivity,
}

impl<W: Write> Repainter<W> {
    fn new(out: W, columns: u16, redraw: bool, logs: LogActivity) -> Self {
        Self {
            out,
            columns,
            redraw,
            last_lines: 0,
            logs,
        }
    }

    fn paint(&mut self, lines: &[Line]) -> io::Result<()> {
        let logged_since_last_paint = self.logs.take();
        if self.redraw && self.last_lines > 0 && !logged_since_last_paint {
            queue!(
                self.out,
                MoveToPreviousLine(self.last_lines),
                Clear(ClearType::FromCursorDown)
            )?;
        }

        let mut physical = 0;
        for line in lines {
            match line.color {
                Some(color) => queue!(
                    self.out,
                    SetForegroundColor(color),
                    Print(&line.text),
                    ResetColor,
                    Print("\n")
                )?,
                None => queue!(self.out, Print(&line.text), Print("\n"))?,
            }
            physical += physical_lines(&line.text, self.columns);
        }
        self.out.flush()?;

        self.last_lines = u16::try_from(physical).unwrap_or(u16::MAX);
        Ok(())
    }
}

fn terminal_columns() -> u16 {
    terminal::size()
        .map(|(columns, _)| columns)
        .unwrap_or(DEFAULT_COLUMNS)
}

/// Print a snapshot once, without redraw
pub fn print_once(containers: &[Container]) -> io::Result<()> {
    Repainter::new(io::stdout(), terminal_columns(), false, LogActivity::default())
        .paint(&format_rows(containers))
}

/// Renders poll snapshots on a background task fed by a channel
pub struct StatusTable {
    tx: Option<mpsc::UnboundedSender<Vec<Container>>>,
    task: Option<JoinHandle<()>>,
}

impl StatusTable {
    /// Render to stdout, redrawing in place when stdout is a terminal
    pub fn start(logs: LogActivity) -> Self {
        let redraw = io::stdout().is_terminal();
        Self::with_writer(io::stdout(), terminal_columns(), redraw, logs)
    }

    pub fn with_writer<W>(out: W, columns: u16, redraw: bool, logs: LogActivity) -> Self
    where
        W: Write + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<Container>>();
        let task = tokio::spawn(async move {
            let mut repainter = Repainter::new(out, columns, redraw, logs);
            while let Some(snapshot) = rx.recv().await {
                if let Err(e) = repainter.paint(&format_rows(&snapshot)) {
                    tracing::debug!("Failed to draw status table: {}", e);
                }
            }
        });

        Self {
            tx: Some(tx),
            task: Some(task),
        }
    }

    /// Close the channel and wait for pending renders to finish
    pub async fn stop(mut self) {
        self.tx.take();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl PollObserver for StatusTable {
    fn snapshot(&mut self, containers: &[Container]) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(containers.to_vec());
        }
    }
}
