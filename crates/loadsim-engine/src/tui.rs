use std::{
    io,
    path::Path,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use loadsim_abstract::LoadProfile;
use ratatui::{
    prelude::*,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, Paragraph},
};
use tracing::info;

use crate::export;
use crate::render;
use crate::session::Session;

/// A tracing subscriber sink that writes to a shared buffer for TUI display
#[derive(Clone)]
pub struct MemoryLogBuffer {
    logs: Arc<Mutex<Vec<String>>>,
}

impl Default for MemoryLogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLogBuffer {
    pub fn new() -> Self {
        Self {
            logs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn push(&self, msg: String) {
        let mut logs = self.logs.lock().unwrap();
        logs.push(msg);
        // Keep last 1000 logs
        if logs.len() > 1000 {
            logs.remove(0);
        }
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.logs.lock().unwrap().clone()
    }
}

impl io::Write for MemoryLogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        self.push(s.trim().to_string());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct TuiApp {
    session: Session,
    profile: LoadProfile,
    title: Option<String>,
    logs: Option<MemoryLogBuffer>,
    status: String,
    plot_points: usize,
}

impl TuiApp {
    pub fn new(
        session: Session,
        profile: LoadProfile,
        title: Option<String>,
        logs: Option<MemoryLogBuffer>,
    ) -> Self {
        Self {
            session,
            profile,
            title,
            logs,
            status: "idle".to_string(),
            plot_points: render::DEFAULT_TARGET_POINTS,
        }
    }

    pub fn plot_points(mut self, points: usize) -> Self {
        self.plot_points = points;
        self
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(100);
        let mut last_tick = Instant::now();

        // First run happens immediately; later ones via 'r'.
        self.execute_run();

        loop {
            terminal.draw(|f| self.ui(f))?;

            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));

            if crossterm::event::poll(timeout)?
                && let Event::Key(key) = event::read()?
            {
                match key.code {
                    KeyCode::Char('q') => break,
                    KeyCode::Char('r') => self.execute_run(),
                    KeyCode::Char('e') => self.export_csv(),
                    _ => {}
                }
            }

            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();
            }
        }

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        Ok(())
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    fn execute_run(&mut self) {
        // Runs are synchronous; the UI blocks until the result lands.
        self.status = match self.session.execute(&self.profile) {
            Ok(result) => format!("run complete: {} samples", result.series.len()),
            Err(err) => format!("run failed: {err:#}"),
        };
    }

    fn export_csv(&mut self) {
        let Some(result) = self.session.last_result() else {
            self.status = "nothing to export yet".to_string();
            return;
        };
        let path = Path::new(export::DEFAULT_EXPORT_FILENAME);
        self.status = match export::write_csv(path, &result.series) {
            Ok(()) => {
                info!(
                    "Exported {} samples to {}",
                    result.series.len(),
                    path.display()
                );
                format!("exported {} samples to {}", result.series.len(), path.display())
            }
            Err(err) => format!("export failed: {err:#}"),
        };
    }

    fn ui(&self, f: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),  // Control bar
                Constraint::Min(8),     // Latency chart
                Constraint::Length(11), // Dashboard + diagnostics
            ])
            .split(f.area());

        self.render_control(f, rows[0]);
        self.render_latency_chart(f, rows[1]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[2]);
        self.render_dashboard(f, bottom[0]);
        self.render_logs(f, bottom[1]);
    }

    fn render_control(&self, f: &mut Frame, area: Rect) {
        let title = self.title.as_deref().unwrap_or("Ad-hoc Load Test");
        let status_text = format!(
            "Run: {} | Backend: {} | {} clients x {} req/s x {} s | {} | (q)uit (r)e-run (e)xport",
            title,
            self.session.backend_label(),
            self.profile.clients,
            self.profile.requests_per_second,
            self.profile.duration_secs,
            self.status
        );
        let status_block = Paragraph::new(status_text)
            .block(Block::default().borders(Borders::ALL).title("Control"));
        f.render_widget(status_block, area);
    }

    fn render_latency_chart(&self, f: &mut Frame, area: Rect) {
        let Some(result) = self.session.last_result() else {
            let block = Paragraph::new("No run yet")
                .block(Block::default().borders(Borders::ALL).title("Latency"));
            f.render_widget(block, area);
            return;
        };

        let plot = render::downsample(&result.series, self.plot_points);
        if plot.points.is_empty() {
            let block = Paragraph::new("Run produced no samples")
                .block(Block::default().borders(Borders::ALL).title("Latency"));
            f.render_widget(block, area);
            return;
        }

        let points: Vec<(f64, f64)> = plot
            .points
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v))
            .collect();

        let y_min = plot.min_ms;
        let y_max = plot.min_ms + plot.span();

        let datasets = vec![
            Dataset::default()
                .name("latency")
                .marker(symbols::Marker::Braille)
                .style(Style::default().fg(Color::Cyan))
                .graph_type(GraphType::Line)
                .data(&points),
        ];

        let x_labels = vec![
            Span::raw("0"),
            Span::raw(""),
            Span::raw(format!("{}", points.len())),
        ];
        let y_labels = vec![
            Span::raw(format!("{:.1}", y_min)),
            Span::raw(""),
            Span::raw(format!("{:.1}", y_max)),
        ];

        let chart = Chart::new(datasets)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Latency ({} of {} samples)",
                points.len(),
                result.series.len()
            )))
            .x_axis(
                Axis::default()
                    .title("sample")
                    .bounds([0.0, points.len() as f64])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .title("ms")
                    .bounds([y_min, y_max])
                    .labels(y_labels),
            );

        f.render_widget(chart, area);
    }

    fn render_dashboard(&self, f: &mut Frame, area: Rect) {
        let mut lines = vec![Line::from("Last Run:")];
        match self.session.last_result() {
            Some(result) => {
                lines.push(Line::from(format!("  Backend:    {}", result.backend)));
                lines.push(Line::from(format!("  Samples:    {}", result.series.len())));
                match &result.metrics {
                    Some(m) => {
                        lines.push(Line::from(format!("  Avg:        {:.2} ms", m.avg_ms)));
                        lines.push(Line::from(format!("  p50:        {:.2} ms", m.p50_ms)));
                        lines.push(Line::from(format!("  p95:        {:.2} ms", m.p95_ms)));
                        lines.push(Line::from(format!("  p99:        {}", fmt_opt_ms(m.p99_ms))));
                        lines.push(Line::from(format!(
                            "  Throughput: {:.2} req/s",
                            m.throughput_rps
                        )));
                    }
                    None => lines.push(Line::from("  Metrics:    - (no samples)")),
                }
            }
            None => lines.push(Line::from("  (none)")),
        }

        let block =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Dashboard"));
        f.render_widget(block, area);
    }

    fn render_logs(&self, f: &mut Frame, area: Rect) {
        let Some(buffer) = &self.logs else {
            let block = Paragraph::new("Log buffer not attached")
                .block(Block::default().borders(Borders::ALL).title("Diagnostics"));
            f.render_widget(block, area);
            return;
        };

        let logs = buffer.snapshot();
        let visible = (area.height.max(3) as usize).saturating_sub(2);
        let start = logs.len().saturating_sub(visible);
        let items: Vec<ListItem> = logs[start..]
            .iter()
            .map(|line| ListItem::new(line.clone()))
            .collect();

        let list =
            List::new(items).block(Block::default().borders(Borders::ALL).title("Diagnostics"));
        f.render_widget(list, area);
    }
}

fn fmt_opt_ms(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.2} ms"),
        None => "-".to_string(),
    }
}
