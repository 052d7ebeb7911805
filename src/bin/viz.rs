/// stacksim live visualizer — attach to any running GPU simulation.
///
/// Run in a separate terminal:
///   cargo run --bin viz
///
/// Polls /tmp/stacksim_live.json every 200ms and renders a live TUI
/// dashboard:
///
///   ┌ header: workload / pattern / status ──────────────────────────┐
///   │ core thermal map (one cell per core) │ clock + progress gauges │
///   │                                      │ temps, throttle stats   │
///   │ q/esc: quit  …footer…                                          │
///
/// Press q or Esc to quit. The simulation keeps running unaffected.
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame, Terminal,
};
use stacksim::metrics::{read_metrics, LiveMetrics};
use std::{io, time::Duration};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let metrics = read_metrics();
        terminal.draw(|f| render(f, metrics.as_ref()))?;

        // Non-blocking: poll for 200ms, then redraw regardless
        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    break;
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Top-level layout
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, metrics: Option<&LiveMetrics>) {
    let area = f.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(0),    // heatmap + stats
            Constraint::Length(1), // footer
        ])
        .split(area);

    render_header(f, rows[0], metrics);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(rows[1]);

    render_thermal_map(f, cols[0], metrics);
    render_stats(f, cols[1], metrics);
    render_footer(f, rows[2]);
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

fn render_header(f: &mut Frame, area: Rect, metrics: Option<&LiveMetrics>) {
    let block = Block::default()
        .title(Span::styled(
            " ⚡ stacksim thermal monitor ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let (name, pattern, status) = metrics
        .map(|m| (m.workload_name.as_str(), m.access_pattern.as_str(), m.status.as_str()))
        .unwrap_or(("—", "—", "idle"));

    let status_color = match status {
        "running" => Color::Green,
        "complete" => Color::Cyan,
        _ => Color::DarkGray,
    };

    let mut spans = vec![
        Span::styled("  workload: ", Style::default().fg(Color::DarkGray)),
        Span::styled(name, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::styled("   pattern: ", Style::default().fg(Color::DarkGray)),
        Span::styled(pattern, Style::default().fg(Color::Cyan)),
        Span::styled("   status: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            status.to_uppercase(),
            Style::default().fg(status_color).add_modifier(Modifier::BOLD),
        ),
    ];

    if metrics.map(|m| m.throttling).unwrap_or(false) {
        spans.push(Span::styled(
            "   THROTTLING",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), inner);
}

// ---------------------------------------------------------------------------
// Core thermal map
// ---------------------------------------------------------------------------

/// Color band for a core temperature, relative to ambient and the throttle
/// threshold.
fn temp_color(temp: f64, ambient: f64, throttle: f64) -> Color {
    let span = (throttle - ambient).max(1.0);
    let frac = (temp - ambient) / span;
    if frac < 0.25 {
        Color::Blue
    } else if frac < 0.5 {
        Color::Green
    } else if frac < 0.75 {
        Color::Yellow
    } else if frac < 1.0 {
        Color::LightRed
    } else {
        Color::Red
    }
}

fn render_thermal_map(f: &mut Frame, area: Rect, metrics: Option<&LiveMetrics>) {
    let block = Block::default().title(" Core Temperatures ").borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(m) = metrics.filter(|m| !m.core_temps_c.is_empty()) else {
        let msg = Paragraph::new(vec![
            Line::raw(""),
            Line::from(Span::styled(
                "  No simulation running.",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                "  Start stacksim to see live data.",
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        f.render_widget(msg, inner);
        return;
    };

    // Legend line at top
    let legend = Line::from(vec![
        Span::styled("██", Style::default().fg(Color::Blue)),
        Span::raw(" cool  "),
        Span::styled("██", Style::default().fg(Color::Green)),
        Span::raw(" warm  "),
        Span::styled("██", Style::default().fg(Color::Yellow)),
        Span::raw(" hot  "),
        Span::styled("██", Style::default().fg(Color::Red)),
        Span::raw(" throttle"),
    ]);
    let mut lines: Vec<Line> = vec![legend, Line::raw("")];

    // One 2-char cell per core, laid out over the simulation's grid.
    let cols = m.grid_cols.max(1);
    for row in m.core_temps_c.chunks(cols) {
        let spans: Vec<Span> = row
            .iter()
            .flat_map(|&temp| {
                let color = temp_color(temp, m.ambient_temp_c, m.throttle_temp_c);
                vec![Span::styled("██", Style::default().fg(color)), Span::raw(" ")]
            })
            .collect();
        lines.push(Line::from(spans));
    }

    let hottest = m.core_temps_c.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    lines.push(Line::raw(""));
    lines.push(Line::from(vec![Span::styled(
        format!(
            "  {} cores   hottest {:.1} °C   throttle at {:.0} °C",
            m.core_temps_c.len(),
            hottest,
            m.throttle_temp_c
        ),
        Style::default().fg(Color::DarkGray),
    )]));

    f.render_widget(Paragraph::new(lines), inner);
}

// ---------------------------------------------------------------------------
// Stats panel
// ---------------------------------------------------------------------------

fn render_stats(f: &mut Frame, area: Rect, metrics: Option<&LiveMetrics>) {
    let block = Block::default().title(" Stats ").borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // progress gauge
            Constraint::Length(1), // spacer
            Constraint::Length(2), // clock gauge
            Constraint::Length(1), // spacer
            Constraint::Min(0),    // text stats
        ])
        .split(inner);

    match metrics {
        None => {
            let msg = Paragraph::new(vec![
                Line::raw(""),
                Line::from(Span::styled(
                    "  Waiting for snapshot…",
                    Style::default().fg(Color::DarkGray),
                )),
            ]);
            f.render_widget(msg, inner);
        }
        Some(m) => {
            // Workload progress gauge
            let progress_pct = (m.progress * 100.0).clamp(0.0, 100.0) as u16;
            let progress_gauge = Gauge::default()
                .block(Block::default().title("Progress"))
                .gauge_style(Style::default().fg(Color::Blue))
                .percent(progress_pct)
                .label(format!("{:.1}%", m.progress * 100.0));
            f.render_widget(progress_gauge, rows[0]);

            // Clock gauge relative to base clock
            let clock_frac = if m.base_clock_ghz > 0.0 {
                (m.current_clock_ghz / m.base_clock_ghz).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let clock_color = if m.throttling { Color::Red } else { Color::Green };
            let clock_gauge = Gauge::default()
                .block(Block::default().title("Clock"))
                .gauge_style(Style::default().fg(clock_color))
                .percent((clock_frac * 100.0) as u16)
                .label(format!("{:.2} / {:.2} GHz", m.current_clock_ghz, m.base_clock_ghz));
            f.render_widget(clock_gauge, rows[2]);

            // Text stats
            let text = vec![
                Line::from(vec![
                    Span::styled("Elapsed:   ", Style::default().fg(Color::DarkGray)),
                    Span::raw(format!("{:.0} ms (simulated)", m.elapsed_ms)),
                ]),
                Line::from(vec![
                    Span::styled("Ops done:  ", Style::default().fg(Color::DarkGray)),
                    Span::raw(format!("{:.3} T", m.ops_completed / 1e12)),
                ]),
                Line::from(vec![
                    Span::styled("Peak temp: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(
                        format!("{:.1} °C", m.peak_temp_c),
                        Style::default().fg(if m.peak_temp_c >= m.throttle_temp_c {
                            Color::Red
                        } else {
                            Color::Yellow
                        }),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Ambient:   ", Style::default().fg(Color::DarkGray)),
                    Span::raw(format!("{:.1} °C", m.ambient_temp_c)),
                ]),
                Line::raw(""),
                Line::from(vec![
                    Span::styled("Grid:  ", Style::default().fg(Color::DarkGray)),
                    Span::raw(format!("{} × {}", m.grid_cols, m.grid_rows)),
                ]),
            ];
            f.render_widget(Paragraph::new(text), rows[4]);
        }
    }
}

// ---------------------------------------------------------------------------
// Footer
// ---------------------------------------------------------------------------

fn render_footer(f: &mut Frame, area: Rect) {
    let text = Paragraph::new(Span::styled(
        "  q / esc: quit    auto-refreshes every 200ms    reads /tmp/stacksim_live.json",
        Style::default().fg(Color::DarkGray),
    ));
    f.render_widget(text, area);
}
