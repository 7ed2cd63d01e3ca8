use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use port_ops::{ChartSeries, Dashboard};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Production,
    Vessels,
    Locations,
    Equipment,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Production => Page::Vessels,
            Page::Vessels => Page::Locations,
            Page::Locations => Page::Equipment,
            Page::Equipment => Page::Production,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Production => Page::Equipment,
            Page::Vessels => Page::Production,
            Page::Locations => Page::Vessels,
            Page::Equipment => Page::Locations,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Production => "Production by Day",
            Page::Vessels => "Vessels",
            Page::Locations => "Location Share",
            Page::Equipment => "Equipment Hours",
        }
    }
}

pub struct App {
    pub dashboard: Dashboard,
    pub current_page: Page,
    pub days_state: TableState,
    pub vessels_state: TableState,
}

impl App {
    pub fn new(dashboard: Dashboard) -> Self {
        let mut days_state = TableState::default();
        if !dashboard.production_by_day.days.is_empty() {
            days_state.select(Some(0));
        }

        let mut vessels_state = TableState::default();
        if !dashboard.vessels.is_empty() {
            vessels_state.select(Some(0));
        }

        Self {
            dashboard,
            current_page: Page::Production,
            days_state,
            vessels_state,
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    fn active_table(&mut self) -> (&mut TableState, usize) {
        match self.current_page {
            Page::Vessels => (&mut self.vessels_state, self.dashboard.vessels.len()),
            _ => (&mut self.days_state, self.dashboard.production_by_day.days.len()),
        }
    }

    pub fn next(&mut self) {
        let (state, len) = self.active_table();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let (state, len) = self.active_table();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Production => render_days(f, chunks[1], app),
        Page::Vessels => render_vessels(f, chunks[1], app),
        Page::Locations => {
            let series = app.dashboard.location_share.clone();
            render_series(f, chunks[1], " Location Share (%) ", &series, Color::Cyan)
        }
        Page::Equipment => {
            let series = app.dashboard.equipment_hours.clone();
            render_series(f, chunks[1], " Equipment Hours ", &series, Color::Magenta)
        }
    }

    render_status_bar(f, chunks[2]);
}

fn header_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Production, Page::Vessels, Page::Locations, Page::Equipment];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            header_style().add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    let filter = &app.dashboard.filter;
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("{} → {}", filter.from, filter.to),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Total: {:.3} t", app.dashboard.production_by_day.grand_total),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

/// Proportional text bar for a 0-100 width
fn text_bar(width_percent: f64, max_cells: usize) -> String {
    let cells = (width_percent / 100.0 * max_cells as f64).round() as usize;
    "█".repeat(cells.min(max_cells))
}

fn render_days(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(
        ["Day", "Tons", "Running", ""]
            .iter()
            .map(|h| Cell::from(*h).style(header_style())),
    )
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows = app.dashboard.production_by_day.days.iter().map(|d| {
        Row::new(vec![
            Cell::from(d.day.clone()),
            Cell::from(format!("{:.3}", d.total)),
            Cell::from(format!("{:.3}", d.running_total)),
            Cell::from(text_bar(d.width_percent, 40)).style(Style::default().fg(Color::Blue)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Production by Day "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.days_state);
}

fn render_vessels(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(
        ["Vessel", "Days", "Total", "Best Day"]
            .iter()
            .map(|h| Cell::from(*h).style(header_style())),
    )
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows = app.dashboard.vessels.iter().map(|v| {
        Row::new(vec![
            Cell::from(v.vessel.clone()),
            Cell::from(v.report.days.len().to_string()),
            Cell::from(format!("{:.3}", v.report.grand_total)),
            Cell::from(format!("{:.3}", v.report.max_day)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(28),
            Constraint::Length(8),
            Constraint::Length(14),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(" Vessels "))
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.vessels_state);
}

fn render_series(f: &mut Frame, area: Rect, title: &str, series: &ChartSeries, color: Color) {
    // BarChart takes whole numbers
    let data: Vec<(&str, u64)> = series
        .points()
        .map(|(label, value)| (label, value.max(0.0).round() as u64))
        .collect();

    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .data(data.as_slice())
        .bar_width(9)
        .bar_gap(2)
        .bar_style(Style::default().fg(color))
        .value_style(Style::default().fg(Color::Black).bg(color));

    f.render_widget(chart, area);
}

fn render_status_bar(f: &mut Frame, area: Rect) {
    let status_spans = vec![
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Page | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Nav | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(status_bar, area);
}
