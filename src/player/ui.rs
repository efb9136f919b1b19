use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
};

use super::app::App;
use super::picker_ui::draw_picker;
use apem_player::controller::{PlaybackState, Transport};
use apem_player::time_format::format_progress;

pub fn draw(f: &mut Frame, app: &App) {
    let size = f.area();

    draw_main_ui(f, app);

    if let Some(ref picker) = app.picker {
        draw_picker(f, size, picker);
    }
}

fn draw_main_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Min(4),    // Catalog
            Constraint::Length(1), // State
            Constraint::Length(3), // Seek bar
            Constraint::Length(3), // Controls
            Constraint::Length(1), // Status
        ])
        .split(f.area());

    let title = Paragraph::new("🎵 apem")
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    draw_catalog(f, chunks[1], app);
    draw_state_line(f, chunks[2], app);
    draw_seek_bar(f, chunks[3], app);
    draw_controls(f, chunks[4], app);

    if let Some(message) = &app.status_message {
        let status = Paragraph::new(message.as_str())
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center);
        f.render_widget(status, chunks[5]);
    }
}

fn draw_catalog(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Files ");

    let active = app.controller.active_entry_id();
    let items: Vec<ListItem> = app
        .catalog
        .list_entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let marker = if Some(entry.id) == active { "▶ " } else { "  " };
            let mut spans = vec![
                Span::styled(marker, Style::default().fg(Color::Green)),
                Span::raw(entry.display_name.clone()),
            ];
            if entry.is_removable() {
                spans.push(Span::styled(
                    "  [d] remove",
                    Style::default().fg(Color::DarkGray),
                ));
            }

            let style = if i == app.selected {
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

fn draw_state_line(f: &mut Frame, area: Rect, app: &App) {
    let state = app.controller.state();
    let color = match state {
        PlaybackState::Idle => Color::DarkGray,
        PlaybackState::Preparing => Color::Yellow,
        PlaybackState::Ready(Transport::Playing) => Color::Green,
        PlaybackState::Ready(Transport::Paused) => Color::Cyan,
    };

    let mut spans = vec![Span::styled(state.label(), Style::default().fg(color))];
    if let Some(session) = app.controller.session() {
        spans.push(Span::raw(format!("  {}", session.entry.display_name)));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_seek_bar(f: &mut Frame, area: Rect, app: &App) {
    let (position_ms, duration_ms) = app
        .controller
        .session()
        .map(|s| (s.position_ms, s.duration_ms))
        .unwrap_or((0, 0));

    let ratio = if duration_ms > 0 {
        (position_ms as f64 / duration_ms as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .ratio(ratio)
        .label(format_progress(position_ms, duration_ms));
    f.render_widget(gauge, area);
}

fn draw_controls(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let row1 = vec![
        Span::styled("[↑↓]", Style::default().fg(Color::Blue)),
        Span::raw(" move  "),
        Span::styled("[enter]", Style::default().fg(Color::Green)),
        Span::raw(" play  "),
        if app.controller.is_playing() {
            Span::styled("[space]", Style::default().fg(Color::Yellow))
        } else {
            Span::styled("[space]", Style::default().fg(Color::Green))
        },
        Span::raw(if app.controller.is_playing() {
            " pause  "
        } else {
            " resume  "
        }),
        Span::styled("[←→]", Style::default().fg(Color::Magenta)),
        Span::raw(format!(" ±{}s", app.controller.skip_interval_ms() / 1000)),
    ];

    let row2 = vec![
        Span::styled("[0-9]", Style::default().fg(Color::Magenta)),
        Span::raw(" jump  "),
        Span::styled("[o]", Style::default().fg(Color::Cyan)),
        Span::raw(" open  "),
        Span::styled("[d]", Style::default().fg(Color::Yellow)),
        Span::raw(" remove  "),
        Span::styled("[s]", Style::default().fg(Color::Yellow)),
        Span::raw(" stop  "),
        Span::styled("[q]", Style::default().fg(Color::Red)),
        Span::raw(" quit"),
    ];

    f.render_widget(Block::default().borders(Borders::TOP), rows[0]);
    f.render_widget(
        Paragraph::new(Line::from(row1)).alignment(Alignment::Center),
        rows[1],
    );
    f.render_widget(
        Paragraph::new(Line::from(row2)).alignment(Alignment::Center),
        rows[2],
    );
}
