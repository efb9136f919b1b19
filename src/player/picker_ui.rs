use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use super::picker::{FilePicker, PickerItemKind};

pub fn draw_picker(f: &mut Frame, area: Rect, picker: &FilePicker) {
    let modal_width = 64.min(area.width.saturating_sub(4));
    let modal_height = 20.min(area.height.saturating_sub(4));

    let modal_area = Rect {
        x: (area.width - modal_width) / 2,
        y: (area.height - modal_height) / 2,
        width: modal_width,
        height: modal_height,
    };

    f.render_widget(Clear, modal_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" Open Audio File ")
        .title_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(block, modal_area);

    let inner_area = modal_area.inner(ratatui::layout::Margin {
        horizontal: 1,
        vertical: 1,
    });

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Current path
            Constraint::Min(3),    // Entries
            Constraint::Length(1), // Controls
        ])
        .split(inner_area);

    let path_widget = Paragraph::new(format!("📁 {}", picker.current_dir().display()))
        .style(Style::default().fg(Color::Blue))
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(path_widget, chunks[0]);

    let items: Vec<ListItem> = picker
        .items
        .iter()
        .map(|item| {
            let (prefix, color) = match item.kind {
                PickerItemKind::Parent => ("↑ ", Color::White),
                PickerItemKind::Directory => ("📁 ", Color::Blue),
                PickerItemKind::AudioFile => ("🎵 ", Color::Green),
            };
            ListItem::new(format!("{prefix}{}", item.name)).style(Style::default().fg(color))
        })
        .collect();

    let list = List::new(items).highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );
    let mut state = ListState::default().with_selected(Some(picker.selected_index));
    f.render_stateful_widget(list, chunks[1], &mut state);

    let controls = vec![
        Span::styled("[↑↓]", Style::default().fg(Color::Yellow)),
        Span::raw(" move  "),
        Span::styled("[Enter]", Style::default().fg(Color::Green)),
        Span::raw(" open  "),
        Span::styled("[Esc]", Style::default().fg(Color::Red)),
        Span::raw(" cancel"),
    ];
    let controls_widget = Paragraph::new(Line::from(controls)).alignment(Alignment::Center);
    f.render_widget(controls_widget, chunks[2]);
}
