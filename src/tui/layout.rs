use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::tui::app::{TuiApp, View};

const KEY_HELP: [(&str, &str); 9] = [
    ("j / Down", "Move down or scroll"),
    ("k / Up", "Move up or scroll"),
    ("g / G", "Jump to top / bottom"),
    ("Enter", "Read the selected item"),
    ("r", "Toggle read"),
    ("o", "Open link in browser"),
    ("R", "Refresh feeds"),
    ("?", "Toggle this help"),
    ("q / Esc", "Back, or quit from the list"),
];

pub fn render(frame: &mut Frame, app: &TuiApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    match app.view {
        View::List => render_list(frame, app, chunks[0]),
        View::Reader => render_reader(frame, app, chunks[0]),
        View::Help => render_help(frame, chunks[0]),
    }
    render_status_bar(frame, app, chunks[1]);
}

fn render_list(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let items: Vec<ListItem> = app
        .items
        .iter()
        .map(|item| {
            let is_read = app.is_item_read(&item.id);
            let marker = if is_read { " " } else { "●" };
            let style = if is_read {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{} {} ", marker, item.date_label()), style),
                Span::styled(item.display_title().to_string(), style),
                Span::styled(
                    format!("  {}", item.feed_name),
                    Style::default().fg(Color::Yellow),
                ),
            ]))
        })
        .collect();

    let title = format!(
        " News ({} unread / {}) ",
        app.unread_count(),
        app.items.len()
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(Color::Cyan)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = ListState::default();
    if !app.items.is_empty() {
        state.select(Some(app.cursor));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_reader(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let Some(item) = app.selected_item() else {
        frame.render_widget(Paragraph::new("No item selected"), area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            item.display_title().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("{} | {}", item.published.format("%Y-%m-%d %H:%M"), item.feed_name),
            Style::default().fg(Color::Yellow),
        )),
    ];
    if let Some(link) = &item.link {
        lines.push(Line::from(Span::styled(
            link.clone(),
            Style::default().fg(Color::Blue),
        )));
    }
    lines.push(Line::from("─".repeat(area.width.saturating_sub(2) as usize)));
    lines.extend(item.content.lines().map(|l| Line::from(l.to_string())));

    let scroll = app.reader_scroll.min(app.reader_max_scroll());

    let read_label = if app.is_item_read(&item.id) { "read" } else { "unread" };
    let block = Block::default()
        .title(format!(" {} [{}] ", item.display_title(), read_label))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    frame.render_widget(paragraph, area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let lines: Vec<Line> = KEY_HELP
        .iter()
        .map(|(keys, what)| {
            Line::from(vec![
                Span::styled(format!("{:<10}", keys), Style::default().fg(Color::Cyan)),
                Span::raw(*what),
            ])
        })
        .collect();

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let status = if app.is_refreshing {
        "Refreshing feeds...".to_string()
    } else if let Some(ref msg) = app.status_message {
        msg.clone()
    } else {
        match app.view {
            View::List => "j/k:Navigate  Enter:Read  r:Toggle read  o:Open  R:Refresh  ?:Help  q:Quit",
            View::Reader => "j/k:Scroll  r:Toggle read  o:Open  q:Back",
            View::Help => "q:Back",
        }
        .to_string()
    };

    let paragraph =
        Paragraph::new(status).style(Style::default().fg(Color::White).bg(Color::DarkGray));

    frame.render_widget(paragraph, area);
}
