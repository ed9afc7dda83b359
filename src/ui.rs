use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, ChatRole, WELCOME_LINE};
use crate::sidebar::SidebarRow;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);

    let [sidebar_area, content_area] =
        Layout::horizontal([Constraint::Length(42), Constraint::Min(0)]).areas(body_area);

    render_sidebar(app, frame, sidebar_area);
    render_content(app, frame, content_area);
    render_footer(app, frame, footer_area);

    // The chatbot floats over the content, bottom-right, like the site widget
    if app.chat_open {
        render_chat(app, frame, body_area);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            " Physical AI & Humanoid Robotics ",
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: &[(&str, &str)] = if app.chat_open {
        &[("Enter", "send"), ("Esc", "close chat")]
    } else {
        &[
            ("j/k", "navigate"),
            ("Enter", "open"),
            ("a", "ask chatbot"),
            ("q", "quit"),
        ]
    };

    let mut spans = Vec::new();
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {}  ", label), label_style));
    }

    let footer = Paragraph::new(Line::from(spans));
    frame.render_widget(footer, area);
}

fn render_sidebar(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.chat_open {
            Color::DarkGray
        } else {
            Color::Cyan
        }))
        .title(" Course ");

    let items: Vec<ListItem> = app
        .sidebar_rows()
        .into_iter()
        .map(|row| match row {
            SidebarRow::Doc(doc) => ListItem::new(format!(" {} ", doc.label)),
            SidebarRow::Category {
                label, collapsed, ..
            } => {
                let marker = if collapsed { "▸" } else { "▾" };
                ListItem::new(format!(" {} {} ", marker, label))
                    .style(Style::default().add_modifier(Modifier::BOLD))
            }
            SidebarRow::Child(doc) => ListItem::new(format!("     {} ", doc.label))
                .style(Style::default().fg(Color::Gray)),
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.sidebar_state);
}

fn render_content(app: &App, frame: &mut Frame, area: Rect) {
    let (title, body) = match app.selected_doc {
        Some(doc) => (
            format!(" {} ", doc.label),
            format!(
                "Selected document: {}\n\nOpen the published book to read this page.\nPress 'a' to ask the chatbot about it.",
                doc.id
            ),
        ),
        None => (
            " Welcome ".to_string(),
            "Pick a chapter on the left, or press 'a' to ask the chatbot.".to_string(),
        ),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title);

    let content = Paragraph::new(body)
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(content, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Anchor the popup to the bottom-right corner
    let popup_width = 48.min(area.width.saturating_sub(2));
    let popup_height = 18.min(area.height.saturating_sub(2));
    let popup_x = area.x + area.width.saturating_sub(popup_width + 1);
    let popup_y = area.y + area.height.saturating_sub(popup_height + 1);
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let [messages_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(popup_area);

    // Store message area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = messages_area.height.saturating_sub(2);
    app.chat_width = messages_area.width.saturating_sub(2);

    let messages_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Book Chatbot ");

    let chat_text = if app.transcript.is_empty() && app.pending == 0 {
        Text::from(Span::styled(
            WELCOME_LINE,
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in &app.transcript {
            let style = match msg.role {
                ChatRole::User => Style::default().fg(Color::Cyan),
                ChatRole::Bot => Style::default().fg(Color::Yellow),
            };
            for line in msg.text.lines() {
                lines.push(Line::from(Span::styled(line.to_string(), style)));
            }
            lines.push(Line::default());
        }

        if app.pending > 0 {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let messages = Paragraph::new(chat_text)
        .block(messages_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(messages, messages_area);

    render_chat_input(app, frame, input_area);
}

fn render_chat_input(app: &App, frame: &mut Frame, area: Rect) {
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Ask about the book ");

    let inner_width = area.width.saturating_sub(2) as usize;

    // Keep the cursor visible: scroll the draft horizontally once it
    // outgrows the input box.
    let scroll_offset = app
        .draft_cursor
        .saturating_sub(inner_width.saturating_sub(1));

    let visible_text: String = app
        .draft
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    let cursor_x = (app.draft_cursor - scroll_offset) as u16;
    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}
