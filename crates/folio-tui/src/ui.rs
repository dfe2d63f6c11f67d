use folio_core::transcript::{role_label, CHIP_INDENT, LINK_INDENT, SOURCES_HEADER, THINKING_TEXT};
use folio_core::{Role, ViewLine};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

use crate::app::{App, FocusPane, InputMode};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c != '*' || chars.peek() != Some(&'*') {
            current_text.push(c);
            continue;
        }
        chars.next();

        let mut bold_text = String::new();
        let mut found_close = false;
        while let Some(c) = chars.next() {
            if c == '*' && chars.peek() == Some(&'*') {
                chars.next();
                found_close = true;
                break;
            }
            bold_text.push(c);
        }

        if found_close && !bold_text.is_empty() {
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }
            spans.push(Span::styled(
                bold_text,
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else {
            // No closing **, treat as literal
            current_text.push_str("**");
            current_text.push_str(&bold_text);
            if found_close {
                current_text.push_str("**");
            }
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    Line::from(spans)
}

fn role_style(role: Role) -> Style {
    let color = match role {
        Role::User => Color::Cyan,
        Role::Assistant => Color::Yellow,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn styled_line(line: ViewLine, animation_frame: u8) -> Line<'static> {
    match line {
        ViewLine::Label(role) => Line::from(Span::styled(role_label(role), role_style(role))),
        ViewLine::Body(text) => parse_markdown_line(&text),
        ViewLine::SourcesHeader => Line::from(Span::styled(
            SOURCES_HEADER,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
        )),
        ViewLine::Chip(label) => Line::from(vec![
            Span::raw(" ".repeat(CHIP_INDENT)),
            Span::styled(
                format!("[{}]", label),
                Style::default().fg(Color::Black).bg(Color::Gray),
            ),
        ]),
        ViewLine::Link(piece) => Line::from(vec![
            Span::raw(" ".repeat(LINK_INDENT)),
            Span::styled(
                piece,
                Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
            ),
        ]),
        ViewLine::Blank => Line::default(),
        ViewLine::Thinking => {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((animation_frame as usize) + 1);
            Line::from(Span::styled(
                format!("{}{}", THINKING_TEXT, dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ))
        }
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = if app.store.is_awaiting() {
        Span::styled(" ● awaiting ", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(" ● online ", Style::default().fg(Color::Green))
    };

    let title = Line::from(vec![
        Span::styled(" Portfolio Assistant ", Style::default().fg(Color::Cyan).bold()),
        status,
        Span::styled(
            format!("{}: {} ", app.provider.display_name(), app.gateway.label()),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Inner size minus borders, used for wrapping and scroll math
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);
    app.follow_transcript();

    let focused = app.focus == FocusPane::Transcript;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Chat ");

    let lines = app.transcript_lines();
    let total_lines = lines.len();
    let visible: Vec<Line> = lines
        .into_iter()
        .skip(app.chat_scroll)
        .take(app.chat_height as usize)
        .map(|line| styled_line(line, app.animation_frame))
        .collect();

    frame.render_widget(Paragraph::new(Text::from(visible)).block(block), area);

    if total_lines > app.chat_height as usize {
        let mut scrollbar_state = ScrollbarState::new(total_lines.saturating_sub(app.chat_height as usize))
            .position(app.chat_scroll);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };
    let title = if app.store.is_awaiting() {
        " Ask (waiting for reply) "
    } else {
        " Ask about my background or projects "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width == 0 || cursor_pos < inner_width {
        0
    } else {
        cursor_pos - inner_width + 1
    };

    let visible_text: String = app
        .store
        .pending_input()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let hints = match app.input_mode {
        InputMode::Normal => " j/k scroll  g/G top/bottom  i/Tab type  c clear  q quit",
        InputMode::Editing => " Enter send  Esc/Tab scroll mode  Ctrl+L clear  Ctrl+C quit",
    };

    let footer = Line::from(vec![
        Span::styled(mode_text, mode_style),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(footer), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_markdown_bold() {
        let line = parse_markdown_line("I use **Rust** daily");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "Rust");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(plain(&line), "I use Rust daily");
    }

    #[test]
    fn test_markdown_unclosed_is_literal() {
        let line = parse_markdown_line("a ** b");
        assert_eq!(plain(&line), "a ** b");
        assert_eq!(plain(&parse_markdown_line("2 * 3")), "2 * 3");
    }

    #[test]
    fn test_chip_label_then_uri_rows() {
        let label = styled_line(ViewLine::Chip("X".to_string()), 0);
        assert_eq!(plain(&label), "  [X]");
        let link = styled_line(ViewLine::Link("https://x".to_string()), 0);
        assert_eq!(plain(&link), "    https://x");
    }

    #[test]
    fn test_drawn_rows_match_layout_width() {
        let lines = [
            ViewLine::Label(Role::Assistant),
            ViewLine::SourcesHeader,
            ViewLine::Chip("github.com".to_string()),
            ViewLine::Link("https://github.com/".to_string()),
            ViewLine::Thinking,
        ];
        for line in lines {
            let width = line.width();
            assert_eq!(plain(&styled_line(line, 2)).chars().count(), width);
        }
        assert_eq!(plain(&styled_line(ViewLine::SourcesHeader, 0)), "Sources:");
    }

    #[test]
    fn test_thinking_dots_follow_animation_frame() {
        assert_eq!(plain(&styled_line(ViewLine::Thinking, 2)), "Thinking...");
    }
}
