use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, FocusPane};

/// Parse a line of text and convert **bold** and *italic* markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c != '*' {
            current_text.push(c);
            continue;
        }

        // ** opens bold, a single * opens italic
        let bold = chars.peek() == Some(&'*');
        if bold {
            chars.next();
        }

        let mut inner = String::new();
        let mut found_close = false;
        while let Some(c) = chars.next() {
            if c == '*' {
                if !bold {
                    found_close = true;
                    break;
                }
                if chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
            }
            inner.push(c);
        }

        let marker = if bold { "**" } else { "*" };
        if found_close && !inner.is_empty() {
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }
            let modifier = if bold { Modifier::BOLD } else { Modifier::ITALIC };
            spans.push(Span::styled(inner, Style::default().add_modifier(modifier)));
        } else {
            // No closing marker, treat as literal
            current_text.push_str(marker);
            current_text.push_str(&inner);
            if found_close {
                current_text.push_str(marker);
            }
        }
    }

    // Push any remaining text
    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Letter markdown as terminal text: headings, rules and inline emphasis.
fn markdown_text(markdown: &str, width: u16) -> Text<'static> {
    let lines: Vec<Line<'static>> = markdown
        .lines()
        .map(|line| {
            let trimmed = line.trim();
            if trimmed == "---" {
                Line::from(Span::styled(
                    "─".repeat(width.max(1) as usize),
                    Style::default().fg(Color::DarkGray),
                ))
            } else if let Some(heading) = trimmed.strip_prefix("# ") {
                parse_markdown_line(heading).style(Style::default().fg(Color::Cyan).bold())
            } else if let Some(heading) = trimmed.strip_prefix("### ") {
                parse_markdown_line(heading).style(Style::default().fg(Color::Yellow).bold())
            } else if let Some(heading) = trimmed.strip_prefix("## ") {
                parse_markdown_line(heading).style(Style::default().fg(Color::Magenta).bold())
            } else {
                parse_markdown_line(line)
            }
        })
        .collect();
    Text::from(lines)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, status, footer
    let [header_area, body_area, status_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [exchange_area, thread_area] = Layout::vertical([
        Constraint::Percentage(60),
        Constraint::Percentage(40),
    ])
    .areas(body_area);

    let [left_area, reply_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(exchange_area);

    let [compose_area, last_letter_area] = Layout::vertical([
        Constraint::Min(5),
        Constraint::Percentage(40),
    ])
    .areas(left_area);

    // Store areas for mouse hit-testing
    app.compose_area = Some(compose_area);
    app.last_letter_area = Some(last_letter_area);
    app.reply_area = Some(reply_area);
    app.thread_area = Some(thread_area);

    render_compose(app, frame, compose_area);
    render_last_letter(app, frame, last_letter_area);
    render_reply(app, frame, reply_area);
    render_thread(app, frame, thread_area);
    render_status(app, frame, status_area);
    render_footer(app, frame, footer_area);

    if app.show_api_key_input {
        render_api_key_input(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let subject = match app.conversation.subject() {
        Some(subject) => format!(
            " Re: {}  [you {} / pen pal {}]",
            subject,
            app.conversation.user_turn(),
            app.conversation.ai_turn()
        ),
        None => String::new(),
    };
    let key_status = if app.pen_pal.has_credential() {
        Span::styled(" key set ", Style::default().fg(Color::Green))
    } else {
        Span::styled(" no API key ", Style::default().fg(Color::Red))
    };

    let title = Line::from(vec![
        Span::styled(" Pen Pal AI - Letter Exchange ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(subject, Style::default().fg(Color::White)),
        Span::raw(" "),
        key_status,
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title)
}

fn render_compose(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Compose;
    let mut title = format!(" {} - {} ", app.labels.section_title, app.labels.input_label);
    if app.dictation.is_capturing() {
        title.push_str("[dictating] ");
    }
    let block = pane_block(title, focused);
    let block = if app.dictation.is_capturing() {
        block.border_style(Style::default().fg(Color::Red))
    } else {
        block
    };

    let inner = block.inner(area);
    let inner_width = inner.width as usize;
    let inner_height = inner.height as usize;

    let (row, col) = app.compose_cursor_position();

    // Keep the cursor inside the viewport in both directions
    let scroll_y = if inner_height == 0 { 0 } else { row.saturating_sub(inner_height - 1) };
    let scroll_x = if inner_width == 0 || col < inner_width { 0 } else { col - inner_width + 1 };

    let text = if app.compose_input.is_empty() {
        Text::styled(
            app.labels.input_placeholder,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )
    } else {
        Text::raw(app.compose_input.as_str())
    };

    let compose = Paragraph::new(text)
        .block(block)
        .scroll((scroll_y as u16, scroll_x as u16));
    frame.render_widget(compose, area);

    // Show cursor when editing
    if focused && !app.show_api_key_input && app.compose_editable() {
        frame.set_cursor_position((
            inner.x + (col - scroll_x) as u16,
            inner.y + (row - scroll_y) as u16,
        ));
    }
}

fn render_letter_pane(frame: &mut Frame, area: Rect, block: Block<'static>, text: Text<'static>, scroll: &mut u16) {
    let inner = block.inner(area);
    let paragraph = Paragraph::new(text).wrap(Wrap { trim: false });

    // Scroll is in wrapped rows; stop once the last row reaches the bottom
    let rows = paragraph.line_count(inner.width);
    let max_scroll = rows.saturating_sub(inner.height as usize).min(u16::MAX as usize) as u16;
    *scroll = (*scroll).min(max_scroll);

    frame.render_widget(block, area);
    frame.render_widget(paragraph.scroll((*scroll, 0)), inner);
}

fn render_last_letter(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = pane_block(" Your Last Letter ".to_string(), app.focus == FocusPane::LastLetter);
    let text = markdown_text(app.user_letter_display(), block.inner(area).width);
    render_letter_pane(frame, area, block, text, &mut app.last_letter_scroll);
}

fn render_reply(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = pane_block(" AI Reply ".to_string(), app.focus == FocusPane::Reply);

    let text = if app.is_sending() {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        Text::from(Line::from(Span::styled(
            format!("Your pen pal is writing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )))
    } else {
        markdown_text(app.ai_letter_display(), block.inner(area).width)
    };
    render_letter_pane(frame, area, block, text, &mut app.reply_scroll);
}

fn render_thread(app: &mut App, frame: &mut Frame, area: Rect) {
    let title = format!(" Letter Thread ({}) ", app.conversation.thread().len());
    let block = pane_block(title, app.focus == FocusPane::Thread);
    let text = markdown_text(&app.thread_display, block.inner(area).width);
    render_letter_pane(frame, area, block, text, &mut app.thread_scroll);
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let status = app.status.as_deref().unwrap_or("");
    let paragraph = Paragraph::new(Span::styled(
        format!(" {}", status),
        Style::default().fg(Color::Yellow),
    ));
    frame.render_widget(paragraph, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = if app.show_api_key_input {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" set key ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ]
    } else {
        let send_label = if app.is_sending() { "Writing..." } else { app.labels.send_button };
        let mut hints = vec![
            Span::styled(" ^S ", key_style),
            Span::styled(format!(" {} ", send_label), label_style),
            Span::styled(" ^N ", key_style),
            Span::styled(" New Conversation ", label_style),
            Span::styled(" ^D ", key_style),
            Span::styled(format!(" {} ", app.dictation.button_label()), label_style),
            Span::styled(" ^U ", key_style),
            Span::styled(" Download Your Letter ", label_style),
            Span::styled(" ^R ", key_style),
            Span::styled(" Download AI Reply ", label_style),
            Span::styled(" ^K ", key_style),
            Span::styled(" API key ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" focus ", label_style),
        ];
        if app.focus != FocusPane::Compose {
            hints.extend(vec![
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
            ]);
        }
        hints.extend(vec![
            Span::styled(" ^Q ", key_style),
            Span::styled(" quit ", label_style),
        ]);
        hints
    };

    let footer = Paragraph::new(Line::from(hints)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn render_api_key_input(app: &App, frame: &mut Frame, area: Rect) {
    let popup = centered_rect(area, 64, 8);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Give your pen pal an OpenAI key ")
        .title_bottom(Line::from(" used for this session only ").right_aligned());
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [help_area, _, input_area, _, count_area] =
        Layout::vertical([Constraint::Length(1); 5]).areas(inner);

    frame.render_widget(
        Paragraph::new("Paste the key, then Enter to use it or Esc to keep the current one.")
            .style(Style::default().fg(Color::DarkGray)),
        help_area,
    );

    // The masked text has one column per key character, so the cursor maps directly
    let width = input_area.width as usize;
    let offset = app.api_key_input_cursor.saturating_sub(width.saturating_sub(1));
    frame.render_widget(
        Paragraph::new(masked_key(&app.api_key_input))
            .style(Style::default().fg(Color::Cyan))
            .scroll((0, offset as u16)),
        input_area,
    );
    frame.set_cursor_position((
        input_area.x + (app.api_key_input_cursor - offset) as u16,
        input_area.y,
    ));

    let count = match app.api_key_input.chars().count() {
        0 => "Nothing entered yet".to_string(),
        n => format!("{} characters", n),
    };
    frame.render_widget(
        Paragraph::new(count).style(Style::default().fg(Color::DarkGray)),
        count_area,
    );
}

/// Hides all but the last four characters, one bullet per hidden character.
/// Keys of four characters or fewer are hidden entirely.
fn masked_key(key: &str) -> String {
    let len = key.chars().count();
    let hidden = if len <= 4 { len } else { len - 4 };
    key.chars()
        .enumerate()
        .map(|(i, c)| if i < hidden { '•' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use penpal_core::{Config, PenPal, PenPalSettings};
    use ratatui::{backend::TestBackend, Terminal};

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn bold_and_italic_become_styled_spans() {
        let line = parse_markdown_line("**Re: Autumn (AI Reply 1)** on *October 03, 2024*");
        assert_eq!(plain(&line), "Re: Autumn (AI Reply 1) on October 03, 2024");
        assert!(line.spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert!(line.spans[2].style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn unclosed_markers_stay_literal() {
        assert_eq!(plain(&parse_markdown_line("5 * 3 = 15")), "5 * 3 = 15");
        assert_eq!(plain(&parse_markdown_line("**open")), "**open");
    }

    #[test]
    fn rules_and_headings_are_rendered() {
        let text = markdown_text("# Letter Thread\n\n---\n### 🧑 **You**", 10);
        assert_eq!(text.lines.len(), 4);
        assert_eq!(plain(&text.lines[0]), "Letter Thread");
        assert_eq!(plain(&text.lines[2]), "─".repeat(10));
        assert_eq!(plain(&text.lines[3]), "🧑 You");
    }

    #[test]
    fn key_is_masked_column_for_column() {
        assert_eq!(masked_key("abc"), "•••");
        assert_eq!(masked_key("sk-1234567"), "••••••4567");
        assert_eq!(masked_key("sk-1234567").chars().count(), 10);
    }

    fn test_app() -> App {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        App::new(Config::default(), PenPal::new(PenPalSettings::default()), tx)
    }

    fn draw(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn long_reply_scrolls_down_to_its_sign_off() {
        let mut app = test_app();
        let paragraph = "I walked along the river this morning and thought of you. ".repeat(40);
        app.ai_letter = format!(
            "Dear Friend,\n\n{}\n\nWarmly,\nYours in ink, Wren",
            paragraph.trim_end()
        );
        app.reply_scroll = 500;

        let screen = draw(&mut app, 100, 40);

        assert!(screen.contains("Yours in ink, Wren"));
        assert!(!screen.contains("Dear Friend,"));
        assert!(app.reply_scroll > 4);
        assert!(app.reply_scroll < 500);
    }

    #[test]
    fn short_reply_does_not_scroll() {
        let mut app = test_app();
        app.ai_letter = "Dear Friend,\n\nA short note.".to_string();
        app.reply_scroll = 10;

        let screen = draw(&mut app, 100, 40);

        assert!(screen.contains("Dear Friend,"));
        assert_eq!(app.reply_scroll, 0);
    }
}
