use super::editor::{embed_display, PhaseEditor};
use crate::content::{ContentPhase, Run};
use crate::decision::{EditorFrame, Placement};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Padding, Paragraph, Wrap};
use ratatui::Terminal;
use std::io;

pub type WizardTerminal = Terminal<CrosstermBackend<io::Stdout>>;

pub fn tail_for_display(value: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= max_chars {
        return value.to_string();
    }
    chars[chars.len() - max_chars..].iter().collect()
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn title_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn highlight_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn main_panel_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .padding(Padding::new(2, 2, 1, 1))
}

fn chrome(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(4),
        ])
        .split(area)
}

pub(crate) fn draw_list_screen(
    terminal: &mut WizardTerminal,
    title: &str,
    items: &[String],
    selected: usize,
    status: &str,
    hint: &str,
) -> Result<(), String> {
    terminal
        .draw(|frame| {
            let chunks = chrome(frame.area());
            let header = Paragraph::new(Line::from(Span::styled(title.to_string(), title_style())))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(header, chunks[0]);

            let list_items: Vec<ListItem> = items
                .iter()
                .enumerate()
                .map(|(idx, line)| {
                    let item = ListItem::new(Line::from(Span::raw(line.clone())));
                    if idx == selected {
                        item.style(highlight_style())
                    } else {
                        item
                    }
                })
                .collect();
            frame.render_widget(List::new(list_items).block(main_panel_block()), chunks[1]);

            let footer = Paragraph::new(vec![
                Line::from(hint.to_string()),
                Line::from(format!("Status: {status}")),
            ])
            .block(Block::default().borders(Borders::ALL));
            frame.render_widget(footer, chunks[2]);
        })
        .map_err(|e| format!("failed to render list screen: {e}"))?;
    Ok(())
}

fn document_lines(editor: &PhaseEditor) -> Vec<Line<'static>> {
    let mut lines = vec![Line::default()];
    let Some(document) = editor.document() else {
        return vec![Line::from(Span::styled(
            "(empty; start typing or press Ctrl-N)",
            Style::default().fg(Color::DarkGray),
        ))];
    };
    for run in document.runs() {
        match run {
            Run::Text { text, style } => {
                let mut span_style = Style::default();
                if style.bold {
                    span_style = span_style.add_modifier(Modifier::BOLD);
                }
                if style.italic {
                    span_style = span_style.add_modifier(Modifier::ITALIC);
                }
                for (idx, segment) in text.split('\n').enumerate() {
                    if idx > 0 {
                        lines.push(Line::default());
                    }
                    if let Some(line) = lines.last_mut() {
                        line.spans.push(Span::styled(segment.to_string(), span_style));
                    }
                }
            }
            Run::Embed(embed) => {
                if let Some(line) = lines.last_mut() {
                    line.spans.push(Span::styled(
                        embed_display(embed),
                        Style::default().fg(Color::Black).bg(Color::Cyan),
                    ));
                }
            }
        }
    }
    lines
}

fn item_titles(editor: &PhaseEditor) -> Vec<String> {
    let content = editor.content();
    match editor.phase() {
        ContentPhase::Rules => vec!["Rules".to_string()],
        ContentPhase::Steps => content
            .steps
            .iter()
            .map(|s| format!("{}. {}", s.order, s.name))
            .collect(),
        ContentPhase::Faq => content
            .faq
            .iter()
            .map(|f| {
                format!(
                    "{}. {}",
                    f.order,
                    f.question.as_deref().unwrap_or("(no question)")
                )
            })
            .collect(),
    }
}

/// Draws the editor and returns the frame the trigger detector should use
/// for the next keystroke.
pub(crate) fn draw_editor(
    terminal: &mut WizardTerminal,
    title: &str,
    editor: &PhaseEditor,
    hint: &str,
) -> Result<EditorFrame, String> {
    let mut editor_frame = EditorFrame::default();
    terminal
        .draw(|frame| {
            let chunks = chrome(frame.area());
            let mut style_flags = Vec::new();
            if editor.style().bold {
                style_flags.push("bold");
            }
            if editor.style().italic {
                style_flags.push("italic");
            }
            let header = Paragraph::new(vec![Line::from(vec![
                Span::styled(title.to_string(), title_style()),
                Span::raw(format!(
                    "  [{}]{}",
                    editor.phase().as_str(),
                    if style_flags.is_empty() {
                        String::new()
                    } else {
                        format!(" {}", style_flags.join("+"))
                    }
                )),
            ])])
            .block(Block::default().borders(Borders::ALL));
            frame.render_widget(header, chunks[0]);

            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
                .split(chunks[1]);
            let items: Vec<ListItem> = item_titles(editor)
                .into_iter()
                .enumerate()
                .map(|(idx, label)| {
                    let item = ListItem::new(label);
                    if idx == editor.item() {
                        item.style(highlight_style())
                    } else {
                        item
                    }
                })
                .collect();
            frame.render_widget(
                List::new(items).block(Block::default().borders(Borders::ALL)),
                body[0],
            );

            let text_block = Block::default().borders(Borders::ALL);
            let text_area = text_block.inner(body[1]);
            frame.render_widget(
                Paragraph::new(document_lines(editor))
                    .block(text_block)
                    .wrap(Wrap { trim: false }),
                body[1],
            );
            editor_frame = EditorFrame {
                origin_left: i32::from(text_area.x),
                origin_top: i32::from(text_area.y),
                viewport_height: i32::from(frame.area().height),
            };
            let cursor = editor.cursor_bounds();
            frame.set_cursor_position((
                text_area.x.saturating_add(cursor.left.max(0) as u16),
                text_area.y.saturating_add(cursor.top.max(0) as u16),
            ));

            if let (Some(palette), Some(anchor)) = (editor.palette(), editor.anchor()) {
                let area = frame.area();
                let height = u16::try_from(editor.palette_height())
                    .unwrap_or(u16::MAX)
                    .min(area.height);
                let width = 40u16.min(area.width);
                let top = anchor.top.max(0) as u16;
                let marker = match anchor.placement {
                    Placement::Below => "v",
                    Placement::Above => "^",
                };
                let popup = Rect {
                    x: (anchor.left.max(0) as u16).min(area.width.saturating_sub(width)),
                    y: top.min(area.height.saturating_sub(height)),
                    width,
                    height,
                };
                let mut lines = vec![Line::from(Span::styled(
                    format!("{marker} {}  > {}", palette.title(), palette.query()),
                    title_style(),
                ))];
                if let Some(err) = palette.load_error() {
                    lines.push(Line::from(Span::styled(
                        err.to_string(),
                        Style::default().fg(Color::Red),
                    )));
                }
                for (idx, row) in palette.rows().into_iter().enumerate() {
                    let line = Line::from(row.label);
                    lines.push(if idx == palette.highlighted() {
                        line.style(highlight_style())
                    } else {
                        line
                    });
                }
                frame.render_widget(Clear, popup);
                frame.render_widget(
                    Paragraph::new(lines).block(Block::default().borders(Borders::ALL)),
                    popup,
                );
            }

            let footer = Paragraph::new(vec![
                Line::from(hint.to_string()),
                Line::from(format!("Status: {}", editor.status().unwrap_or("editing"))),
            ])
            .block(Block::default().borders(Borders::ALL));
            frame.render_widget(footer, chunks[2]);
        })
        .map_err(|e| format!("failed to render editor: {e}"))?;
    Ok(editor_frame)
}

pub(crate) fn prompt_line_tui(
    terminal: &mut WizardTerminal,
    title: &str,
    prompt: &str,
    initial: &str,
) -> Result<Option<String>, String> {
    let mut value = initial.to_string();
    loop {
        terminal
            .draw(|frame| {
                let area = centered_rect(70, 30, frame.area());
                let block = Block::default()
                    .borders(Borders::ALL)
                    .padding(Padding::new(2, 2, 1, 1));
                frame.render_widget(Clear, area);
                frame.render_widget(block.clone(), area);
                let inner = block.inner(area);
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(1),
                        Constraint::Length(1),
                        Constraint::Length(1),
                        Constraint::Length(1),
                        Constraint::Length(1),
                        Constraint::Min(1),
                    ])
                    .split(inner);
                let max_input_width = rows[3].width.saturating_sub(2) as usize;
                let display_value = tail_for_display(&value, max_input_width);
                frame.render_widget(
                    Paragraph::new(Line::from(Span::styled(title, title_style()))),
                    rows[0],
                );
                frame.render_widget(Paragraph::new(prompt), rows[2]);
                frame.render_widget(
                    Paragraph::new(Line::from(format!("> {display_value}"))),
                    rows[3],
                );
                frame.render_widget(Paragraph::new("Enter apply, Esc cancel"), rows[4]);
                frame.set_cursor_position((
                    rows[3].x + 2 + display_value.chars().count() as u16,
                    rows[3].y,
                ));
            })
            .map_err(|e| format!("failed to render prompt: {e}"))?;
        let ev = event::read().map_err(|e| format!("failed to read prompt input: {e}"))?;
        let Event::Key(key) = ev else {
            continue;
        };
        if key.kind == KeyEventKind::Release {
            continue;
        }
        match key.code {
            KeyCode::Esc => return Ok(None),
            KeyCode::Enter | KeyCode::Char('\n') | KeyCode::Char('\r') => return Ok(Some(value)),
            KeyCode::Backspace => {
                value.pop();
            }
            KeyCode::Char(ch) => value.push(ch),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_for_display_keeps_the_end() {
        assert_eq!(tail_for_display("Bancário (2)", 5), "o (2)");
        assert_eq!(tail_for_display("BPC", 5), "BPC");
        assert_eq!(tail_for_display("BPC", 0), "");
    }
}
