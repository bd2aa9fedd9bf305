use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;
use crate::words::{EditGroup, WordMap};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditField {
    Word,
    Suggestions,
}

pub struct WordTable<'a> {
    groups: &'a [EditGroup],
    group: usize,
    row: usize,
    words: &'a WordMap,
    editing: Option<(EditField, &'a LineInput)>,
    theme: &'a Theme,
}

impl<'a> WordTable<'a> {
    pub fn new(
        groups: &'a [EditGroup],
        group: usize,
        row: usize,
        words: &'a WordMap,
        theme: &'a Theme,
    ) -> Self {
        Self {
            groups,
            group,
            row,
            words,
            editing: None,
            theme,
        }
    }

    pub fn editing(mut self, editing: Option<(EditField, &'a LineInput)>) -> Self {
        self.editing = editing;
        self
    }

    fn input_spans(&self, input: &LineInput) -> Vec<Span<'static>> {
        let colors = &self.theme.colors;
        let (before, cursor, after) = input.render_parts();
        let cursor_style = Style::default().fg(colors.bg()).bg(colors.accent());
        vec![
            Span::styled(before.to_string(), Style::default().fg(colors.fg())),
            Span::styled(
                cursor.map(String::from).unwrap_or_else(|| " ".to_string()),
                cursor_style,
            ),
            Span::styled(after.to_string(), Style::default().fg(colors.fg())),
        ]
    }
}

impl Widget for WordTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(20), Constraint::Min(20)])
            .split(area);

        let group_lines: Vec<Line> = self
            .groups
            .iter()
            .enumerate()
            .map(|(i, g)| {
                let style = if i == self.group {
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors.text_muted())
                };
                Line::from(Span::styled(format!(" {}", g.label), style))
            })
            .collect();
        Paragraph::new(group_lines)
            .block(
                Block::bordered()
                    .title(" Groups ")
                    .border_style(Style::default().fg(colors.border())),
            )
            .render(columns[0], buf);

        let Some(group) = self.groups.get(self.group) else {
            return;
        };

        let mut lines: Vec<Line> = Vec::with_capacity(group.keys.len() * 2);
        for (i, key) in group.keys.iter().enumerate() {
            let selected = i == self.row;
            let entry = self.words.get(key);
            let word = entry.map(|e| e.word.as_str()).unwrap_or("");
            let suggestions = entry.map(|e| e.suggestions.join(", ")).unwrap_or_default();

            let key_style = if selected {
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.number())
            };
            let indicator = if selected { ">" } else { " " };

            let mut word_line = vec![Span::styled(format!("{indicator} {key:>2}: "), key_style)];
            match self.editing {
                Some((EditField::Word, input)) if selected => {
                    word_line.extend(self.input_spans(input));
                }
                _ => word_line.push(Span::styled(
                    word.to_string(),
                    Style::default().fg(colors.word()),
                )),
            }
            lines.push(Line::from(word_line));

            let mut sugg_line = vec![Span::styled(
                "      Suggestions: ",
                Style::default().fg(colors.text_muted()),
            )];
            match self.editing {
                Some((EditField::Suggestions, input)) if selected => {
                    sugg_line.extend(self.input_spans(input));
                }
                _ => sugg_line.push(Span::styled(
                    suggestions,
                    Style::default().fg(colors.text_muted()),
                )),
            }
            lines.push(Line::from(sugg_line));
        }

        // keep the selected row visible
        let inner_height = columns[1].height.saturating_sub(2) as usize;
        let selected_bottom = self.row * 2 + 2;
        let scroll = selected_bottom.saturating_sub(inner_height) as u16;

        Paragraph::new(lines)
            .scroll((scroll, 0))
            .block(
                Block::bordered()
                    .title(format!(" {} ", group.label))
                    .border_style(Style::default().fg(colors.border_focused())),
            )
            .render(columns[1], buf);
    }
}
