use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::ui::theme::Theme;

/// Bordered box with the current number centred, and an optional word under it.
pub struct NumberDisplay<'a> {
    title: &'a str,
    number: Option<&'a str>,
    word: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> NumberDisplay<'a> {
    pub fn new(title: &'a str, number: Option<&'a str>, theme: &'a Theme) -> Self {
        Self {
            title,
            number,
            word: None,
            theme,
        }
    }

    pub fn word(mut self, word: Option<&'a str>) -> Self {
        self.word = word;
        self
    }
}

impl Widget for NumberDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines = Vec::new();
        let used = if self.word.is_some() { 3 } else { 1 };
        for _ in 0..inner.height.saturating_sub(used) / 2 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            spaced(self.number.unwrap_or("")),
            Style::default()
                .fg(colors.number())
                .add_modifier(Modifier::BOLD),
        )));
        if let Some(word) = self.word {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                word.to_string(),
                Style::default().fg(colors.word()),
            )));
        }

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(inner, buf);
    }
}

/// "42" -> "4 2", so the number reads larger in a terminal cell grid.
fn spaced(number: &str) -> String {
    let chars: Vec<String> = number.chars().map(String::from).collect();
    chars.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spaced() {
        assert_eq!(spaced("42"), "4 2");
        assert_eq!(spaced("7"), "7");
        assert_eq!(spaced(""), "");
    }

    #[test]
    fn test_renders_number_and_word() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 20, 7);
        let mut buf = Buffer::empty(area);
        NumberDisplay::new("Flash", Some("42"), &theme)
            .word(Some("rain"))
            .render(area, &mut buf);

        let text: String = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.contains("4 2"));
        assert!(text.contains("rain"));
        assert!(text.contains("Flash"));
    }
}
