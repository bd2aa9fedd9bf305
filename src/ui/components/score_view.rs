use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::engine::scoring::{Score, Verdict};
use crate::session::sequence::{CheckKind, CheckOutcome};
use crate::ui::theme::Theme;

const EXACT_MATCH: &str = "\u{2705} Correct!";
const BLANK: &str = "_";

/// One rendered position of a scored answer.
#[derive(Debug, PartialEq, Eq)]
struct RenderToken {
    display: String,
    verdict: Verdict,
}

fn build_render_tokens(score: &Score) -> Vec<RenderToken> {
    match score {
        Score::ExactMatch => Vec::new(),
        Score::Scored(seq) => seq
            .digits
            .iter()
            .map(|d| RenderToken {
                display: d
                    .shown
                    .map(|digit| digit.to_string())
                    .unwrap_or_else(|| BLANK.to_string()),
                verdict: d.verdict,
            })
            .collect(),
    }
}

fn kind_label(kind: CheckKind) -> String {
    match kind {
        CheckKind::PartialForward(n) | CheckKind::PartialBackward(n) => {
            format!("{} (last {n})", kind.label())
        }
        _ => kind.label().to_string(),
    }
}

/// The results of every check made since the last trial started.
pub struct ScoreView<'a> {
    outcomes: &'a [CheckOutcome],
    theme: &'a Theme,
}

impl<'a> ScoreView<'a> {
    pub fn new(outcomes: &'a [CheckOutcome], theme: &'a Theme) -> Self {
        Self { outcomes, theme }
    }
}

impl Widget for ScoreView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let mut lines: Vec<Line> = Vec::new();

        for outcome in self.outcomes {
            lines.push(Line::from(Span::styled(
                format!("{}:", kind_label(outcome.kind)),
                Style::default().fg(colors.accent()),
            )));

            let mut spans = vec![Span::raw("  ")];
            match &outcome.score {
                Score::ExactMatch => spans.push(Span::styled(
                    EXACT_MATCH,
                    Style::default()
                        .fg(colors.success())
                        .add_modifier(Modifier::BOLD),
                )),
                Score::Scored(seq) => {
                    for token in build_render_tokens(&outcome.score) {
                        let style = match token.verdict {
                            Verdict::Correct => Style::default().fg(colors.text_correct()),
                            Verdict::Incorrect => Style::default()
                                .fg(colors.text_incorrect())
                                .bg(colors.text_incorrect_bg())
                                .add_modifier(Modifier::UNDERLINED),
                        };
                        spans.push(Span::styled(token.display, style));
                    }
                    spans.push(Span::styled(
                        format!(
                            "   {}/{} ({:.0}%)",
                            seq.correct_count(),
                            seq.digits.len(),
                            seq.accuracy()
                        ),
                        Style::default().fg(colors.text_muted()),
                    ));
                }
            }
            lines.push(Line::from(spans));
        }

        let block = Block::bordered()
            .title(" Results ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scoring::{ScoringPolicy, normalize, score};

    fn displays(tokens: &[RenderToken]) -> String {
        tokens.iter().map(|t| t.display.as_str()).collect()
    }

    #[test]
    fn test_exact_match_has_no_tokens() {
        assert!(build_render_tokens(&Score::ExactMatch).is_empty());
    }

    #[test]
    fn test_correct_length_tokens_show_expected_digits() {
        let s = score(&normalize("12175"), &normalize("12075"), ScoringPolicy::CorrectLength);
        let tokens = build_render_tokens(&s);
        assert_eq!(displays(&tokens), "12075");
        assert_eq!(tokens[2].verdict, Verdict::Incorrect);
        assert_eq!(tokens[3].verdict, Verdict::Correct);
    }

    #[test]
    fn test_max_length_tokens_blank_missing_input() {
        let s = score(&normalize("12"), &normalize("1234"), ScoringPolicy::MaxLength);
        let tokens = build_render_tokens(&s);
        assert_eq!(displays(&tokens), "12__");
    }

    #[test]
    fn test_partial_label_includes_count() {
        assert_eq!(kind_label(CheckKind::PartialBackward(3)), "Partial backward (last 3)");
        assert_eq!(kind_label(CheckKind::Forward), "Forward");
    }
}
