use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub struct AppLayout {
    pub header: Rect,
    pub main: Rect,
    pub status: Rect,
    pub footer: Rect,
}

impl AppLayout {
    /// Header bar, main area, one status line, and footer hints that take as
    /// many rows as `footer_lines`.
    pub fn new(area: Rect, footer_lines: u16) -> Self {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(6),
                Constraint::Length(1),
                Constraint::Length(footer_lines.max(1)),
            ])
            .split(area);

        Self {
            header: vertical[0],
            main: vertical[1],
            status: vertical[2],
            footer: vertical[3],
        }
    }
}

pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    if width == 0 || hints.is_empty() {
        return Vec::new();
    }

    let prefix = " ";
    let separator = "  ";
    let mut out: Vec<String> = Vec::new();
    let mut current = prefix.to_string();
    let mut has_hint = false;

    for hint in hints.iter().filter(|h| !h.is_empty()) {
        let candidate = if has_hint {
            format!("{current}{separator}{hint}")
        } else {
            format!("{current}{hint}")
        };
        if candidate.chars().count() <= width || !has_hint {
            current = candidate;
        } else {
            out.push(current);
            current = format!("{prefix}{hint}");
        }
        has_hint = true;
    }

    if has_hint {
        out.push(current);
    }
    out
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    const MIN_POPUP_WIDTH: u16 = 40;
    const MIN_POPUP_HEIGHT: u16 = 12;

    let requested_w = area.width.saturating_mul(percent_x.min(100)) / 100;
    let requested_h = area.height.saturating_mul(percent_y.min(100)) / 100;

    let target_w = requested_w.max(MIN_POPUP_WIDTH).min(area.width);
    let target_h = requested_h.max(MIN_POPUP_HEIGHT).min(area.height);

    let left = area
        .x
        .saturating_add((area.width.saturating_sub(target_w)) / 2);
    let top = area
        .y
        .saturating_add((area.height.saturating_sub(target_h)) / 2);

    Rect::new(left, top, target_w, target_h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_hint_lines_wraps() {
        let lines = pack_hint_lines(&["[s] Start", "[f] Forward", "[b] Backward"], 24);
        assert_eq!(lines, vec![" [s] Start  [f] Forward", " [b] Backward"]);
    }

    #[test]
    fn test_pack_hint_lines_overlong_hint_gets_own_line() {
        let lines = pack_hint_lines(&["[x] a very long hint indeed", "[q] Quit"], 10);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], " [q] Quit");
    }

    #[test]
    fn test_pack_hint_lines_empty() {
        assert!(pack_hint_lines(&[], 40).is_empty());
        assert!(pack_hint_lines(&["[q] Quit"], 0).is_empty());
    }

    #[test]
    fn test_centered_rect_fits_area() {
        let area = Rect::new(0, 0, 30, 10);
        let rect = centered_rect(50, 50, area);
        assert_eq!(rect, area);

        let big = Rect::new(0, 0, 200, 60);
        let rect = centered_rect(50, 50, big);
        assert_eq!((rect.width, rect.height), (100, 30));
        assert_eq!((rect.x, rect.y), (50, 15));
    }
}
