pub mod dashboard;
pub mod deep_dive;
pub mod key_stock;
pub mod score_table;

use super::styles;
use crate::report::model::TabContent;
use ratatui::text::{Line, Span};

/// Rendered body of one tab. `cursor_line` is the row the item cursor sits
/// on, so the caller can keep it on screen.
pub struct TabLines {
    pub lines: Vec<Line<'static>>,
    pub cursor_line: Option<usize>,
}

impl TabLines {
    fn new() -> Self {
        TabLines { lines: Vec::new(), cursor_line: None }
    }

    fn push(&mut self, line: Line<'static>) {
        self.lines.push(line);
    }

    fn blank(&mut self) {
        self.lines.push(Line::default());
    }

    /// Mark the next pushed line as the cursor row
    fn mark_cursor(&mut self) {
        self.cursor_line = Some(self.lines.len());
    }
}

/// Fallback for a tab whose content doesn't match its id
pub fn raw(content: &TabContent) -> TabLines {
    let mut out = TabLines::new();
    out.push(Line::from(Span::styled(
        " 알 수 없는 탭 형식입니다. 원본 데이터:",
        ratatui::style::Style::default().fg(styles::YELLOW),
    )));
    out.blank();
    for line in content.to_pretty_json().lines() {
        out.push(Line::from(Span::styled(
            format!("  {}", line),
            ratatui::style::Style::default().fg(styles::MUTED),
        )));
    }
    out
}

/// Concatenated span text, one row per line
pub(crate) fn visible_text(lines: &[Line]) -> String {
    lines
        .iter()
        .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
