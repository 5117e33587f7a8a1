use super::TabLines;
use crate::report::model::{AllStockScoresContent, Cell};
use crate::report::view::SortState;
use crate::ui::styles;
use crate::ui::utils::{display_width, pad_to};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

const COLUMN_GAP: usize = 2;

/// Sortable score table. `column` is the focused header.
pub fn render(content: &AllStockScoresContent, column: usize, sort: &SortState) -> TabLines {
    let mut out = TabLines::new();
    let table = &content.score_table;
    let rows = sort.sorted(&table.rows);

    // Column width = widest of header (+ sort arrow) and every cell
    let widths: Vec<usize> = table
        .headers
        .iter()
        .map(|h| {
            let cells = table
                .rows
                .iter()
                .map(|r| r.get(h).map(|c| display_width(&c.display())).unwrap_or(0))
                .max()
                .unwrap_or(0);
            (display_width(h) + 2).max(cells)
        })
        .collect();

    let mut header = vec![Span::raw(" ")];
    for (i, h) in table.headers.iter().enumerate() {
        let arrow = if sort.column.as_deref() == Some(h.as_str()) {
            format!(" {}", sort.direction.arrow())
        } else {
            String::new()
        };
        let style = if i == column {
            styles::selected_style().add_modifier(Modifier::BOLD)
        } else {
            styles::heading_style()
        };
        header.push(Span::styled(pad_to(&format!("{}{}", h, arrow), widths[i]), style));
        header.push(Span::raw(" ".repeat(COLUMN_GAP)));
    }
    out.push(Line::from(header));

    let rule_width = widths.iter().map(|w| w + COLUMN_GAP).sum::<usize>();
    out.push(Line::from(Span::styled(
        format!(" {}", "─".repeat(rule_width)),
        Style::default().fg(styles::BORDER),
    )));

    for row in &rows {
        let mut spans = vec![Span::raw(" ")];
        for (i, h) in table.headers.iter().enumerate() {
            let cell = row.get(h);
            let text = cell.map(Cell::display).unwrap_or_default();
            let style = match cell {
                Some(Cell::Number(n)) => styles::score_style(*n),
                _ => Style::default().fg(styles::TEXT),
            };
            spans.push(Span::styled(pad_to(&text, widths[i]), style));
            spans.push(Span::raw(" ".repeat(COLUMN_GAP)));
        }
        out.push(Line::from(spans));
    }

    out.blank();
    out.push(Line::from(Span::styled(
        format!(" 총 {}개 종목 • h/l 열 이동, Enter 정렬", table.rows.len()),
        Style::default().fg(styles::MUTED),
    )));
    out
}
