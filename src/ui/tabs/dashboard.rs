use super::TabLines;
use crate::report::model::{format_number, DashboardContent};
use crate::report::view::fill_ratio;
use crate::ui::styles;
use crate::ui::utils::{bar, pad_to, word_wrap};
use ratatui::style::Style;
use ratatui::text::{Line, Span};

/// Overall score, criterion bars, strengths and weaknesses
pub fn render(content: &DashboardContent, width: u16) -> TabLines {
    let mut out = TabLines::new();
    let bar_width = (width.saturating_sub(30) as usize).clamp(10, 40);

    let overall = &content.overall_score;
    let title = if overall.title.is_empty() { "종합 스코어" } else { overall.title.as_str() };
    out.push(Line::from(Span::styled(format!(" {}", title), styles::heading_style())));
    out.push(Line::from(vec![
        Span::raw("   "),
        Span::styled(format_number(overall.score), styles::score_style(overall.score)),
        Span::styled(
            format!(" / {}점", format_number(overall.max_score)),
            Style::default().fg(styles::MUTED),
        ),
    ]));
    out.blank();

    out.push(Line::from(Span::styled(" 핵심 기준", styles::heading_style())));
    let label_width = content
        .core_criteria_scores
        .iter()
        .map(|c| crate::ui::utils::display_width(&c.criterion))
        .max()
        .unwrap_or(0);
    for criterion in &content.core_criteria_scores {
        let (filled, empty) = bar(fill_ratio(criterion.score, criterion.max_score), bar_width);
        let color = styles::band_color(crate::report::ScoreBand::of(criterion.score));
        out.push(Line::from(vec![
            Span::styled(
                format!("   {} ", pad_to(&criterion.criterion, label_width)),
                Style::default().fg(styles::TEXT),
            ),
            Span::styled(filled, Style::default().fg(color)),
            Span::styled(empty, Style::default().fg(styles::TRACK)),
            Span::styled(
                format!(" {}점", format_number(criterion.score)),
                styles::score_style(criterion.score),
            ),
        ]));
    }
    out.blank();

    list_section(&mut out, " 강점", "✓", styles::GREEN, &content.strengths, width);
    out.blank();
    list_section(&mut out, " 약점", "!", styles::RED, &content.weaknesses, width);
    out
}

fn list_section(
    out: &mut TabLines,
    heading: &str,
    marker: &str,
    color: ratatui::style::Color,
    items: &[String],
    width: u16,
) {
    out.push(Line::from(Span::styled(heading.to_string(), styles::heading_style().fg(color))));
    if items.is_empty() {
        out.push(Line::from(Span::styled("   (없음)", Style::default().fg(styles::DIM))));
        return;
    }
    let wrap_width = width.saturating_sub(8) as usize;
    for item in items {
        for (i, piece) in word_wrap(item, wrap_width).into_iter().enumerate() {
            let lead = if i == 0 { format!("   {} ", marker) } else { "     ".to_string() };
            out.push(Line::from(vec![
                Span::styled(lead, Style::default().fg(color)),
                Span::styled(piece, Style::default().fg(styles::TEXT)),
            ]));
        }
    }
}
