use super::TabLines;
use crate::report::model::{format_number, DeepDiveContent};
use crate::report::view::{clamp_score, Accordion};
use crate::ui::styles;
use crate::ui::utils::{bar, word_wrap};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

/// Scored analysis items followed by the opportunities accordion.
/// `cursor` indexes opportunities.
pub fn render(content: &DeepDiveContent, cursor: usize, opportunities: &Accordion, width: u16) -> TabLines {
    let mut out = TabLines::new();
    let wrap_width = width.saturating_sub(6) as usize;
    let bar_width = (width.saturating_sub(12) as usize).clamp(10, 50);

    out.push(Line::from(Span::styled(" 심층 분석", styles::heading_style())));
    out.blank();
    for item in &content.in_depth_analysis {
        let shown = clamp_score(item.score);
        out.push(Line::from(vec![
            Span::styled(format!("   {}  ", item.title), styles::heading_style()),
            Span::styled(format!("{}점", format_number(shown)), styles::score_style(shown)),
        ]));
        let (filled, empty) = bar(shown / 100.0, bar_width);
        out.push(Line::from(vec![
            Span::raw("   "),
            Span::styled(filled, Style::default().fg(styles::band_color(crate::report::ScoreBand::of(shown)))),
            Span::styled(empty, Style::default().fg(styles::TRACK)),
        ]));
        for piece in word_wrap(&item.description, wrap_width) {
            out.push(Line::from(Span::styled(
                format!("   {}", piece),
                Style::default().fg(styles::TEXT),
            )));
        }
        out.blank();
    }

    let title = if content.opportunities.title.is_empty() {
        "기회 및 개선 방안"
    } else {
        content.opportunities.title.as_str()
    };
    out.push(Line::from(Span::styled(format!(" {}", title), styles::heading_style())));
    if content.opportunities.items.is_empty() {
        out.push(Line::from(Span::styled("   (없음)", Style::default().fg(styles::DIM))));
    }
    for (i, item) in content.opportunities.items.iter().enumerate() {
        let is_cursor = i == cursor;
        let expanded = opportunities.is_expanded(i);
        let marker = if is_cursor { "▶" } else { " " };
        let arrow = if expanded { "▾" } else { "▸" };
        let summary_style = if is_cursor {
            styles::selected_style().add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(styles::BRIGHT)
        };
        if is_cursor {
            out.mark_cursor();
        }
        out.push(Line::from(vec![
            Span::styled(format!(" {} ", marker), Style::default().fg(styles::CYAN)),
            Span::styled(format!("{} ", arrow), Style::default().fg(styles::MUTED)),
            Span::styled(item.summary.clone(), summary_style),
        ]));
        if expanded {
            for piece in word_wrap(&item.details, wrap_width.saturating_sub(2)) {
                out.push(Line::from(Span::styled(
                    format!("      {}", piece),
                    Style::default().fg(styles::TEXT),
                )));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::model::fixtures::deep_dive_json;
    use crate::ui::tabs::visible_text;

    fn content() -> DeepDiveContent {
        serde_json::from_value(deep_dive_json()).unwrap()
    }

    #[test]
    fn scores_are_clamped_for_display() {
        let text = visible_text(&render(&content(), 0, &Accordion::open_at(0), 80).lines);
        assert!(text.contains("80점"));
        // 130 → 100 and -5 → 0
        assert!(text.contains("안정성 및 방어력  100점"));
        assert!(text.contains("전략적 일관성  0점"));
        assert!(!text.contains("130"));
    }

    #[test]
    fn only_expanded_opportunity_shows_details() {
        let text = visible_text(&render(&content(), 0, &Accordion::open_at(0), 80).lines);
        assert!(text.contains("배당주 비중 확대 시나리오"));
        assert!(!text.contains("글로벌 기술 기업 편입 시나리오"));

        let mut acc = Accordion::open_at(0);
        acc.toggle(1);
        let text = visible_text(&render(&content(), 1, &acc, 80).lines);
        assert!(!text.contains("배당주 비중 확대 시나리오"));
        assert!(text.contains("글로벌 기술 기업 편입 시나리오"));
    }

    #[test]
    fn collapsed_accordion_hides_all_details() {
        let acc = Accordion { expanded: None };
        let text = visible_text(&render(&content(), 0, &acc, 80).lines);
        assert!(!text.contains("시나리오"));
        assert!(text.contains("안정성 보강"));
    }

    #[test]
    fn cursor_line_points_at_summary() {
        let out = render(&content(), 1, &Accordion::open_at(0), 80);
        let line = out.cursor_line.unwrap();
        assert!(visible_text(&out.lines[line..=line]).contains("지역 분산"));
    }
}
