use super::TabLines;
use crate::report::model::{format_number, KeyStockAnalysisContent};
use crate::report::view::{clamp_score, criterion_positions, CardAccordions};
use crate::ui::styles;
use crate::ui::utils::{bar, word_wrap};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

pub const MSG_NO_CARDS: &str = "핵심 종목 분석 데이터가 없습니다.";

/// One card per stock; each card's criteria form an independent accordion.
/// `cursor` indexes the flattened (card, criterion) list.
pub fn render(content: &KeyStockAnalysisContent, cursor: usize, cards: &CardAccordions, width: u16) -> TabLines {
    let mut out = TabLines::new();
    if content.analysis_cards.is_empty() {
        out.blank();
        out.push(Line::from(Span::styled(format!("   {}", MSG_NO_CARDS), Style::default().fg(styles::MUTED))));
        return out;
    }

    let focused = criterion_positions(content).get(cursor).copied();
    let wrap_width = width.saturating_sub(10) as usize;
    let bar_width = (width.saturating_sub(12) as usize).clamp(10, 40);

    out.push(Line::from(vec![
        Span::styled(" 핵심 종목 상세 분석", styles::heading_style()),
        Span::styled(
            format!(" ({}개 종목)", content.analysis_cards.len()),
            Style::default().fg(styles::MUTED),
        ),
    ]));
    out.blank();

    for (ci, card) in content.analysis_cards.iter().enumerate() {
        out.push(Line::from(vec![
            Span::styled(format!(" ■ {}  ", card.stock_name), styles::heading_style().fg(styles::BLUE)),
            Span::styled(
                format!("{}점", format_number(card.overall_score)),
                styles::score_style(clamp_score(card.overall_score)),
            ),
        ]));

        for (si, criterion) in card.detailed_scores.iter().enumerate() {
            let is_cursor = focused == Some((ci, si));
            let expanded = cards.is_expanded(ci, si);
            if is_cursor {
                out.mark_cursor();
            }
            let label_style = if is_cursor {
                styles::selected_style().add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(styles::TEXT)
            };
            out.push(Line::from(vec![
                Span::styled(
                    format!("  {} ", if is_cursor { "▶" } else { " " }),
                    Style::default().fg(styles::CYAN),
                ),
                Span::styled(
                    format!("{} ", if expanded { "▾" } else { "▸" }),
                    Style::default().fg(styles::MUTED),
                ),
                Span::styled(criterion.category.clone(), label_style),
                Span::raw("  "),
                Span::styled(
                    format_number(criterion.score),
                    styles::score_style(clamp_score(criterion.score)),
                ),
            ]));

            if expanded {
                let shown = clamp_score(criterion.score);
                let (filled, empty) = bar(shown / 100.0, bar_width);
                out.push(Line::from(vec![
                    Span::raw("       "),
                    Span::styled(filled, Style::default().fg(styles::band_color(crate::report::ScoreBand::of(shown)))),
                    Span::styled(empty, Style::default().fg(styles::TRACK)),
                ]));
                for piece in word_wrap(&criterion.analysis, wrap_width) {
                    out.push(Line::from(Span::styled(
                        format!("       {}", piece),
                        Style::default().fg(styles::TEXT),
                    )));
                }
            }
        }
        out.blank();
    }
    out
}
