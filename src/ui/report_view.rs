use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::styles;
use super::tabs::{self, TabLines};
use crate::report::model::{StructuredReport, TabContent};
use crate::report::view::TabView;
use crate::report::{ReportView, TabUi};

/// Render the tabbed report: meta line, tab bar, active tab body
pub fn render(f: &mut Frame, area: Rect, view: &ReportView, focused: bool) {
    let block = Block::default()
        .title(Span::styled(" 포트폴리오 분석 결과 ", styles::heading_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused))
        .style(styles::default_style());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // meta
            Constraint::Length(1), // tab bar
            Constraint::Length(1), // spacer
            Constraint::Min(1),    // body
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(meta_line(&view.report), Style::default().fg(styles::MUTED)))),
        rows[0],
    );

    let titles: Vec<Line> = view
        .report
        .portfolio_report
        .tabs
        .iter()
        .enumerate()
        .map(|(i, t)| Line::from(format!("{} {}", i + 1, tab_title(t))))
        .collect();
    let tab_bar = Tabs::new(titles)
        .select(view.active)
        .style(Style::default().fg(styles::MUTED))
        .highlight_style(Style::default().fg(styles::CYAN).add_modifier(Modifier::BOLD | Modifier::UNDERLINED))
        .divider(Span::styled("│", Style::default().fg(styles::BORDER)));
    f.render_widget(tab_bar, rows[1]);

    let body_area = rows[3];
    let Some(body) = tab_body(view, body_area.width) else {
        f.render_widget(
            Paragraph::new(Span::styled(" 표시할 탭이 없습니다.", Style::default().fg(styles::DIM))),
            body_area,
        );
        return;
    };

    let top = view
        .active_view()
        .map(|v| settle_scroll(v, &body, body_area.height))
        .unwrap_or(0);
    f.render_widget(Paragraph::new(body.lines).scroll((top, 0)), body_area);
}

/// "2025-09-30 • 2개 이미지 분석 • 15.2초 소요"
pub fn meta_line(report: &StructuredReport) -> String {
    let mut parts = Vec::new();
    if !report.portfolio_report.report_date.is_empty() {
        parts.push(report.portfolio_report.report_date.clone());
    }
    parts.push(format!("{}개 이미지 분석", report.images_processed));
    parts.push(format!("{:.1}초 소요", report.processing_time));
    format!(" {}", parts.join(" • "))
}

fn tab_title(tab: &crate::report::Tab) -> &str {
    if tab.tab_title.is_empty() {
        tab.tab_id.as_str()
    } else {
        &tab.tab_title
    }
}

/// Lines for the active tab, dispatched on the classified content
pub fn tab_body(view: &ReportView, width: u16) -> Option<TabLines> {
    let tab = view.active_tab()?;
    let ui = &view.active_view()?.ui;
    let lines = match (tab.checked_content(), ui) {
        (Some(TabContent::Dashboard(c)), _) => tabs::dashboard::render(c, width),
        (Some(TabContent::DeepDive(c)), TabUi::DeepDive { cursor, opportunities }) => {
            tabs::deep_dive::render(c, *cursor, opportunities, width)
        }
        (Some(TabContent::AllStockScores(c)), TabUi::Scores { column, sort }) => {
            tabs::score_table::render(c, *column, sort)
        }
        (Some(TabContent::KeyStockAnalysis(c)), TabUi::KeyStock { cursor, cards }) => {
            tabs::key_stock::render(c, *cursor, cards, width)
        }
        _ => tabs::raw(&tab.content),
    };
    Some(lines)
}

/// Resolve the top row for this draw and store it back on the tab, so the
/// next scroll starts from what is actually on screen.
fn settle_scroll(tab: &TabView, body: &TabLines, height: u16) -> u16 {
    let requested = tab.scroll.get();
    let top = if tab.follow {
        follow_cursor(requested, body.cursor_line, height)
    } else {
        requested
    };
    let max_top = body.lines.len().saturating_sub(height as usize).min(u16::MAX as usize) as u16;
    let top = top.min(max_top);
    tab.scroll.set(top);
    top
}

/// Scroll offset that keeps `cursor` on screen with a little context below it
fn follow_cursor(scroll: u16, cursor: Option<usize>, height: u16) -> u16 {
    let Some(cursor) = cursor else { return scroll };
    let cursor = cursor.min(u16::MAX as usize) as u16;
    if cursor < scroll {
        cursor
    } else if cursor.saturating_add(3) > scroll.saturating_add(height) {
        cursor.saturating_add(3).saturating_sub(height)
    } else {
        scroll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::model::fixtures::structured_json;
    use crate::report::AnalysisResult;
    use crate::ui::tabs::visible_text;
    use serde_json::json;

    fn view_of(body: serde_json::Value) -> ReportView {
        match AnalysisResult::from_value(body).unwrap() {
            AnalysisResult::Structured(r) => ReportView::new(r),
            AnalysisResult::Legacy(_) => panic!("fixture should be structured"),
        }
    }

    /// What a draw of the active tab at `height` rows would show first
    fn draw_top(v: &ReportView, height: u16) -> u16 {
        let body = tab_body(v, 80).unwrap();
        settle_scroll(v.active_view().unwrap(), &body, height)
    }

    fn view() -> ReportView {
        view_of(structured_json())
    }

    #[test]
    fn meta_line_has_date_images_and_time() {
        assert_eq!(meta_line(&view().report), " 2025-09-30 • 2개 이미지 분석 • 15.2초 소요");
    }

    #[test]
    fn body_follows_active_tab() {
        let mut v = view();
        assert!(visible_text(&tab_body(&v, 80).unwrap().lines).contains("핵심 기준"));
        v.select_tab(1);
        assert!(visible_text(&tab_body(&v, 80).unwrap().lines).contains("기회 및 개선 방안"));
        v.select_tab(2);
        assert!(visible_text(&tab_body(&v, 80).unwrap().lines).contains("총 3개 종목"));
        v.select_tab(3);
        assert!(visible_text(&tab_body(&v, 80).unwrap().lines).contains("Stock1 fundamentals"));
    }

    #[test]
    fn mismatched_tab_renders_raw_json() {
        let mut body = structured_json();
        // deepDive id carrying a score table
        body["portfolioReport"]["tabs"][1]["content"] =
            crate::report::model::fixtures::scores_json();
        let AnalysisResult::Structured(report) = AnalysisResult::from_value(body).unwrap() else {
            panic!("expected structured");
        };
        let mut v = ReportView::new(report);
        v.select_tab(1);
        let text = visible_text(&tab_body(&v, 80).unwrap().lines);
        assert!(text.contains("\"scoreTable\""));
    }

    #[test]
    fn follow_cursor_scrolls_minimally() {
        assert_eq!(follow_cursor(0, None, 10), 0);
        assert_eq!(follow_cursor(0, Some(5), 10), 0);
        // cursor 9 + 3 lines of context = 12 > 10 rows visible → scroll 2
        assert_eq!(follow_cursor(0, Some(9), 10), 2);
        assert_eq!(follow_cursor(8, Some(4), 10), 4);
    }

    #[test]
    fn long_score_table_scrolls_with_j_and_k() {
        let rows: Vec<_> = (0..40)
            .map(|i| json!({"주식": format!("S{i:02}"), "Overall": 50 + i, "펀더멘탈": 40}))
            .collect();
        let mut body = structured_json();
        body["portfolioReport"]["tabs"][2]["content"]["scoreTable"]["rows"] = json!(rows);
        let mut v = view_of(body);
        v.select_tab(2);
        assert_eq!(draw_top(&v, 12), 0);

        for _ in 0..20 {
            v.cursor_down();
        }
        assert_eq!(draw_top(&v, 12), 20);
        let shown = tab_body(&v, 80).unwrap();
        // header + rule precede the data rows
        assert!(visible_text(&shown.lines[20..21]).contains("S18"));

        // 44 lines in a 12-row pane: never past the footer
        v.scroll_by(100);
        assert_eq!(draw_top(&v, 12), 32);
        v.cursor_up();
        assert_eq!(draw_top(&v, 12), 31);
    }

    #[test]
    fn deep_dive_top_reachable_after_cursor_moves() {
        let items: Vec<_> = (0..8)
            .map(|i| json!({"title": format!("항목 {i}"), "score": 70, "description": "설명"}))
            .collect();
        let mut body = structured_json();
        body["portfolioReport"]["tabs"][1]["content"]["inDepthAnalysis"] = json!(items);
        let mut v = view_of(body);
        v.select_tab(1);
        assert_eq!(draw_top(&v, 12), 0);

        // 8 items x 4 rows + heading: first opportunity sits on row 35
        for _ in 0..5 {
            v.cursor_up();
        }
        assert_eq!(draw_top(&v, 12), 26);

        v.scroll_by(-100);
        assert_eq!(draw_top(&v, 12), 0);
        assert_eq!(draw_top(&v, 12), 0);

        v.cursor_down();
        let top = draw_top(&v, 12) as usize;
        let cursor = tab_body(&v, 80).unwrap().cursor_line.unwrap();
        assert!(cursor >= top && cursor < top + 12);
    }
}
