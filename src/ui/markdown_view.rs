use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::highlight::{plain_markdown, Highlighter};
use super::styles;
use super::utils::expand_tabs;
use crate::config::DisplayConfig;
use crate::report::view::MarkdownView;

/// Render a legacy markdown report, scrollable, wrapped to the pane
pub fn render(f: &mut Frame, area: Rect, view: &MarkdownView, hl: &mut Highlighter, display: &DisplayConfig, focused: bool) {
    let block = Block::default()
        .title(Span::styled(" 포트폴리오 분석 완료 ", styles::heading_style()))
        .title_bottom(Line::from(Span::styled(
            format!(" 분석 ID: {} ", view.report.request_id),
            Style::default().fg(styles::DIM),
        )))
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused))
        .style(styles::default_style());

    let content = expand_tabs(&view.report.content, display.tab_width);
    let mut lines = vec![header_line(view), Line::default()];
    if display.highlight_markdown {
        lines.extend_from_slice(hl.markdown_cached(&view.report.request_id, &content, styles::default_style()));
    } else {
        lines.extend(plain_markdown(&content, styles::default_style()));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((view.scroll, 0));
    f.render_widget(paragraph, area);
}

/// "처리 시간: 2.5초 · 이미지 1개"
pub(crate) fn header_line(view: &MarkdownView) -> Line<'static> {
    let mut text = format!(" 처리 시간: {:.1}초", view.report.processing_time);
    if let Some(n) = view.report.images_processed {
        text.push_str(&format!(" · 이미지 {}개", n));
    }
    Line::from(Span::styled(text, Style::default().fg(styles::MUTED)))
}
