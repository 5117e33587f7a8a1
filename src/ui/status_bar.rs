use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::styles;
use super::utils::display_width;
use crate::app::{App, Focus, InputMode, Status};
use crate::report::ResultView;

/// Render the one-row top bar: app name, service URL, analysis status
pub fn render_top_bar(f: &mut Frame, area: Rect, app: &App) {
    let (label, color) = match app.session.analysis().status() {
        Status::Idle => ("대기", styles::MUTED),
        Status::Loading => ("분석 중", styles::CYAN),
        Status::Success => ("완료", styles::GREEN),
        Status::Error => ("오류", styles::RED),
    };

    let spans = vec![
        Span::styled(" linia", Style::default().fg(styles::CYAN).add_modifier(Modifier::BOLD)),
        Span::styled(" · ", Style::default().fg(styles::BORDER)),
        Span::styled(app.config.api.base_url.clone(), Style::default().fg(styles::DIM)),
        Span::raw("  "),
        Span::styled(
            format!(" {} ", label),
            Style::default().fg(styles::BG).bg(color).add_modifier(Modifier::BOLD),
        ),
    ];
    let bar = Paragraph::new(Line::from(spans)).style(Style::default().bg(styles::PANEL));
    f.render_widget(bar, area);
}

/// A keybinding hint: key + label
struct Hint {
    key: String,
    label: String,
}

impl Hint {
    fn new(key: &str, label: &str) -> Self {
        Self { key: key.to_string(), label: label.to_string() }
    }
    fn width(&self) -> usize {
        display_width(&self.key) + display_width(&self.label)
    }
}

fn build_hints(app: &App) -> Vec<Hint> {
    if app.overlay.is_some() {
        return vec![
            Hint::new("j/k", " 이동 "),
            Hint::new("Enter", " 열기 "),
            Hint::new("␣", " 선택 "),
            Hint::new("a", " 추가 "),
            Hint::new("Bksp", " 상위 "),
            Hint::new("Esc", " 닫기 "),
        ];
    }

    let mut hints = Vec::new();
    match (&app.focus, &app.result_view) {
        (Focus::Result, Some(ResultView::Tabbed(_))) => {
            hints.push(Hint::new("1-4", " 탭 "));
            hints.push(Hint::new("[/]", " 이전/다음 "));
            hints.push(Hint::new("j/k", " 이동 "));
            hints.push(Hint::new("h/l", " 열 "));
            hints.push(Hint::new("Enter", " 펼치기/정렬 "));
            hints.push(Hint::new("PgUp/PgDn", " 스크롤 "));
        }
        (Focus::Result, Some(ResultView::Markdown(_))) => {
            hints.push(Hint::new("j/k", " 스크롤 "));
            hints.push(Hint::new("PgUp/PgDn", " 페이지 "));
        }
        _ => {
            hints.push(Hint::new("a", " 찾아보기 "));
            hints.push(Hint::new("i", " 경로 "));
            if !app.session.files().is_empty() {
                hints.push(Hint::new("j/k", " 이동 "));
                hints.push(Hint::new("x", " 제거 "));
            }
            if app.session.can_analyze() {
                hints.push(Hint::new("r", " 분석 "));
            }
            hints.push(Hint::new("s", " 샘플 "));
        }
    }
    if app.result_view.is_some() {
        hints.push(Hint::new("Tab", " 포커스 "));
    }
    hints.push(Hint::new("R", " 초기화 "));
    hints.push(Hint::new("q", " 종료 "));
    hints
}

/// Pack hints into rows that fit within `width`
fn pack_hint_lines(hints: &[Hint], width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current_spans: Vec<Span<'static>> = Vec::new();
    let mut current_w: usize = 1; // leading space

    for hint in hints {
        let hw = hint.width();
        if current_w + hw > width && !current_spans.is_empty() {
            lines.push(Line::from(current_spans));
            current_spans = Vec::new();
            current_w = 1;
        }
        if current_spans.is_empty() {
            current_spans.push(Span::raw(" "));
        }
        current_spans.push(Span::styled(hint.key.clone(), styles::key_hint_style()));
        current_spans.push(Span::styled(hint.label.clone(), Style::default().fg(styles::DIM)));
        current_w += hw;
    }
    if !current_spans.is_empty() {
        lines.push(Line::from(current_spans));
    }
    if lines.is_empty() {
        lines.push(Line::from(vec![Span::raw(" ")]));
    }
    lines
}

/// Calculate how many rows the bottom bar needs
pub fn bottom_bar_height(app: &App, width: u16) -> u16 {
    match app.input_mode {
        InputMode::PathInput => 1,
        InputMode::Normal => (pack_hint_lines(&build_hints(app), width as usize).len() as u16).max(1),
    }
}

/// Render the bottom bar: key hints, or the path prompt while typing
pub fn render_bottom_bar(f: &mut Frame, area: Rect, app: &App) {
    let panel_bg = Style::default().bg(styles::PANEL);
    let lines = match app.input_mode {
        InputMode::PathInput => vec![Line::from(vec![
            Span::styled(
                " 경로 ",
                Style::default().fg(styles::BG).bg(styles::CYAN).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(app.input_buffer.clone(), Style::default().fg(styles::BRIGHT)),
            Span::styled("█", Style::default().fg(styles::CYAN)),
            Span::styled("  Enter 추가 · Esc 취소", Style::default().fg(styles::DIM)),
        ])],
        InputMode::Normal => pack_hint_lines(&build_hints(app), area.width as usize),
    };
    f.render_widget(Paragraph::new(lines).style(panel_bg), area);
}

/// Floating one-line notification in the top-right corner
pub fn render_notification(f: &mut Frame, area: Rect, message: &str) {
    let notif_width = display_width(message) as u16 + 4;
    let notif_x = area.x + area.width.saturating_sub(notif_width + 2);
    let notif_y = area.y + 2;

    let notif_area = Rect {
        x: notif_x,
        y: notif_y.min(area.bottom().saturating_sub(1)),
        width: notif_width.min(area.width),
        height: 1,
    };

    let accent = if message.starts_with('✗') { styles::RED } else { styles::GREEN };
    let notif = Paragraph::new(Line::from(vec![
        Span::styled(" ● ", Style::default().fg(accent)),
        Span::styled(message.to_string(), Style::default().fg(styles::TEXT)),
        Span::raw(" "),
    ]))
    .style(Style::default().bg(styles::PANEL).fg(styles::TEXT));

    f.render_widget(notif, notif_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::tabs::visible_text;

    #[test]
    fn hints_wrap_by_display_width() {
        let hints = vec![Hint::new("a", " 찾아보기 "), Hint::new("i", " 경로 "), Hint::new("q", " 종료 ")];
        // "a 찾아보기 " is 11 cells wide
        assert_eq!(hints[0].width(), 11);
        let lines = pack_hint_lines(&hints, 20);
        assert_eq!(lines.len(), 2);
        assert_eq!(visible_text(&lines[..1]).trim_end(), " a 찾아보기 i 경로");
    }

    #[test]
    fn empty_hint_list_still_yields_a_row() {
        assert_eq!(pack_hint_lines(&[], 40).len(), 1);
    }
}
