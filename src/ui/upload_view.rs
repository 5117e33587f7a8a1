use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::styles;
use crate::app::{AnalysisState, App, Focus, Status};
use crate::upload::{MAX_FILES, MAX_FILE_SIZE};

const SPINNER: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

/// Render the selected files, their previews and the analysis state
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let count = app.session.files().len();
    let block = Block::default()
        .title(Span::styled(
            format!(" 이미지 {}/{} ", count, MAX_FILES),
            styles::heading_style(),
        ))
        .borders(Borders::ALL)
        .border_style(styles::border_style(app.focus == Focus::Files))
        .style(styles::surface_style());

    let paragraph = Paragraph::new(panel_lines(app))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

pub fn panel_lines(app: &App) -> Vec<Line<'static>> {
    let upload = app.session.upload();
    let mut lines = Vec::new();

    if upload.files.is_empty() {
        lines.push(Line::from(Span::styled(
            " 포트폴리오 스크린샷을 선택하세요",
            Style::default().fg(styles::BRIGHT),
        )));
        lines.push(Line::from(Span::styled(
            format!(" PNG, JPEG · 파일당 {}MB · 최대 {}개", MAX_FILE_SIZE / (1024 * 1024), MAX_FILES),
            Style::default().fg(styles::DIM),
        )));
        lines.push(Line::default());
        for (key, label) in [("a", "파일 찾아보기"), ("i", "경로 입력"), ("s", "샘플 리포트")] {
            lines.push(Line::from(vec![
                Span::styled(format!("  {} ", key), styles::key_hint_style()),
                Span::styled(label.to_string(), Style::default().fg(styles::TEXT)),
            ]));
        }
    }

    for (i, file) in upload.files.iter().enumerate() {
        let is_sel = i == app.selected_file && app.focus == Focus::Files;
        let marker = if is_sel { "▶ " } else { "  " };
        let name_style = if is_sel {
            styles::selected_style().add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(styles::TEXT)
        };
        lines.push(Line::from(vec![
            Span::styled(marker.to_string(), Style::default().fg(styles::CYAN)),
            Span::styled(format!("{}. ", i + 1), Style::default().fg(styles::DIM)),
            Span::styled(file.name.clone(), name_style),
            Span::styled(format!("  {}", file.size_label()), Style::default().fg(styles::MUTED)),
        ]));
        if let Some(preview) = upload.previews.get(i) {
            lines.push(Line::from(Span::styled(
                format!("     {}", preview_summary(preview)),
                Style::default().fg(styles::DIM),
            )));
        }
    }

    if let Some(ref error) = upload.error {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(format!(" ✗ {}", error), styles::error_style())));
    }

    lines.push(Line::default());
    match app.session.analysis() {
        AnalysisState::Idle => {
            if app.session.can_analyze() {
                lines.push(Line::from(vec![
                    Span::styled("  r ", styles::key_hint_style()),
                    Span::styled("분석 시작".to_string(), Style::default().fg(styles::GREEN)),
                ]));
            }
        }
        AnalysisState::Loading => {
            let frame = SPINNER[app.spinner % SPINNER.len()];
            lines.push(Line::from(Span::styled(
                format!(" {} 포트폴리오 분석 중...", frame),
                Style::default().fg(styles::CYAN).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                "   일반적으로 30-60초 소요됩니다",
                Style::default().fg(styles::DIM),
            )));
        }
        AnalysisState::Success(result) => {
            lines.push(Line::from(Span::styled(
                format!(" ✓ 분석 완료 · {:.1}초", result.processing_time()),
                Style::default().fg(styles::GREEN),
            )));
        }
        AnalysisState::Error(message) => {
            lines.push(Line::from(Span::styled(" 분석 중 오류가 발생했습니다", styles::error_style())));
            lines.push(Line::from(Span::styled(
                format!("   {}", message),
                Style::default().fg(styles::RED),
            )));
            if app.session.upload().status == Status::Success {
                lines.push(Line::from(vec![
                    Span::styled("  r ", styles::key_hint_style()),
                    Span::styled("다시 분석하기".to_string(), Style::default().fg(styles::TEXT)),
                ]));
            }
        }
    }
    lines
}

/// Short description of a data URL: its header and decoded size
pub fn preview_summary(data_url: &str) -> String {
    let (header, payload) = data_url.split_once(',').unwrap_or((data_url, ""));
    // base64: 4 chars → 3 bytes, minus padding
    let padding = payload.chars().rev().take_while(|c| *c == '=').count();
    let bytes = (payload.len() / 4 * 3).saturating_sub(padding);
    format!("{}, … ({:.1} KB)", header, bytes as f64 / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AnalysisBackend, ApiError};
    use crate::config::LiniaConfig;
    use crate::report::AnalysisResult;
    use crate::ui::tabs::visible_text;
    use crate::upload::ImageFile;
    use std::sync::Arc;

    struct NoBackend;

    impl AnalysisBackend for NoBackend {
        fn analyze(&self, _files: &[ImageFile]) -> Result<AnalysisResult, ApiError> {
            Err(ApiError::Network("offline".into()))
        }
    }

    fn app() -> App {
        App::new(LiniaConfig::default(), Arc::new(NoBackend))
    }

    #[test]
    fn preview_summary_reports_decoded_size() {
        // "aGk=" decodes to 2 bytes
        assert_eq!(preview_summary("data:image/png;base64,aGk="), "data:image/png;base64, … (0.0 KB)");
        let big = format!("data:image/jpeg;base64,{}", "A".repeat(4096));
        // 4096 chars → 3072 bytes = 3.0 KB
        assert_eq!(preview_summary(&big), "data:image/jpeg;base64, … (3.0 KB)");
    }

    #[test]
    fn empty_state_shows_hints() {
        let text = visible_text(&panel_lines(&app()));
        assert!(text.contains("파일 찾아보기"));
        assert!(!text.contains("분석 시작"));
    }

    #[test]
    fn selected_files_and_error_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holdings.png");
        std::fs::write(&path, b"hi").unwrap();
        let mut app = app();
        app.select_paths(&[path]);
        let text = visible_text(&panel_lines(&app));
        assert!(text.contains("1. holdings.png"));
        assert!(text.contains("data:image/png;base64"));
        assert!(text.contains("분석 시작"));

        app.select_paths(&[dir.path().join("notes.gif")]);
        let text = visible_text(&panel_lines(&app));
        assert!(text.contains("✗ 파일 1: PNG, JPEG 파일만 업로드 가능합니다."));
    }

    #[test]
    fn loading_shows_spinner_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, b"x").unwrap();
        let mut app = app();
        app.select_paths(&[path]);
        app.start_analysis();
        let text = visible_text(&panel_lines(&app));
        assert!(text.contains("포트폴리오 분석 중..."));
    }
}
