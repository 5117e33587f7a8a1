pub mod highlight;
mod markdown_view;
mod overlay;
mod report_view;
mod status_bar;
mod styles;
pub mod tabs;
mod upload_view;
mod utils;

use crate::app::{App, Focus};
use crate::config::DisplayConfig;
use crate::report::{AnalysisResult, ResultView};
use highlight::Highlighter;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;

/// Width of the file panel when a result is shown beside it
const FILE_PANEL_WIDTH: u16 = 32;

/// Render the entire UI
pub fn draw(f: &mut Frame, app: &App, hl: &mut Highlighter) {
    let bottom_height = status_bar::bottom_bar_height(app, f.area().width);

    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),             // top bar
            Constraint::Min(1),                // main content
            Constraint::Length(bottom_height), // bottom bar (dynamic rows)
        ])
        .split(f.area());

    status_bar::render_top_bar(f, outer[0], app);

    match &app.result_view {
        Some(view) => {
            let main_area = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(FILE_PANEL_WIDTH), Constraint::Min(1)])
                .split(outer[1]);

            upload_view::render(f, main_area[0], app);
            let focused = app.focus == Focus::Result;
            match view {
                ResultView::Tabbed(report) => report_view::render(f, main_area[1], report, focused),
                ResultView::Markdown(markdown) => markdown_view::render(
                    f,
                    main_area[1],
                    markdown,
                    hl,
                    &app.config.display,
                    focused,
                ),
            }
        }
        None => upload_view::render(f, outer[1], app),
    }

    status_bar::render_bottom_bar(f, outer[2], app);

    if let Some(ref msg) = app.notification {
        status_bar::render_notification(f, f.area(), msg);
    }

    if let Some(ref overlay_data) = app.overlay {
        overlay::render_overlay(f, f.area(), overlay_data);
    }
}

/// Plain-text rendition of a result for `--print`: every tab in order,
/// markdown reports as-is.
pub fn render_plain(result: &AnalysisResult, display: &DisplayConfig, width: u16) -> String {
    let mut out = Vec::new();
    match ResultView::for_result(result) {
        ResultView::Markdown(view) => {
            out.push(tabs::visible_text(&[markdown_view::header_line(&view)]));
            out.push(String::new());
            out.push(utils::expand_tabs(&view.report.content, display.tab_width));
        }
        ResultView::Tabbed(mut view) => {
            out.push(report_view::meta_line(&view.report));
            for index in 0..view.tab_count() {
                view.select_tab(index);
                let Some(tab) = view.active_tab() else { continue };
                out.push(String::new());
                out.push(format!("━━ {} ━━", tab.tab_title));
                if let Some(body) = report_view::tab_body(&view, width) {
                    out.push(tabs::visible_text(&body.lines));
                }
            }
        }
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}
