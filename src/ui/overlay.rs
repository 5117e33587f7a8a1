use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};
use std::path::{Path, PathBuf};

use super::styles;
use crate::app::{DirEntry, OverlayData};

/// Render the active overlay on top of the main UI
pub fn render_overlay(f: &mut Frame, area: Rect, overlay: &OverlayData) {
    match overlay {
        OverlayData::FileBrowser { current_path, entries, selected, marked } => {
            render_file_browser(f, area, current_path, entries, *selected, marked);
        }
    }
}

fn render_file_browser(
    f: &mut Frame,
    area: Rect,
    current_path: &Path,
    entries: &[DirEntry],
    selected: usize,
    marked: &[PathBuf],
) {
    let popup_height = (entries.len() as u16 + 2).min(area.height.saturating_sub(6)).max(5);
    let popup_width = 70u16.min(area.width.saturating_sub(6));
    let popup = centered_rect(popup_width, popup_height, area);

    f.render_widget(Clear, popup);

    let max_title_width = popup_width.saturating_sub(24) as usize;
    let title = format!(" {} ", shorten_path(&current_path.to_string_lossy(), max_title_width));
    let mut block = Block::default()
        .title(Span::styled(title, Style::default().fg(styles::CYAN)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(styles::CYAN))
        .style(Style::default().bg(styles::PANEL));
    if !marked.is_empty() {
        block = block.title_bottom(Line::from(Span::styled(
            format!(" {}개 선택됨 · a 추가 ", marked.len()),
            Style::default().fg(styles::GREEN),
        )));
    }

    if entries.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "  (빈 디렉터리)",
            Style::default().fg(styles::MUTED),
        )))
        .block(block);
        f.render_widget(empty, popup);
        return;
    }

    let items: Vec<ListItem> = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let is_sel = idx == selected;
            let is_marked = marked.iter().any(|p| p == &current_path.join(&entry.name));
            ListItem::new(entry_line(entry, is_sel, is_marked)).style(if is_sel {
                styles::selected_style()
            } else {
                Style::default().bg(styles::PANEL)
            })
        })
        .collect();

    // ListState keeps the cursor row scrolled into view
    let mut state = ListState::default().with_selected(Some(selected));
    f.render_stateful_widget(List::new(items).block(block), popup, &mut state);
}

fn entry_line(entry: &DirEntry, is_sel: bool, is_marked: bool) -> Line<'static> {
    let marker = if is_sel { "▶ " } else { "  " };
    let check = if is_marked {
        "[✓] "
    } else if entry.is_image {
        "[ ] "
    } else {
        "    "
    };
    let name_style = if entry.is_dir {
        Style::default().fg(styles::BLUE)
    } else if entry.is_image {
        Style::default().fg(styles::TEXT)
    } else {
        Style::default().fg(styles::DIM)
    };

    let mut spans = vec![
        Span::styled(marker, Style::default().fg(styles::CYAN)),
        Span::styled(check, Style::default().fg(styles::GREEN)),
        Span::styled(
            entry.name.clone(),
            if is_sel { Style::default().fg(styles::BRIGHT) } else { name_style },
        ),
    ];
    if entry.is_dir {
        spans.push(Span::styled("/", Style::default().fg(styles::DIM)));
    }
    Line::from(spans)
}

/// Keep the tail of a long path (char-aware)
fn shorten_path(path: &str, max_chars: usize) -> String {
    let count = path.chars().count();
    if count <= max_chars {
        return path.to_string();
    }
    let suffix: String = path.chars().skip(count - max_chars).collect();
    format!("…{}", suffix)
}

/// Centre a `width` x `height` box inside `r`
pub(crate) fn centered_rect(width: u16, height: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(r.height.saturating_sub(height) / 2),
            Constraint::Length(height.min(r.height)),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(r.width.saturating_sub(width) / 2),
            Constraint::Length(width.min(r.width)),
            Constraint::Min(0),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_paths_keep_their_tail() {
        assert_eq!(shorten_path("/home/me", 20), "/home/me");
        assert_eq!(shorten_path("/home/me/스크린샷", 6), "…e/스크린샷");
    }

    #[test]
    fn centered_rect_fits_inside() {
        let r = centered_rect(40, 10, Rect::new(0, 0, 100, 30));
        assert_eq!(r, Rect::new(30, 10, 40, 10));
        let small = centered_rect(40, 10, Rect::new(0, 0, 20, 5));
        assert!(small.width <= 20 && small.height <= 5);
    }

    #[test]
    fn marked_images_show_a_check() {
        let entry = DirEntry { name: "a.png".into(), is_dir: false, is_image: true };
        let text: String = entry_line(&entry, false, true).spans.iter().map(|s| s.content.to_string()).collect();
        assert_eq!(text, "  [✓] a.png");
        let dir = DirEntry { name: "shots".into(), is_dir: true, is_image: false };
        let text: String = entry_line(&dir, true, false).spans.iter().map(|s| s.content.to_string()).collect();
        assert_eq!(text, "▶     shots/");
    }
}
