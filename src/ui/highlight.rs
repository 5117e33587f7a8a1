use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, ThemeSet};
use syntect::parsing::SyntaxSet;

/// Syntax highlighting state, loaded once and reused for every report
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    /// Last highlighted document, keyed by caller (redrawn every tick)
    cache: Option<(String, Vec<Line<'static>>)>,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    pub fn new() -> Self {
        Highlighter {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            cache: None,
        }
    }

    /// `highlight_markdown`, memoized on `key` until a different key comes along
    pub fn markdown_cached(&mut self, key: &str, text: &str, base_style: Style) -> &[Line<'static>] {
        let stale = !matches!(&self.cache, Some((k, _)) if k == key);
        if stale {
            let lines = self.highlight_markdown(text, base_style);
            self.cache = Some((key.to_string(), lines));
        }
        match &self.cache {
            Some((_, lines)) => lines,
            None => &[],
        }
    }

    /// Highlight a markdown document line by line. Parser state carries
    /// across lines, so fenced blocks and lists colour correctly.
    pub fn highlight_markdown(&self, text: &str, base_style: Style) -> Vec<Line<'static>> {
        let syntax = self
            .syntax_set
            .find_syntax_by_extension("md")
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        // Dark theme to match the TUI background
        let theme = &self.theme_set.themes["base16-ocean.dark"];
        let mut highlighter = HighlightLines::new(syntax, theme);

        text.lines()
            .map(|line| {
                // syntect needs a trailing newline
                let input = format!("{}\n", line);
                match highlighter.highlight_line(&input, &self.syntax_set) {
                    Ok(ranges) => Line::from(
                        ranges
                            .into_iter()
                            .map(|(syn_style, piece)| {
                                let fg = Color::Rgb(
                                    syn_style.foreground.r,
                                    syn_style.foreground.g,
                                    syn_style.foreground.b,
                                );
                                let mut style = base_style.fg(fg);
                                if syn_style.font_style.contains(FontStyle::BOLD) {
                                    style = style.add_modifier(Modifier::BOLD);
                                }
                                if syn_style.font_style.contains(FontStyle::ITALIC) {
                                    style = style.add_modifier(Modifier::ITALIC);
                                }
                                Span::styled(piece.trim_end_matches('\n').to_string(), style)
                            })
                            .collect::<Vec<_>>(),
                    ),
                    Err(_) => Line::from(Span::styled(line.to_string(), base_style)),
                }
            })
            .collect()
    }
}

/// Unhighlighted rendition, used when highlighting is turned off
pub fn plain_markdown(text: &str, base_style: Style) -> Vec<Line<'static>> {
    text.lines()
        .map(|line| {
            let style = if line.starts_with('#') {
                base_style.add_modifier(Modifier::BOLD)
            } else {
                base_style
            };
            Line::from(Span::styled(line.to_string(), style))
        })
        .collect()
}
