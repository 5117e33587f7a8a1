use ratatui::text::Span;

/// Terminal cell width of `text` (Hangul and other wide glyphs count 2).
pub(crate) fn display_width(text: &str) -> usize {
    Span::raw(text).width()
}

/// Word-wrap by display width, so Korean text wraps at the right column.
/// Words wider than the line are hard-broken.
pub(crate) fn word_wrap(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![text.to_string()];
    }
    let mut result = Vec::new();
    for line in text.lines() {
        if display_width(line) <= max_width {
            result.push(line.to_string());
            continue;
        }
        let mut current = String::new();
        for word in line.split_whitespace() {
            let word_width = display_width(word);
            if current.is_empty() {
                current = word.to_string();
            } else if display_width(&current) + 1 + word_width <= max_width {
                current.push(' ');
                current.push_str(word);
            } else {
                result.push(std::mem::take(&mut current));
                current = word.to_string();
            }
            while display_width(&current) > max_width {
                let (head, tail) = split_at_width(&current, max_width);
                result.push(head);
                current = tail;
            }
        }
        if !current.is_empty() {
            result.push(current);
        }
    }
    if result.is_empty() {
        result.push(String::new());
    }
    result
}

/// Split so that the head is at most `width` cells (and at least one char).
fn split_at_width(text: &str, width: usize) -> (String, String) {
    let mut used = 0;
    for (idx, ch) in text.char_indices() {
        let w = display_width(ch.encode_utf8(&mut [0u8; 4]));
        if used + w > width && idx > 0 {
            return (text[..idx].to_string(), text[idx..].to_string());
        }
        used += w;
    }
    (text.to_string(), String::new())
}

/// Horizontal bar of `width` cells, `ratio` of it filled
pub(crate) fn bar(ratio: f64, width: usize) -> (String, String) {
    let filled = ((ratio.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    ("█".repeat(filled), "░".repeat(width - filled))
}

/// Pad with spaces to `width` display cells (no truncation).
pub(crate) fn pad_to(text: &str, width: usize) -> String {
    let w = display_width(text);
    if w >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - w))
    }
}

/// Replace tabs with spaces up to the next multiple of `tab_width` columns.
pub(crate) fn expand_tabs(text: &str, tab_width: u8) -> String {
    if !text.contains('\t') {
        return text.to_string();
    }
    let tab_width = usize::from(tab_width.max(1));
    let mut out = String::with_capacity(text.len());
    let mut column = 0;
    for ch in text.chars() {
        match ch {
            '\t' => {
                let pad = tab_width - column % tab_width;
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
            '\n' => {
                out.push(ch);
                column = 0;
            }
            _ => {
                out.push(ch);
                column += display_width(ch.encode_utf8(&mut [0u8; 4]));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_expand_to_next_stop() {
        assert_eq!(expand_tabs("a\tb", 4), "a   b");
        assert_eq!(expand_tabs("\tx\n--\ty", 4), "    x\n--  y");
        // Hangul takes two columns
        assert_eq!(expand_tabs("가\t|", 4), "가  |");
        assert_eq!(expand_tabs("no tabs", 4), "no tabs");
    }


    #[test]
    fn short_line_untouched() {
        assert_eq!(word_wrap("hello world", 20), vec!["hello world"]);
    }

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(word_wrap("aaa bbb ccc", 7), vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn hangul_counts_double_width() {
        // "가나다 라마" is 11 cells wide; at 8 cells it must break after "가나다"
        assert_eq!(display_width("가나다"), 6);
        assert_eq!(word_wrap("가나다 라마", 8), vec!["가나다", "라마"]);
    }

    #[test]
    fn long_word_is_hard_broken() {
        assert_eq!(word_wrap("abcdefgh", 3), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn empty_text_gives_one_empty_line() {
        assert_eq!(word_wrap("", 10), vec![String::new()]);
    }

    #[test]
    fn bar_fill() {
        // 0.5 of 10 cells = 5 filled, 5 empty
        assert_eq!(bar(0.5, 10), ("█".repeat(5), "░".repeat(5)));
        assert_eq!(bar(2.0, 4), ("█".repeat(4), String::new()));
        assert_eq!(bar(0.0, 3), (String::new(), "░".repeat(3)));
    }

    #[test]
    fn pad_uses_display_width() {
        assert_eq!(pad_to("가", 4), "가  ");
        assert_eq!(pad_to("abcd", 2), "abcd");
    }
}
