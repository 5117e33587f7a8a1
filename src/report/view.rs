use super::model::*;
use std::cmp::Ordering;

// ── Score bands ──

/// Three-way severity classification shared by every tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    pub fn of(score: f64) -> Self {
        if score >= 80.0 {
            ScoreBand::High
        } else if score >= 60.0 {
            ScoreBand::Medium
        } else {
            ScoreBand::Low
        }
    }
}

/// Clamp a nominal 0-100 score for display
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

/// Fraction of a progress bar to fill for `score / max_score`
pub fn fill_ratio(score: f64, max_score: f64) -> f64 {
    if !(max_score > 0.0) || score.is_nan() {
        return 0.0;
    }
    (score / max_score).clamp(0.0, 1.0)
}

// ── Sorting (allStockScores) ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        SortState { column: None, direction: SortDirection::Desc }
    }
}

impl SortState {
    /// Header click: a new column sorts descending, the same column flips.
    pub fn click(&mut self, column: &str) {
        if self.column.as_deref() == Some(column) {
            self.direction = self.direction.toggled();
        } else {
            self.column = Some(column.to_string());
            self.direction = SortDirection::Desc;
        }
    }

    /// Rows in display order. The input slice is never reordered.
    pub fn sorted<'a>(&self, rows: &'a [ScoreRow]) -> Vec<&'a ScoreRow> {
        let mut view: Vec<&ScoreRow> = rows.iter().collect();
        if let Some(ref column) = self.column {
            view.sort_by(|a, b| {
                let ord = compare_cells(a.get(column), b.get(column));
                match self.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }
        view
    }
}

/// Numbers compare numerically when both sides are numbers; everything
/// else compares as display text.
pub fn compare_cells(a: Option<&Cell>, b: Option<&Cell>) -> Ordering {
    if let (Some(x), Some(y)) = (a.and_then(Cell::as_number), b.and_then(Cell::as_number)) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    let a = a.map(Cell::display).unwrap_or_default();
    let b = b.map(Cell::display).unwrap_or_default();
    locale_cmp(&a, &b)
}

/// Case-insensitive ordering with a code-point tie-break. Precomposed Hangul
/// syllables are laid out in dictionary order, so Korean names sort 가나다.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

// ── Accordions ──

/// At most one expanded item; re-selecting the open one closes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accordion {
    pub expanded: Option<usize>,
}

impl Accordion {
    pub fn open_at(index: usize) -> Self {
        Accordion { expanded: Some(index) }
    }

    pub fn toggle(&mut self, index: usize) {
        self.expanded = if self.expanded == Some(index) { None } else { Some(index) };
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded == Some(index)
    }
}

/// One independent accordion per stock card, indexed by card position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardAccordions {
    cards: Vec<Accordion>,
}

impl CardAccordions {
    /// Every card starts with its first criterion expanded
    pub fn new(card_count: usize) -> Self {
        CardAccordions { cards: vec![Accordion::open_at(0); card_count] }
    }

    pub fn toggle(&mut self, card: usize, criterion: usize) {
        if let Some(acc) = self.cards.get_mut(card) {
            acc.toggle(criterion);
        }
    }

    pub fn is_expanded(&self, card: usize, criterion: usize) -> bool {
        self.expanded(card) == Some(criterion)
    }

    pub fn expanded(&self, card: usize) -> Option<usize> {
        self.cards.get(card).and_then(|a| a.expanded)
    }
}

// ── Per-tab view state ──

/// Local UI state for one tab, shaped after the tab's content
#[derive(Debug, Clone, PartialEq)]
pub enum TabUi {
    Dashboard,
    DeepDive { cursor: usize, opportunities: Accordion },
    Scores { column: usize, sort: SortState },
    KeyStock { cursor: usize, cards: CardAccordions },
    /// Id/content mismatch or unknown tab: raw dump
    Raw,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TabView {
    /// Top row. Drawing writes back the clamped value actually shown.
    pub scroll: std::cell::Cell<u16>,
    /// Item cursor moved since the last explicit scroll: keep it on screen
    pub follow: bool,
    pub ui: TabUi,
}

impl TabView {
    pub fn for_tab(tab: &Tab) -> Self {
        let ui = match tab.checked_content() {
            Some(TabContent::Dashboard(_)) => TabUi::Dashboard,
            Some(TabContent::DeepDive(_)) => TabUi::DeepDive {
                cursor: 0,
                opportunities: Accordion::open_at(0),
            },
            Some(TabContent::AllStockScores(_)) => TabUi::Scores {
                column: 0,
                sort: SortState::default(),
            },
            Some(TabContent::KeyStockAnalysis(c)) => TabUi::KeyStock {
                cursor: 0,
                cards: CardAccordions::new(c.analysis_cards.len()),
            },
            Some(TabContent::Raw(_)) | None => TabUi::Raw,
        };
        TabView { scroll: std::cell::Cell::new(0), follow: false, ui }
    }

    /// Explicit scroll; the cursor may leave the screen
    fn scroll_by(&mut self, delta: i32) {
        let top = self.scroll.get();
        self.scroll.set(if delta < 0 {
            top.saturating_sub(delta.unsigned_abs().min(u16::MAX as u32) as u16)
        } else {
            top.saturating_add(delta.min(u16::MAX as i32) as u16)
        });
        self.follow = false;
    }
}

/// (card, criterion) pairs in display order, the key-stock cursor space
pub fn criterion_positions(content: &KeyStockAnalysisContent) -> Vec<(usize, usize)> {
    content
        .analysis_cards
        .iter()
        .enumerate()
        .flat_map(|(ci, card)| (0..card.detailed_scores.len()).map(move |si| (ci, si)))
        .collect()
}

// ── Structured report view ──

pub struct ReportView {
    pub report: StructuredReport,
    pub active: usize,
    pub tabs: Vec<TabView>,
}

impl ReportView {
    pub fn new(report: StructuredReport) -> Self {
        let tabs: Vec<TabView> = report.portfolio_report.tabs.iter().map(TabView::for_tab).collect();
        let active = report
            .portfolio_report
            .tabs
            .iter()
            .position(|t| t.tab_id == TabId::Dashboard)
            .unwrap_or(0);
        ReportView { report, active, tabs }
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.report.portfolio_report.tabs.get(self.active)
    }

    pub fn active_view(&self) -> Option<&TabView> {
        self.tabs.get(self.active)
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    pub fn select_tab(&mut self, index: usize) {
        if index < self.tabs.len() {
            self.active = index;
        }
    }

    pub fn next_tab(&mut self) {
        if !self.tabs.is_empty() {
            self.active = (self.active + 1) % self.tabs.len();
        }
    }

    pub fn prev_tab(&mut self) {
        if !self.tabs.is_empty() {
            self.active = (self.active + self.tabs.len() - 1) % self.tabs.len();
        }
    }

    /// Move the item cursor, or scroll when the tab has nothing to select
    pub fn cursor_down(&mut self) {
        let limit = self.cursor_limit();
        let Some(view) = self.tabs.get_mut(self.active) else { return };
        let has_cursor = match &mut view.ui {
            TabUi::DeepDive { cursor, .. } | TabUi::KeyStock { cursor, .. } => {
                if *cursor + 1 < limit {
                    *cursor += 1;
                }
                true
            }
            _ => false,
        };
        if has_cursor {
            view.follow = true;
        } else {
            view.scroll_by(1);
        }
    }

    pub fn cursor_up(&mut self) {
        let Some(view) = self.tabs.get_mut(self.active) else { return };
        let has_cursor = match &mut view.ui {
            TabUi::DeepDive { cursor, .. } | TabUi::KeyStock { cursor, .. } => {
                *cursor = cursor.saturating_sub(1);
                true
            }
            _ => false,
        };
        if has_cursor {
            view.follow = true;
        } else {
            view.scroll_by(-1);
        }
    }

    pub fn column_right(&mut self) {
        let headers = self.active_headers_len();
        if let Some(TabView { ui: TabUi::Scores { column, .. }, .. }) = self.tabs.get_mut(self.active) {
            if *column + 1 < headers {
                *column += 1;
            }
        }
    }

    pub fn column_left(&mut self) {
        if let Some(TabView { ui: TabUi::Scores { column, .. }, .. }) = self.tabs.get_mut(self.active) {
            *column = column.saturating_sub(1);
        }
    }

    pub fn scroll_by(&mut self, delta: i32) {
        if let Some(view) = self.tabs.get_mut(self.active) {
            view.scroll_by(delta);
        }
    }

    /// Enter/Space on the focused item: toggle an accordion or sort a column
    pub fn activate(&mut self) {
        let Some(tab) = self.report.portfolio_report.tabs.get(self.active) else { return };
        let Some(view) = self.tabs.get_mut(self.active) else { return };
        match (&mut view.ui, tab.checked_content()) {
            (TabUi::DeepDive { cursor, opportunities }, Some(TabContent::DeepDive(c))) => {
                if *cursor < c.opportunities.items.len() {
                    opportunities.toggle(*cursor);
                }
            }
            (TabUi::Scores { column, sort }, Some(TabContent::AllStockScores(c))) => {
                if let Some(header) = c.score_table.headers.get(*column) {
                    sort.click(header);
                }
            }
            (TabUi::KeyStock { cursor, cards }, Some(TabContent::KeyStockAnalysis(c))) => {
                if let Some(&(card, criterion)) = criterion_positions(c).get(*cursor) {
                    cards.toggle(card, criterion);
                }
            }
            _ => {}
        }
    }

    fn cursor_limit(&self) -> usize {
        match self.active_tab().and_then(Tab::checked_content) {
            Some(TabContent::DeepDive(c)) => c.opportunities.items.len(),
            Some(TabContent::KeyStockAnalysis(c)) => criterion_positions(c).len(),
            _ => 0,
        }
    }

    fn active_headers_len(&self) -> usize {
        match self.active_tab().and_then(Tab::checked_content) {
            Some(TabContent::AllStockScores(c)) => c.score_table.headers.len(),
            _ => 0,
        }
    }
}

// ── Legacy markdown view ──

pub struct MarkdownView {
    pub report: LegacyReport,
    pub scroll: u16,
}

/// How a successful result is displayed. Chosen once per result.
pub enum ResultView {
    Markdown(MarkdownView),
    Tabbed(ReportView),
}

impl ResultView {
    pub fn for_result(result: &AnalysisResult) -> Self {
        match result {
            AnalysisResult::Legacy(r) => ResultView::Markdown(MarkdownView { report: r.clone(), scroll: 0 }),
            AnalysisResult::Structured(r) => ResultView::Tabbed(ReportView::new(r.clone())),
        }
    }

    #[cfg(test)]
    pub fn is_tabbed(&self) -> bool {
        matches!(self, ResultView::Tabbed(_))
    }

    pub fn scroll_by(&mut self, delta: i32) {
        match self {
            ResultView::Markdown(m) => {
                m.scroll = if delta < 0 {
                    m.scroll.saturating_sub(delta.unsigned_abs() as u16)
                } else {
                    m.scroll.saturating_add(delta as u16)
                };
            }
            ResultView::Tabbed(r) => r.scroll_by(delta),
        }
    }
}
