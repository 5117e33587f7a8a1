use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ── Top-level result ──

/// A successful analysis payload, discriminated once at deserialization.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    /// Older single-markdown response
    Legacy(LegacyReport),
    /// Multi-tab JSON report (has a `portfolioReport` field)
    Structured(StructuredReport),
}

impl AnalysisResult {
    /// Parse a response body. A `portfolioReport` key selects the structured
    /// shape; otherwise the body must carry a non-empty string `content`.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body).context("response is not JSON")?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Some(obj) = value.as_object() else {
            bail!("response is not a JSON object");
        };

        if obj.contains_key("portfolioReport") {
            let report: StructuredReport =
                serde_json::from_value(value).context("invalid portfolioReport")?;
            return Ok(AnalysisResult::Structured(report));
        }

        match obj.get("content") {
            Some(Value::String(s)) if !s.is_empty() => {}
            Some(Value::String(_)) => bail!("`content` is empty"),
            Some(_) => bail!("`content` is not a string"),
            None => bail!("missing `content`"),
        }
        let report: LegacyReport = serde_json::from_value(value).context("invalid legacy report")?;
        Ok(AnalysisResult::Legacy(report))
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, AnalysisResult::Structured(_))
    }

    pub fn processing_time(&self) -> f64 {
        match self {
            AnalysisResult::Legacy(r) => r.processing_time,
            AnalysisResult::Structured(r) => r.processing_time,
        }
    }

    pub fn request_id(&self) -> &str {
        match self {
            AnalysisResult::Legacy(r) => &r.request_id,
            AnalysisResult::Structured(r) => &r.request_id,
        }
    }

    pub fn images_processed(&self) -> Option<u32> {
        match self {
            AnalysisResult::Legacy(r) => r.images_processed,
            AnalysisResult::Structured(r) => Some(r.images_processed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyReport {
    /// Markdown body
    pub content: String,
    /// Seconds
    pub processing_time: f64,
    pub request_id: String,
    #[serde(default)]
    pub images_processed: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StructuredReport {
    #[serde(rename = "portfolioReport")]
    pub portfolio_report: PortfolioReport,
    pub processing_time: f64,
    pub request_id: String,
    #[serde(default)]
    pub images_processed: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PortfolioReport {
    #[serde(default)]
    pub version: String,
    #[serde(rename = "reportDate", default)]
    pub report_date: String,
    pub tabs: Vec<Tab>,
}

// ── Tabs ──

/// Which renderer a tab asks for. Unknown ids are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabId {
    Dashboard,
    DeepDive,
    AllStockScores,
    KeyStockAnalysis,
    Other(String),
}

impl TabId {
    pub fn parse(id: &str) -> Self {
        match id {
            "dashboard" => TabId::Dashboard,
            "deepDive" => TabId::DeepDive,
            "allStockScores" => TabId::AllStockScores,
            "keyStockAnalysis" => TabId::KeyStockAnalysis,
            other => TabId::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TabId::Dashboard => "dashboard",
            TabId::DeepDive => "deepDive",
            TabId::AllStockScores => "allStockScores",
            TabId::KeyStockAnalysis => "keyStockAnalysis",
            TabId::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawTab")]
pub struct Tab {
    pub tab_id: TabId,
    pub tab_title: String,
    pub content: TabContent,
}

#[derive(Deserialize)]
struct RawTab {
    #[serde(rename = "tabId")]
    tab_id: String,
    #[serde(rename = "tabTitle", default)]
    tab_title: String,
    #[serde(default)]
    content: Value,
}

impl From<RawTab> for Tab {
    fn from(raw: RawTab) -> Self {
        Tab {
            tab_id: TabId::parse(&raw.tab_id),
            tab_title: raw.tab_title,
            content: TabContent::classify(raw.content),
        }
    }
}

impl Tab {
    /// Content whose shape agrees with the tab id, or `None` on a mismatch
    pub fn checked_content(&self) -> Option<&TabContent> {
        if self.content.matches(&self.tab_id) {
            Some(&self.content)
        } else {
            None
        }
    }
}

/// Tab payload, classified by shape (never by `tabId`).
#[derive(Debug, Clone, PartialEq)]
pub enum TabContent {
    Dashboard(DashboardContent),
    DeepDive(DeepDiveContent),
    AllStockScores(AllStockScoresContent),
    KeyStockAnalysis(KeyStockAnalysisContent),
    /// Anything that fits none of the known shapes
    Raw(Value),
}

impl TabContent {
    pub fn classify(value: Value) -> Self {
        if let Ok(c) = serde_json::from_value::<DashboardContent>(value.clone()) {
            return TabContent::Dashboard(c);
        }
        if let Ok(c) = serde_json::from_value::<DeepDiveContent>(value.clone()) {
            return TabContent::DeepDive(c);
        }
        if let Ok(c) = serde_json::from_value::<AllStockScoresContent>(value.clone()) {
            return TabContent::AllStockScores(c);
        }
        if let Ok(c) = serde_json::from_value::<KeyStockAnalysisContent>(value.clone()) {
            return TabContent::KeyStockAnalysis(c);
        }
        TabContent::Raw(value)
    }

    pub fn matches(&self, id: &TabId) -> bool {
        matches!(
            (self, id),
            (TabContent::Dashboard(_), TabId::Dashboard)
                | (TabContent::DeepDive(_), TabId::DeepDive)
                | (TabContent::AllStockScores(_), TabId::AllStockScores)
                | (TabContent::KeyStockAnalysis(_), TabId::KeyStockAnalysis)
        )
    }

    /// Pretty-printed JSON, used by the raw fallback renderer
    pub fn to_pretty_json(&self) -> String {
        let value = match self {
            TabContent::Dashboard(c) => serde_json::to_value(c),
            TabContent::DeepDive(c) => serde_json::to_value(c),
            TabContent::AllStockScores(c) => serde_json::to_value(c),
            TabContent::KeyStockAnalysis(c) => serde_json::to_value(c),
            TabContent::Raw(v) => Ok(v.clone()),
        };
        value
            .and_then(|v| serde_json::to_string_pretty(&v))
            .unwrap_or_default()
    }
}

// ── dashboard ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardContent {
    pub overall_score: OverallScore,
    pub core_criteria_scores: Vec<CriterionScore>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallScore {
    #[serde(default)]
    pub title: String,
    pub score: f64,
    #[serde(default = "default_max_score")]
    pub max_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionScore {
    pub criterion: String,
    pub score: f64,
    #[serde(default = "default_max_score")]
    pub max_score: f64,
}

fn default_max_score() -> f64 {
    100.0
}

// ── deepDive ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepDiveContent {
    pub in_depth_analysis: Vec<InDepthItem>,
    pub opportunities: Opportunities,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InDepthItem {
    pub title: String,
    /// Nominally 0-100, but not guaranteed by the service
    pub score: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunities {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<Opportunity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub summary: String,
    #[serde(default)]
    pub details: String,
}

// ── allStockScores ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllStockScoresContent {
    pub score_table: ScoreTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<ScoreRow>,
}

pub type ScoreRow = HashMap<String, Cell>;

/// One table cell: the service sends either numbers or strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Cell::Number(n) => format_number(*n),
            Cell::Text(s) => s.clone(),
            Cell::Empty => String::new(),
        }
    }
}

// ── keyStockAnalysis ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStockAnalysisContent {
    pub analysis_cards: Vec<AnalysisCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisCard {
    pub stock_name: String,
    pub overall_score: f64,
    #[serde(default)]
    pub detailed_scores: Vec<DetailedScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedScore {
    pub category: String,
    pub score: f64,
    #[serde(default)]
    pub analysis: String,
}

/// Render a number without a trailing ".0" for whole values (75.0 → "75").
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_body_parses_as_legacy() {
        let result = AnalysisResult::from_value(legacy_json()).unwrap();
        assert!(!result.is_structured());
        assert_eq!(result.request_id(), "req-1");
        assert_eq!(result.images_processed(), Some(1));
    }

    #[test]
    fn legacy_images_processed_is_optional() {
        let body = br#"{"content":"ok","processing_time":1.2,"request_id":"r1"}"#;
        match AnalysisResult::from_slice(body).unwrap() {
            AnalysisResult::Legacy(r) => {
                assert_eq!(r.content, "ok");
                assert_eq!(r.images_processed, None);
            }
            other => panic!("expected legacy, got {:?}", other),
        }
    }

    #[test]
    fn portfolio_report_key_selects_structured() {
        let result = AnalysisResult::from_value(structured_json()).unwrap();
        let AnalysisResult::Structured(report) = result else {
            panic!("expected structured");
        };
        assert_eq!(report.portfolio_report.version, "1.0");
        assert_eq!(report.portfolio_report.tabs.len(), 4);
        assert_eq!(report.images_processed, 2);
    }

    #[test]
    fn structured_wins_even_with_content_present() {
        let mut body = structured_json();
        body["content"] = json!("markdown too");
        assert!(AnalysisResult::from_value(body).unwrap().is_structured());
    }

    #[test]
    fn missing_or_empty_content_is_rejected() {
        for body in [
            json!({"processing_time": 1.0, "request_id": "r"}),
            json!({"content": "", "processing_time": 1.0, "request_id": "r"}),
            json!({"content": 42, "processing_time": 1.0, "request_id": "r"}),
            json!(["not", "an", "object"]),
        ] {
            assert!(AnalysisResult::from_value(body).is_err());
        }
    }

    #[test]
    fn malformed_portfolio_report_is_rejected() {
        let body = json!({"portfolioReport": {"version": "1.0"}, "processing_time": 1.0, "request_id": "r"});
        assert!(AnalysisResult::from_value(body).is_err());
    }

    #[test]
    fn non_json_body_is_rejected() {
        assert!(AnalysisResult::from_slice(b"<html>502</html>").is_err());
    }

    #[test]
    fn tab_content_is_classified_by_shape() {
        assert!(matches!(TabContent::classify(dashboard_json()), TabContent::Dashboard(_)));
        assert!(matches!(TabContent::classify(deep_dive_json()), TabContent::DeepDive(_)));
        assert!(matches!(TabContent::classify(scores_json()), TabContent::AllStockScores(_)));
        assert!(matches!(TabContent::classify(key_stock_json(1)), TabContent::KeyStockAnalysis(_)));
        assert!(matches!(TabContent::classify(json!({"foo": 1})), TabContent::Raw(_)));
    }

    #[test]
    fn mismatched_tab_id_has_no_checked_content() {
        let tab: Tab = serde_json::from_value(json!({
            "tabId": "dashboard",
            "tabTitle": "총괄 요약",
            "content": scores_json()
        }))
        .unwrap();
        assert_eq!(tab.tab_id, TabId::Dashboard);
        assert!(tab.checked_content().is_none());
        assert!(tab.content.to_pretty_json().contains("scoreTable"));
    }

    #[test]
    fn unknown_tab_id_is_preserved() {
        let tab: Tab = serde_json::from_value(json!({
            "tabId": "newSection",
            "tabTitle": "New",
            "content": {"x": 1}
        }))
        .unwrap();
        assert_eq!(tab.tab_id, TabId::Other("newSection".into()));
        assert_eq!(tab.tab_id.as_str(), "newSection");
        assert!(tab.checked_content().is_none());
    }

    #[test]
    fn cells_accept_numbers_strings_and_null() {
        let row: ScoreRow =
            serde_json::from_value(json!({"a": 7.5, "b": "ABC", "c": null})).unwrap();
        assert_eq!(row["a"], Cell::Number(7.5));
        assert_eq!(row["b"], Cell::Text("ABC".into()));
        assert_eq!(row["c"], Cell::Empty);
        assert_eq!(row["a"].display(), "7.5");
        assert_eq!(Cell::Number(75.0).display(), "75");
    }

    #[test]
    fn max_score_defaults_to_hundred() {
        let c: CriterionScore = serde_json::from_value(json!({"criterion": "x", "score": 5})).unwrap();
        assert_eq!(c.max_score, 100.0);
    }
}
