pub mod model;
pub mod view;

pub use model::{AnalysisResult, Tab};
pub use view::{ResultView, ReportView, ScoreBand, TabUi};
