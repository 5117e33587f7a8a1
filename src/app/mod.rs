pub mod session;
mod state;

pub use session::{AnalysisState, Status};
pub use state::{expand_paths, App, DirEntry, Focus, InputMode, OverlayData};
