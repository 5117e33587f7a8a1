mod client;
mod error;

pub use client::{AnalysisBackend, AnalysisClient};
pub use error::ApiError;
