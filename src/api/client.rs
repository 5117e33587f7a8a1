use super::error::{ApiError, MSG_NO_FILES, MSG_TOO_MANY_FILES};
use crate::report::AnalysisResult;
use crate::upload::{ImageFile, MAX_FILES};
use anyhow::{Context, Result};
use reqwest::blocking::multipart::{Form, Part};
use serde_json::Value;
use std::time::{Duration, Instant};

/// Anything that can turn a set of screenshots into a report.
/// The UI and the session only talk to this trait.
pub trait AnalysisBackend: Send + Sync {
    fn analyze(&self, files: &[ImageFile]) -> Result<AnalysisResult, ApiError>;

    /// Canned report from the service's demo endpoint
    fn sample(&self) -> Result<AnalysisResult, ApiError> {
        Err(ApiError::Invalid("sample report is not available".to_string()))
    }
}

/// HTTP client for the portfolio analysis service
pub struct AnalysisClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl AnalysisClient {
    /// The timeout covers the whole request, upload and response body included.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { base_url, client })
    }

    fn build_form(files: &[ImageFile]) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for file in files {
            let bytes = std::fs::read(&file.path).map_err(|e| ApiError::FileRead {
                name: file.name.clone(),
                cause: e.to_string(),
            })?;
            let part = Part::bytes(bytes)
                .file_name(file.name.clone())
                .mime_str(&file.mime)
                .map_err(|e| ApiError::Invalid(e.to_string()))?;
            form = form.part("files", part);
        }
        Ok(form)
    }

    fn read_result(response: reqwest::blocking::Response) -> Result<AnalysisResult, ApiError> {
        let status = response.status();
        let body = response.bytes()?;

        if !status.is_success() {
            let message = error_message_from_body(status.as_u16(), &body);
            return Err(ApiError::Server { status: status.as_u16(), message });
        }

        AnalysisResult::from_slice(&body).map_err(|e| ApiError::Malformed(format!("{:#}", e)))
    }
}

impl AnalysisBackend for AnalysisClient {
    fn analyze(&self, files: &[ImageFile]) -> Result<AnalysisResult, ApiError> {
        if files.is_empty() {
            return Err(ApiError::Invalid(MSG_NO_FILES.to_string()));
        }
        if files.len() > MAX_FILES {
            return Err(ApiError::Invalid(MSG_TOO_MANY_FILES.to_string()));
        }

        let form = Self::build_form(files)?;
        let url = format!("{}/api/analyze", self.base_url);
        log::info!("POST {} ({} file(s))", url, files.len());

        let started = Instant::now();
        let outcome = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(ApiError::from)
            .and_then(Self::read_result);

        match &outcome {
            Ok(result) => log::info!(
                "analysis {} done in {:.1?} (server {:.2}s, {} report, {} image(s))",
                result.request_id(),
                started.elapsed(),
                result.processing_time(),
                if result.is_structured() { "structured" } else { "markdown" },
                result.images_processed().unwrap_or(files.len() as u32)
            ),
            Err(e) => log::warn!("analysis failed ({:?}, status {}): {:?}", e.kind(), e.status(), e),
        }
        outcome
    }

    fn sample(&self) -> Result<AnalysisResult, ApiError> {
        let url = format!("{}/api/analyze/sample", self.base_url);
        log::info!("GET {}", url);
        let outcome = self
            .client
            .get(&url)
            .send()
            .map_err(ApiError::from)
            .and_then(Self::read_result);
        if let Err(ref e) = outcome {
            log::warn!("sample request failed ({:?}, status {}): {:?}", e.kind(), e.status(), e);
        }
        outcome
    }
}

/// Best user-facing message for a non-2xx response body: the JSON `error`
/// field, then `detail`, then "HTTP <status>". Non-JSON bodies get a
/// status-coded server error message.
pub fn error_message_from_body(status: u16, body: &[u8]) -> String {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return format!("서버 오류 ({})", status);
    };
    ["error", "detail"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status))
}
