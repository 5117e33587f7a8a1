use crate::api::{AnalysisBackend, ApiError};
use crate::report::AnalysisResult;
use crate::upload::{validate_image_file, ImageFile, PreviewEncoder, MAX_FILES};

pub const MSG_SELECT_FILES: &str = "파일을 선택해주세요.";
pub const MSG_TOO_MANY_FILES: &str = "최대 5개의 파일만 업로드 가능합니다.";
pub const MSG_PREVIEW_FAILED: &str = "이미지 미리보기 생성에 실패했습니다.";
pub const MSG_NO_FILE_TO_ANALYZE: &str = "분석할 파일이 없습니다.";
pub const MSG_ANALYSIS_FAILED: &str = "분석 중 오류가 발생했습니다.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading,
    Success,
    Error,
}

/// Selected files and their previews. `files` and `previews` stay aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadState {
    pub status: Status,
    pub files: Vec<ImageFile>,
    pub previews: Vec<String>,
    pub error: Option<String>,
}

impl UploadState {
    fn idle() -> Self {
        UploadState { status: Status::Idle, files: Vec::new(), previews: Vec::new(), error: None }
    }

    fn failed(message: impl Into<String>) -> Self {
        UploadState { error: Some(message.into()), status: Status::Error, ..Self::idle() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisState {
    Idle,
    Loading,
    Success(AnalysisResult),
    Error(String),
}

impl AnalysisState {
    pub fn status(&self) -> Status {
        match self {
            AnalysisState::Idle => Status::Idle,
            AnalysisState::Loading => Status::Loading,
            AnalysisState::Success(_) => Status::Success,
            AnalysisState::Error(_) => Status::Error,
        }
    }

    pub fn data(&self) -> Option<&AnalysisResult> {
        match self {
            AnalysisState::Success(r) => Some(r),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AnalysisState::Error(e) => Some(e),
            _ => None,
        }
    }
}

/// Work order for one analysis request. `id` must be handed back to
/// `Session::finish_analysis` together with the outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisTicket {
    pub id: u64,
    /// Empty for a sample request
    pub files: Vec<ImageFile>,
}

/// Upload and analysis state machine driven by the UI.
pub struct Session {
    upload: UploadState,
    analysis: AnalysisState,
    last_issued: u64,
    /// Id of the one request whose outcome will be accepted
    pending: Option<u64>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Session {
            upload: UploadState::idle(),
            analysis: AnalysisState::Idle,
            last_issued: 0,
            pending: None,
        }
    }

    pub fn upload(&self) -> &UploadState {
        &self.upload
    }

    pub fn analysis(&self) -> &AnalysisState {
        &self.analysis
    }

    pub fn files(&self) -> &[ImageFile] {
        &self.upload.files
    }

    pub fn is_loading(&self) -> bool {
        self.analysis.status() == Status::Loading
    }

    pub fn can_analyze(&self) -> bool {
        self.upload.status == Status::Success && !self.upload.files.is_empty()
    }

    /// Replace the selection. Every candidate is validated and previewed in
    /// order; the first failure discards the whole batch. Only a successful
    /// selection supersedes an in-flight analysis.
    pub fn select_files(&mut self, candidates: Vec<ImageFile>, encoder: &dyn PreviewEncoder) {
        if candidates.is_empty() {
            self.upload = UploadState::failed(MSG_SELECT_FILES);
            return;
        }
        if candidates.len() > MAX_FILES {
            self.upload = UploadState::failed(MSG_TOO_MANY_FILES);
            return;
        }

        self.upload = UploadState { status: Status::Loading, ..UploadState::idle() };

        let mut previews = Vec::with_capacity(candidates.len());
        for (i, file) in candidates.iter().enumerate() {
            let step = validate_image_file(file).and_then(|()| {
                encoder.encode(file).map_err(|e| {
                    log::warn!("preview of {} failed: {:#}", file.path.display(), e);
                    MSG_PREVIEW_FAILED.to_string()
                })
            });
            match step {
                Ok(preview) => previews.push(preview),
                Err(reason) => {
                    self.upload = UploadState::failed(format!("파일 {}: {}", i + 1, reason));
                    return;
                }
            }
        }

        log::info!("selected {} file(s)", candidates.len());
        self.supersede();
        self.upload = UploadState {
            status: Status::Success,
            files: candidates,
            previews,
            error: None,
        };
        self.analysis = AnalysisState::Idle;
    }

    /// Start an analysis of the current files. Returns `None` (and records
    /// the error) when there is nothing to analyze.
    pub fn begin_analysis(&mut self) -> Option<AnalysisTicket> {
        if self.upload.files.is_empty() {
            self.analysis = AnalysisState::Error(MSG_NO_FILE_TO_ANALYZE.to_string());
            return None;
        }
        let id = self.issue();
        Some(AnalysisTicket { id, files: self.upload.files.clone() })
    }

    /// Start a request for the service's sample report; needs no files.
    pub fn begin_sample(&mut self) -> AnalysisTicket {
        let id = self.issue();
        AnalysisTicket { id, files: Vec::new() }
    }

    /// Record the outcome of request `id`. Outcomes of superseded requests
    /// are dropped; returns whether the outcome was applied.
    pub fn finish_analysis(&mut self, id: u64, outcome: Result<AnalysisResult, ApiError>) -> bool {
        if self.pending != Some(id) {
            log::info!("discarding outcome of superseded request #{}", id);
            return false;
        }
        self.pending = None;
        self.analysis = match outcome {
            Ok(result) => AnalysisState::Success(result),
            Err(e) => {
                let message = e.to_string();
                if message.is_empty() {
                    AnalysisState::Error(MSG_ANALYSIS_FAILED.to_string())
                } else {
                    AnalysisState::Error(message)
                }
            }
        };
        true
    }

    /// Run a whole analysis on the calling thread.
    pub fn analyze_with(&mut self, backend: &dyn AnalysisBackend) {
        if let Some(ticket) = self.begin_analysis() {
            let outcome = backend.analyze(&ticket.files);
            self.finish_analysis(ticket.id, outcome);
        }
    }

    pub fn remove_file(&mut self, index: usize) {
        if index >= self.upload.files.len() {
            return;
        }
        self.upload.files.remove(index);
        if index < self.upload.previews.len() {
            self.upload.previews.remove(index);
        }
        if self.upload.files.is_empty() {
            self.upload = UploadState::idle();
        }
    }

    pub fn reset(&mut self) {
        self.pending = None;
        self.upload = UploadState::idle();
        self.analysis = AnalysisState::Idle;
    }

    fn issue(&mut self) -> u64 {
        self.last_issued += 1;
        self.pending = Some(self.last_issued);
        self.analysis = AnalysisState::Loading;
        log::debug!("issued request #{}", self.last_issued);
        self.last_issued
    }

    /// Forget any in-flight request
    fn supersede(&mut self) {
        if self.pending.take().is_some() && self.is_loading() {
            self.analysis = AnalysisState::Idle;
        }
    }
}
