use thiserror::Error;

pub const MSG_NO_FILES: &str = "분석할 파일이 없습니다.";
pub const MSG_TOO_MANY_FILES: &str = "최대 5개의 파일만 업로드 가능합니다.";

/// Failure of one analysis request. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Rejected before any network traffic
    #[error("{0}")]
    Invalid(String),

    #[error("파일을 읽을 수 없습니다: {name}")]
    FileRead { name: String, cause: String },

    #[error("요청 시간이 초과되었습니다. 다시 시도해 주세요.")]
    Timeout,

    /// Connection refused, DNS failure, reset... The cause is kept for logs.
    #[error("네트워크 오류가 발생했습니다. 인터넷 연결을 확인해 주세요.")]
    Network(String),

    #[error("{message}")]
    Server { status: u16, message: String },

    /// 2xx body that is neither report shape
    #[error("잘못된 응답 형식")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Timeout,
    Network,
    Server,
    Malformed,
}

impl ApiError {
    /// HTTP-like status code: 400 client-side, 408 timeout, 0 transport,
    /// 500 malformed, otherwise the server's own status.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Invalid(_) | ApiError::FileRead { .. } => 400,
            ApiError::Timeout => 408,
            ApiError::Network(_) => 0,
            ApiError::Server { status, .. } => *status,
            ApiError::Malformed(_) => 500,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Invalid(_) | ApiError::FileRead { .. } => ErrorKind::Validation,
            ApiError::Timeout => ErrorKind::Timeout,
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::Malformed(_) => ErrorKind::Malformed,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(e.to_string())
        }
    }
}
