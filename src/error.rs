use thiserror::Error;

/// Shown when the user submits without picking a photo first.
pub const NO_PHOTO_MESSAGE: &str = "먼저 사진을 콕! 눌러서 선택해 주세요! 📸";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY must be set (environment or .env file)")]
    MissingApiKey,
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Problems with the submitted file, caught before any outbound call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no file selected")]
    NoFile,
    #[error("selected file is empty")]
    EmptyFile,
    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),
}

impl ValidationError {
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::NoFile | ValidationError::EmptyFile => NO_PHOTO_MESSAGE.to_string(),
            ValidationError::UnsupportedMedia(kind) => {
                format!("사진 파일만 올릴 수 있어요! ({kind}) 🖼️")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("이미지가 없습니다.")]
    MissingImage,
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("authentication rejected ({status}): {body}")]
    Unauthorized { status: u16, body: String },
    #[error("quota or rate limit exceeded: {body}")]
    RateLimited { body: String },
    #[error("API Error {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl GatewayError {
    pub fn user_message(&self) -> String {
        format!("분석 중 오류 발생: {self}")
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("an analysis is already in progress")]
    Busy,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
    #[error("nothing to share yet")]
    NothingToShare,
    #[error("share failed: {0}")]
    Failed(String),
}
