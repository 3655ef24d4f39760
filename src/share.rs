//! Share text for a finished analysis and the platform hooks that deliver it.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::parser::ParsedResult;

pub const SHARE_TITLE: &str = "✨ 내 관상 & 닮은꼴 연예인 찾기 ✨";

/// Title and body of a share; the page URL is attached by whoever knows it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShareMessage {
    pub title: String,
    pub text: String,
}

impl ShareMessage {
    /// `None` unless the result names a lookalike.
    pub fn compose(result: &ParsedResult) -> Option<Self> {
        let name = result.subject_name.as_deref()?;
        Some(Self {
            title: SHARE_TITLE.to_string(),
            text: format!(
                "[AI 관상 분석 결과]\n\n{}\n\n👉 나랑 닮은 연예인: {}\n\n너도 한번 해봐! 소름 돋음 🔮",
                result.body_text, name
            ),
        })
    }

    pub fn with_url(self, url: impl Into<String>) -> SharePayload {
        SharePayload {
            title: self.title,
            text: self.text,
            url: url.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl SharePayload {
    /// What goes on the clipboard when native sharing is unavailable.
    pub fn clipboard_text(&self) -> String {
        format!("{}\n{}", self.text, self.url)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareFailure {
    #[error("share dismissed by user")]
    Cancelled,
    #[error("{0}")]
    Failed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    Copied,
    Dismissed,
}

#[async_trait]
pub trait SharePlatform: Send + Sync {
    fn supports_native_share(&self) -> bool;

    async fn share(&self, payload: &SharePayload) -> Result<(), ShareFailure>;

    async fn copy_to_clipboard(&self, text: &str) -> Result<(), ShareFailure>;
}
