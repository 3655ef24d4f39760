//! Splits the lookalike marker out of the model's free-text answer.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Label the prompt asks the model to put in front of the name.
pub const MARKER_LABEL: &str = "닮은꼴";

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"!!!{}:([^!\r\n]+)!!!", regex::escape(MARKER_LABEL)))
        .expect("marker pattern is a valid regex")
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParsedResult {
    pub body_text: String,
    pub subject_name: Option<String>,
}

impl ParsedResult {
    /// Google image search for the matched name, if there is one.
    pub fn image_search_url(&self) -> Option<String> {
        let name = self.subject_name.as_deref()?;
        reqwest::Url::parse_with_params(
            "https://www.google.com/search",
            &[("q", name), ("tbm", "isch")],
        )
        .ok()
        .map(String::from)
    }
}

/// Never fails. Only the first marker is consumed; anything after it stays in the body.
pub fn parse(text: &str) -> ParsedResult {
    let Some(caps) = MARKER_RE.captures(text) else {
        return ParsedResult {
            body_text: text.to_string(),
            subject_name: None,
        };
    };

    let whole = caps.get(0).map_or(0..0, |m| m.range());
    let name = caps.get(1).map(|m| m.as_str().to_string());

    let mut body_text = String::with_capacity(text.len() - whole.len());
    body_text.push_str(&text[..whole.start]);
    body_text.push_str(&text[whole.end..]);

    ParsedResult {
        body_text,
        subject_name: name,
    }
}
