//! Outbound call to the Gemini `generateContent` endpoint.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::GatewayError;
use crate::submission::ImageSubmission;

pub const ANALYSIS_PROMPT: &str = r#"
당신은 수십 년 경력의 관상가이자, 안면 인식 전문가입니다.
제공된 사진의 인물을 **아이들의 눈높이에 맞춰** 재미있게 설명하되, 닮은꼴 찾기 단계에서는 **매우 정밀하게** 분석해야 합니다.

[분석 단계]
1. 먼저 사진 속 인물의 성별, 나이대, 얼굴형(둥근형, 계란형, 각진형 등), 눈매(쌍꺼풀 유무, 눈꼬리), 코의 모양, 입술 두께를 관찰하세요.
2. 위에서 관찰한 **물리적 특징(이목구비의 생김새)**과 가장 일치하는 **실존 연예인(배우, 가수, 운동선수)**을 찾아보세요.
3. 분위기가 비슷한 사람이 아니라, **얼굴 생김새가 실제로 닮은 사람**이어야 합니다.
4. 사진 속 인물이 한국인으로 보인다면, **한국 연예인** 중에서 우선적으로 찾아주세요.

[출력 양식]
다음 5가지 항목에 대해 초등학생도 이해하기 쉬운 한국어로 답변해 주세요:

1. 🦁 전체적인 느낌 (동물에 비유하거나 재미있는 표현 사용)
2. 👀 얼굴의 특징 (눈, 코, 입이 어떻게 생겼는지 묘사)
3. ✨ 숨겨진 능력 (성격 장점, 재능)
4. 🍀 행운의 조언
5. 👯 나와 닮은 연예인 (선정 이유를 "눈매가 닮았어요" 처럼 구체적으로 설명)

★중요★: 답변의 맨 마지막 줄에는 반드시 "!!!닮은꼴:이름!!!" 형식으로 이름만 딱 적어주세요.
(예시: ...설명 끝. \n!!!닮은꼴:손흥민!!!)
"#;

#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Returns the model's full text answer for one photo.
    async fn infer(&self, image: &ImageSubmission) -> Result<String, GatewayError>;
}

/// Prompt plus one encoded image; built once per call.
#[derive(Debug)]
pub struct InferenceRequest {
    prompt: &'static str,
    mime_type: String,
    data: String,
}

impl InferenceRequest {
    pub fn new(prompt: &'static str, image: &ImageSubmission) -> Self {
        Self {
            prompt,
            mime_type: image.media_type().to_string(),
            data: image.to_base64(),
        }
    }

    pub fn to_payload(&self) -> Value {
        serde_json::json!({
            "contents": [{
                "parts": [
                    { "text": self.prompt },
                    {
                        "inline_data": {
                            "mime_type": self.mime_type,
                            "data": self.data
                        }
                    }
                ]
            }]
        })
    }
}

pub struct GeminiGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GeminiGateway {
    pub fn new(config: &Config) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &Config) -> Self {
        let endpoint = format!(
            "{}/{}/models/{}:generateContent",
            config.api_base, config.api_version, config.model
        );
        Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl InferenceGateway for GeminiGateway {
    async fn infer(&self, image: &ImageSubmission) -> Result<String, GatewayError> {
        if image.is_empty() {
            return Err(GatewayError::MissingImage);
        }

        let request = InferenceRequest::new(ANALYSIS_PROMPT, image);
        info!(
            model = %self.model,
            media_type = image.media_type(),
            bytes = image.len(),
            "Sending analysis request to Gemini"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request.to_payload())
            .send()
            .await
            .map_err(|e| {
                error!("Gemini request failed: {e}");
                GatewayError::Transport(e)
            })?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            error!("Failed to read Gemini response body: {e}");
            GatewayError::Transport(e)
        })?;
        debug!(
            %status,
            body = %preview(&response_text, 500),
            "Gemini response"
        );

        if !status.is_success() {
            let err = classify_failure(status, response_text);
            warn!("Gemini call rejected: {err}");
            return Err(err);
        }

        let result: Value = serde_json::from_str(&response_text)
            .map_err(|e| GatewayError::Malformed(format!("invalid JSON: {e}")))?;
        let text = extract_text(&result).inspect_err(|e| warn!("{e}"))?;

        info!(chars = text.chars().count(), "Gemini analysis received");
        Ok(text)
    }
}

fn classify_failure(status: StatusCode, body: String) -> GatewayError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Unauthorized {
            status: status.as_u16(),
            body,
        },
        StatusCode::TOO_MANY_REQUESTS => GatewayError::RateLimited { body },
        _ => GatewayError::Upstream {
            status: status.as_u16(),
            body,
        },
    }
}

/// Concatenates the text parts of the first candidate.
pub fn extract_text(result: &Value) -> Result<String, GatewayError> {
    if let Some(reason) = result["promptFeedback"]["blockReason"].as_str() {
        return Err(GatewayError::Malformed(format!("prompt blocked: {reason}")));
    }

    let parts = result["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| GatewayError::Malformed("no candidates in response".into()))?;

    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    if text.trim().is_empty() {
        return Err(GatewayError::Malformed("empty text in response".into()));
    }
    Ok(text)
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
