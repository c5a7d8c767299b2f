use std::future::Future;
use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::llm::media::{detect_mime_type, is_supported_image_mime, normalize_image_mime};
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, thiserror::Error)]
pub enum ImageGenerationError {
    #[error("Gemini request failed: {0}")]
    Request(String),
    #[error("Gemini request failed with status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("Invalid Gemini response: {0}")]
    InvalidResponse(String),
    #[error("No image returned by Gemini (model: {model}){}", no_image_reply(.text))]
    NoImage { model: String, text: Option<String> },
    #[error("Unsupported input image type: {0}")]
    UnsupportedMedia(String),
}

/// One generateContent call: reference images first, target last, then the prompt.
#[derive(Debug, Clone, Default)]
pub struct EditRequest {
    pub system_instruction: String,
    pub prompt: String,
    pub images: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Default)]
pub struct GeminiImageConfig {
    pub aspect_ratio: Option<String>,
    pub image_size: Option<String>,
}

pub trait ImageEditor {
    fn edit(
        &self,
        model: &str,
        request: &EditRequest,
    ) -> impl Future<Output = Result<Vec<u8>, ImageGenerationError>> + Send;
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone)]
pub struct GeminiImageEditor {
    api_key: String,
    safety_profile: String,
    max_attempts: usize,
    retry_delay: Duration,
    request_timeout: Duration,
    image_config: Option<GeminiImageConfig>,
}

impl GeminiImageEditor {
    pub fn from_config(config: &Config) -> Self {
        GeminiImageEditor {
            api_key: config.gemini_api_key.clone(),
            safety_profile: config.gemini_safety_settings.clone(),
            max_attempts: config.gemini_max_attempts.max(1),
            retry_delay: Duration::from_millis(config.gemini_retry_delay_ms),
            request_timeout: Duration::from_secs(config.gemini_request_timeout_secs),
            image_config: Some(GeminiImageConfig {
                aspect_ratio: Some(config.gemini_aspect_ratio.clone()),
                image_size: Some(config.gemini_image_size.clone()),
            }),
        }
    }

    fn redact(&self, text: &str) -> String {
        redact_api_key(text, &self.api_key)
    }

    async fn call_gemini_api(
        &self,
        model: &str,
        payload: &Value,
    ) -> Result<GeminiResponse, ImageGenerationError> {
        let client = get_http_client();
        let url = format!("{GEMINI_ENDPOINT}/{model}:generateContent");

        if tracing::enabled!(tracing::Level::DEBUG) {
            let payload_summary = summarize_gemini_payload(payload);
            debug!(target: "llm.gemini", model = model, payload = %payload_summary);
        }

        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let response = match client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .timeout(self.request_timeout)
                .json(payload)
                .send()
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    let err_text = self.redact(&err.to_string());
                    let should_retry =
                        gemini_should_retry_error(&err) && attempt < self.max_attempts;
                    warn!(
                        "Gemini request failed to send: {} (timeout={}, connect={}, model={}, attempt={}/{}, retrying={})",
                        err_text,
                        err.is_timeout(),
                        err.is_connect(),
                        model,
                        attempt,
                        self.max_attempts,
                        should_retry
                    );
                    if should_retry {
                        tokio::time::sleep(gemini_retry_delay(self.retry_delay, attempt)).await;
                        continue;
                    }
                    return Err(ImageGenerationError::Request(err_text));
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let (message, body_summary) = summarize_error_body(&self.redact(&body));
                let should_retry =
                    gemini_should_retry_status(status) && attempt < self.max_attempts;
                warn!(
                    "Gemini API error: status={}, model={}, body={}, attempt={}/{}, retrying={}",
                    status, model, body_summary, attempt, self.max_attempts, should_retry
                );
                if should_retry {
                    tokio::time::sleep(gemini_retry_delay(self.retry_delay, attempt)).await;
                    continue;
                }
                return Err(ImageGenerationError::Status {
                    status: status.as_u16(),
                    detail: message.unwrap_or(body_summary),
                });
            }

            let value = response
                .json::<GeminiResponse>()
                .await
                .map_err(|err| ImageGenerationError::InvalidResponse(self.redact(&err.to_string())))?;
            if tracing::enabled!(tracing::Level::DEBUG) {
                let response_summary = summarize_gemini_response(&value);
                debug!(target: "llm.gemini", model = model, response = %response_summary);
            }
            return Ok(value);
        }
    }
}

impl ImageEditor for GeminiImageEditor {
    async fn edit(
        &self,
        model: &str,
        request: &EditRequest,
    ) -> Result<Vec<u8>, ImageGenerationError> {
        let payload = build_edit_payload(
            request,
            &self.safety_profile,
            self.image_config.as_ref(),
        )?;
        let metadata = json!({
            "images": request.images.len(),
            "promptChars": request.prompt.chars().count(),
        });

        log_llm_timing("gemini", model, "edit_image", Some(metadata), || async {
            let response = self.call_gemini_api(model, &payload).await?;
            let (image, text) = extract_image_from_response(response);
            image.ok_or_else(|| ImageGenerationError::NoImage {
                model: model.to_string(),
                text,
            })
        })
        .await
    }
}

fn redact_api_key(text: &str, key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return text.to_string();
    }
    text.replace(key, "[redacted]")
}

fn gemini_should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

fn gemini_should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn gemini_retry_delay(base: Duration, attempt: usize) -> Duration {
    let attempt = attempt.max(1) as u32;
    base.saturating_mul(attempt)
}

fn build_safety_settings(profile: &str) -> Vec<Value> {
    let threshold = match profile {
        "standard" => "BLOCK_MEDIUM_AND_ABOVE",
        "permissive" => "OFF",
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}', using permissive defaults.",
                profile
            );
            "OFF"
        }
    };

    vec![
        json!({ "category": "HARM_CATEGORY_HARASSMENT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_CIVIC_INTEGRITY", "threshold": threshold }),
    ]
}

fn build_image_config(config: Option<&GeminiImageConfig>) -> Option<Value> {
    let config = config?;
    let mut map = Map::new();

    if let Some(aspect_ratio) = config.aspect_ratio.as_deref() {
        let trimmed = aspect_ratio.trim();
        if !trimmed.is_empty() {
            map.insert("aspectRatio".to_string(), json!(trimmed));
        }
    }

    if let Some(image_size) = config.image_size.as_deref() {
        let trimmed = image_size.trim();
        if !trimmed.is_empty() {
            map.insert("imageSize".to_string(), json!(trimmed));
        }
    }

    if map.is_empty() {
        None
    } else {
        Some(Value::Object(map))
    }
}

fn build_edit_parts(request: &EditRequest) -> Result<Vec<Value>, ImageGenerationError> {
    let mut parts = Vec::with_capacity(request.images.len() + 1);

    for image_data in &request.images {
        let mime_type = detect_mime_type(image_data)
            .map(|mime| normalize_image_mime(&mime))
            .ok_or_else(|| ImageGenerationError::UnsupportedMedia("unknown".to_string()))?;
        if !is_supported_image_mime(&mime_type) {
            return Err(ImageGenerationError::UnsupportedMedia(mime_type));
        }
        parts.push(json!({
            "inlineData": {
                "mimeType": mime_type,
                "data": general_purpose::STANDARD.encode(image_data)
            }
        }));
    }

    parts.push(json!({ "text": request.prompt }));
    Ok(parts)
}

fn build_edit_payload(
    request: &EditRequest,
    safety_profile: &str,
    image_config: Option<&GeminiImageConfig>,
) -> Result<Value, ImageGenerationError> {
    let mut generation_config = json!({
        "responseModalities": ["TEXT", "IMAGE"]
    });
    if let Some(image_config) = build_image_config(image_config) {
        if let Some(config_object) = generation_config.as_object_mut() {
            config_object.insert("imageConfig".to_string(), image_config);
        }
    }

    let mut payload = json!({
        "contents": [{ "role": "user", "parts": build_edit_parts(request)? }],
        "generationConfig": generation_config,
        "safetySettings": build_safety_settings(safety_profile),
    });

    // An empty instruction is omitted rather than sent as a blank part.
    if !request.system_instruction.trim().is_empty() {
        if let Some(object) = payload.as_object_mut() {
            object.insert(
                "systemInstruction".to_string(),
                json!({ "parts": [{ "text": request.system_instruction }] }),
            );
        }
    }

    Ok(payload)
}

fn no_image_reply(text: &Option<String>) -> String {
    match text.as_deref().map(str::trim) {
        Some(reply) if !reply.is_empty() => format!(", response: {}", truncate_for_log(reply, 500)),
        _ => String::new(),
    }
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn summarize_gemini_parts(parts: &[Value]) -> Vec<Value> {
    parts
        .iter()
        .map(|part| {
            if let Some(text) = part.get("text").and_then(|value| value.as_str()) {
                json!({ "text": truncate_for_log(text, 200) })
            } else if let Some(inline_data) = part.get("inlineData") {
                let mime_type = inline_data
                    .get("mimeType")
                    .and_then(|value| value.as_str())
                    .unwrap_or("unknown");
                let data_len = inline_data
                    .get("data")
                    .and_then(|value| value.as_str())
                    .map(|value| value.len())
                    .unwrap_or(0);
                json!({ "inlineData": { "mimeType": mime_type, "dataLen": data_len } })
            } else {
                json!({ "unknownPart": true })
            }
        })
        .collect()
}

fn summarize_gemini_payload(payload: &Value) -> Value {
    let mut summary = Map::new();

    if let Some(instruction) = payload
        .pointer("/systemInstruction/parts/0/text")
        .and_then(|value| value.as_str())
    {
        summary.insert(
            "systemInstruction".to_string(),
            json!(truncate_for_log(instruction, 120)),
        );
    }

    if let Some(contents) = payload.get("contents").and_then(|value| value.as_array()) {
        let mut summarized_contents = Vec::new();
        for content in contents {
            let role = content
                .get("role")
                .and_then(|value| value.as_str())
                .unwrap_or("user");
            let parts = content
                .get("parts")
                .and_then(|value| value.as_array())
                .map(|parts| summarize_gemini_parts(parts))
                .unwrap_or_default();
            summarized_contents.push(json!({ "role": role, "parts": parts }));
        }
        summary.insert("contents".to_string(), Value::Array(summarized_contents));
    }

    if let Some(config) = payload.get("generationConfig") {
        summary.insert("generationConfig".to_string(), config.clone());
    }

    if let Some(safety) = payload
        .get("safetySettings")
        .and_then(|value| value.as_array())
    {
        summary.insert("safetySettingsCount".to_string(), json!(safety.len()));
    }

    Value::Object(summary)
}

fn summarize_gemini_response(response: &GeminiResponse) -> Value {
    let mut text_parts = 0usize;
    let mut image_parts = 0usize;
    let mut text_preview = None;

    let candidates = response.candidates.as_deref().unwrap_or(&[]);
    for candidate in candidates {
        let parts = candidate
            .content
            .as_ref()
            .and_then(|content| content.parts.as_deref())
            .unwrap_or(&[]);
        for part in parts {
            match part {
                GeminiPart::Text { text } => {
                    text_parts += 1;
                    if text_preview.is_none() && !text.trim().is_empty() {
                        text_preview = Some(truncate_for_log(text, 200));
                    }
                }
                GeminiPart::InlineData { inline_data } => {
                    if inline_data.mime_type.starts_with("image/") {
                        image_parts += 1;
                    }
                }
            }
        }
    }

    json!({
        "candidates": candidates.len(),
        "textParts": text_parts,
        "imageParts": image_parts,
        "textPreview": text_preview
    })
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

/// First decodable inline image, plus any text the model returned alongside it.
fn extract_image_from_response(response: GeminiResponse) -> (Option<Vec<u8>>, Option<String>) {
    let mut image = None;
    let mut text_parts = Vec::new();

    for candidate in response.candidates.unwrap_or_default() {
        let Some(parts) = candidate.content.and_then(|content| content.parts) else {
            continue;
        };
        for part in parts {
            match part {
                GeminiPart::Text { text } => {
                    if !text.trim().is_empty() {
                        text_parts.push(text);
                    }
                }
                GeminiPart::InlineData { inline_data } => {
                    if image.is_some() || !inline_data.mime_type.starts_with("image/") {
                        continue;
                    }
                    match general_purpose::STANDARD.decode(inline_data.data) {
                        Ok(bytes) => image = Some(bytes),
                        Err(err) => warn!("Discarding undecodable Gemini image part: {err}"),
                    }
                }
            }
        }
    }

    let text = if text_parts.is_empty() {
        None
    } else {
        Some(text_parts.join("\n"))
    };
    (image, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::media::encode_png;
    use image::{Rgb, RgbImage};

    fn png_bytes() -> Vec<u8> {
        encode_png(&RgbImage::from_pixel(2, 2, Rgb([255, 255, 255]))).unwrap()
    }

    #[test]
    fn payload_omits_empty_system_instruction() {
        let request = EditRequest {
            system_instruction: String::new(),
            prompt: "make it purikura".to_string(),
            images: vec![png_bytes()],
        };
        let payload = build_edit_payload(&request, "permissive", None).unwrap();
        assert!(payload.get("systemInstruction").is_none());
        assert_eq!(
            payload.pointer("/generationConfig/responseModalities"),
            Some(&json!(["TEXT", "IMAGE"]))
        );
        assert_eq!(
            payload.pointer("/safetySettings/0/threshold"),
            Some(&json!("OFF"))
        );
    }

    #[test]
    fn payload_places_images_before_prompt() {
        let request = EditRequest {
            system_instruction: "You are a photo booth.".to_string(),
            prompt: "match the reference".to_string(),
            images: vec![png_bytes(), png_bytes()],
        };
        let payload = build_edit_payload(&request, "standard", None).unwrap();
        let parts = payload
            .pointer("/contents/0/parts")
            .and_then(|value| value.as_array())
            .unwrap();

        assert_eq!(parts.len(), 3);
        assert_eq!(
            parts[0].pointer("/inlineData/mimeType"),
            Some(&json!("image/png"))
        );
        assert_eq!(parts[2], json!({ "text": "match the reference" }));
        assert_eq!(
            payload.pointer("/systemInstruction/parts/0/text"),
            Some(&json!("You are a photo booth."))
        );
        assert_eq!(
            payload.pointer("/safetySettings/0/threshold"),
            Some(&json!("BLOCK_MEDIUM_AND_ABOVE"))
        );
    }

    #[test]
    fn payload_rejects_unknown_image_bytes() {
        let request = EditRequest {
            prompt: "x".to_string(),
            images: vec![b"not an image".to_vec()],
            ..EditRequest::default()
        };
        assert!(matches!(
            build_edit_payload(&request, "permissive", None),
            Err(ImageGenerationError::UnsupportedMedia(_))
        ));
    }

    #[test]
    fn image_config_is_attached_when_set() {
        let config = GeminiImageConfig {
            aspect_ratio: Some("3:2".to_string()),
            image_size: Some("  ".to_string()),
        };
        let payload = build_edit_payload(&EditRequest::default(), "permissive", Some(&config)).unwrap();
        assert_eq!(
            payload.pointer("/generationConfig/imageConfig"),
            Some(&json!({ "aspectRatio": "3:2" }))
        );
    }

    #[test]
    fn extracts_first_image_and_text() {
        let encoded = general_purpose::STANDARD.encode([1u8, 2, 3]);
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "Here is your photo" },
                    { "inlineData": { "mimeType": "image/png", "data": encoded } },
                    { "inlineData": { "mimeType": "image/png", "data": "AAAA" } }
                ]}
            }]
        }))
        .unwrap();

        let (image, text) = extract_image_from_response(response);
        assert_eq!(image, Some(vec![1, 2, 3]));
        assert_eq!(text.as_deref(), Some("Here is your photo"));
    }

    #[test]
    fn text_only_response_has_no_image() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "I cannot edit this photo." }] } }]
        }))
        .unwrap();
        let (image, text) = extract_image_from_response(response);
        assert!(image.is_none());
        assert_eq!(text.as_deref(), Some("I cannot edit this photo."));
    }

    #[test]
    fn missing_image_error_carries_model_reply() {
        let err = ImageGenerationError::NoImage {
            model: "gemini-2.5-flash-image".to_string(),
            text: Some("I cannot edit photos of minors.".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "No image returned by Gemini (model: gemini-2.5-flash-image), response: I cannot edit photos of minors."
        );

        let silent = ImageGenerationError::NoImage {
            model: "m".to_string(),
            text: Some("  ".to_string()),
        };
        assert_eq!(silent.to_string(), "No image returned by Gemini (model: m)");

        let long = ImageGenerationError::NoImage {
            model: "m".to_string(),
            text: Some("x".repeat(800)),
        };
        assert!(long.to_string().ends_with("... (truncated)"));
    }

    #[test]
    fn payload_summary_hides_image_data() {
        let request = EditRequest {
            prompt: "prompt".to_string(),
            images: vec![png_bytes()],
            ..EditRequest::default()
        };
        let payload = build_edit_payload(&request, "permissive", None).unwrap();
        let summary = summarize_gemini_payload(&payload);
        let part = summary.pointer("/contents/0/parts/0/inlineData").unwrap();
        assert!(part.get("data").is_none());
        assert!(part.get("dataLen").and_then(|v| v.as_u64()).unwrap() > 0);
        assert_eq!(summary.get("safetySettingsCount"), Some(&json!(5)));
    }

    #[test]
    fn retry_policy_matches_transient_statuses() {
        assert!(gemini_should_retry_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(gemini_should_retry_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(gemini_should_retry_status(StatusCode::REQUEST_TIMEOUT));
        assert!(!gemini_should_retry_status(StatusCode::BAD_REQUEST));
        assert_eq!(
            gemini_retry_delay(Duration::from_millis(500), 3),
            Duration::from_millis(1500)
        );
        assert_eq!(
            gemini_retry_delay(Duration::from_millis(500), 0),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn redacts_api_key_and_reads_error_message() {
        assert_eq!(
            redact_api_key("bad key abc123 used", "abc123"),
            "bad key [redacted] used"
        );
        assert_eq!(redact_api_key("unchanged", " "), "unchanged");

        let (message, _) =
            summarize_error_body(r#"{"error":{"message":"Resource has been exhausted"}}"#);
        assert_eq!(message.as_deref(), Some("Resource has been exhausted"));
        assert_eq!(summarize_error_body("  ").1, "empty response body");
    }
}
