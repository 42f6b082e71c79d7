//! Plain-language report summaries from an external LLM.
//!
//! Two providers are supported, each behind a small async client. Prompt construction and
//! response parsing are plain functions so they can be tested without a network.

use crate::error::SummaryError;
use lipid_core::{LlmProvider, ServiceConfig};
use lipid_types::LipidDetail;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const OPENAI_BASE_URL: &str = "https://api.openai.com";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const SYSTEM_PROMPT: &str = "You explain blood lipid test results to patients in plain language. \
Describe what each value means using the categories provided. Do not diagnose, do not recommend \
medication, and do not invent values. Keep it under 150 words and end by reminding the reader to \
discuss the results with their clinician.";

/// System and user text for one summary request.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryPrompt {
    pub system: String,
    pub user: String,
}

/// Builds the prompt for a set of classified readings.
pub fn build_prompt(details: &[LipidDetail]) -> SummaryPrompt {
    let mut user = String::from("Lipid results from my report:\n");
    for detail in details {
        let name = detail.display_name.as_deref().unwrap_or(detail.code.as_str());
        let unit = detail.unit.as_deref().unwrap_or("mg/dL");
        user.push_str(&format!(
            "- {name} ({}): {} {unit}, category {}",
            detail.code,
            detail.value,
            detail.category.as_str()
        ));
        let ranges: Vec<String> = [
            ("desirable", &detail.desirable_range),
            ("borderline high", &detail.borderline_high_range),
            ("high", &detail.high_range),
            ("low", &detail.low_range),
        ]
        .into_iter()
        .filter_map(|(label, range)| range.as_deref().map(|r| format!("{label} {r}")))
        .collect();
        if !ranges.is_empty() {
            user.push_str(&format!(" (reference: {})", ranges.join("; ")));
        }
        user.push('\n');
    }
    user.push_str("Please summarise what these results mean.");

    SummaryPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client, SummaryError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| SummaryError::HttpClient(e.to_string()))
}

fn map_send_error(e: reqwest::Error, base_url: &str, timeout_secs: u64) -> SummaryError {
    if e.is_connect() {
        SummaryError::Connection(base_url.to_string())
    } else if e.is_timeout() {
        SummaryError::Timeout(timeout_secs)
    } else {
        SummaryError::HttpClient(e.to_string())
    }
}

async fn read_success_body(response: reqwest::Response) -> Result<String, SummaryError> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(SummaryError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

// ---------------------------------------------------------------------------
// OpenAI
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Extracts the first choice's text from a chat completions response body.
pub fn parse_openai_response(body: &str) -> Result<String, SummaryError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| SummaryError::ResponseParsing(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(SummaryError::EmptyResponse)
}

/// Client for the OpenAI chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, SummaryError> {
        Ok(Self {
            base_url: OPENAI_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: http_client(timeout_secs)?,
            timeout_secs,
        })
    }

    /// Points the client at a compatible server, e.g. a local proxy.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn summarise(&self, prompt: &SummaryPrompt) -> Result<String, SummaryError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_send_error(e, &self.base_url, self.timeout_secs))?;

        parse_openai_response(&read_success_body(response).await?)
    }
}

// ---------------------------------------------------------------------------
// Gemini
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

/// Joins the text parts of the first candidate in a generateContent response body.
pub fn parse_gemini_response(body: &str) -> Result<String, SummaryError> {
    let parsed: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| SummaryError::ResponseParsing(e.to_string()))?;
    let text = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        Err(SummaryError::EmptyResponse)
    } else {
        Ok(text.to_string())
    }
}

/// Client for the Gemini generateContent endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, SummaryError> {
        Ok(Self {
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: http_client(timeout_secs)?,
            timeout_secs,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn summarise(&self, prompt: &SummaryPrompt) -> Result<String, SummaryError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = GenerateContentRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: Some(prompt.system.clone()),
                }],
            },
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(prompt.user.clone()),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| map_send_error(e, &self.base_url, self.timeout_secs))?;

        parse_gemini_response(&read_success_body(response).await?)
    }
}

// ---------------------------------------------------------------------------
// Provider selection
// ---------------------------------------------------------------------------

/// The configured summary backend.
#[derive(Debug, Clone)]
pub enum SummaryProvider {
    OpenAi(OpenAiClient),
    Gemini(GeminiClient),
}

impl SummaryProvider {
    /// Builds the provider selected by `cfg`, or `None` when its API key is not set.
    pub fn from_config(cfg: &ServiceConfig) -> Result<Option<Self>, SummaryError> {
        let Some(api_key) = cfg.llm_api_key() else {
            return Ok(None);
        };
        let provider = match cfg.llm_provider() {
            LlmProvider::OpenAi => SummaryProvider::OpenAi(OpenAiClient::new(
                api_key,
                cfg.llm_model().unwrap_or(DEFAULT_OPENAI_MODEL),
                DEFAULT_TIMEOUT_SECS,
            )?),
            LlmProvider::Gemini => SummaryProvider::Gemini(GeminiClient::new(
                api_key,
                cfg.llm_model().unwrap_or(DEFAULT_GEMINI_MODEL),
                DEFAULT_TIMEOUT_SECS,
            )?),
        };
        Ok(Some(provider))
    }

    pub fn name(&self) -> &'static str {
        match self {
            SummaryProvider::OpenAi(_) => "openai",
            SummaryProvider::Gemini(_) => "gemini",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            SummaryProvider::OpenAi(client) => client.model(),
            SummaryProvider::Gemini(client) => client.model(),
        }
    }

    pub async fn summarise(&self, details: &[LipidDetail]) -> Result<String, SummaryError> {
        let prompt = build_prompt(details);
        match self {
            SummaryProvider::OpenAi(client) => client.summarise(&prompt).await,
            SummaryProvider::Gemini(client) => client.summarise(&prompt).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lipid_types::{Category, LdlCategory, LipidCode};

    fn ldl_detail() -> LipidDetail {
        LipidDetail {
            code: LipidCode::Ldl,
            value: 145.0,
            category: Category::Ldl(LdlCategory::BorderlineHigh),
            display_name: Some("LDL cholesterol".to_string()),
            unit: Some("mg/dL".to_string()),
            desirable_range: Some("<100".to_string()),
            borderline_high_range: Some("130-159".to_string()),
            high_range: None,
            low_range: None,
            sex_specific_ranges: None,
        }
    }

    #[test]
    fn test_prompt_lists_values_categories_and_ranges() {
        let prompt = build_prompt(&[ldl_detail()]);
        assert!(prompt.system.contains("Do not diagnose"));
        assert!(prompt.system.contains("clinician"));
        assert!(prompt.user.contains(
            "- LDL cholesterol (LDL): 145 mg/dL, category borderline-high \
             (reference: desirable <100; borderline high 130-159)"
        ));
    }

    #[test]
    fn test_prompt_without_reference_falls_back_to_code() {
        let mut detail = ldl_detail();
        detail.display_name = None;
        detail.unit = None;
        detail.desirable_range = None;
        detail.borderline_high_range = None;
        let prompt = build_prompt(&[detail]);
        assert!(prompt.user.contains("- LDL (LDL): 145 mg/dL, category borderline-high\n"));
    }

    #[test]
    fn test_parse_openai_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Your LDL is a bit high. "}}]}"#;
        assert_eq!(parse_openai_response(body).unwrap(), "Your LDL is a bit high.");

        let empty = r#"{"choices":[]}"#;
        assert!(matches!(parse_openai_response(empty), Err(SummaryError::EmptyResponse)));

        assert!(matches!(
            parse_openai_response("<html>"),
            Err(SummaryError::ResponseParsing(_))
        ));
    }

    #[test]
    fn test_parse_gemini_response_joins_parts() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Your LDL "},{"text":"is a bit high."}]}}]}"#;
        assert_eq!(parse_gemini_response(body).unwrap(), "Your LDL is a bit high.");

        let blocked = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        assert!(matches!(parse_gemini_response(blocked), Err(SummaryError::EmptyResponse)));
    }

    #[test]
    fn test_provider_from_config() {
        assert!(SummaryProvider::from_config(&ServiceConfig::default())
            .unwrap()
            .is_none());

        let cfg = ServiceConfig::from_lookup(|key| match key {
            "LLM_PROVIDER" => Some("gemini".to_string()),
            "GEMINI_API_KEY" => Some("g-key".to_string()),
            _ => None,
        })
        .unwrap();
        let provider = SummaryProvider::from_config(&cfg).unwrap().unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.model(), DEFAULT_GEMINI_MODEL);
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_an_error() {
        let client = OpenAiClient::new("sk-test", DEFAULT_OPENAI_MODEL, 5)
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let err = client
            .summarise(&build_prompt(&[ldl_detail()]))
            .await
            .expect_err("nothing listens on the discard port");
        assert!(matches!(
            err,
            SummaryError::Connection(_) | SummaryError::HttpClient(_) | SummaryError::Timeout(_)
        ));
    }
}
