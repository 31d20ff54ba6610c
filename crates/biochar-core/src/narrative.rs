//! Short qualitative commentary on a calculation, written by an external text model.
//!
//! Strictly best effort: [`generate_insight`] yields an empty string whenever the
//! model cannot be reached, has no credentials or answers with nothing usable.

use crate::calculator::CalculationResult;
use crate::processevent::{emit, EventSender, InsightEvent, ServiceEvent};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

const SYSTEM_INSTRUCTION: &str = "You are a senior scientist specialising in carbon \
sequestration with biochar. Give very short technical insights (at most 240 characters) \
focused on chemical stability and eligibility for carbon credits. Use an academic tone, \
no markdown, no bold text, no quotes and no greetings.";

#[derive(thiserror::Error, Debug)]
pub enum NarrativeError {
    #[error("no API key configured for the text generator")]
    MissingApiKey,
    #[error("result has no scenario to describe")]
    NoScenario,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("text generator answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("text generator returned no text")]
    EmptyResponse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsightRequest {
    pub system_instruction: String,
    pub prompt: String,
    pub temperature: f32,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &InsightRequest) -> Result<String, NarrativeError>;
}

/// Builds the prompt from the first scenario's 100-year figures.
pub fn build_prompt(result: &CalculationResult) -> Option<String> {
    let main = result.main_scenario()?;
    let p100 = main.point(100);
    let f_perm = p100.map_or(0.0, |p| p.f_perm);
    let co2 = p100.map_or(0.0, |p| p.co2_sequestered);

    Some(format!(
        "Analyse these Woolf model results:\n\
         Biomass: {}\n\
         H/C ratio: {:.2}\n\
         Soil temperature: {}°C\n\
         Permanence at 100 years: {:.1}%\n\
         CO2 sequestered: {:.2} tCO2e",
        result.inputs.biomass_type,
        result.inputs.hc_ratio,
        main.temp,
        f_perm * 100.0,
        co2
    ))
}

pub fn insight_request(result: &CalculationResult) -> Option<InsightRequest> {
    Some(InsightRequest {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        prompt: build_prompt(result)?,
        temperature: 0.2,
    })
}

/// Strips formatting the model adds despite being asked not to: bold markers,
/// double quotes, inline `$...$` maths and stray backslashes.
pub fn clean_insight_text(text: &str) -> String {
    let no_bold = text.replace("**", "").replace('"', "");

    let mut out = String::with_capacity(no_bold.len());
    let mut rest = no_bold.as_str();
    while let Some(start) = rest.find('$') {
        let after = &rest[start + 1..];
        // spans do not cross line breaks
        let line_end = after.find('\n').unwrap_or(after.len());
        match after[..line_end].find('$') {
            Some(close) => {
                out.push_str(&rest[..start]);
                rest = &after[close + 1..];
            },
            None => {
                out.push_str(&rest[..=start]);
                rest = after;
            },
        }
    }
    out.push_str(rest);

    out.replace('\\', "").trim().to_string()
}

/// Runs the generator and never fails: any problem yields `""`.
pub async fn generate_insight(
    generator: &dyn TextGenerator,
    result: &CalculationResult,
    events: &EventSender,
) -> String {
    let Some(request) = insight_request(result) else {
        let reason = NarrativeError::NoScenario.to_string();
        emit(events, ServiceEvent::Insight(InsightEvent::Unavailable(reason)));
        return String::new();
    };
    emit(events, ServiceEvent::Insight(InsightEvent::Requested));

    match generator.generate(&request).await {
        Ok(text) => {
            let cleaned = clean_insight_text(&text);
            if cleaned.is_empty() {
                emit(
                    events,
                    ServiceEvent::Insight(InsightEvent::Unavailable(
                        NarrativeError::EmptyResponse.to_string(),
                    )),
                );
            } else {
                emit(events, ServiceEvent::Insight(InsightEvent::Ready(cleaned.chars().count())));
            }
            cleaned
        },
        Err(NarrativeError::MissingApiKey) => {
            warn!("text generator API key missing, no insight generated");
            emit(
                events,
                ServiceEvent::Insight(InsightEvent::Unavailable(
                    NarrativeError::MissingApiKey.to_string(),
                )),
            );
            String::new()
        },
        Err(e) => {
            warn!(error = %e, "insight generation failed");
            emit(events, ServiceEvent::Insight(InsightEvent::Failed(e.to_string())));
            String::new()
        },
    }
}

/* ------------------------- Gemini backend ------------------------- */

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

pub struct GeminiGenerator {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(config: GeminiConfig) -> Result<Self, NarrativeError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    thinking_config: ThinkingConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect::<String>())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, request: &InsightRequest) -> Result<String, NarrativeError> {
        let api_key = match self.config.api_key.as_deref() {
            Some(k) if !k.trim().is_empty() => k,
            _ => return Err(NarrativeError::MissingApiKey),
        };

        let body = GenerateContentBody {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: &request.system_instruction }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: &request.prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                thinking_config: ThinkingConfig { thinking_budget: 0 },
            },
        };

        let resp = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NarrativeError::Status { status: status.as_u16(), body });
        }

        let parsed: GenerateContentResponse = resp.json().await?;
        let text = parsed.text().trim().to_string();
        if text.is_empty() {
            return Err(NarrativeError::EmptyResponse);
        }
        Ok(text)
    }
}
