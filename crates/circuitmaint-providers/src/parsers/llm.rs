//! Generative free-text extraction.
//!
//! [`LlmParser`] routes notification text through an [`LlmBackend`] and
//! maps the returned JSON onto the same [`ExtractedFields`] every
//! deterministic extractor produces, so the output passes through the
//! identical validation path. Token-usage accounting stays out of the
//! field schema: it is logged and nothing more.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use circuitmaint_core::{CircuitImpact, Impact, Status};

use crate::data::{DataPart, PartKind};
use crate::diagnostics::Diagnostics;
use crate::fields::ExtractedFields;
use crate::html;
use crate::parser::{Parser, ParserError};

/// The fixed instruction sent ahead of the notification text.
const EXTRACTION_PROMPT: &str = "\
You are given the text of a circuit maintenance notification. Reply with \
a single JSON object and no other commentary, using this schema: \
{\"maintenance_id\": string, \"account\": string, \"start\": integer epoch \
seconds UTC, \"end\": integer epoch seconds UTC, \"summary\": string, \
\"status\": one of TENTATIVE|CONFIRMED|CANCELLED|IN-PROCESS|COMPLETED|RE-SCHEDULED, \
\"impact\": one of NO-IMPACT|REDUCED-REDUNDANCY|DEGRADED|OUTAGE, \
\"circuit_ids\": array of strings}. Omit keys you cannot determine.";

/// A failure talking to the generative backend.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The backend was unreachable or refused the request.
    #[error("backend request failed: {0}")]
    Request(String),
    /// The backend answered with something other than a completion.
    #[error("backend returned a malformed payload: {0}")]
    Malformed(String),
}

/// Token accounting for one backend call. Observability only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Tokens generated in the reply.
    #[serde(default)]
    pub completion_tokens: u32,
    /// Total billed tokens.
    #[serde(default)]
    pub total_tokens: u32,
}

/// One completed backend call.
#[derive(Debug, Clone)]
pub struct LlmReply {
    /// The generated text, expected to be a JSON object.
    pub content: String,
    /// Resource accounting for the call.
    pub usage: TokenUsage,
}

/// A generative completion backend.
///
/// The contract is text in, canonical-schema JSON plus usage accounting
/// out; whatever sits behind it (hosted API, local model) is someone
/// else's concern.
pub trait LlmBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Requests one completion.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] when the backend cannot be reached or
    /// its answer cannot be read.
    fn complete(&self, instruction: &str, content: &str) -> Result<LlmReply, LlmError>;
}

/// Extractor that delegates to a generative backend.
pub struct LlmParser {
    backend: Arc<dyn LlmBackend>,
}

impl LlmParser {
    /// Creates the extractor around a backend.
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }
}

/// The JSON shape requested from the backend.
#[derive(Debug, Default, Deserialize)]
struct LlmAnswer {
    maintenance_id: Option<String>,
    account: Option<String>,
    start: Option<i64>,
    end: Option<i64>,
    summary: Option<String>,
    status: Option<String>,
    impact: Option<String>,
    #[serde(default)]
    circuit_ids: Vec<String>,
}

impl Parser for LlmParser {
    fn name(&self) -> &'static str {
        "llm"
    }

    fn data_kinds(&self) -> &'static [PartKind] {
        &[PartKind::Text, PartKind::Html]
    }

    fn parse(
        &self,
        part: &DataPart,
        _diags: &mut Diagnostics,
    ) -> Result<Vec<ExtractedFields>, ParserError> {
        let content = match part.kind() {
            // Feed the backend readable text, not markup.
            PartKind::Html => {
                let doc = html::parse_document(part.content());
                html::clean_text(&doc.root_element().text().collect::<String>())
            }
            _ => part.text().into_owned(),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let reply = self
            .backend
            .complete(EXTRACTION_PROMPT, &content)
            .map_err(|err| ParserError::Backend(err.to_string()))?;

        info!(
            backend = self.backend.name(),
            prompt_tokens = reply.usage.prompt_tokens,
            completion_tokens = reply.usage.completion_tokens,
            total_tokens = reply.usage.total_tokens,
            "generative extraction completed"
        );

        let answer: LlmAnswer = serde_json::from_str(strip_fences(&reply.content))
            .map_err(|err| ParserError::Backend(format!("unusable completion: {err}")))?;
        let fields = map_answer(answer);
        if fields.is_empty() {
            debug!("generative extraction produced no fields");
            return Ok(Vec::new());
        }
        Ok(vec![fields])
    }
}

/// Models love to wrap JSON in markdown fences.
fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

fn map_answer(answer: LlmAnswer) -> ExtractedFields {
    let impact = answer
        .impact
        .as_deref()
        .and_then(|raw| raw.parse::<Impact>().ok())
        .unwrap_or_default();
    let status = answer
        .status
        .as_deref()
        .and_then(|raw| raw.trim().to_uppercase().replace(' ', "-").parse::<Status>().ok());

    ExtractedFields {
        maintenance_id: answer.maintenance_id.filter(|s| !s.trim().is_empty()),
        account: answer.account.filter(|s| !s.trim().is_empty()),
        summary: answer.summary.filter(|s| !s.trim().is_empty()),
        start: answer.start,
        end: answer.end,
        status,
        circuits: answer
            .circuit_ids
            .into_iter()
            .filter(|id| !id.trim().is_empty())
            .map(|id| CircuitImpact::new(id.trim(), impact))
            .collect(),
        ..Default::default()
    }
}

/// [`LlmBackend`] for OpenAI-compatible chat-completion endpoints.
///
/// Configured explicitly — endpoint, model, key — rather than from
/// process environment, so isolated instances can coexist.
pub struct OpenAiBackend {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: TokenUsage,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiBackend {
    /// Backend against the hosted OpenAI endpoint.
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_endpoint("https://api.openai.com/v1/chat/completions", model, api_key)
    }

    /// Backend against a custom OpenAI-compatible endpoint.
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }
}

impl LlmBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn complete(&self, instruction: &str, content: &str) -> Result<LlmReply, LlmError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": instruction},
                {"role": "user", "content": content},
            ],
        });

        let response: ChatResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|err| LlmError::Request(err.to_string()))?
            .json()
            .map_err(|err| LlmError::Malformed(err.to_string()))?;

        let Some(choice) = response.choices.into_iter().next() else {
            return Err(LlmError::Malformed("no choices in completion".to_string()));
        };
        Ok(LlmReply {
            content: choice.message.content,
            usage: response.usage,
        })
    }
}
