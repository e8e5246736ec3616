//! Plain-text and schema-validated LLM invocation with retry and
//! markdown-fenced-JSON recovery, against an OpenAI-compatible
//! chat-completions endpoint.

use std::time::Duration;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use agentic_prompt::PromptLoader;
use agentic_types::{ApiKey, Message};

use crate::error::LlmError;
use crate::usage::LlmUsage;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BASE: Duration = Duration::from_millis(500);

/// Either a plain string or a sequence of tagged conversational messages.
pub enum PromptInput {
    Text(String),
    Messages(Vec<Message>),
}

impl From<String> for PromptInput {
    fn from(value: String) -> Self {
        PromptInput::Text(value)
    }
}

impl From<&str> for PromptInput {
    fn from(value: &str) -> Self {
        PromptInput::Text(value.to_string())
    }
}

impl From<Vec<Message>> for PromptInput {
    fn from(value: Vec<Message>) -> Self {
        PromptInput::Messages(value)
    }
}

/// Per-call overrides. Fields left `None` fall back to the provider's
/// own configured defaults.
#[derive(Debug, Clone)]
pub struct InvokeOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

impl Default for InvokeOptions {
    fn default() -> Self {
        Self { model: None, temperature: None, max_tokens: None, timeout: Duration::from_secs(60) }
    }
}

/// Construction parameters for [`LlmProvider`].
pub struct LlmProviderConfig {
    pub api_key: ApiKey,
    pub model: String,
    /// Overrides the chat-completions endpoint. Tests point this at a
    /// `wiremock` server instead of the real OpenAI API.
    pub base_url: Option<String>,
    pub prompt_loader: PromptLoader,
}

/// An OpenAI-compatible chat-completions client offering plain and
/// schema-validated invocation.
pub struct LlmProvider {
    client: reqwest::Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
    prompt_loader: PromptLoader,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl LlmProvider {
    pub fn new(config: LlmProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key,
            model: config.model,
            base_url: config.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            prompt_loader: config.prompt_loader,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE,
        }
    }

    /// Plain-text invocation. Retries transport failures up to
    /// `max_retries` times with exponential backoff.
    pub async fn invoke(&self, prompt: impl Into<PromptInput>, options: &InvokeOptions) -> Result<(String, LlmUsage), LlmError> {
        let messages = self.build_messages(prompt.into())?;
        let mut last_err = None;
        for attempt in 1..=self.max_retries {
            match self.send_chat_completion(&messages, false, options).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "llm invoke failed, retrying");
                    last_err = Some(e);
                    if attempt < self.max_retries {
                        tokio::time::sleep(self.retry_base_delay * 2u32.pow(attempt - 1)).await;
                    }
                }
            }
        }
        Err(last_err.expect("loop runs at least once since max_retries >= 1"))
    }

    /// Schema-validated invocation. `T` doubles as the schema — its
    /// `JsonSchema` impl is what the Planner describes to the model, and
    /// its `Deserialize` impl is the validation step itself: a response
    /// that does not deserialize into `T` is, by construction, a
    /// response that fails `T`'s schema.
    pub async fn invoke_structured<T>(&self, prompt: impl Into<PromptInput>, options: &InvokeOptions) -> Result<(T, LlmUsage), LlmError>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let messages = self.build_messages(prompt.into())?;
        let mut last_raw = String::new();
        let mut last_transport_err: Option<LlmError> = None;

        for attempt in 1..=self.max_retries {
            match self.send_chat_completion(&messages, true, options).await {
                Ok((raw, usage)) => {
                    last_raw = raw.clone();
                    last_transport_err = None;
                    if let Some(value) = parse_structured::<T>(&raw) {
                        return Ok((value, usage));
                    }
                    tracing::warn!(attempt, "invoke_structured: response failed to parse/validate, retrying");
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "invoke_structured: transport error, retrying");
                    last_transport_err = Some(e);
                }
            }
            if attempt < self.max_retries {
                tokio::time::sleep(self.retry_base_delay * 2u32.pow(attempt - 1)).await;
            }
        }

        if let Some(e) = last_transport_err {
            return Err(e);
        }
        Err(LlmError::StructuredParse { last_response: last_raw })
    }

    fn build_messages(&self, prompt: PromptInput) -> Result<Vec<Value>, LlmError> {
        let base = self.prompt_loader.load()?;
        let mut messages = vec![serde_json::json!({ "role": "system", "content": base })];
        match prompt {
            PromptInput::Text(text) => messages.push(serde_json::json!({ "role": "user", "content": text })),
            PromptInput::Messages(history) => messages.extend(history.iter().map(message_to_json)),
        }
        Ok(messages)
    }

    async fn send_chat_completion(&self, messages: &[Value], json_mode: bool, options: &InvokeOptions) -> Result<(String, LlmUsage), LlmError> {
        let mut body = serde_json::json!({
            "model": options.model.clone().unwrap_or_else(|| self.model.clone()),
            "messages": messages,
        });
        if let Some(temperature) = options.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        if json_mode {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(self.api_key.expose())
            .timeout(options.timeout)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Transport(format!("chat completion endpoint returned {status}: {text}")));
        }

        let value: Value = response.json().await?;
        let usage = LlmUsage::from_response(&value);
        let content = value["choices"][0]["message"]["content"].as_str().unwrap_or_default().to_string();
        Ok((content, usage))
    }
}

fn message_to_json(message: &Message) -> Value {
    match message {
        Message::System { content } => serde_json::json!({ "role": "system", "content": content }),
        Message::Human { content } => serde_json::json!({ "role": "user", "content": content }),
        Message::Assistant { content } => serde_json::json!({ "role": "assistant", "content": content }),
        Message::Tool { content, .. } => serde_json::json!({ "role": "tool", "content": content }),
    }
}

/// Step 2-4 of the structured-output retry protocol: parse the raw body
/// directly, fall back to its first fenced code block, then validate by
/// attempting to deserialize into `T`.
fn parse_structured<T: DeserializeOwned>(raw: &str) -> Option<T> {
    if let Some(value) = try_value(raw.trim()) {
        if let Ok(parsed) = serde_json::from_value(value) {
            return Some(parsed);
        }
    }
    if let Some(fenced) = extract_fenced_block(raw) {
        if let Some(value) = try_value(fenced.trim()) {
            if let Ok(parsed) = serde_json::from_value(value) {
                return Some(parsed);
            }
        }
    }
    None
}

fn try_value(raw: &str) -> Option<Value> {
    serde_json::from_str(raw).ok()
}

/// Find the first ```-delimited block and return its inner text, after
/// skipping an optional language tag on the fence's own line.
fn extract_fenced_block(raw: &str) -> Option<&str> {
    let fence_start = raw.find("```")?;
    let after_open = &raw[fence_start + 3..];
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_open[body_start..];
    let fence_end = body.find("```")?;
    Some(&body[..fence_end])
}
