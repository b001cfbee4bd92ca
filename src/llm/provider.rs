use std::time::{Duration, Instant};

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse, FinishReason,
    },
    Client,
};
use tracing::{debug, info};

use crate::config::{parse_llm_provider_model, LlmConfig};
use crate::error::{QuillError, Result};
use crate::models::{GenerationMetadata, ProcessingOptions};

use super::prompts::{study_notes_prompt, SYSTEM_PROMPT};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
const LMSTUDIO_BASE_URL: &str = "http://localhost:1234/v1";

const GENERATION_TEMPERATURE: f32 = 0.7;
const GENERATION_MAX_TOKENS: u32 = 2000;

/// Output of one generation call.
#[derive(Debug, Clone)]
pub struct GeneratedNotes {
    pub notes: String,
    pub metadata: GenerationMetadata,
}

/// OpenAI-compatible client that turns extracted text into study notes.
///
/// Works against any provider speaking the chat-completions API. The
/// provider prefix of the model name selects the default base URL;
/// `LLM_BASE_URL` overrides it.
#[derive(Clone)]
pub struct NoteGenerator {
    client: Client<OpenAIConfig>,
    model: String,
}

impl NoteGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let (provider, model) = parse_llm_provider_model(&config.model);

        let needs_api_key = !matches!(
            provider.to_lowercase().as_str(),
            "ollama" | "local" | "lmstudio"
        );
        if needs_api_key && config.api_key.is_none() {
            return Err(QuillError::Generation(format!(
                "API key required for provider '{provider}'"
            )));
        }

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(provider).to_string());

        let model = if provider.eq_ignore_ascii_case("local") {
            config.model.clone()
        } else {
            model.to_string()
        };

        let openai_config = OpenAIConfig::new()
            .with_api_base(base_url)
            .with_api_key(config.api_key.clone().unwrap_or_default());

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QuillError::Generation(format!("Failed to create HTTP client: {e}")))?;

        // Cap async-openai's internal backoff at our timeout. Its default
        // retries server errors for up to 15 minutes.
        let backoff = backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(config.timeout_secs)),
            ..Default::default()
        };

        let client = Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(backoff);

        info!(model = %model, provider = %provider, "note generator initialized");

        Ok(Self { client, model })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generates study notes from extracted text. One attempt; the caller
    /// decides whether a failed run is retried.
    pub async fn generate(
        &self,
        text: &str,
        options: &ProcessingOptions,
    ) -> Result<GeneratedNotes> {
        if text.trim().is_empty() {
            return Err(QuillError::Validation(
                "Cannot generate notes from empty text".to_string(),
            ));
        }

        let request = self.build_request(text, options)?;
        let started = Instant::now();

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        let duration_ms = started.elapsed().as_millis() as u64;
        let finish_reason = response
            .choices
            .first()
            .and_then(|c| c.finish_reason)
            .map(finish_reason_label);
        let notes = extract_content(response)?;

        debug!(
            input_length = text.len(),
            output_length = notes.len(),
            duration_ms,
            "notes generated"
        );

        Ok(GeneratedNotes {
            metadata: GenerationMetadata {
                model: self.model.clone(),
                input_length: text.len(),
                output_length: notes.len(),
                finish_reason,
                duration_ms,
            },
            notes,
        })
    }

    fn build_request(
        &self,
        text: &str,
        options: &ProcessingOptions,
    ) -> Result<CreateChatCompletionRequest> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| QuillError::Validation(format!("Invalid system prompt: {e}")))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(study_notes_prompt(text, options))
                .build()
                .map_err(|e| QuillError::Validation(format!("Invalid user prompt: {e}")))?
                .into(),
        ];

        CreateChatCompletionRequestArgs::default()
            .model(self.model.clone())
            .messages(messages)
            .temperature(GENERATION_TEMPERATURE)
            .max_tokens(GENERATION_MAX_TOKENS)
            .build()
            .map_err(|e| QuillError::Validation(format!("Invalid generation request: {e}")))
    }
}

fn default_base_url(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "openrouter" => OPENROUTER_BASE_URL,
        "ollama" => OLLAMA_BASE_URL,
        "lmstudio" => LMSTUDIO_BASE_URL,
        _ => OPENAI_BASE_URL,
    }
}

fn finish_reason_label(reason: FinishReason) -> String {
    match reason {
        FinishReason::Stop => "stop".to_string(),
        FinishReason::Length => "length".to_string(),
        FinishReason::ContentFilter => "content_filter".to_string(),
        FinishReason::ToolCalls => "tool_calls".to_string(),
        FinishReason::FunctionCall => "function_call".to_string(),
    }
}

fn extract_content(response: CreateChatCompletionResponse) -> Result<String> {
    let content = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| QuillError::Generation("Response contained no choices".to_string()))?
        .message
        .content
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(QuillError::Generation(
            "Response contained empty content".to_string(),
        ));
    }

    Ok(content)
}

fn map_openai_error(error: OpenAIError) -> QuillError {
    match error {
        OpenAIError::ApiError(api_error) if is_auth_error(&api_error) => {
            QuillError::Generation(format!("Authentication failed: {api_error}"))
        }
        OpenAIError::ApiError(api_error) if is_rate_limit_error(&api_error) => {
            QuillError::Generation(format!("Rate limited: {api_error}"))
        }
        OpenAIError::ApiError(api_error) => QuillError::Generation(format!("API error: {api_error}")),
        OpenAIError::Reqwest(e) => QuillError::Generation(format!("Request failed: {e}")),
        OpenAIError::JSONDeserialize(e) => {
            QuillError::Generation(format!("Failed to parse response: {e}"))
        }
        OpenAIError::InvalidArgument(message) => QuillError::Validation(message),
        other => QuillError::Generation(other.to_string()),
    }
}

fn is_auth_error(api_error: &ApiError) -> bool {
    let message = api_error.message.to_lowercase();
    let code = api_error.code.clone().unwrap_or_default().to_lowercase();
    let error_type = api_error.r#type.clone().unwrap_or_default().to_lowercase();

    message.contains("unauthorized")
        || message.contains("invalid api key")
        || message.contains("authentication")
        || code.contains("invalid_api_key")
        || error_type.contains("authentication")
}

fn is_rate_limit_error(api_error: &ApiError) -> bool {
    let message = api_error.message.to_lowercase();
    let code = api_error.code.clone().unwrap_or_default().to_lowercase();

    message.contains("rate limit")
        || message.contains("too many requests")
        || code.contains("rate_limit")
        || code == "insufficient_quota"
}
