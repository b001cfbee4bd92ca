use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub upload: UploadConfig,
    pub ocr: OcrConfig,
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    /// Auth token for remote libsql databases.
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory where uploaded images are stored.
    pub dir: String,
    /// Maximum accepted upload size in bytes.
    pub max_file_size: usize,
    /// Accepted MIME types for uploads.
    pub allowed_types: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Comma-separated ISO 639-2 language codes passed to Tesseract.
    pub languages: String,
    /// Hard bound on a single recognition pass.
    pub timeout_secs: u64,
    /// Below this confidence the extractor re-runs with an alternate
    /// page-segmentation mode and keeps the better result.
    pub retry_confidence: f32,
    /// Apply heuristic character-confusion correction to extracted text.
    /// Lossy; off by default.
    pub fix_confusions: bool,
    pub max_image_dimension: u32,
    pub min_image_dimension: u32,
}

/// LLM configuration for the note generation backend.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("QUILL_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("QUILL_PORT", 5002),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "file:quill.db".to_string()),
                auth_token: env::var("DATABASE_AUTH_TOKEN").ok(),
            },
            upload: UploadConfig {
                dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
                max_file_size: parse_env_or("MAX_FILE_SIZE", 10 * 1024 * 1024),
                allowed_types: env::var("ALLOWED_FILE_TYPES")
                    .map(|types| types.split(',').map(|s| s.trim().to_string()).collect())
                    .unwrap_or_else(|_| {
                        ["image/jpeg", "image/png", "image/gif", "image/webp"]
                            .iter()
                            .map(|s| s.to_string())
                            .collect()
                    }),
            },
            ocr: OcrConfig {
                languages: env::var("OCR_LANGUAGES").unwrap_or_else(|_| "eng".to_string()),
                timeout_secs: parse_env_or("OCR_TIMEOUT", 60),
                retry_confidence: parse_env_or("OCR_RETRY_CONFIDENCE", 70.0),
                fix_confusions: parse_env_or("OCR_FIX_CONFUSIONS", false),
                max_image_dimension: parse_env_or("OCR_MAX_DIMENSION", 4096),
                min_image_dimension: parse_env_or("OCR_MIN_DIMENSION", 50),
            },
            llm: env::var("LLM_MODEL").ok().map(|model| LlmConfig {
                model,
                api_key: env::var("LLM_API_KEY").ok(),
                base_url: env::var("LLM_BASE_URL").ok(),
                timeout_secs: parse_env_or("LLM_TIMEOUT", 120),
            }),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known LLM providers that use OpenAI-compatible APIs.
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse an LLM model name into a (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}
