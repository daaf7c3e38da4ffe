pub const THESYS_HOST: &str = "https://api.thesys.dev/v1/embed";
pub const DEFAULT_MODEL: &str = "c1/anthropic/claude-3.5-sonnet/v-20250617";
pub const DEFAULT_MAX_ROUNDS: usize = 10;

/// Settings for an OpenAI-compatible chat completion service
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    /// Upper bound on completion requests per reply, tool rounds included
    pub max_rounds: usize,
}

impl CompletionConfig {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            host: THESYS_HOST.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}
