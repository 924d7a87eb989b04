use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (ollama, openai, groq)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "openai")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "CHAT_BASE_URL")]
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., gpt-4o, llama3)
    #[arg(long, env = "CHAT_MODEL")]
    pub chat_model: Option<String>,

    // --- Transcription Provider Args ---
    /// Type of provider for voice transcription (openai, groq)
    #[arg(long, env = "TRANSCRIBE_LLM_TYPE", default_value = "openai")]
    pub transcribe_llm_type: String,

    /// Base URL for the transcription provider API. Defaults to the provider's public endpoint.
    #[arg(long, env = "TRANSCRIBE_BASE_URL")]
    pub transcribe_base_url: Option<String>,

    /// API Key for the transcription provider. Defaults to CHAT_API_KEY if not set.
    #[arg(long, env = "TRANSCRIBE_API_KEY")]
    pub transcribe_api_key: Option<String>,

    /// Model name for transcription (e.g., whisper-1)
    #[arg(long, env = "TRANSCRIBE_MODEL")]
    pub transcribe_model: Option<String>,

    // --- GitHub Args ---
    /// Personal access token used for listing and reviewing pull requests.
    #[arg(long, env = "GITHUB_TOKEN")]
    pub github_token: Option<String>,

    /// Override for the GitHub REST API base URL (e.g., a GitHub Enterprise host).
    #[arg(long, env = "GITHUB_API_URL")]
    pub github_api_url: Option<String>,

    // --- Store Args ---
    /// Usage store type (redis, memory)
    #[arg(long, env = "STORE_TYPE", default_value = "redis")]
    pub store_type: String,

    /// Usage store host endpoint (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "STORE_URL", default_value = "redis://127.0.0.1:6379")]
    pub store_url: String,

    /// Prefix for store keys.
    #[arg(long, env = "STORE_KEY_PREFIX", default_value = "devpilot:")]
    pub store_key_prefix: String,

    // --- General App Args ---
    /// Path to the prompt instruction configuration file.
    #[arg(long, env = "PROMPTS_PATH", default_value = "json/prompts.json")]
    pub prompts_path: String,

    /// Comma-separated bearer-token to user-id pairs (token=user) accepted by the API.
    #[arg(long, env = "AUTH_TOKENS", default_value = "")]
    pub auth_tokens: String,

    /// Number of entries returned in the analytics recent-activity feed.
    #[arg(long, env = "RECENT_ACTIVITY_LIMIT", default_value = "10")]
    pub recent_activity_limit: usize,
}
