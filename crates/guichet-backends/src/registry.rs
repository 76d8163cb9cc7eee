//! Backend registry — maps provider names to endpoint presets.
//!
//! Generation runs against any OpenAI-compatible chat endpoint; embeddings
//! and span extraction additionally need an inference-pipeline endpoint,
//! which only the Hugging Face preset carries.

/// How to attach auth credentials to requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// No authentication required (local servers).
    None,
}

/// Endpoint preset for a single provider.
#[derive(Debug, Clone)]
pub struct BackendPreset {
    /// Provider identifier.
    pub name: &'static str,
    /// OpenAI-compatible base URL for chat completions.
    pub chat_base_url: &'static str,
    /// Base URL for pipeline calls (feature extraction, question answering).
    /// Empty when the provider exposes no pipeline API.
    pub pipeline_base_url: &'static str,
    /// Environment variable names to try for the API key (in order).
    pub env_keys: &'static [&'static str],
    /// How to send auth credentials.
    pub auth_style: AuthStyle,
}

static PRESETS: &[BackendPreset] = &[
    BackendPreset {
        name: "huggingface",
        chat_base_url: "https://router.huggingface.co/v1",
        pipeline_base_url: "https://api-inference.huggingface.co/models",
        env_keys: &["HF_API_TOKEN", "HUGGINGFACE_API_KEY"],
        auth_style: AuthStyle::Bearer,
    },
    BackendPreset {
        name: "openai",
        chat_base_url: "https://api.openai.com/v1",
        pipeline_base_url: "",
        env_keys: &["OPENAI_API_KEY"],
        auth_style: AuthStyle::Bearer,
    },
    BackendPreset {
        name: "ollama",
        chat_base_url: "http://localhost:11434/v1",
        pipeline_base_url: "",
        env_keys: &[],
        auth_style: AuthStyle::None,
    },
];

/// Look up a preset by provider name.
pub fn get_preset(name: &str) -> Option<&'static BackendPreset> {
    PRESETS.iter().find(|p| p.name == name)
}

/// All registered provider names.
pub fn all_provider_names() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.name).collect()
}
