use serde::{ Serialize, Deserialize };

const THEMES: [&str; 3] = ["light", "dark", "system"];

/// Per-user feature toggles and credentials, persisted through the usage
/// store so they survive restarts and multiple instances.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(default = "default_true")]
    pub enable_voice_control: bool,
    #[serde(default = "default_true")]
    pub enable_pr_reviews: bool,
    #[serde(default = "default_true")]
    pub enable_analytics: bool,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_api_key: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_theme() -> String {
    "system".to_string()
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            enable_voice_control: true,
            enable_pr_reviews: true,
            enable_analytics: true,
            theme: default_theme(),
            github_token: None,
            llm_api_key: None,
        }
    }
}

impl UserSettings {
    /// Clamps free-form input to valid values; unknown themes fall back to
    /// "system".
    pub fn normalized(mut self) -> Self {
        if !THEMES.contains(&self.theme.as_str()) {
            self.theme = default_theme();
        }
        self
    }
}
