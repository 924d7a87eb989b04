use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use log::info;

#[derive(Debug)]
pub enum PromptError {
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

/// System instructions for each assistant operation. Any subset can be
/// overridden from a JSON file; omitted entries keep the built-in text.
#[derive(Deserialize, Debug, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_generate_instruction")]
    pub generate_instruction: String,
    #[serde(default = "default_refactor_instruction")]
    pub refactor_instruction: String,
    #[serde(default = "default_review_instruction")]
    pub review_instruction: String,
}

fn default_generate_instruction() -> String {
    "You are a helpful AI programming assistant. Provide clear, concise, and practical code solutions.".to_string()
}

fn default_refactor_instruction() -> String {
    "You are a code refactoring expert. Provide refactored code with clear explanations of changes. Return the response in JSON format with 'refactoredCode' and 'explanation' fields.".to_string()
}

fn default_review_instruction() -> String {
    "You are a senior software engineer reviewing pull requests. Provide a concise summary and risk assessment.".to_string()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            generate_instruction: default_generate_instruction(),
            refactor_instruction: default_refactor_instruction(),
            review_instruction: default_review_instruction(),
        }
    }
}

pub fn load_prompts(path: &str) -> Result<Arc<PromptConfig>, PromptError> {
    if !Path::new(path).exists() {
        info!("Prompt config '{}' not found, using built-in instructions", path);
        return Ok(Arc::new(PromptConfig::default()));
    }

    let content = fs::read_to_string(path)?;
    let config: PromptConfig = serde_json::from_str(&content)?;
    info!("Loaded prompt configuration from: {}", path);
    Ok(Arc::new(config))
}
