pub mod openai;

use async_trait::async_trait;
use std::error::Error as StdError;
use std::sync::Arc;

use super::{ LlmConfig, LlmType };
use self::openai::OpenAITranscriptionClient;

#[async_trait]
pub trait TranscriptionClient: Send + Sync {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        mime_type: &str
    ) -> Result<String, Box<dyn StdError + Send + Sync>>;
}

pub fn new_client(
    config: &LlmConfig
) -> Result<Arc<dyn TranscriptionClient>, Box<dyn StdError + Send + Sync>> {
    let client: Arc<dyn TranscriptionClient> = match config.llm_type {
        LlmType::OpenAI | LlmType::Groq => {
            let specific_client = OpenAITranscriptionClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::Ollama => {
            return Err("Ollama does not expose a transcription endpoint".into());
        }
    };
    Ok(client)
}
