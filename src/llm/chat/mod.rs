pub mod ollama;
pub mod openai;
pub mod groq;

use async_trait::async_trait;
use futures::{ Stream, Future };
use serde::{ Serialize, Deserialize };
use std::error::Error as StdError;
use std::pin::Pin;
use std::sync::Arc;
use super::{ LlmConfig, LlmType };
use self::ollama::OllamaClient;
use self::openai::OpenAIChatClient;
use self::groq::GroqChatClient;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// A lazy, finite sequence of partial-content fragments produced by a
/// streaming completion call. The stream ends when the provider signals
/// completion; an `Err` item means the provider failed mid-stream.
pub type FragmentStream = Pin<
    Box<dyn Stream<Item = Result<String, Box<dyn StdError + Send + Sync>>> + Send>
>;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub response: String,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message]
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>>;

    async fn stream_completion(
        &self,
        messages: &[Message]
    ) -> Result<FragmentStream, Box<dyn StdError + Send + Sync>>;

    fn get_model(&self) -> String;
}

pub fn create_streaming_response<F, Fut>(
    response_fn: F
) -> Result<FragmentStream, Box<dyn StdError + Send + Sync>>
    where
        F: FnOnce(mpsc::Sender<Result<String, Box<dyn StdError + Send + Sync>>>) -> Fut +
            Send +
            'static,
        Fut: Future<Output = ()> + Send + 'static
{
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        response_fn(tx).await;
    });

    Ok(Box::pin(ReceiverStream::new(rx)))
}

pub fn new_client(
    config: &LlmConfig
) -> Result<Arc<dyn ChatClient>, Box<dyn StdError + Send + Sync>> {
    let client: Arc<dyn ChatClient> = match config.llm_type {
        LlmType::Ollama => {
            let specific_client = OllamaClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::OpenAI => {
            let specific_client = OpenAIChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::Groq => {
            let specific_client = GroqChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    Ok(client)
}
