use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use async_trait::async_trait;
use std::error::Error as StdError;
use super::{ ChatClient, CompletionResponse, FragmentStream, Message, create_streaming_response };
use crate::llm::LlmConfig;
use futures::StreamExt;
use log::info;

#[derive(Debug)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
    completion_model: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct StreamResponse {
    #[serde(default)]
    message: Option<ChatResponseMessage>,
    done: bool,
}

impl OllamaClient {
    pub fn new(base_url: Option<String>, completion_model: Option<String>) -> Self {
        let model = completion_model.unwrap_or_else(|| "cogito:3b".to_string());
        let url = base_url.unwrap_or_else(|| "http://localhost:11434".into());

        Self {
            http: HttpClient::new(),
            base_url: url,
            completion_model: model,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        if config.llm_type != crate::llm::LlmType::Ollama {
            return Err("Invalid config type for OllamaClient".into());
        }

        Ok(Self::new(config.base_url.clone(), config.completion_model.clone()))
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn complete(
        &self,
        messages: &[Message]
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        let url = format!("{}/api/chat", self.base_url);
        let req = ChatRequest {
            model: self.completion_model.clone(),
            messages: messages.to_vec(),
            stream: false,
        };
        let resp = self.http.post(&url).json(&req).send().await?.error_for_status()?;
        let data = resp.json::<ChatResponse>().await?;
        Ok(CompletionResponse { response: data.message.content })
    }

    async fn stream_completion(
        &self,
        messages: &[Message]
    ) -> Result<FragmentStream, Box<dyn StdError + Send + Sync>> {
        let url = format!("{}/api/chat", self.base_url);
        let req = ChatRequest {
            model: self.completion_model.clone(),
            messages: messages.to_vec(),
            stream: true,
        };

        let client = self.http.clone();

        create_streaming_response(move |tx| async move {
            let response = match client.post(&url).json(&req).send().await {
                Ok(r) => r,
                Err(e) => {
                    let _ = tx.send(Err(Box::new(e) as _)).await;
                    return;
                }
            };

            if !response.status().is_success() {
                let err_msg = format!("HTTP error: {}", response.status());
                let _ = tx.send(
                    Err(Box::new(std::io::Error::new(std::io::ErrorKind::Other, err_msg)) as _)
                ).await;
                return;
            }

            // One JSON object per line; a line can span chunk boundaries.
            let mut stream = response.bytes_stream();
            let mut pending: Vec<u8> = Vec::new();

            while let Some(chunk_result) = stream.next().await {
                match chunk_result {
                    Ok(chunk) => {
                        pending.extend_from_slice(&chunk);

                        while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                            let raw: Vec<u8> = pending.drain(..=pos).collect();
                            let line = match std::str::from_utf8(&raw[..pos]) {
                                Ok(s) => s.trim(),
                                Err(_) => {
                                    continue;
                                }
                            };
                            if line.is_empty() {
                                continue;
                            }

                            match serde_json::from_str::<StreamResponse>(line) {
                                Ok(stream_resp) => {
                                    if let Some(message) = stream_resp.message {
                                        if !message.content.is_empty() {
                                            if tx.send(Ok(message.content)).await.is_err() {
                                                return;
                                            }
                                        }
                                    }

                                    if stream_resp.done {
                                        return;
                                    }
                                }
                                Err(e) => {
                                    info!("JSON parse error: {} for line: {}", e, line);
                                    continue;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(Box::new(e) as Box<dyn StdError + Send + Sync>)).await;
                        return;
                    }
                }
            }
        })
    }

    fn get_model(&self) -> String {
        self.completion_model.clone()
    }
}
