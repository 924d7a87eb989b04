use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;

use super::{ ChatClient, CompletionResponse, FragmentStream, Message, create_streaming_response };
use super::openai::{ parse_stream_line, StreamLine };
use crate::llm::LlmConfig;

pub struct GroqChatClient {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct GroqRequest {
    messages: Vec<Message>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
}

#[derive(Deserialize)]
struct GroqChoice {
    message: GroqResponseMessage,
}

#[derive(Deserialize)]
struct GroqResponseMessage {
    content: String,
}

impl GroqChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let chat_model = model.unwrap_or_else(|| "llama-3.1-8b-instruct".to_string());
        let api_url = base_url.unwrap_or_else(|| "https://api.groq.com".to_string());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e|
                format!("Invalid API key format: {}", e)
            )?
        );

        let http = HttpClient::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)?;

        Ok(Self {
            http,
            api_key,
            model: chat_model,
            base_url: api_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| "Groq API key is required".to_string())?;

        Self::new(api_key, config.completion_model.clone(), config.base_url.clone())
    }

    fn completions_url(&self) -> String {
        format!("{}/openai/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatClient for GroqChatClient {
    async fn complete(
        &self,
        messages: &[Message]
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        let req = GroqRequest {
            messages: messages.to_vec(),
            model: self.model.clone(),
            temperature: 0.3,
            max_tokens: 2048,
            stream: None,
        };

        let resp = self.http
            .post(self.completions_url())
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&req)
            .send().await?
            .error_for_status()?
            .json::<GroqResponse>().await?;

        let content = resp.choices
            .first()
            .ok_or_else(|| "No response from Groq API".to_string())?
            .message.content.clone();

        Ok(CompletionResponse { response: content })
    }

    async fn stream_completion(
        &self,
        messages: &[Message]
    ) -> Result<FragmentStream, Box<dyn StdError + Send + Sync>> {
        let url = self.completions_url();
        let req = GroqRequest {
            messages: messages.to_vec(),
            model: self.model.clone(),
            temperature: 0.7,
            max_tokens: 2048,
            stream: Some(true),
        };

        let client = self.http.clone();
        let auth_header = format!("Bearer {}", self.api_key);

        create_streaming_response(move |tx| async move {
            let resp = match client.post(&url).header(AUTHORIZATION, auth_header).json(&req).send().await {
                Ok(r) => r,
                Err(e) => {
                    let _ = tx.send(Err(Box::new(e) as _)).await;
                    return;
                }
            };

            if let Err(e) = resp.error_for_status_ref() {
                let _ = tx.send(Err(Box::new(e) as _)).await;
                return;
            }

            // Groq speaks the OpenAI SSE wire format, so the same line parser
            // applies.
            let mut stream = resp.bytes_stream();
            let mut pending: Vec<u8> = Vec::new();

            while let Some(chunk_result) = stream.next().await {
                match chunk_result {
                    Ok(chunk) => {
                        pending.extend_from_slice(&chunk);

                        while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                            let raw: Vec<u8> = pending.drain(..=pos).collect();
                            let line = match std::str::from_utf8(&raw[..pos]) {
                                Ok(s) => s.trim_end_matches('\r'),
                                Err(_) => {
                                    continue;
                                }
                            };

                            match parse_stream_line(line) {
                                Some(StreamLine::Content(content)) => {
                                    if tx.send(Ok(content)).await.is_err() {
                                        return;
                                    }
                                }
                                Some(StreamLine::Done) => {
                                    return;
                                }
                                None => {}
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(Box::new(e) as _)).await;
                        return;
                    }
                }
            }
        })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}
