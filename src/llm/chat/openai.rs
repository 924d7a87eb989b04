use futures::StreamExt;
use log::info;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use async_trait::async_trait;

use super::{ ChatClient, CompletionResponse, FragmentStream, Message, create_streaming_response };
use crate::llm::LlmConfig;

const STREAM_TEMPERATURE: f32 = 0.7;
const COMPLETE_TEMPERATURE: f32 = 0.3;

pub struct OpenAIChatClient {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct OpenAIStreamResponse {
    choices: Vec<OpenAIStreamChoice>,
}

#[derive(Deserialize)]
struct OpenAIStreamChoice {
    delta: OpenAIDelta,
    #[serde(rename = "finish_reason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIDelta {
    content: Option<String>,
}

pub(crate) enum StreamLine {
    Content(String),
    Done,
}

/// Parses one `data:` line of an OpenAI-compatible SSE stream. Returns `None`
/// for blank lines, unparseable payloads, and deltas without content.
pub(crate) fn parse_stream_line(line: &str) -> Option<StreamLine> {
    if line.is_empty() {
        return None;
    }
    if line == "data: [DONE]" {
        return Some(StreamLine::Done);
    }

    let data = line.strip_prefix("data: ")?;
    match serde_json::from_str::<OpenAIStreamResponse>(data) {
        Ok(stream_resp) => {
            for choice in stream_resp.choices {
                if let Some(content) = choice.delta.content {
                    if !content.is_empty() {
                        return Some(StreamLine::Content(content));
                    }
                }
                if let Some(reason) = &choice.finish_reason {
                    if reason == "stop" {
                        return Some(StreamLine::Done);
                    }
                }
            }
            None
        }
        Err(e) => {
            info!("JSON parse error: {} for data: {}", e, data);
            None
        }
    }
}

impl OpenAIChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let chat_model = model.unwrap_or_else(|| "gpt-4o".to_string());
        let api_url = base_url.unwrap_or_else(||
            "https://api.openai.com/v1/chat/completions".to_string()
        );
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
            .ok_or_else(|| "OpenAI API key is required".to_string())?;

        Self::new(api_key, config.completion_model.clone(), config.base_url.clone())
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(
        &self,
        messages: &[Message]
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        let url = self.base_url.trim_end_matches('/').to_string();

        let req = OpenAIChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            temperature: COMPLETE_TEMPERATURE,
            max_tokens: Some(2048),
            stream: None,
        };

        let resp = self.http
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&req)
            .send().await?
            .error_for_status()?
            .json::<OpenAIResponse>().await?;

        let content = resp.choices
            .first()
            .ok_or_else(|| "No response from OpenAI API".to_string())?
            .message.content.clone();

        Ok(CompletionResponse { response: content })
    }

    async fn stream_completion(
        &self,
        messages: &[Message]
    ) -> Result<FragmentStream, Box<dyn StdError + Send + Sync>> {
        let url = self.base_url.trim_end_matches('/').to_string();

        let req = OpenAIChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            temperature: STREAM_TEMPERATURE,
            max_tokens: Some(2048),
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

            let mut stream = resp.bytes_stream();
            // SSE lines can split across chunk boundaries, so unfinished bytes
            // carry over to the next chunk.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_content_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hel"},"finish_reason":null}]}"#;
        match parse_stream_line(line) {
            Some(StreamLine::Content(c)) => assert_eq!(c, "Hel"),
            _ => panic!("expected content"),
        }
    }

    #[test]
    fn done_sentinel_ends_stream() {
        assert!(matches!(parse_stream_line("data: [DONE]"), Some(StreamLine::Done)));
    }

    #[test]
    fn stop_reason_ends_stream() {
        let line = r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        assert!(matches!(parse_stream_line(line), Some(StreamLine::Done)));
    }

    #[test]
    fn skips_blank_and_malformed_lines() {
        assert!(parse_stream_line("").is_none());
        assert!(parse_stream_line(": keep-alive").is_none());
        assert!(parse_stream_line("data: not json").is_none());
    }

    #[test]
    fn skips_empty_content_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":""},"finish_reason":null}]}"#;
        assert!(parse_stream_line(line).is_none());
    }
}
