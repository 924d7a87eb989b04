use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::multipart::{ Form, Part };
use std::error::Error as StdError;

use super::TranscriptionClient;
use crate::llm::LlmConfig;

pub struct OpenAITranscriptionClient {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAITranscriptionClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let transcription_model = model.unwrap_or_else(|| "whisper-1".to_string());
        let api_url = base_url.unwrap_or_else(|| "https://api.openai.com".to_string());

        let http = HttpClient::builder()
            .build()
            .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)?;

        Ok(Self {
            http,
            api_key,
            model: transcription_model,
            base_url: api_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| "Transcription API key is required".to_string())?;

        Self::new(api_key, config.transcription_model.clone(), config.base_url.clone())
    }

    fn transcriptions_url(&self) -> String {
        format!("{}/v1/audio/transcriptions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TranscriptionClient for OpenAITranscriptionClient {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        mime_type: &str
    ) -> Result<String, Box<dyn StdError + Send + Sync>> {
        let file_part = Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| format!("Invalid audio mime type '{}': {}", mime_type, e))?;

        let form = Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "text");

        let resp = self.http
            .post(self.transcriptions_url())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send().await?
            .error_for_status()?;

        let transcription = resp.text().await?;
        Ok(transcription.trim_end().to_string())
    }
}
