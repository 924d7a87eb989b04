use crate::cli::Args;
use crate::config::prompt::{ self, PromptConfig };
use crate::github::GitHubClient;
use crate::llm::{ parse_llm_type, LlmConfig };
use crate::llm::chat::{ ChatClient, FragmentStream, Message, new_client as new_chat_client };
use crate::llm::transcribe::{
    TranscriptionClient,
    new_client as new_transcription_client,
};
use crate::models::api::{
    ActivityEntry,
    AnalyticsReport,
    FeatureUsage,
    RefactorOutcome,
    RefactorResult,
    ReviewOutcome,
    ReviewSummary,
    RiskLevel,
};
use crate::models::log::ReviewLog;
use crate::store::{ initialize_store, UsageStore };

use log::{ info, warn, error };
use serde::Deserialize;
use std::error::Error;
use std::sync::Arc;

const ACTIVITY_DESCRIPTION_LEN: usize = 50;

const REVIEW_FALLBACK_SUMMARY: &str =
    "This PR introduces new features and bug fixes. The changes appear well-structured and follow good practices.";

const REFACTOR_FALLBACK_EXPLANATION: &str =
    "Code has been refactored according to your instructions.";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelReviewReply {
    summary: String,
    risk_level: RiskLevel,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelRefactorReply {
    refactored_code: String,
    explanation: String,
}

#[derive(Clone)]
pub struct Assistant {
    chat_client: Arc<dyn ChatClient>,
    transcription_client: Arc<dyn TranscriptionClient>,
    github: Option<Arc<GitHubClient>>,
    store: Arc<dyn UsageStore>,
    prompt_config: Arc<PromptConfig>,
    recent_activity_limit: usize,
}

impl Assistant {
    pub async fn new(args: Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let chat_llm_type = parse_llm_type(&args.chat_llm_type)?;
        let chat_api_key = if !args.chat_api_key.is_empty() {
            Some(args.chat_api_key.clone())
        } else {
            None
        };
        let chat_config = LlmConfig {
            llm_type: chat_llm_type,
            base_url: args.chat_base_url.clone(),
            api_key: chat_api_key.clone(),
            completion_model: args.chat_model.clone(),
            transcription_model: None,
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={:?}, BaseURL={:?}",
            args.chat_llm_type,
            chat_config.completion_model.as_deref().unwrap_or("adapter default"),
            chat_config.base_url.as_deref().unwrap_or("adapter default")
        );

        let transcribe_llm_type = parse_llm_type(&args.transcribe_llm_type)?;
        let transcribe_api_key = args.transcribe_api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or(chat_api_key);
        let transcribe_config = LlmConfig {
            llm_type: transcribe_llm_type,
            base_url: args.transcribe_base_url.clone(),
            api_key: transcribe_api_key,
            completion_model: None,
            transcription_model: args.transcribe_model.clone(),
        };
        let transcription_client = new_transcription_client(&transcribe_config)?;
        info!(
            "Transcription client configured: Type={}, Model={:?}",
            args.transcribe_llm_type,
            transcribe_config.transcription_model.as_deref().unwrap_or("adapter default")
        );

        let github = match &args.github_token {
            Some(token) if !token.is_empty() => {
                Some(Arc::new(GitHubClient::new(token.clone(), args.github_api_url.clone())?))
            }
            _ => {
                warn!("GitHub token not configured; pull request routes will be unavailable");
                None
            }
        };

        let store = initialize_store(&args)?;
        let prompt_config = prompt::load_prompts(&args.prompts_path)?;

        Ok(Self {
            chat_client,
            transcription_client,
            github,
            store,
            prompt_config,
            recent_activity_limit: args.recent_activity_limit,
        })
    }

    pub fn with_parts(
        chat_client: Arc<dyn ChatClient>,
        transcription_client: Arc<dyn TranscriptionClient>,
        github: Option<Arc<GitHubClient>>,
        store: Arc<dyn UsageStore>,
        prompt_config: Arc<PromptConfig>,
        recent_activity_limit: usize
    ) -> Self {
        Self {
            chat_client,
            transcription_client,
            github,
            store,
            prompt_config,
            recent_activity_limit,
        }
    }

    pub fn store(&self) -> Arc<dyn UsageStore> {
        Arc::clone(&self.store)
    }

    pub fn github(&self) -> Option<&Arc<GitHubClient>> {
        self.github.as_ref()
    }

    /// Opens a streaming completion for one generation request. The returned
    /// stream yields fragments in production order; errors surface as stream
    /// items once the provider has accepted the request.
    pub async fn stream_generation(
        &self,
        user_prompt: &str
    ) -> Result<FragmentStream, Box<dyn Error + Send + Sync>> {
        let messages = vec![
            Message::system(&self.prompt_config.generate_instruction),
            Message::user(user_prompt)
        ];
        self.chat_client.stream_completion(&messages).await
    }

    pub async fn refactor(
        &self,
        code: &str,
        instructions: &str
    ) -> Result<RefactorOutcome, Box<dyn Error + Send + Sync>> {
        let messages = vec![
            Message::system(&self.prompt_config.refactor_instruction),
            Message::user(
                format!("Refactor this code: {}\n\nCode:\n```\n{}\n```", instructions, code)
            )
        ];
        let resp = self.chat_client.complete(&messages).await?;
        Ok(parse_refactor_reply(&resp.response))
    }

    pub async fn review_summary(
        &self,
        user_id: &str,
        repo: &str,
        pr_number: u64
    ) -> Result<ReviewOutcome, Box<dyn Error + Send + Sync>> {
        let mut request = format!(
            "Review PR #{} in repository {}. Provide a summary and risk level (low/medium/high). Return as JSON with 'summary' and 'riskLevel' fields.",
            pr_number,
            repo
        );

        if let Some(github) = &self.github {
            match github.pull_request(repo, pr_number).await {
                Ok(details) => {
                    request.push_str(&format!("\n\nPR title: {}", details.title));
                    if let Some(body) = details.body {
                        request.push_str(&format!("\n\nPR description:\n{}", body));
                    }
                }
                Err(e) => {
                    warn!("Could not fetch PR details for {}#{}: {}", repo, pr_number, e);
                }
            }
        }

        let messages = vec![
            Message::system(&self.prompt_config.review_instruction),
            Message::user(request)
        ];
        let resp = self.chat_client.complete(&messages).await?;
        let outcome = parse_review_reply(&resp.response);

        let review_log = ReviewLog::new(
            user_id,
            repo,
            pr_number,
            outcome.summary().risk_level.as_str()
        );
        if let Err(e) = self.store.record_review(&review_log).await {
            error!("Failed to record review log for {}#{}: {}", repo, pr_number, e);
        }

        Ok(outcome)
    }

    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        mime_type: &str
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        self.transcription_client.transcribe(audio, file_name, mime_type).await
    }

    pub async fn analytics(
        &self,
        user_id: &str
    ) -> Result<AnalyticsReport, Box<dyn Error + Send + Sync>> {
        let total_prompts = self.store.prompt_count(user_id).await?;
        let total_pr_reviews = self.store.review_count(user_id).await?;
        let recent_prompts = self.store.recent_prompts(
            user_id,
            self.recent_activity_limit
        ).await?;
        let recent_reviews = self.store.recent_reviews(
            user_id,
            self.recent_activity_limit
        ).await?;

        let average_response_time_ms = if recent_prompts.is_empty() {
            0
        } else {
            recent_prompts
                .iter()
                .map(|log| log.duration_ms)
                .sum::<u64>() / (recent_prompts.len() as u64)
        };

        let most_used_features = vec![
            FeatureUsage {
                feature: "Code Generation".to_string(),
                count: total_prompts,
            },
            FeatureUsage {
                feature: "PR Reviews".to_string(),
                count: total_pr_reviews,
            }
        ];

        let mut recent_activity: Vec<ActivityEntry> = recent_prompts
            .iter()
            .map(|log| ActivityEntry {
                id: log.id.clone(),
                kind: "prompt".to_string(),
                timestamp: log.created_at,
                description: format!(
                    "Generated code for: \"{}...\"",
                    truncate_chars(&log.prompt, ACTIVITY_DESCRIPTION_LEN)
                ),
            })
            .chain(
                recent_reviews.iter().map(|log| ActivityEntry {
                    id: log.id.clone(),
                    kind: "pr_review".to_string(),
                    timestamp: log.created_at,
                    description: format!("Reviewed PR #{} in {}", log.pr_number, log.repo),
                })
            )
            .collect();
        recent_activity.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent_activity.truncate(self.recent_activity_limit);

        Ok(AnalyticsReport {
            total_prompts,
            total_pr_reviews,
            average_response_time_ms,
            most_used_features,
            recent_activity,
        })
    }
}

fn parse_review_reply(raw: &str) -> ReviewOutcome {
    match serde_json::from_str::<ModelReviewReply>(raw) {
        Ok(reply) =>
            ReviewOutcome::Parsed(ReviewSummary {
                summary: reply.summary,
                risk_level: reply.risk_level,
            }),
        Err(_) =>
            ReviewOutcome::Fallback(ReviewSummary {
                summary: REVIEW_FALLBACK_SUMMARY.to_string(),
                risk_level: RiskLevel::Low,
            }),
    }
}

fn parse_refactor_reply(raw: &str) -> RefactorOutcome {
    match serde_json::from_str::<ModelRefactorReply>(raw) {
        Ok(reply) =>
            RefactorOutcome::Parsed(RefactorResult {
                refactored_code: reply.refactored_code,
                explanation: reply.explanation,
            }),
        Err(_) =>
            RefactorOutcome::Fallback(RefactorResult {
                refactored_code: raw.to_string(),
                explanation: REFACTOR_FALLBACK_EXPLANATION.to_string(),
            }),
    }
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_review_json_is_tagged_as_model_output() {
        let raw = r#"{"summary": "Tightens input validation.", "riskLevel": "medium"}"#;
        match parse_review_reply(raw) {
            ReviewOutcome::Parsed(s) => {
                assert_eq!(s.summary, "Tightens input validation.");
                assert_eq!(s.risk_level, RiskLevel::Medium);
            }
            ReviewOutcome::Fallback(_) => panic!("expected parsed outcome"),
        }
    }

    #[test]
    fn unparseable_review_reply_is_tagged_as_fallback() {
        match parse_review_reply("Sure! Here's my review of the PR...") {
            ReviewOutcome::Fallback(s) => {
                assert_eq!(s.summary, REVIEW_FALLBACK_SUMMARY);
                assert_eq!(s.risk_level, RiskLevel::Low);
            }
            ReviewOutcome::Parsed(_) => panic!("expected fallback outcome"),
        }
    }

    #[test]
    fn refactor_fallback_keeps_raw_reply_as_code() {
        let raw = "fn better() {}";
        match parse_refactor_reply(raw) {
            RefactorOutcome::Fallback(r) => {
                assert_eq!(r.refactored_code, raw);
                assert_eq!(r.explanation, REFACTOR_FALLBACK_EXPLANATION);
            }
            RefactorOutcome::Parsed(_) => panic!("expected fallback outcome"),
        }
    }

    #[test]
    fn refactor_json_reply_is_parsed() {
        let raw = r#"{"refactoredCode": "fn f() {}", "explanation": "Renamed."}"#;
        match parse_refactor_reply(raw) {
            RefactorOutcome::Parsed(r) => {
                assert_eq!(r.refactored_code, "fn f() {}");
                assert_eq!(r.explanation, "Renamed.");
            }
            RefactorOutcome::Fallback(_) => panic!("expected parsed outcome"),
        }
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 50), "short");
    }
}
