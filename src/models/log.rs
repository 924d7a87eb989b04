use chrono::Utc;
use serde::{ Serialize, Deserialize };
use uuid::Uuid;

/// Durable record of one completed prompt/response exchange. Written once,
/// after the response stream has fully terminated, and never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptLog {
    pub id: String,
    pub user_id: String,
    pub prompt: String,
    pub response: String,
    pub duration_ms: u64,
    pub created_at: i64,
}

impl PromptLog {
    pub fn new(user_id: &str, prompt: &str, response: &str, duration_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            prompt: prompt.to_string(),
            response: response.to_string(),
            duration_ms,
            created_at: Utc::now().timestamp(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLog {
    pub id: String,
    pub user_id: String,
    pub repo: String,
    pub pr_number: u64,
    pub risk_level: String,
    pub created_at: i64,
}

impl ReviewLog {
    pub fn new(user_id: &str, repo: &str, pr_number: u64, risk_level: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            repo: repo.to_string(),
            pr_number,
            risk_level: risk_level.to_string(),
            created_at: Utc::now().timestamp(),
        }
    }
}
