use serde::{ Serialize, Deserialize };

#[derive(Deserialize, Debug)]
pub struct GenerateRequest {
    pub prompt: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct RefactorRequest {
    pub code: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummaryRequest {
    pub repo: Option<String>,
    pub pr_number: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TranscriptionResponse {
    pub transcription: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub summary: String,
    pub risk_level: RiskLevel,
}

/// Review result with provenance: callers can tell genuine model output from
/// the canned fallback used when the provider reply is not parseable JSON.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "source")]
pub enum ReviewOutcome {
    #[serde(rename = "model")] Parsed(ReviewSummary),
    #[serde(rename = "fallback")] Fallback(ReviewSummary),
}

impl ReviewOutcome {
    pub fn summary(&self) -> &ReviewSummary {
        match self {
            ReviewOutcome::Parsed(s) | ReviewOutcome::Fallback(s) => s,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RefactorResult {
    pub refactored_code: String,
    pub explanation: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "source")]
pub enum RefactorOutcome {
    #[serde(rename = "model")] Parsed(RefactorResult),
    #[serde(rename = "fallback")] Fallback(RefactorResult),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FeatureUsage {
    pub feature: String,
    pub count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: i64,
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub total_prompts: u64,
    pub total_pr_reviews: u64,
    pub average_response_time_ms: u64,
    pub most_used_features: Vec<FeatureUsage>,
    pub recent_activity: Vec<ActivityEntry>,
}
