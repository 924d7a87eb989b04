use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;
use tokio::sync::Mutex;

use crate::models::log::{ PromptLog, ReviewLog };
use crate::models::settings::UserSettings;
use crate::store::UsageStore;

/// In-process store for development and tests. Logs are kept newest-first to
/// match the Redis list ordering.
#[derive(Default)]
pub struct MemoryStore {
    prompts: Mutex<HashMap<String, Vec<PromptLog>>>,
    reviews: Mutex<HashMap<String, Vec<ReviewLog>>>,
    settings: Mutex<HashMap<String, UserSettings>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageStore for MemoryStore {
    async fn record_prompt(&self, log: &PromptLog) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut prompts = self.prompts.lock().await;
        prompts.entry(log.user_id.clone()).or_default().insert(0, log.clone());
        Ok(())
    }

    async fn record_review(&self, log: &ReviewLog) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut reviews = self.reviews.lock().await;
        reviews.entry(log.user_id.clone()).or_default().insert(0, log.clone());
        Ok(())
    }

    async fn recent_prompts(
        &self,
        user_id: &str,
        limit: usize
    ) -> Result<Vec<PromptLog>, Box<dyn Error + Send + Sync>> {
        let prompts = self.prompts.lock().await;
        Ok(
            prompts
                .get(user_id)
                .map(|logs| logs.iter().take(limit).cloned().collect())
                .unwrap_or_default()
        )
    }

    async fn recent_reviews(
        &self,
        user_id: &str,
        limit: usize
    ) -> Result<Vec<ReviewLog>, Box<dyn Error + Send + Sync>> {
        let reviews = self.reviews.lock().await;
        Ok(
            reviews
                .get(user_id)
                .map(|logs| logs.iter().take(limit).cloned().collect())
                .unwrap_or_default()
        )
    }

    async fn prompt_count(&self, user_id: &str) -> Result<u64, Box<dyn Error + Send + Sync>> {
        let prompts = self.prompts.lock().await;
        Ok(prompts.get(user_id).map(|logs| logs.len() as u64).unwrap_or(0))
    }

    async fn review_count(&self, user_id: &str) -> Result<u64, Box<dyn Error + Send + Sync>> {
        let reviews = self.reviews.lock().await;
        Ok(reviews.get(user_id).map(|logs| logs.len() as u64).unwrap_or(0))
    }

    async fn get_settings(
        &self,
        user_id: &str
    ) -> Result<Option<UserSettings>, Box<dyn Error + Send + Sync>> {
        let settings = self.settings.lock().await;
        Ok(settings.get(user_id).cloned())
    }

    async fn put_settings(
        &self,
        user_id: &str,
        settings: &UserSettings
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut stored = self.settings.lock().await;
        stored.insert(user_id.to_string(), settings.clone());
        Ok(())
    }
}
