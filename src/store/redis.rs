use async_trait::async_trait;
use log::error;
use redis::{ Client, AsyncCommands };
use std::error::Error;

use crate::cli::Args;
use crate::models::log::{ PromptLog, ReviewLog };
use crate::models::settings::UserSettings;
use crate::store::UsageStore;

pub struct RedisStore {
    client: Client,
    key_prefix: String,
}

impl RedisStore {
    pub fn new(args: Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(Self {
            client: Client::open(args.store_url.as_str())?,
            key_prefix: args.store_key_prefix,
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn prompts_key(&self, user_id: &str) -> String {
        format!("{}prompts:{}", self.key_prefix, user_id)
    }

    fn reviews_key(&self, user_id: &str) -> String {
        format!("{}reviews:{}", self.key_prefix, user_id)
    }

    fn settings_key(&self, user_id: &str) -> String {
        format!("{}settings:{}", self.key_prefix, user_id)
    }
}

#[async_trait]
impl UsageStore for RedisStore {
    async fn record_prompt(&self, log: &PromptLog) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let json_log = serde_json::to_string(log)?;
        let _: i64 = conn.lpush(self.prompts_key(&log.user_id), &json_log).await?;
        Ok(())
    }

    async fn record_review(&self, log: &ReviewLog) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let json_log = serde_json::to_string(log)?;
        let _: i64 = conn.lpush(self.reviews_key(&log.user_id), &json_log).await?;
        Ok(())
    }

    async fn recent_prompts(
        &self,
        user_id: &str,
        limit: usize
    ) -> Result<Vec<PromptLog>, Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let json_entries: Vec<String> = conn.lrange(
            self.prompts_key(user_id),
            0,
            (limit as isize) - 1
        ).await?;

        let mut logs = Vec::new();
        for json_entry in &json_entries {
            match serde_json::from_str::<PromptLog>(json_entry) {
                Ok(log) => logs.push(log),
                Err(e) => {
                    error!("Error parsing prompt log entry: {}", e);
                }
            }
        }
        Ok(logs)
    }

    async fn recent_reviews(
        &self,
        user_id: &str,
        limit: usize
    ) -> Result<Vec<ReviewLog>, Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let json_entries: Vec<String> = conn.lrange(
            self.reviews_key(user_id),
            0,
            (limit as isize) - 1
        ).await?;

        let mut logs = Vec::new();
        for json_entry in &json_entries {
            match serde_json::from_str::<ReviewLog>(json_entry) {
                Ok(log) => logs.push(log),
                Err(e) => {
                    error!("Error parsing review log entry: {}", e);
                }
            }
        }
        Ok(logs)
    }

    async fn prompt_count(&self, user_id: &str) -> Result<u64, Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let count: u64 = conn.llen(self.prompts_key(user_id)).await?;
        Ok(count)
    }

    async fn review_count(&self, user_id: &str) -> Result<u64, Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let count: u64 = conn.llen(self.reviews_key(user_id)).await?;
        Ok(count)
    }

    async fn get_settings(
        &self,
        user_id: &str
    ) -> Result<Option<UserSettings>, Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let stored: Option<String> = conn.get(self.settings_key(user_id)).await?;
        match stored {
            Some(json_settings) => Ok(Some(serde_json::from_str(&json_settings)?)),
            None => Ok(None),
        }
    }

    async fn put_settings(
        &self,
        user_id: &str,
        settings: &UserSettings
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let json_settings = serde_json::to_string(settings)?;
        let _: () = conn.set(self.settings_key(user_id), json_settings).await?;
        Ok(())
    }
}
