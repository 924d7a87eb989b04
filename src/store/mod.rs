mod memory;
mod redis;

use async_trait::async_trait;
use log::info;
use std::error::Error;
use std::sync::Arc;

use crate::cli::Args;
use crate::models::log::{ PromptLog, ReviewLog };
use crate::models::settings::UserSettings;

pub use memory::MemoryStore;
pub use redis::RedisStore;

/// Durable sink for completed exchanges and per-user settings. Every write is
/// an independent insert or overwrite with no read-modify-write dependency on
/// prior state.
#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn record_prompt(&self, log: &PromptLog) -> Result<(), Box<dyn Error + Send + Sync>>;

    async fn record_review(&self, log: &ReviewLog) -> Result<(), Box<dyn Error + Send + Sync>>;

    async fn recent_prompts(
        &self,
        user_id: &str,
        limit: usize
    ) -> Result<Vec<PromptLog>, Box<dyn Error + Send + Sync>>;

    async fn recent_reviews(
        &self,
        user_id: &str,
        limit: usize
    ) -> Result<Vec<ReviewLog>, Box<dyn Error + Send + Sync>>;

    async fn prompt_count(&self, user_id: &str) -> Result<u64, Box<dyn Error + Send + Sync>>;

    async fn review_count(&self, user_id: &str) -> Result<u64, Box<dyn Error + Send + Sync>>;

    async fn get_settings(
        &self,
        user_id: &str
    ) -> Result<Option<UserSettings>, Box<dyn Error + Send + Sync>>;

    async fn put_settings(
        &self,
        user_id: &str,
        settings: &UserSettings
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

pub fn create_store(args: &Args) -> Result<Arc<dyn UsageStore>, Box<dyn Error + Send + Sync>> {
    match args.store_type.to_lowercase().as_str() {
        "redis" => {
            let store = redis::RedisStore::new(args.clone())?;
            Ok(Arc::new(store))
        }
        "memory" => Ok(Arc::new(memory::MemoryStore::new())),
        _ =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported store type: {}", args.store_type)
                    )
                )
            ),
    }
}

pub fn initialize_store(args: &Args) -> Result<Arc<dyn UsageStore>, Box<dyn Error + Send + Sync>> {
    info!("Usage logs will be stored in: {} at {}", args.store_type, args.store_url);
    create_store(args)
}
