pub mod assistant;
pub mod cli;
pub mod config;
pub mod github;
pub mod llm;
pub mod models;
pub mod server;
pub mod sse;
pub mod store;

use assistant::Assistant;
use cli::Args;
use log::{ info, warn };
use server::Server;
use server::auth::StaticTokenResolver;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Transcription Type: {}", args.transcribe_llm_type);
    info!("Store Type: {}", args.store_type);
    info!("Store URL: {}", args.store_url);
    info!("GitHub Configured: {}", args.github_token.as_deref().map_or(false, |t| !t.is_empty()));
    info!("Prompts Path: {}", args.prompts_path);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let resolver = StaticTokenResolver::from_token_list(&args.auth_tokens);
    if resolver.is_empty() {
        warn!("No auth tokens configured; every request will be rejected as unauthorized");
    }

    let assistant = Arc::new(Assistant::new(args.clone()).await?);
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, assistant, Arc::new(resolver), args);
    server.run().await?;

    Ok(())
}
