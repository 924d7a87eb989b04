#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use devpilot::assistant::Assistant;
use devpilot::config::prompt::PromptConfig;
use devpilot::llm::chat::{
    create_streaming_response,
    ChatClient,
    CompletionResponse,
    FragmentStream,
    Message,
};
use devpilot::llm::transcribe::TranscriptionClient;
use devpilot::server::api::{ build_router, AppState };
use devpilot::server::auth::StaticTokenResolver;
use devpilot::store::{ MemoryStore, UsageStore };
use std::error::Error as StdError;
use std::sync::Arc;
use std::sync::atomic::{ AtomicUsize, Ordering };

pub const TEST_TOKEN: &str = "s3cret";
pub const TEST_USER: &str = "user-1";

/// Scripted stand-in for a completion provider.
#[derive(Default)]
pub struct MockChatClient {
    pub fragments: Vec<String>,
    pub completion: String,
    pub fail_on_open: bool,
    pub fail_mid_stream: bool,
    calls: AtomicUsize,
}

impl MockChatClient {
    pub fn streaming(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ..Default::default()
        }
    }

    pub fn completing(reply: &str) -> Self {
        Self {
            completion: reply.to_string(),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn complete(
        &self,
        _messages: &[Message]
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CompletionResponse { response: self.completion.clone() })
    }

    async fn stream_completion(
        &self,
        _messages: &[Message]
    ) -> Result<FragmentStream, Box<dyn StdError + Send + Sync>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_open {
            return Err("provider unreachable".into());
        }

        let fragments = self.fragments.clone();
        let fail_mid_stream = self.fail_mid_stream;
        create_streaming_response(move |tx| async move {
            for fragment in fragments {
                if tx.send(Ok(fragment)).await.is_err() {
                    return;
                }
            }
            if fail_mid_stream {
                let _ = tx.send(Err("connection reset by peer".into())).await;
            }
        })
    }

    fn get_model(&self) -> String {
        "mock".to_string()
    }
}

pub struct MockTranscriber {
    pub reply: String,
}

#[async_trait]
impl TranscriptionClient for MockTranscriber {
    async fn transcribe(
        &self,
        _audio: Vec<u8>,
        _file_name: &str,
        _mime_type: &str
    ) -> Result<String, Box<dyn StdError + Send + Sync>> {
        Ok(self.reply.clone())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub chat: Arc<MockChatClient>,
}

pub fn test_app(chat: MockChatClient) -> TestApp {
    test_app_with_transcriber(chat, "")
}

pub fn test_app_with_transcriber(chat: MockChatClient, transcription: &str) -> TestApp {
    let chat = Arc::new(chat);
    let store = Arc::new(MemoryStore::new());
    let dyn_store: Arc<dyn UsageStore> = store.clone();

    let assistant = Assistant::with_parts(
        chat.clone(),
        Arc::new(MockTranscriber { reply: transcription.to_string() }),
        None,
        dyn_store,
        Arc::new(PromptConfig::default()),
        10
    );

    let resolver = StaticTokenResolver::from_token_list(&format!("{}={}", TEST_TOKEN, TEST_USER));
    let state = AppState::new(Arc::new(assistant), Arc::new(resolver));

    TestApp {
        router: build_router(state),
        store,
        chat,
    }
}

pub fn post_json(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}
