use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use log::warn;
use std::collections::HashMap;
use std::error::Error;

/// Maps a request's bearer token to an owner identity. Returning `None`
/// means the request is unauthenticated; session issuance itself is someone
/// else's problem.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(
        &self,
        bearer_token: Option<&str>
    ) -> Result<Option<String>, Box<dyn Error + Send + Sync>>;
}

pub struct StaticTokenResolver {
    tokens: HashMap<String, String>,
}

impl StaticTokenResolver {
    /// Parses a comma-separated `token=user` list, e.g.
    /// `s3cret=alice,t0ken=bob`. Malformed entries are skipped with a warning.
    pub fn from_token_list(list: &str) -> Self {
        let mut tokens = HashMap::new();
        for pair in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some((token, user)) if !token.is_empty() && !user.is_empty() => {
                    tokens.insert(token.to_string(), user.to_string());
                }
                _ => {
                    warn!("Ignoring malformed auth token entry: {}", pair);
                }
            }
        }
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl IdentityResolver for StaticTokenResolver {
    async fn resolve(
        &self,
        bearer_token: Option<&str>
    ) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        Ok(bearer_token.and_then(|token| self.tokens.get(token).cloned()))
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn resolves_known_tokens() {
        let resolver = StaticTokenResolver::from_token_list("s3cret=alice, t0ken=bob");
        assert_eq!(resolver.resolve(Some("s3cret")).await.unwrap(), Some("alice".to_string()));
        assert_eq!(resolver.resolve(Some("t0ken")).await.unwrap(), Some("bob".to_string()));
        assert_eq!(resolver.resolve(Some("wrong")).await.unwrap(), None);
        assert_eq!(resolver.resolve(None).await.unwrap(), None);
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let resolver = StaticTokenResolver::from_token_list("good=alice,noequals,=nouser,notoken=");
        assert!(!resolver.is_empty());
        assert_eq!(resolver.tokens.len(), 1);
    }

    #[test]
    fn extracts_bearer_token_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"));
        assert_eq!(bearer_token(&headers), Some("s3cret"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);

        headers.remove(AUTHORIZATION);
        assert_eq!(bearer_token(&headers), None);
    }
}
