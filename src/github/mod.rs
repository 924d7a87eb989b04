use reqwest::{
    Client as HttpClient,
    header::{ HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT },
};
use serde::{ Serialize, Deserialize };
use std::error::Error as StdError;

const GITHUB_API_BASE: &str = "https://api.github.com";

pub struct GitHubClient {
    http: HttpClient,
    api_base: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: u64,
    title: String,
    number: u64,
    state: String,
    html_url: String,
    created_at: String,
    user: PrAuthor,
    repository_url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PrAuthor {
    pub login: String,
    pub avatar_url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PrRepository {
    pub name: String,
    pub full_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PullRequestSummary {
    pub id: u64,
    pub title: String,
    pub number: u64,
    pub state: String,
    pub html_url: String,
    pub created_at: String,
    pub user: PrAuthor,
    pub repository: PrRepository,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PullRequestDetails {
    pub title: String,
    pub body: Option<String>,
}

impl GitHubClient {
    pub fn new(
        token: String,
        api_base: Option<String>
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("devpilot"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("token {}", token)).map_err(|e|
                format!("Invalid GitHub token format: {}", e)
            )?
        );

        let http = HttpClient::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)?;

        Ok(Self {
            http,
            api_base: api_base.unwrap_or_else(|| GITHUB_API_BASE.to_string()),
        })
    }

    /// Open pull requests authored by the token's user, each resolved to its
    /// owning repository.
    pub async fn list_open_prs(
        &self
    ) -> Result<Vec<PullRequestSummary>, Box<dyn StdError + Send + Sync>> {
        let url = format!(
            "{}/search/issues?q=is:pr+is:open+author:@me",
            self.api_base.trim_end_matches('/')
        );
        let search = self.http
            .get(&url)
            .send().await?
            .error_for_status()?
            .json::<SearchResponse>().await?;

        let mut prs = Vec::with_capacity(search.items.len());
        for item in search.items {
            let repository = self.http
                .get(&item.repository_url)
                .send().await?
                .error_for_status()?
                .json::<PrRepository>().await?;

            prs.push(PullRequestSummary {
                id: item.id,
                title: item.title,
                number: item.number,
                state: item.state,
                html_url: item.html_url,
                created_at: item.created_at,
                user: item.user,
                repository,
            });
        }

        Ok(prs)
    }

    pub async fn pull_request(
        &self,
        repo: &str,
        number: u64
    ) -> Result<PullRequestDetails, Box<dyn StdError + Send + Sync>> {
        let url = format!("{}/repos/{}/pulls/{}", self.api_base.trim_end_matches('/'), repo, number);
        let details = self.http
            .get(&url)
            .send().await?
            .error_for_status()?
            .json::<PullRequestDetails>().await?;
        Ok(details)
    }
}
