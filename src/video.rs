//! YouTube top-video lookup
//!
//! Best-effort: every failure is logged and reported as "no video". The chat
//! reply must never break because the search did.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const YOUTUBE_BASE_URL: &str = "https://www.googleapis.com";
const SEARCH_TIMEOUT_SECS: u64 = 6;

/// Top search hit, as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResult {
    pub url: String,
    pub video_id: String,
    pub title: String,
    pub thumbnail: Option<String>,
}

#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Whether lookups can reach the network at all
    fn is_enabled(&self) -> bool;

    /// Best match for `query`, or `None` when disabled, empty, or failed
    async fn find_top_video(&self, query: &str, max_results: u32) -> Option<VideoResult>;
}

// ============================================================================
// YouTube Data API v3
// ============================================================================

pub struct YouTubeClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl YouTubeClient {
    /// A client without a key never touches the network.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: YOUTUBE_BASE_URL.to_string(),
            timeout: Duration::from_secs(SEARCH_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn search_url(&self, query: &str, api_key: &str, max_results: u32) -> String {
        format!(
            "{}/youtube/v3/search?part=snippet&q={}&key={}&type=video&maxResults={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(api_key),
            max_results
        )
    }

    async fn search(&self, url: &str) -> Result<SearchResponse, reqwest::Error> {
        self.client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json::<SearchResponse>()
            .await
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    async fn find_top_video(&self, query: &str, max_results: u32) -> Option<VideoResult> {
        let api_key = self.api_key.as_deref()?;
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        let url = self.search_url(query, api_key, max_results.max(1));
        match self.search(&url).await {
            Ok(response) => {
                let top = extract_top(response);
                if top.is_none() {
                    debug!(query, "YouTube search returned no usable result");
                }
                top
            }
            Err(e) => {
                // The URL carries the API key
                warn!(query, error = %e.without_url(), "YouTube search failed");
                None
            }
        }
    }
}

/// First item with a video id; thumbnail prefers high, then medium, then default.
fn extract_top(response: SearchResponse) -> Option<VideoResult> {
    let item = response.items.into_iter().next()?;
    let video_id = item.id.video_id.filter(|id| !id.is_empty())?;

    let snippet = item.snippet.unwrap_or_default();
    let thumbs = snippet.thumbnails.unwrap_or_default();
    let thumbnail = [thumbs.high, thumbs.medium, thumbs.default]
        .into_iter()
        .flatten()
        .find_map(|t| t.url);

    Some(VideoResult {
        url: format!("https://www.youtube.com/watch?v={}", video_id),
        video_id,
        title: snippet.title.unwrap_or_default(),
        thumbnail,
    })
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Deserialize, Default)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: ItemId,
    snippet: Option<Snippet>,
}

#[derive(Deserialize, Default)]
struct ItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Deserialize, Default)]
struct Snippet {
    title: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Deserialize, Default)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: Option<String>,
}
