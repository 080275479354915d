// src/fetch/reddit.rs
//! Reddit listing fetcher over the public JSON endpoints
//! (`/r/<sub>/<sort>.json`). No OAuth; a descriptive user agent and the
//! daily cadence keep request volume trivial.

use crate::error::HarvestError;
use crate::fetch::SourceFetcher;
use crate::time_policy::SortMethod;
use crate::types::{Item, ItemFlags};
use metrics::counter;
use serde::Deserialize;
use std::time::Duration;

const ENV_USER_AGENT: &str = "REDDIT_USER_AGENT";
const DEFAULT_USER_AGENT: &str = "reddit-ai-harvester/0.1 (daily collection)";
const BASE_URL: &str = "https://www.reddit.com";

pub struct RedditFetcher {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: i64,
    #[serde(default)]
    upvote_ratio: f64,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    permalink: String,
    /// Only present when the post points at an external destination.
    #[serde(default)]
    url_overridden_by_dest: Option<String>,
    #[serde(default)]
    over_18: bool,
    #[serde(default)]
    removed_by_category: Option<String>,
    #[serde(default)]
    locked: bool,
}

impl RedditFetcher {
    pub fn from_env() -> Result<Self, HarvestError> {
        let user_agent =
            std::env::var(ENV_USER_AGENT).unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| HarvestError::config(format!("building reddit client: {e}")))?;
        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point the fetcher at a different host (local stub in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn listing_url(&self, source: &str, sort: SortMethod, limit: u32) -> String {
        let mut url = format!(
            "{}/r/{}/{}.json?limit={}&raw_json=1",
            self.base_url, source, sort, limit
        );
        if sort == SortMethod::Top {
            // Weekly lookback, matching the top sort's acceptance window.
            url.push_str("&t=week");
        }
        url
    }
}

fn parse_listing(body: &str, source: &str, sort: SortMethod) -> Result<Vec<Item>, HarvestError> {
    let listing: Listing = serde_json::from_str(body).map_err(|e| HarvestError::Fetch {
        subreddit: source.to_string(),
        sort: sort.to_string(),
        message: format!("decoding listing: {e}"),
    })?;

    let items = listing
        .data
        .children
        .into_iter()
        .map(|child| {
            let p = child.data;
            Item {
                permalink: format!("{BASE_URL}{}", p.permalink),
                id: p.id,
                title: p.title,
                body: p.selftext,
                score: p.score,
                num_comments: p.num_comments,
                upvote_ratio: p.upvote_ratio,
                created_utc: p.created_utc as i64,
                author: p.author.unwrap_or_else(|| "unknown".to_string()),
                url: p.url_overridden_by_dest,
                flags: ItemFlags {
                    nsfw: p.over_18,
                    removed: p.removed_by_category.is_some(),
                    locked: p.locked,
                },
            }
        })
        .collect();
    Ok(items)
}

#[async_trait::async_trait]
impl SourceFetcher for RedditFetcher {
    async fn fetch(
        &self,
        source: &str,
        sort: SortMethod,
        limit: u32,
    ) -> Result<Vec<Item>, HarvestError> {
        counter!("harvest_api_calls_total").increment(1);

        let url = self.listing_url(source, sort, limit);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| HarvestError::Fetch {
                subreddit: source.to_string(),
                sort: sort.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HarvestError::Fetch {
                subreddit: source.to_string(),
                sort: sort.to_string(),
                message: format!("listing returned {status}"),
            });
        }

        let body = resp.text().await.map_err(|e| HarvestError::Fetch {
            subreddit: source.to_string(),
            sort: sort.to_string(),
            message: format!("reading body: {e}"),
        })?;
        parse_listing(&body, source, sort)
    }

    fn name(&self) -> &'static str {
        "reddit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "kind": "Listing",
        "data": {
            "children": [
                {"kind": "t3", "data": {
                    "id": "1abcd",
                    "title": "New GPT-4 model",
                    "selftext": "175B parameters",
                    "score": 120,
                    "num_comments": 40,
                    "upvote_ratio": 0.95,
                    "created_utc": 1700000000.0,
                    "author": "researcher",
                    "permalink": "/r/MachineLearning/comments/1abcd/new_gpt4/",
                    "url_overridden_by_dest": "https://arxiv.org/abs/2303.08774",
                    "over_18": false,
                    "locked": false
                }},
                {"kind": "t3", "data": {
                    "id": "2efgh",
                    "title": "[deleted]",
                    "selftext": "",
                    "score": 3,
                    "num_comments": 0,
                    "upvote_ratio": 0.4,
                    "created_utc": 1699990000.0,
                    "author": null,
                    "permalink": "/r/MachineLearning/comments/2efgh/x/",
                    "over_18": true,
                    "removed_by_category": "moderator",
                    "locked": true
                }}
            ]
        }
    }"#;

    #[test]
    fn listing_fixture_maps_to_items() {
        let items = parse_listing(FIXTURE, "MachineLearning", SortMethod::Hot).unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.id, "1abcd");
        assert_eq!(first.score, 120);
        assert_eq!(first.created_utc, 1_700_000_000);
        assert_eq!(
            first.url.as_deref(),
            Some("https://arxiv.org/abs/2303.08774")
        );
        assert!(!first.flags.nsfw);

        let second = &items[1];
        assert_eq!(second.author, "unknown");
        assert!(second.flags.nsfw && second.flags.removed && second.flags.locked);
        assert!(second.url.is_none());
    }

    #[test]
    fn top_sort_requests_weekly_lookback() {
        let f = RedditFetcher {
            client: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
        };
        let url = f.listing_url("ChatGPT", SortMethod::Top, 100);
        assert!(url.contains("/r/ChatGPT/top.json"));
        assert!(url.contains("t=week"));
        assert!(!f.listing_url("ChatGPT", SortMethod::Hot, 100).contains("t=week"));
    }

    #[test]
    fn malformed_listing_is_a_fetch_error() {
        let err = parse_listing("not json", "NLP", SortMethod::New).unwrap_err();
        assert!(matches!(err, HarvestError::Fetch { .. }));
    }
}
