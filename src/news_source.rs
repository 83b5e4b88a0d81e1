use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::query::QueryOptions;

// ─── Provider types ───

// Provider fields are loosely typed; anything that is not a string reads as absent
fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

// Only `{"name": ...}` objects carry a source; other shapes read as absent
fn deserialize_lenient_source<'de, D>(deserializer: D) -> Result<Option<ArticleSource>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => Some(ArticleSource {
            name: map.get("name").and_then(Value::as_str).map(str::to_string),
        }),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleSource {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub name: Option<String>,
}

/// One news item as delivered by the provider. Every field may be missing or
/// wrongly typed; display defaults live in `crate::display`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub description: Option<String>,
    #[serde(
        rename = "pubDate",
        default,
        deserialize_with = "deserialize_lenient_string"
    )]
    pub published_at: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_source")]
    pub source: Option<ArticleSource>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub link: Option<String>,
}

impl Article {
    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.name.as_deref())
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to news provider failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("news provider returned {status}")]
    Status { status: reqwest::StatusCode },
    #[error("news provider body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("news provider returned no usable articles")]
    NoArticles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// A message the dashboard shows next to the articles when live data was
/// replaced by the mock set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn for_error(err: &FetchError) -> Self {
        match err {
            FetchError::NoArticles => Notice {
                level: NoticeLevel::Warning,
                message: "No articles found, showing sample articles instead.".to_string(),
            },
            other => Notice {
                level: NoticeLevel::Error,
                message: format!("Error fetching news: {}", other),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewsFeed {
    pub articles: Vec<Article>,
    pub notice: Option<Notice>,
    pub is_fallback: bool,
}

/// The fixed two-entry sample set substituted whenever live data is unusable.
pub fn mock_articles() -> Vec<Article> {
    vec![
        Article {
            title: Some("Bitcoin Reaches New High".to_string()),
            description: Some(
                "Bitcoin price surged 5% today as market sentiment turns bullish...".to_string(),
            ),
            published_at: Some("2025-11-13T12:00:00.000Z".to_string()),
            source: Some(ArticleSource {
                name: Some("CryptoNews".to_string()),
            }),
            link: Some("https://example.com/bitcoin".to_string()),
        },
        Article {
            title: Some("Ethereum Merge Update".to_string()),
            description: Some(
                "Ethereum upgrade drives adoption and network efficiency...".to_string(),
            ),
            published_at: Some("2025-11-12T09:30:00.000Z".to_string()),
            source: Some(ArticleSource {
                name: Some("CoinTelegraph".to_string()),
            }),
            link: Some("https://example.com/ethereum".to_string()),
        },
    ]
}

/// Pull `data.articles` out of a provider envelope. Anything other than
/// object → object → list yields no articles; list entries that are not
/// article objects are skipped.
pub fn extract_articles(body: &Value) -> Vec<Article> {
    let Some(entries) = body
        .as_object()
        .and_then(|root| root.get("data"))
        .and_then(Value::as_object)
        .and_then(|data| data.get("articles"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    entries
        .iter()
        .filter(|entry| entry.is_object())
        .filter_map(|entry| match Article::deserialize(entry) {
            Ok(article) => Some(article),
            Err(e) => {
                debug!("Skipping unreadable article entry: {}", e);
                None
            }
        })
        .collect()
}

pub struct NewsSource {
    client: Client,
    api_url: String,
    api_key: String,
}

impl NewsSource {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build news HTTP client")?;

        Ok(NewsSource {
            client,
            api_url: config.news_api_url.clone(),
            api_key: config.news_api_key.clone(),
        })
    }

    /// For testing: create source with custom client and URL
    pub fn with_client(client: Client, api_url: String, api_key: String) -> Self {
        NewsSource {
            client,
            api_url,
            api_key,
        }
    }

    /// Fetch one page of articles. Never fails: on any provider problem the
    /// mock set is returned (untruncated) together with a notice.
    pub async fn fetch(&self, options: &QueryOptions) -> NewsFeed {
        match self.fetch_live(options).await {
            Ok(mut articles) => {
                articles.truncate(options.limit() as usize);
                info!(
                    "Fetched {} {} articles (page {})",
                    articles.len(),
                    options.language(),
                    options.page()
                );
                NewsFeed {
                    articles,
                    notice: None,
                    is_fallback: false,
                }
            }
            Err(e) => {
                warn!("News fetch failed, using sample articles: {}", e);
                NewsFeed {
                    articles: mock_articles(),
                    notice: Some(Notice::for_error(&e)),
                    is_fallback: true,
                }
            }
        }
    }

    async fn fetch_live(&self, options: &QueryOptions) -> Result<Vec<Article>, FetchError> {
        let response = self
            .client
            .get(&self.api_url)
            .header("X-API-Key", &self.api_key)
            .query(&[
                ("items", options.limit().to_string()),
                ("page", options.page().to_string()),
                ("language", options.language().code().to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }

        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)?;
        let articles = extract_articles(&body);
        if articles.is_empty() {
            return Err(FetchError::NoArticles);
        }

        debug!("Provider returned {} usable articles", articles.len());
        Ok(articles)
    }
}
