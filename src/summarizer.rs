use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::news_source::Article;

const PROMPT_TEMPLATE: &str = include_str!("../prompts/market_summary.md");

// ─── Chat completion API types ───

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

// ─── The Summarizer ───

pub struct Summarizer {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl Summarizer {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build Summarizer HTTP client")?;

        Ok(Summarizer {
            client,
            api_url: config.openai_api_url.trim_end_matches('/').to_string(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
        })
    }

    /// For testing: create summarizer with custom client and URL
    pub fn with_client(client: Client, api_url: String, api_key: String, model: String) -> Self {
        Summarizer {
            client,
            api_url,
            api_key,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the completion model for a sentiment / trend / action summary of
    /// the given articles. Errors are returned to the caller as-is.
    pub async fn analyze(&self, articles: &[Article]) -> Result<String> {
        if articles.is_empty() {
            anyhow::bail!("Cannot summarize an empty article list");
        }

        let prompt = render_prompt(articles);
        let response = self.call_completion(&prompt).await?;

        if let Some(usage) = &response.usage {
            debug!(
                "Completion usage: {} prompt tokens, {} completion tokens",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        let summary = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("No content in completion response")?
            .trim()
            .to_string();

        info!(
            "Summarized {} articles with {} ({} chars)",
            articles.len(),
            self.model,
            summary.len()
        );
        Ok(summary)
    }

    async fn call_completion(&self, user_message: &str) -> Result<ChatResponse> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(user_message.to_string()),
            }],
        };

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Completion API request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Completion API returned {}: {}", status.as_u16(), body);
        }

        resp.json::<ChatResponse>()
            .await
            .context("Failed to parse completion API response")
    }
}

/// Title and description of every article, in order, as one text block.
pub fn combine_articles(articles: &[Article]) -> String {
    articles
        .iter()
        .map(|art| {
            format!(
                "{}\n{}\n\n",
                art.title.as_deref().unwrap_or(""),
                art.description.as_deref().unwrap_or("")
            )
        })
        .collect()
}

pub fn render_prompt(articles: &[Article]) -> String {
    PROMPT_TEMPLATE.replace("{{news}}", &combine_articles(articles))
}
