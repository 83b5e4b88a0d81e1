use anyhow::Result;
use serde::Serialize;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::display::ArticleView;
use crate::news_source::{NewsSource, Notice};
use crate::query::QueryOptions;
use crate::summarizer::Summarizer;

pub const SUMMARY_UNAVAILABLE: &str = "Summary unavailable.";

/// What to do when the completion call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryPolicy {
    /// Return the error to the caller; the interaction fails.
    Propagate,
    /// Log the error and show a placeholder summary instead.
    Fallback,
}

impl SummaryPolicy {
    pub fn from_flag(fallback: bool) -> Self {
        if fallback {
            SummaryPolicy::Fallback
        } else {
            SummaryPolicy::Propagate
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InsightReport {
    pub cycle_id: String,
    pub options: QueryOptions,
    pub articles: Vec<ArticleView>,
    pub notice: Option<Notice>,
    pub is_fallback: bool,
    pub summary: String,
}

/// One dashboard interaction: fetch (with fallback), build display views,
/// then summarize the same article set.
pub async fn run_cycle(
    news: &NewsSource,
    summarizer: &Summarizer,
    options: QueryOptions,
    policy: SummaryPolicy,
) -> Result<InsightReport> {
    let cycle_id = Uuid::new_v4().to_string();
    let span = info_span!("insight", cycle = %cycle_id);

    async move {
        info!(
            "Insight cycle starting (language={}, limit={}, page={})",
            options.language(),
            options.limit(),
            options.page()
        );

        let feed = news.fetch(&options).await;
        let articles: Vec<ArticleView> = feed.articles.iter().map(ArticleView::from).collect();

        let summary = match summarizer.analyze(&feed.articles).await {
            Ok(summary) => summary,
            Err(e) => match policy {
                SummaryPolicy::Propagate => {
                    error!("Summarization failed: {:#}", e);
                    return Err(e);
                }
                SummaryPolicy::Fallback => {
                    error!("Summarization failed, using placeholder: {:#}", e);
                    SUMMARY_UNAVAILABLE.to_string()
                }
            },
        };

        info!(
            "Insight cycle complete: {} articles (fallback={})",
            articles.len(),
            feed.is_fallback
        );

        Ok(InsightReport {
            cycle_id,
            options,
            articles,
            notice: feed.notice,
            is_fallback: feed.is_fallback,
            summary,
        })
    }
    .instrument(span)
    .await
}
