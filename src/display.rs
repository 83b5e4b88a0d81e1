use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use crate::news_source::Article;

pub const DEFAULT_TITLE: &str = "No Title";
pub const DEFAULT_SOURCE: &str = "Unknown Source";
pub const DEFAULT_LINK: &str = "#";

fn timestamp_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").expect("timestamp prefix regex")
    })
}

/// Reformat a provider timestamp (`YYYY-MM-DDTHH:MM:SS...`) as
/// `DD Mon YYYY, HH:MM`. Anything else is passed through unchanged.
pub fn format_pub_date(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };

    timestamp_prefix()
        .find(raw)
        .and_then(|m| NaiveDateTime::parse_from_str(m.as_str(), "%Y-%m-%dT%H:%M:%S").ok())
        .map(|dt| dt.format("%d %b %Y, %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// An article with every default applied, ready for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleView {
    pub title: String,
    pub description: String,
    pub published: String,
    pub source: String,
    pub link: String,
}

impl From<&Article> for ArticleView {
    fn from(article: &Article) -> Self {
        ArticleView {
            title: article
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: article.description.clone().unwrap_or_default(),
            published: format_pub_date(article.published_at.as_deref()),
            source: article
                .source_name()
                .unwrap_or(DEFAULT_SOURCE)
                .to_string(),
            link: article
                .link
                .as_deref()
                .filter(|link| is_web_link(link))
                .unwrap_or(DEFAULT_LINK)
                .to_string(),
        }
    }
}

/// Only `http:` and `https:` links are rendered as anchors.
fn is_web_link(link: &str) -> bool {
    let link = link.trim_start();
    ["http://", "https://"].iter().any(|scheme| {
        link.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}
