pub mod config;
pub mod dashboard;
pub mod display;
pub mod insight;
pub mod news_source;
pub mod query;
pub mod summarizer;
