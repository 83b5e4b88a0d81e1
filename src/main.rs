use anyhow::Result;
use tracing::info;

use crypto_news_insight::config::{Config, LogFormat};
use crypto_news_insight::dashboard::start_dashboard;

fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("crypto_news_insight=info,tower_http=info")
    });

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration; missing API keys stop the process here
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("⚠️  {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(config.log_format);

    info!(
        "Crypto News Insight starting (model: {}, news: {})",
        config.openai_model, config.news_api_url
    );
    if config.summary_fallback {
        info!("Summary fallback enabled — completion errors show a placeholder");
    }

    start_dashboard(&config, async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received — shutting down gracefully");
        }
    })
    .await
}
