//! Fetch news through the configured repository graph and report the outcome.
//!
//! Usage: `feedline-probe [NEWS_ID]`

use anyhow::Context;
use feedline_infra::{config, init_tracing, NewsRepositoryFactory};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let config = config::load().context("failed to load configuration")?;
    init_tracing(&config.logging).context("failed to initialize logging")?;

    let repository =
        NewsRepositoryFactory::build_from_config(&config).context("failed to build repository")?;

    let items = repository.news_list().await.context("failed to fetch news list")?;
    tracing::info!(count = items.len(), kind = %config.repository.kind, "fetched news list");
    for item in &items {
        tracing::info!(id = %item.id, date = %item.date, title = %item.title, "news item");
    }

    if let Some(id) = std::env::args().nth(1) {
        let item = repository
            .news_by_id(&id)
            .await
            .with_context(|| format!("failed to fetch news item {id}"))?;
        tracing::info!(id = %item.id, title = %item.title, subtitle = %item.subtitle, "fetched news item");
    }

    Ok(())
}
