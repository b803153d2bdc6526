mod aggregate;
mod blacklist;
mod collect;
mod config;
mod dispatch;
mod error;
mod fetch;
mod pipeline;
mod process;
mod report;
mod sentiment;
mod tokenize;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::{Config, WordLists};
use crate::pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./config.toml".to_owned());

    // Configuration problems are the only fatal errors; everything past this
    // point degrades per film, per page or per comment.
    let config = Config::load(&config_path)?;
    let lists = WordLists::load(&config.analysis)?;

    info!(
        films = config.films.len(),
        pages_per_film = config.fetch.page_limit,
        output = %config.output.dir,
        "🎉 review analysis batch starting"
    );

    let pipeline = Pipeline::new(config, lists)?;
    let summary = pipeline.run().await;

    info!(analyzed = summary.analyzed.len(), "✅ batch finished");
    for (film, reason) in &summary.skipped {
        warn!(film = %film, reason = *reason, "film skipped");
    }

    Ok(())
}
