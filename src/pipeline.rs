//! Batch orchestration.
//!
//! Films run sequentially; one film's pipeline finishes before the next
//! starts. Per film:
//! `PENDING -> FETCHING -> (COLLECTED | SKIPPED_NO_COMMENTS) -> PROCESSING ->
//! (AGGREGATED | SKIPPED_NO_RESULTS)`. Failures never cross film boundaries;
//! the batch always runs to the end and reports what was skipped.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::aggregate::{aggregate, summarize, FilmReport, SentimentSummary};
use crate::blacklist;
use crate::collect::{collect, CollectOptions};
use crate::config::{Config, Film, WordLists};
use crate::dispatch::RequestDispatcher;
use crate::error::Result;
use crate::fetch::CommentFetcher;
use crate::process::{process_all, ProcessContext};
use crate::report::write_report;
use crate::sentiment::{LexiconScorer, SentimentScorer};
use crate::tokenize::{DictTokenizer, Tokenizer};

/// Terminal state for one film.
#[derive(Debug)]
pub enum FilmOutcome {
    Aggregated {
        report: FilmReport,
        summary: SentimentSummary,
    },
    SkippedNoComments,
    SkippedNoResults,
}

impl FilmOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            FilmOutcome::Aggregated { .. } => "AGGREGATED",
            FilmOutcome::SkippedNoComments => "SKIPPED_NO_COMMENTS",
            FilmOutcome::SkippedNoResults => "SKIPPED_NO_RESULTS",
        }
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub analyzed: Vec<String>,
    pub skipped: Vec<(String, &'static str)>,
}

pub struct Pipeline {
    config: Config,
    fetcher: Arc<CommentFetcher>,
    tokenizer: Arc<dyn Tokenizer>,
    scorer: Arc<dyn SentimentScorer>,
    stopwords: Arc<std::collections::HashSet<String>>,
    filter_terms: std::collections::HashSet<String>,
}

impl Pipeline {
    /// Wires the components from config. Fails only on configuration
    /// problems, before any fetching.
    pub fn new(config: Config, lists: WordLists) -> Result<Self> {
        let dispatcher = RequestDispatcher::new(
            format!("{}/", config.fetch.base_url),
            config.fetch.proxy_pool.clone(),
        );
        let fetcher = Arc::new(CommentFetcher::new(
            dispatcher,
            config.fetch.base_url.clone(),
            config.fetch.timeout_secs,
            config.delays.page_delay_ms,
        ));
        let tokenizer: Arc<dyn Tokenizer> = Arc::new(DictTokenizer::new(lists.user_dict));
        let scorer: Arc<dyn SentimentScorer> = match &config.analysis.lexicon {
            Some(path) => Arc::new(LexiconScorer::from_file(path)?),
            None => Arc::new(LexiconScorer::new()),
        };
        Ok(Self {
            config,
            fetcher,
            tokenizer,
            scorer,
            stopwords: Arc::new(lists.stopwords),
            filter_terms: lists.filter_terms,
        })
    }

    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for film in &self.config.films {
            info!(film = %film.name, id = %film.id, "🎬 analyzing");
            let outcome = self.run_film(film).await;
            info!(film = %film.name, state = outcome.label(), "film finished");
            match outcome {
                FilmOutcome::Aggregated { report, summary: stats } => {
                    if let Err(err) = write_report(
                        &self.config.output.dir,
                        film,
                        &report,
                        &stats,
                        self.config.output.top_keywords,
                    ) {
                        warn!(film = %film.name, %err, "report write failed");
                    }
                    summary.analyzed.push(film.name.clone());
                }
                outcome => summary.skipped.push((film.name.clone(), outcome.label())),
            }
        }
        summary
    }

    async fn run_film(&self, film: &Film) -> FilmOutcome {
        let deadline = self
            .config
            .fetch
            .film_deadline_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs));

        info!(film = %film.name, state = "FETCHING", "collecting comments");
        let options = CollectOptions {
            page_count: self.config.fetch.page_limit,
            concurrency: self.config.fetch.concurrency,
            stagger_ms: self.config.delays.page_stagger_ms,
            fetch_cast: self.config.fetch.filter_role_names,
            deadline,
        };
        let collected = collect(Arc::clone(&self.fetcher), &film.id, &options).await;

        if collected.comments.is_empty() {
            warn!(film = %film.name, "⚠️ no comments collected, film skipped");
            return FilmOutcome::SkippedNoComments;
        }
        info!(
            film = %film.name,
            state = "COLLECTED",
            comments = collected.comments.len(),
            cast = collected.characters.len(),
            "collection done"
        );

        let ctx = Arc::new(ProcessContext {
            tokenizer: Arc::clone(&self.tokenizer),
            scorer: Arc::clone(&self.scorer),
            stopwords: Arc::clone(&self.stopwords),
            blacklist: Arc::new(blacklist::build(&collected.characters, &self.filter_terms)),
        });

        info!(film = %film.name, state = "PROCESSING", "processing comments");
        let processed = process_all(
            collected.comments,
            ctx,
            self.config.analysis.concurrency,
            deadline,
        )
        .await;

        match aggregate(processed) {
            Some(report) => {
                let stats = summarize(&report, self.config.analysis.sentiment_thresholds);
                FilmOutcome::Aggregated {
                    report,
                    summary: stats,
                }
            }
            None => {
                warn!(film = %film.name, "⚠️ nothing survived processing, film skipped");
                FilmOutcome::SkippedNoResults
            }
        }
    }
}
