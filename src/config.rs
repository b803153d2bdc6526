//! Run configuration.
//!
//! Everything the pipeline needs is one TOML document plus a handful of
//! newline-delimited word lists. The config is an explicit value threaded into
//! the pipeline, never process-wide state. Missing word-list files are fatal
//! before any fetching starts.

use std::collections::HashSet;
use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;

use crate::error::{PipelineError, Result};

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub films: Vec<Film>,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub delays: DelayConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Film {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Pages of comments fetched per film (20 comments per page).
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Max page fetches in flight per film.
    #[serde(default = "default_fetch_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub proxy_pool: Vec<String>,
    /// Fetch the cast list and blacklist actor names.
    #[serde(default = "default_true")]
    pub filter_role_names: bool,
    /// Optional per-film deadline. Once elapsed, no new page or comment tasks
    /// are submitted; whatever completed flows through as a partial result.
    #[serde(default)]
    pub film_deadline_secs: Option<u64>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DelayConfig {
    /// Politeness delay after each page fetch, uniform in [min, max] ms.
    #[serde(default = "default_page_delay")]
    pub page_delay_ms: (u64, u64),
    /// Stagger between page task submissions, uniform in [min, max] ms.
    /// Kept separate from the page delay; both intervals are deliberate
    /// backpressure against the remote service.
    #[serde(default = "default_page_stagger")]
    pub page_stagger_ms: (u64, u64),
}

#[derive(Deserialize, Debug, Clone)]
pub struct AnalysisConfig {
    /// Max comments processed concurrently per film.
    #[serde(default = "default_process_concurrency")]
    pub concurrency: usize,
    /// Scores below `low` are negative, above `high` positive.
    #[serde(default = "default_thresholds")]
    pub sentiment_thresholds: (f64, f64),
    #[serde(default = "default_stopwords_path")]
    pub stopwords: String,
    #[serde(default = "default_filter_path")]
    pub filter_terms: String,
    /// Custom dictionary for the tokenizer, one word per line.
    #[serde(default = "default_userdict_path")]
    pub user_dict: String,
    /// Optional sentiment lexicon, `word<TAB>score` per line.
    #[serde(default)]
    pub lexicon: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default = "default_top_keywords")]
    pub top_keywords: usize,
}

fn default_base_url() -> String {
    "https://movie.douban.com".to_owned()
}
fn default_page_limit() -> u32 {
    5
}
fn default_fetch_concurrency() -> usize {
    3
}
fn default_process_concurrency() -> usize {
    4
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_true() -> bool {
    true
}
fn default_page_delay() -> (u64, u64) {
    (1000, 3000)
}
fn default_page_stagger() -> (u64, u64) {
    (500, 1500)
}
fn default_thresholds() -> (f64, f64) {
    (0.4, 0.6)
}
fn default_stopwords_path() -> String {
    "./stopwords.txt".to_owned()
}
fn default_filter_path() -> String {
    "./filter_terms.txt".to_owned()
}
fn default_userdict_path() -> String {
    "./userdict.txt".to_owned()
}
fn default_output_dir() -> String {
    "./reports".to_owned()
}
fn default_top_keywords() -> usize {
    50
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_limit: default_page_limit(),
            concurrency: default_fetch_concurrency(),
            timeout_secs: default_timeout_secs(),
            proxy_pool: Vec::new(),
            filter_role_names: true,
            film_deadline_secs: None,
        }
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: default_page_delay(),
            page_stagger_ms: default_page_stagger(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            concurrency: default_process_concurrency(),
            sentiment_thresholds: default_thresholds(),
            stopwords: default_stopwords_path(),
            filter_terms: default_filter_path(),
            user_dict: default_userdict_path(),
            lexicon: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            top_keywords: default_top_keywords(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let raw = read_to_string(path).map_err(|err| {
            PipelineError::Configuration(format!("cannot read config {}: {}", path, err))
        })?;
        let config: Config = toml::from_str(&raw).map_err(|err| {
            PipelineError::Configuration(format!("cannot parse config {}: {}", path, err))
        })?;
        if config.films.is_empty() {
            return Err(PipelineError::Configuration(
                "no films configured".to_owned(),
            ));
        }
        Ok(config)
    }
}

/// Word lists loaded once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct WordLists {
    pub stopwords: HashSet<String>,
    pub filter_terms: HashSet<String>,
    pub user_dict: Vec<String>,
}

impl WordLists {
    pub fn load(analysis: &AnalysisConfig) -> Result<Self> {
        Ok(Self {
            stopwords: load_word_set(&analysis.stopwords)?,
            filter_terms: load_word_set(&analysis.filter_terms)?,
            user_dict: load_word_lines(&analysis.user_dict)?,
        })
    }
}

fn load_word_lines(path: &str) -> Result<Vec<String>> {
    if !Path::new(path).exists() {
        return Err(PipelineError::Configuration(format!(
            "word list not found: {}",
            path
        )));
    }
    let raw = read_to_string(path)
        .map_err(|err| PipelineError::Configuration(format!("cannot read {}: {}", path, err)))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

fn load_word_set(path: &str) -> Result<HashSet<String>> {
    Ok(load_word_lines(path)?.into_iter().collect())
}
