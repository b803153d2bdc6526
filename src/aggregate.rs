//! Aggregation: merge per-comment results into a token frequency table and a
//! sentiment score list.
//!
//! Runs strictly after the concurrent processing stage, so no locks. Token
//! counts and the sentiment multiset are order-independent; the table still
//! remembers first-seen order so top-N output is deterministic.

use serde::Serialize;

use crate::process::ProcessedComment;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KeywordCount {
    pub token: String,
    pub count: u64,
}

/// Final aggregate for one film. `sum of counts` equals total retained token
/// occurrences; `sentiments.len()` equals the number of comments that
/// processed successfully.
#[derive(Debug, Clone, Serialize)]
pub struct FilmReport {
    /// Token frequencies in first-seen order.
    pub frequencies: Vec<KeywordCount>,
    /// One score per surviving comment, in the order comments were yielded.
    pub sentiments: Vec<f64>,
}

impl FilmReport {
    /// Top `n` keywords by count, ties broken by first-seen order.
    pub fn top_keywords(&self, n: usize) -> Vec<KeywordCount> {
        let mut sorted = self.frequencies.clone();
        sorted.sort_by(|a, b| b.count.cmp(&a.count));
        sorted.truncate(n);
        sorted
    }

    pub fn total_token_occurrences(&self) -> u64 {
        self.frequencies.iter().map(|k| k.count).sum()
    }
}

/// `None` when nothing survived processing: the film is skipped instead of
/// producing a report with undefined statistics.
pub fn aggregate(processed: Vec<ProcessedComment>) -> Option<FilmReport> {
    if processed.is_empty() {
        return None;
    }

    let mut frequencies: Vec<KeywordCount> = Vec::new();
    let mut index: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    let mut sentiments = Vec::with_capacity(processed.len());

    for comment in processed {
        for token in comment.tokens {
            match index.get(&token) {
                Some(&i) => frequencies[i].count += 1,
                None => {
                    index.insert(token.clone(), frequencies.len());
                    frequencies.push(KeywordCount { token, count: 1 });
                }
            }
        }
        sentiments.push(comment.sentiment);
    }

    Some(FilmReport {
        frequencies,
        sentiments,
    })
}

/// Sentiment bands and summary statistics for a non-empty report.
#[derive(Debug, Clone, Serialize)]
pub struct SentimentSummary {
    pub comments: usize,
    pub mean_score: f64,
    pub negative: usize,
    pub neutral: usize,
    pub positive: usize,
    pub positive_rate: f64,
    pub negative_rate: f64,
}

pub fn summarize(report: &FilmReport, thresholds: (f64, f64)) -> SentimentSummary {
    let (low, high) = thresholds;
    let total = report.sentiments.len();
    let negative = report.sentiments.iter().filter(|&&s| s < low).count();
    let positive = report.sentiments.iter().filter(|&&s| s > high).count();
    let neutral = total - negative - positive;
    let mean_score = report.sentiments.iter().sum::<f64>() / total as f64;
    SentimentSummary {
        comments: total,
        mean_score,
        negative,
        neutral,
        positive,
        positive_rate: positive as f64 / total as f64,
        negative_rate: negative as f64 / total as f64,
    }
}
