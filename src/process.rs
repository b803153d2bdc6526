//! Per-comment processing: sentiment score, tokenize, filter.
//!
//! Either the whole comment processes or it is dropped; tokens without a
//! score (or vice versa) are never emitted. Processing only reads shared
//! immutable state, so comments run concurrently under a bounded pool with
//! results collected in input order.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::sentiment::SentimentScorer;
use crate::tokenize::Tokenizer;

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedComment {
    pub tokens: Vec<String>,
    pub sentiment: f64,
}

/// Immutable state shared by every processor for one film.
pub struct ProcessContext {
    pub tokenizer: Arc<dyn Tokenizer>,
    pub scorer: Arc<dyn SentimentScorer>,
    pub stopwords: Arc<HashSet<String>>,
    pub blacklist: Arc<HashSet<String>>,
}

/// Process one comment. `None` means dropped: the comment contributes
/// nothing to any aggregate.
pub fn process(comment: &str, ctx: &ProcessContext) -> Option<ProcessedComment> {
    let sentiment = match ctx.scorer.score(comment) {
        Ok(score) => score,
        Err(err) => {
            warn!(%err, "comment dropped, scorer failed");
            return None;
        }
    };

    let tokens: Vec<String> = ctx
        .tokenizer
        .tokenize(comment)
        .into_iter()
        .filter(|token| {
            token.chars().count() > 1
                && !ctx.stopwords.contains(token)
                && !ctx.blacklist.contains(token)
        })
        .collect();

    Some(ProcessedComment { tokens, sentiment })
}

/// Run all comments through the bounded pool. The returned list holds the
/// surviving comments in input order; dropped comments leave no gap marker.
pub async fn process_all(
    comments: Vec<String>,
    ctx: Arc<ProcessContext>,
    concurrency: usize,
    deadline: Option<Instant>,
) -> Vec<ProcessedComment> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut handles = Vec::with_capacity(comments.len());

    for comment in comments {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                warn!("deadline reached, remaining comments not processed");
                break;
            }
        }
        let ctx = Arc::clone(&ctx);
        let semaphore = Arc::clone(&semaphore);
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            process(&comment, &ctx)
        }));
    }

    let mut processed = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(Some(result)) => processed.push(result),
            Ok(None) => {}
            Err(err) => warn!(%err, "processing task panicked"),
        }
    }
    debug!(kept = processed.len(), "processing stage finished");
    processed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, Result};
    use crate::tokenize::DictTokenizer;
    use std::collections::HashMap;

    /// Scorer stub with fixed per-comment scores; unknown comments fail.
    struct FixedScorer(HashMap<String, f64>);

    impl SentimentScorer for FixedScorer {
        fn score(&self, text: &str) -> Result<f64> {
            self.0
                .get(text)
                .copied()
                .ok_or_else(|| PipelineError::Processing("unknown comment".to_owned()))
        }
    }

    fn set(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn context(scores: &[(&str, f64)]) -> Arc<ProcessContext> {
        Arc::new(ProcessContext {
            tokenizer: Arc::new(DictTokenizer::new(
                ["电影", "好看", "浪费", "时间", "一般"]
                    .iter()
                    .map(|w| w.to_string()),
            )),
            scorer: Arc::new(FixedScorer(
                scores.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            )),
            stopwords: Arc::new(set(&["的", "了"])),
            blacklist: Arc::new(set(&["张三"])),
        })
    }

    #[test]
    fn test_all_or_nothing_on_scorer_failure() {
        let ctx = context(&[]);
        assert!(process("这部电影真好看", &ctx).is_none());
    }

    #[test]
    fn test_filters_short_stopword_blacklist_tokens() {
        let ctx = context(&[("张三的电影真好看", 0.8)]);
        let result = process("张三的电影真好看", &ctx).unwrap();
        assert_eq!(result.sentiment, 0.8);
        assert!(result.tokens.contains(&"电影".to_owned()));
        assert!(result.tokens.contains(&"好看".to_owned()));
        assert!(!result.tokens.iter().any(|t| t.chars().count() <= 1));
        assert!(!result.tokens.contains(&"张三".to_owned()));
        assert!(!result.tokens.contains(&"的".to_owned()));
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let comments = vec![
            "这部电影真好看".to_owned(),
            "太差了，浪费时间".to_owned(),
            "一般般吧".to_owned(),
        ];
        let ctx = context(&[
            ("这部电影真好看", 0.9),
            ("太差了，浪费时间", 0.1),
            ("一般般吧", 0.5),
        ]);
        let processed = process_all(comments, ctx, 4, None).await;
        let scores: Vec<f64> = processed.iter().map(|p| p.sentiment).collect();
        assert_eq!(scores, vec![0.9, 0.1, 0.5]);
    }

    #[tokio::test]
    async fn test_failed_comments_leave_no_gap() {
        let comments = vec![
            "这部电影真好看".to_owned(),
            "无法评分的评论".to_owned(),
            "一般般吧".to_owned(),
        ];
        let ctx = context(&[("这部电影真好看", 0.9), ("一般般吧", 0.5)]);
        let processed = process_all(comments, ctx, 2, None).await;
        let scores: Vec<f64> = processed.iter().map(|p| p.sentiment).collect();
        assert_eq!(scores, vec![0.9, 0.5]);
    }

    #[tokio::test]
    async fn test_two_page_batch_end_to_end() {
        use crate::aggregate::aggregate;

        // As merged from two fetched pages, in page order.
        let comments = vec![
            "这部电影真好看".to_owned(),
            "太差了，浪费时间".to_owned(),
            "一般般吧".to_owned(),
        ];
        let ctx = context(&[
            ("这部电影真好看", 0.9),
            ("太差了，浪费时间", 0.1),
            ("一般般吧", 0.5),
        ]);
        let processed = process_all(comments, ctx, 4, None).await;
        let report = aggregate(processed).unwrap();

        assert_eq!(report.sentiments, vec![0.9, 0.1, 0.5]);
        assert!(report
            .frequencies
            .iter()
            .all(|k| k.token.chars().count() > 1));
        for token in ["好看", "浪费", "一般"] {
            assert!(
                report.frequencies.iter().any(|k| k.token == token),
                "missing {}",
                token
            );
        }
        assert_eq!(
            report.total_token_occurrences(),
            report.frequencies.iter().map(|k| k.count).sum::<u64>()
        );
    }

    #[tokio::test]
    async fn test_deadline_stops_new_submissions() {
        let comments = vec!["这部电影真好看".to_owned(); 100];
        let ctx = context(&[("这部电影真好看", 0.9)]);
        let processed = process_all(comments, ctx, 2, Some(Instant::now())).await;
        assert!(processed.is_empty());
    }
}
