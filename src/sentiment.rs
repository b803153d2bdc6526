//! Sentiment scorer seam.
//!
//! The pipeline needs "score text -> scalar in [0,1]", higher = more positive.
//! `LexiconScorer` is the built-in implementation: a word -> polarity lexicon
//! in [-1,1], occurrences averaged and mapped into [0,1] around a neutral 0.5.
//! Scoring fails on unusable input and the comment is then dropped upstream.

use std::collections::HashMap;
use std::fs::read_to_string;

use crate::error::{PipelineError, Result};

pub trait SentimentScorer: Send + Sync {
    /// Score in [0,1]; `Err` marks the comment as unprocessable.
    fn score(&self, text: &str) -> Result<f64>;
}

#[derive(Debug)]
pub struct LexiconScorer {
    lexicon: HashMap<String, f64>,
}

impl LexiconScorer {
    pub fn new() -> Self {
        Self {
            lexicon: default_lexicon(),
        }
    }

    pub fn with_lexicon(lexicon: HashMap<String, f64>) -> Self {
        Self { lexicon }
    }

    /// Load `word<TAB>score` lines; scores outside [-1,1] are clamped.
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = read_to_string(path).map_err(|err| {
            PipelineError::Configuration(format!("cannot read lexicon {}: {}", path, err))
        })?;
        let mut lexicon = HashMap::new();
        for (line_no, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (word, score) = line.split_once('\t').ok_or_else(|| {
                PipelineError::Configuration(format!(
                    "lexicon {} line {}: expected word<TAB>score",
                    path,
                    line_no + 1
                ))
            })?;
            let score: f64 = score.trim().parse().map_err(|_| {
                PipelineError::Configuration(format!(
                    "lexicon {} line {}: bad score {:?}",
                    path,
                    line_no + 1,
                    score
                ))
            })?;
            lexicon.insert(word.to_owned(), score.clamp(-1.0, 1.0));
        }
        Ok(Self { lexicon })
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> Result<f64> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PipelineError::Processing(
                "cannot score empty comment".to_owned(),
            ));
        }

        let mut hits = 0usize;
        let mut sum = 0.0f64;
        for (word, polarity) in &self.lexicon {
            let count = text.matches(word.as_str()).count();
            if count > 0 {
                hits += count;
                sum += polarity * count as f64;
            }
        }

        if hits == 0 {
            return Ok(0.5);
        }
        let mean = sum / hits as f64;
        Ok((0.5 + 0.5 * mean).clamp(0.0, 1.0))
    }
}

fn default_lexicon() -> HashMap<String, f64> {
    [
        ("好看", 0.9),
        ("精彩", 1.0),
        ("震撼", 0.8),
        ("感人", 0.8),
        ("出色", 0.8),
        ("喜欢", 0.7),
        ("推荐", 0.6),
        ("不错", 0.6),
        ("用心", 0.5),
        ("一般", -0.2),
        ("平庸", -0.5),
        ("尴尬", -0.6),
        ("拖沓", -0.6),
        ("无聊", -0.7),
        ("失望", -0.8),
        ("难看", -0.9),
        ("浪费", -0.9),
        ("烂", -1.0),
    ]
    .into_iter()
    .map(|(word, score)| (word.to_owned(), score))
    .collect()
}
