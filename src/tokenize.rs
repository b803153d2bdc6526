//! Tokenizer seam.
//!
//! The pipeline only needs "split text into tokens given a custom dictionary".
//! `DictTokenizer` is the built-in implementation: forward maximum matching
//! over the user dictionary for CJK runs, overlapping bigrams for whatever the
//! dictionary does not cover, plain runs elsewhere. Deterministic given the
//! same dictionary. A heavier segmenter can be plugged in behind the trait.

use std::collections::HashSet;

/// Splits text into tokens. Implementations must be deterministic given the
/// same dictionary and are shared read-only across concurrent processors.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub struct DictTokenizer {
    dict: HashSet<String>,
    max_word_chars: usize,
}

impl DictTokenizer {
    pub fn new(custom_dict: impl IntoIterator<Item = String>) -> Self {
        let dict: HashSet<String> = custom_dict
            .into_iter()
            .filter(|word| !word.is_empty())
            .collect();
        let max_word_chars = dict
            .iter()
            .map(|word| word.chars().count())
            .max()
            .unwrap_or(0);
        Self {
            dict,
            max_word_chars,
        }
    }

    /// Forward maximum matching over one CJK run. Stretches the dictionary
    /// does not know fall back to overlapping bigrams; a stranded single
    /// char is emitted as-is and dropped later by the length filter.
    fn segment_cjk(&self, run: &[char], out: &mut Vec<String>) {
        let mut i = 0;
        let mut pending: Vec<char> = Vec::new();
        while i < run.len() {
            let longest = self.max_word_chars.min(run.len() - i);
            let mut matched = 0;
            for len in (2..=longest).rev() {
                let candidate: String = run[i..i + len].iter().collect();
                if self.dict.contains(&candidate) {
                    flush_pending(&mut pending, out);
                    out.push(candidate);
                    matched = len;
                    break;
                }
            }
            if matched > 0 {
                i += matched;
            } else {
                pending.push(run[i]);
                i += 1;
            }
        }
        flush_pending(&mut pending, out);
    }
}

fn flush_pending(pending: &mut Vec<char>, out: &mut Vec<String>) {
    match pending.len() {
        0 => {}
        1 => out.push(pending[0].to_string()),
        _ => {
            for pair in pending.windows(2) {
                out.push(pair.iter().collect());
            }
        }
    }
    pending.clear();
}

impl Tokenizer for DictTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut cjk_run: Vec<char> = Vec::new();
        let mut word_run = String::new();

        for c in text.chars() {
            if is_cjk(c) {
                if !word_run.is_empty() {
                    tokens.push(std::mem::take(&mut word_run));
                }
                cjk_run.push(c);
            } else if is_word(c) {
                if !cjk_run.is_empty() {
                    self.segment_cjk(&std::mem::take(&mut cjk_run), &mut tokens);
                }
                word_run.push(c);
            } else {
                if !cjk_run.is_empty() {
                    self.segment_cjk(&std::mem::take(&mut cjk_run), &mut tokens);
                }
                if !word_run.is_empty() {
                    tokens.push(std::mem::take(&mut word_run));
                }
            }
        }
        if !cjk_run.is_empty() {
            self.segment_cjk(&cjk_run, &mut tokens);
        }
        if !word_run.is_empty() {
            tokens.push(word_run);
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer(words: &[&str]) -> DictTokenizer {
        DictTokenizer::new(words.iter().map(|w| w.to_string()))
    }

    #[test]
    fn test_dictionary_words_win() {
        let t = tokenizer(&["电影", "好看"]);
        let tokens = t.tokenize("电影好看");
        assert_eq!(tokens, vec!["电影", "好看"]);
    }

    #[test]
    fn test_longest_match_preferred() {
        let t = tokenizer(&["魔童", "魔童闹海"]);
        let tokens = t.tokenize("魔童闹海");
        assert_eq!(tokens, vec!["魔童闹海"]);
    }

    #[test]
    fn test_unknown_run_falls_back_to_bigrams() {
        let t = tokenizer(&[]);
        let tokens = t.tokenize("真好看");
        assert_eq!(tokens, vec!["真好", "好看"]);
    }

    #[test]
    fn test_single_stranded_char() {
        let t = tokenizer(&["电影"]);
        let tokens = t.tokenize("看电影");
        assert_eq!(tokens, vec!["看", "电影"]);
    }

    #[test]
    fn test_mixed_script_runs() {
        let t = tokenizer(&["电影"]);
        let tokens = t.tokenize("imax 电影 2025");
        assert_eq!(tokens, vec!["imax", "电影", "2025"]);
    }

    #[test]
    fn test_deterministic() {
        let t = tokenizer(&["电影", "好看", "剧情"]);
        let a = t.tokenize("剧情不错的电影真好看");
        let b = t.tokenize("剧情不错的电影真好看");
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_input() {
        let t = tokenizer(&["电影"]);
        assert!(t.tokenize("").is_empty());
        assert!(t.tokenize("   ").is_empty());
    }
}
