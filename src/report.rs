//! Report export: per-film JSON report and top-keywords CSV.
//!
//! Downstream generators (word cloud, charts, spreadsheets) consume the
//! `(frequencies, sentiments)` tuple read-only; these files are the
//! machine-readable form of that tuple. A failed write is logged by the
//! caller and never aborts the batch.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::aggregate::{FilmReport, KeywordCount, SentimentSummary};
use crate::config::Film;

#[derive(Serialize)]
struct ReportDocument<'a> {
    film_id: &'a str,
    film_name: &'a str,
    generated_at: String,
    summary: &'a SentimentSummary,
    top_keywords: Vec<KeywordCount>,
    sentiments: &'a [f64],
}

pub fn write_report(
    dir: &str,
    film: &Film,
    report: &FilmReport,
    summary: &SentimentSummary,
    top_keywords: usize,
) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating output dir {}", dir))?;

    let document = ReportDocument {
        film_id: &film.id,
        film_name: &film.name,
        generated_at: Utc::now().to_rfc3339(),
        summary,
        top_keywords: report.top_keywords(top_keywords),
        sentiments: &report.sentiments,
    };

    let json_path = output_path(dir, &film.name, "report.json");
    let json = serde_json::to_string_pretty(&document).context("serializing report")?;
    fs::write(&json_path, json).with_context(|| format!("writing {}", json_path.display()))?;

    let csv_path = output_path(dir, &film.name, "keywords.csv");
    write_keywords_csv(&csv_path, &document.top_keywords)?;

    Ok(())
}

fn write_keywords_csv(path: &Path, keywords: &[KeywordCount]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    writer.write_record(["token", "count"])?;
    for keyword in keywords {
        let count = keyword.count.to_string();
        writer.write_record([keyword.token.as_str(), count.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

fn output_path(dir: &str, film_name: &str, suffix: &str) -> PathBuf {
    // Film names come from config and may contain separators.
    let safe: String = film_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    Path::new(dir).join(format!("{}_{}", safe, suffix))
}
