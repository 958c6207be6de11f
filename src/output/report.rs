// JSON title report: every distinct title with its score and verdict,
// so a threshold can be tuned without rerunning the classifier.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::schema::table::partial_path;
use crate::topics::relevance::{Classification, ScoreStrategy, TitleScore};

pub const REPORT_FILE: &str = "relevant_titles.json";

#[derive(Debug, Serialize)]
struct TitleReport<'a> {
    threshold: f64,
    strategy: ScoreStrategy,
    corpus_tokens: usize,
    titles_scored: usize,
    relevant: usize,
    /// Ranked by descending score
    titles: Vec<&'a TitleScore>,
}

/// Write `<output_dir>/relevant_titles.json`.
pub fn write_title_report(classification: &Classification, output_dir: &Path) -> Result<PathBuf> {
    let report = TitleReport {
        threshold: classification.threshold,
        strategy: classification.strategy,
        corpus_tokens: classification.corpus_tokens,
        titles_scored: classification.scores.len(),
        relevant: classification.relevant_count(),
        titles: classification.ranked(),
    };

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let path = output_dir.join(REPORT_FILE);
    let json = serde_json::to_string_pretty(&report)?;
    let tmp = partial_path(&path);
    if let Err(e) = std::fs::write(&tmp, json) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e)
            .with_context(|| format!("Failed to write title report to {}", tmp.display()));
    }
    std::fs::rename(&tmp, &path)
        .with_context(|| format!("Failed to move title report into {}", path.display()))?;

    info!(path = %path.display(), "Wrote title report");
    Ok(path)
}
