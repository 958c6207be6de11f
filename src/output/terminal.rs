// Colored terminal output for title scores and run summaries.

use colored::Colorize;

use super::truncate_chars;
use crate::pipeline::RunSummary;
use crate::topics::relevance::Classification;

/// Display the top-scoring titles, colored relative to the threshold.
pub fn display_classification(classification: &Classification, limit: usize) {
    if classification.scores.is_empty() {
        println!("No occupation titles found in the unified table.");
        return;
    }

    println!(
        "\n{}",
        format!(
            "=== Title Relevance ({} of {} relevant, threshold {:.2}) ===",
            classification.relevant_count(),
            classification.scores.len(),
            classification.threshold
        )
        .bold()
    );
    println!();
    println!(
        "  {:>4}  {:<60} {:>6}",
        "Rank".dimmed(),
        "Title".dimmed(),
        "Score".dimmed()
    );
    println!("  {}", "-".repeat(74).dimmed());

    for (i, entry) in classification.ranked().into_iter().take(limit).enumerate() {
        let score = format!("{:>6.3}", entry.score);
        let score = if entry.relevant {
            score.bright_green()
        } else if entry.score > classification.threshold - 0.1 {
            score.yellow()
        } else {
            score.normal()
        };
        let marker = if entry.relevant { "*".green() } else { " ".normal() };

        println!(
            "  {:>4}. {:<60} {} {}",
            i + 1,
            truncate_chars(&entry.title, 57),
            score,
            marker
        );
    }

    if classification.scores.len() > limit {
        println!(
            "  {}",
            format!("... {} more titles", classification.scores.len() - limit).dimmed()
        );
    }
}

/// Display where a full run left its outputs.
pub fn display_run_summary(summary: &RunSummary) {
    println!("\n{}", "Run complete.".bold());
    println!(
        "  Years: {}-{}",
        summary.years.start(),
        summary.years.end()
    );
    println!(
        "  Unified table: {} rows -> {}",
        summary.unified_rows,
        summary.checkpoint.display()
    );
    println!(
        "  Relevant titles: {} of {} -> {}",
        summary.classification.relevant_count(),
        summary.classification.scores.len(),
        summary.report.display()
    );
    println!(
        "  Filtered table: {} rows -> {}",
        summary.filtered_rows,
        summary.output.display()
    );
}
