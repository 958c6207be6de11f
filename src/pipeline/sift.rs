// The sift pipeline.
//
// Stages run strictly one after another: build and checkpoint the unified
// table, score every distinct occupation title against the industry
// corpus, then keep the rows with a relevant title in an allowed state.
// Each output is written whole or not at all; a failure in a later stage
// never removes an earlier stage's file.

use std::ops::RangeInclusive;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::filter::{standardize_titles, RowFilter};
use crate::output::report::write_title_report;
use crate::schema::{write_checkpoint, Table};
use crate::topics::relevance::{classify_table, Classification};

/// What a full run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub years: RangeInclusive<i32>,
    pub unified_rows: usize,
    pub checkpoint: PathBuf,
    pub classification: Classification,
    pub report: PathBuf,
    pub filtered_rows: usize,
    pub output: PathBuf,
}

/// Build the unified table for the configured years and write the checkpoint.
pub fn normalize(config: &Config) -> Result<(Table, PathBuf)> {
    config.validate()?;

    let years = config.years();
    println!(
        "Reading {} vintages ({}-{}) from {}...",
        years.clone().count(),
        years.start(),
        years.end(),
        config.input_dir.display()
    );

    let table = config
        .normalizer()
        .normalize(years)
        .context("Failed to build unified table")?;
    let checkpoint = write_checkpoint(&table, &config.output_dir, config.delimiter)
        .context("Failed to write unified checkpoint")?;

    println!(
        "  {} rows, {} columns -> {}",
        table.len(),
        table.columns().len(),
        checkpoint.display()
    );
    Ok((table, checkpoint))
}

/// Score the distinct titles of `table` against `corpus`.
pub fn classify(config: &Config, table: &Table, corpus: &str) -> Result<Classification> {
    let settings = config.classifier_settings();
    println!("Loading word vectors from {}...", settings.model_path.display());

    let classification =
        classify_table(table, corpus, &settings).context("Failed to classify occupation titles")?;

    println!(
        "  {} of {} titles relevant (threshold {:.2}, {})",
        classification.relevant_count(),
        classification.scores.len(),
        classification.threshold,
        classification.strategy
    );
    Ok(classification)
}

/// Run every stage and write all outputs.
pub fn run(config: &Config, corpus: &str) -> Result<RunSummary> {
    let (table, checkpoint) = normalize(config)?;
    let classification = classify(config, &table, corpus)?;
    let report = write_title_report(&classification, &config.output_dir)?;

    let filter = RowFilter::new(config.states.clone());
    let mut filtered = filter.filter(&table, &classification.relevant_titles());
    standardize_titles(&mut filtered);

    let output = config.output_path();
    filtered
        .write_csv(&output, config.delimiter)
        .context("Failed to write filtered table")?;
    info!(path = %output.display(), rows = filtered.len(), "Wrote filtered table");

    Ok(RunSummary {
        years: config.years(),
        unified_rows: table.len(),
        checkpoint,
        classification,
        report,
        filtered_rows: filtered.len(),
        output,
    })
}
