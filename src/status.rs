// Input inventory: which vintages are present and what their headers
// reconcile to.

use anyhow::Result;
use colored::Colorize;

use crate::config::Config;
use crate::error::PipelineError;
use crate::schema::renames::RENAMES;

/// Display the per-year input inventory to the terminal.
///
/// Returns the number of years whose file is missing or unreadable, so
/// the caller can fail the command when a run would abort.
pub fn show(config: &Config) -> Result<usize> {
    config.validate()?;
    let normalizer = config.normalizer();

    println!(
        "Input directory: {} (template {})",
        config.input_dir.display(),
        config.filename_template
    );

    let mut problems = 0;
    for year in config.years() {
        let path = normalizer.path_for(year);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match normalizer.read_columns(year) {
            Ok(columns) => {
                let file_size = std::fs::metadata(&path)
                    .map(|m| format_bytes(m.len()))
                    .unwrap_or_else(|_| "unknown".to_string());
                let renamed = raw_renames(&normalizer, year);
                println!(
                    "  {} {:<28} {:>9}  {} columns{}",
                    year.to_string().bold(),
                    name,
                    file_size,
                    columns.len(),
                    if renamed > 0 {
                        format!(", {renamed} renamed").dimmed().to_string()
                    } else {
                        String::new()
                    }
                );
                println!("       {}", columns.join(", ").dimmed());
            }
            Err(PipelineError::MissingInput { .. }) => {
                problems += 1;
                println!("  {} {:<28} {}", year.to_string().bold(), name, "missing".red());
            }
            Err(e) => {
                problems += 1;
                println!("  {} {:<28} {}", year.to_string().bold(), name, "unreadable".red());
                println!("       {}", e.to_string().dimmed());
            }
        }
    }

    println!(
        "Embedding model: {}{}",
        config.model_path.display(),
        if config.model_path.is_file() {
            String::new()
        } else {
            format!(" ({})", "not found".yellow())
        }
    );

    Ok(problems)
}

/// How many of a vintage's raw headers are historical names.
fn raw_renames(normalizer: &crate::schema::Normalizer, year: i32) -> usize {
    let path = normalizer.path_for(year);
    let Ok(mut rdr) = csv::ReaderBuilder::new()
        .delimiter(normalizer.delimiter)
        .from_path(&path)
    else {
        return 0;
    };
    let Ok(headers) = rdr.headers() else {
        return 0;
    };
    headers
        .iter()
        .filter(|h| {
            let upper = h.trim().trim_start_matches('\u{feff}').to_uppercase();
            RENAMES.iter().any(|(old, _)| *old == upper)
        })
        .count()
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
